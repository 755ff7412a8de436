use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{ErpaError, Result};

/// Every action kind the client can execute.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    DynamicSearch,
    GetDocumentDetails,
    FindDuplicates,
    CountDocuments,
    CreateDocument,
    SearchCustomers,
    GetCustomersByOrderCount,
    GetCustomersByOrderValue,
    GetOrdersByCustomerGroup,
    GetOrdersByTerritory,
    GetOrdersByItem,
    GetOrdersByItemGroup,
    GetOrdersWithMostItems,
    GetTotalQuantitySold,
    GetMostSoldItems,
    GetSalesOrderCountByCustomer,
    GetSalesPersonSummary,
    GetSalesPersonCount,
    GetSalesPersonNames,
    GetSalesPersonsByGroup,
}

/// Older action names the assistant still emits.
///
/// Each one is an alias of a canonical kind pinned to the `Customer` doctype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum LegacyAlias {
    SearchCustomer,
    GetCustomerDetails,
    FindDuplicateCustomers,
    CountCustomers,
}

impl LegacyAlias {
    pub fn canonical(self) -> ActionKind {
        match self {
            Self::SearchCustomer => ActionKind::DynamicSearch,
            Self::GetCustomerDetails => ActionKind::GetDocumentDetails,
            Self::FindDuplicateCustomers => ActionKind::FindDuplicates,
            Self::CountCustomers => ActionKind::CountDocuments,
        }
    }
}

/// Result of looking up an action name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedName {
    pub kind: ActionKind,
    pub alias: Option<LegacyAlias>,
}

impl ActionKind {
    /// Resolves a canonical or legacy name. Unknown names fail closed.
    pub fn resolve(name: &str) -> Result<ResolvedName> {
        let trimmed = name.trim();
        if let Ok(kind) = trimmed.parse::<ActionKind>() {
            return Ok(ResolvedName { kind, alias: None });
        }
        if let Ok(alias) = trimmed.parse::<LegacyAlias>() {
            return Ok(ResolvedName {
                kind: alias.canonical(),
                alias: Some(alias),
            });
        }
        Err(ErpaError::UnknownAction(trimmed.to_string()))
    }
}

/// The sales analytics queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum AggregateKind {
    CustomersByOrderCount,
    CustomersByOrderValue,
    OrdersByCustomerGroup,
    OrdersByTerritory,
    OrdersByItem,
    OrdersByItemGroup,
    OrdersWithMostItems,
    TotalQuantitySold,
    MostSoldItems,
    SalesOrderCountByCustomer,
    SalesPersonSummary,
    SalesPersonCount,
    SalesPersonNames,
    SalesPersonsByGroup,
}

impl AggregateKind {
    pub fn action_kind(self) -> ActionKind {
        match self {
            Self::CustomersByOrderCount => ActionKind::GetCustomersByOrderCount,
            Self::CustomersByOrderValue => ActionKind::GetCustomersByOrderValue,
            Self::OrdersByCustomerGroup => ActionKind::GetOrdersByCustomerGroup,
            Self::OrdersByTerritory => ActionKind::GetOrdersByTerritory,
            Self::OrdersByItem => ActionKind::GetOrdersByItem,
            Self::OrdersByItemGroup => ActionKind::GetOrdersByItemGroup,
            Self::OrdersWithMostItems => ActionKind::GetOrdersWithMostItems,
            Self::TotalQuantitySold => ActionKind::GetTotalQuantitySold,
            Self::MostSoldItems => ActionKind::GetMostSoldItems,
            Self::SalesOrderCountByCustomer => ActionKind::GetSalesOrderCountByCustomer,
            Self::SalesPersonSummary => ActionKind::GetSalesPersonSummary,
            Self::SalesPersonCount => ActionKind::GetSalesPersonCount,
            Self::SalesPersonNames => ActionKind::GetSalesPersonNames,
            Self::SalesPersonsByGroup => ActionKind::GetSalesPersonsByGroup,
        }
    }

    /// Parameter that must be present before the query is sent.
    pub fn required_param(self) -> Option<&'static str> {
        match self {
            Self::OrdersByCustomerGroup => Some("customer_group"),
            Self::OrdersByTerritory => Some("territory"),
            Self::OrdersByItem | Self::TotalQuantitySold => Some("item_code"),
            Self::OrdersByItemGroup => Some("item_group"),
            Self::SalesPersonSummary => Some("sales_person"),
            _ => None,
        }
    }

    /// Default sort applied when the assistant gives none.
    pub fn default_order_by(self) -> Option<&'static str> {
        match self {
            Self::CustomersByOrderCount => Some("order_count desc"),
            Self::CustomersByOrderValue => Some("total_value desc"),
            Self::OrdersWithMostItems => Some("item_count desc"),
            Self::MostSoldItems => Some("total_qty desc"),
            _ => None,
        }
    }

    /// Heading shown above the rendered result.
    pub fn title(self) -> &'static str {
        match self {
            Self::CustomersByOrderCount => "Customers by number of orders",
            Self::CustomersByOrderValue => "Customers by order value",
            Self::OrdersByCustomerGroup => "Sales orders for customer group",
            Self::OrdersByTerritory => "Sales orders for territory",
            Self::OrdersByItem => "Sales orders containing item",
            Self::OrdersByItemGroup => "Sales orders for item group",
            Self::OrdersWithMostItems => "Sales orders with the most items",
            Self::TotalQuantitySold => "Total quantity sold",
            Self::MostSoldItems => "Most sold items",
            Self::SalesOrderCountByCustomer => "Sales order count by customer",
            Self::SalesPersonSummary => "Sales person summary",
            Self::SalesPersonCount => "Sales persons",
            Self::SalesPersonNames => "Sales person names",
            Self::SalesPersonsByGroup => "Sales persons by group",
        }
    }
}
