//! Typed action descriptors parsed from assistant replies.

use serde_json::{Map, Value, json};

use super::kind::{ActionKind, AggregateKind, LegacyAlias};
use crate::doctype::plural_label;
use crate::error::{ErpaError, Result};

/// Doctype assumed when the assistant names none.
pub const DEFAULT_DOCTYPE: &str = "Customer";

/// A follow-up operation suggested by the assistant.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDescriptor {
    pub action: Action,
    pub execute_immediately: bool,
    pub confidence: Option<f64>,
    /// Set when the assistant used an older action name.
    pub alias: Option<LegacyAlias>,
}

/// Closed set of operations, each with its own parameters.
///
/// Required parameters are optional here so that handlers can report them
/// as validation failures instead of the parser rejecting the reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    DynamicSearch(SearchQuery),
    GetDocumentDetails(DetailQuery),
    FindDuplicates {
        doctype: String,
    },
    CountDocuments {
        doctype: String,
        filters: Option<Map<String, Value>>,
    },
    CreateDocument {
        doctype: Option<String>,
        fields: Map<String, Value>,
    },
    SearchCustomers {
        query: Option<String>,
        limit: Option<u32>,
    },
    Aggregate {
        kind: AggregateKind,
        params: AggregateParams,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub doctype: String,
    pub filters: Map<String, Value>,
    pub limit: Option<u32>,
    pub order_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailQuery {
    pub doctype: String,
    pub name: Option<String>,
    /// Follow-up question about the document, if the user asked one.
    pub question: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateParams {
    pub limit: Option<u32>,
    pub order_by: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub customer_group: Option<String>,
    pub territory: Option<String>,
    pub item_code: Option<String>,
    pub item_group: Option<String>,
    pub sales_person: Option<String>,
    pub filters: Option<Map<String, Value>>,
}

impl AggregateParams {
    /// Looks up a named string parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "order_by" => &self.order_by,
            "from_date" => &self.from_date,
            "to_date" => &self.to_date,
            "customer_group" => &self.customer_group,
            "territory" => &self.territory,
            "item_code" => &self.item_code,
            "item_group" => &self.item_group,
            "sales_person" => &self.sales_person,
            _ => return None,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    /// Request parameters for the aggregate endpoint.
    pub fn to_request(&self, kind: AggregateKind) -> Map<String, Value> {
        let mut params = Map::new();
        for key in [
            "from_date",
            "to_date",
            "customer_group",
            "territory",
            "item_code",
            "item_group",
            "sales_person",
        ] {
            if let Some(value) = self.get(key) {
                params.insert(key.to_string(), json!(value));
            }
        }
        if let Some(limit) = self.limit {
            params.insert("limit".to_string(), json!(limit));
        }
        if let Some(order_by) = self.get("order_by").or(kind.default_order_by()) {
            params.insert("order_by".to_string(), json!(order_by));
        }
        if let Some(filters) = &self.filters {
            params.insert("filters".to_string(), Value::Object(filters.clone()));
        }
        params
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::DynamicSearch(_) => ActionKind::DynamicSearch,
            Self::GetDocumentDetails(_) => ActionKind::GetDocumentDetails,
            Self::FindDuplicates { .. } => ActionKind::FindDuplicates,
            Self::CountDocuments { .. } => ActionKind::CountDocuments,
            Self::CreateDocument { .. } => ActionKind::CreateDocument,
            Self::SearchCustomers { .. } => ActionKind::SearchCustomers,
            Self::Aggregate { kind, .. } => kind.action_kind(),
        }
    }

    /// Canned status phrase shown when the assistant's text is unusable.
    pub fn status_phrase(&self) -> String {
        match self {
            Self::DynamicSearch(query) => format!("Searching for {}…", plural_label(&query.doctype)),
            Self::SearchCustomers { .. } => "Searching for customers…".to_string(),
            Self::GetDocumentDetails(query) => {
                format!("Fetching {} details…", query.doctype.to_lowercase())
            }
            Self::FindDuplicates { doctype } => {
                format!("Checking for duplicate {}…", plural_label(doctype))
            }
            Self::CountDocuments { doctype, .. } => format!("Counting {}…", plural_label(doctype)),
            Self::CreateDocument { doctype, .. } => format!(
                "Creating {}…",
                doctype.as_deref().unwrap_or("document").to_lowercase()
            ),
            Self::Aggregate { kind, .. } => match kind {
                AggregateKind::SalesPersonCount
                | AggregateKind::SalesPersonNames
                | AggregateKind::SalesPersonsByGroup
                | AggregateKind::SalesPersonSummary => "Looking up sales persons…".to_string(),
                _ => "Analyzing sales orders…".to_string(),
            },
        }
    }

    /// Short label for a confirmation affordance.
    pub fn label(&self) -> String {
        match self {
            Self::DynamicSearch(query) => format!("Search {}", plural_label(&query.doctype)),
            Self::SearchCustomers { query, .. } => match query {
                Some(query) => format!("Search customers for \"{query}\""),
                None => "Search customers".to_string(),
            },
            Self::GetDocumentDetails(query) => match &query.name {
                Some(name) => format!("Show {} {name}", query.doctype),
                None => format!("Show {} details", query.doctype),
            },
            Self::FindDuplicates { doctype } => {
                format!("Find duplicate {}", plural_label(doctype))
            }
            Self::CountDocuments { doctype, .. } => format!("Count {}", plural_label(doctype)),
            Self::CreateDocument { doctype, .. } => {
                format!("Create {}", doctype.as_deref().unwrap_or("document"))
            }
            Self::Aggregate { kind, .. } => kind.title().to_string(),
        }
    }
}

impl ActionDescriptor {
    /// Builds a descriptor that runs without confirmation.
    pub fn immediate(action: Action) -> Self {
        Self {
            action,
            execute_immediately: true,
            confidence: None,
            alias: None,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    /// Parses the loosely shaped JSON object the assistant attaches.
    ///
    /// Parameters may sit at the top level or under `params`. Filters may be
    /// an object or a JSON-encoded string, numbers may arrive as strings.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ErpaError::malformed("Action descriptor must be a JSON object"))?;
        let name = object
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| ErpaError::malformed("Action descriptor is missing its action name"))?;

        let resolved = ActionKind::resolve(name)?;
        let params = Params { object };
        let action = match resolved.alias {
            Some(alias) => legacy_action(alias, &params),
            None => canonical_action(resolved.kind, &params),
        };

        Ok(Self {
            action,
            execute_immediately: params.flag("execute_immediately"),
            confidence: params.get("confidence").and_then(Value::as_f64),
            alias: resolved.alias,
        })
    }
}

fn legacy_action(alias: LegacyAlias, params: &Params<'_>) -> Action {
    let doctype = DEFAULT_DOCTYPE.to_string();
    match alias {
        LegacyAlias::SearchCustomer => {
            let mut filters = params.map("filters").unwrap_or_default();
            if filters.is_empty() {
                if let Some(query) = params.string("query") {
                    filters.insert(
                        "customer_name".to_string(),
                        json!({ "$like": format!("%{query}%") }),
                    );
                }
            }
            Action::DynamicSearch(SearchQuery {
                doctype,
                filters,
                limit: params.number("limit"),
                order_by: params.string("order_by"),
            })
        }
        LegacyAlias::GetCustomerDetails => Action::GetDocumentDetails(DetailQuery {
            doctype,
            name: params
                .string("name")
                .or_else(|| params.string("customer_name"))
                .or_else(|| params.string("customer")),
            question: params.question(),
        }),
        LegacyAlias::FindDuplicateCustomers => Action::FindDuplicates { doctype },
        LegacyAlias::CountCustomers => Action::CountDocuments {
            doctype,
            filters: params.map("filters"),
        },
    }
}

fn canonical_action(kind: ActionKind, params: &Params<'_>) -> Action {
    let doctype = || {
        params
            .string("doctype")
            .unwrap_or_else(|| DEFAULT_DOCTYPE.to_string())
    };

    match kind {
        ActionKind::DynamicSearch => Action::DynamicSearch(SearchQuery {
            doctype: doctype(),
            filters: params.map("filters").unwrap_or_default(),
            limit: params.number("limit"),
            order_by: params.string("order_by"),
        }),
        ActionKind::GetDocumentDetails => Action::GetDocumentDetails(DetailQuery {
            doctype: doctype(),
            name: params.string("name"),
            question: params.question(),
        }),
        ActionKind::FindDuplicates => Action::FindDuplicates { doctype: doctype() },
        ActionKind::CountDocuments => Action::CountDocuments {
            doctype: doctype(),
            filters: params.map("filters"),
        },
        ActionKind::CreateDocument => Action::CreateDocument {
            doctype: params.string("doctype"),
            fields: params
                .map("fields")
                .or_else(|| params.map("data"))
                .unwrap_or_default(),
        },
        ActionKind::SearchCustomers => Action::SearchCustomers {
            query: params.string("query"),
            limit: params.number("limit"),
        },
        ActionKind::GetCustomersByOrderCount => {
            aggregate_action(AggregateKind::CustomersByOrderCount, params)
        }
        ActionKind::GetCustomersByOrderValue => {
            aggregate_action(AggregateKind::CustomersByOrderValue, params)
        }
        ActionKind::GetOrdersByCustomerGroup => {
            aggregate_action(AggregateKind::OrdersByCustomerGroup, params)
        }
        ActionKind::GetOrdersByTerritory => {
            aggregate_action(AggregateKind::OrdersByTerritory, params)
        }
        ActionKind::GetOrdersByItem => aggregate_action(AggregateKind::OrdersByItem, params),
        ActionKind::GetOrdersByItemGroup => {
            aggregate_action(AggregateKind::OrdersByItemGroup, params)
        }
        ActionKind::GetOrdersWithMostItems => {
            aggregate_action(AggregateKind::OrdersWithMostItems, params)
        }
        ActionKind::GetTotalQuantitySold => {
            aggregate_action(AggregateKind::TotalQuantitySold, params)
        }
        ActionKind::GetMostSoldItems => aggregate_action(AggregateKind::MostSoldItems, params),
        ActionKind::GetSalesOrderCountByCustomer => {
            aggregate_action(AggregateKind::SalesOrderCountByCustomer, params)
        }
        ActionKind::GetSalesPersonSummary => {
            aggregate_action(AggregateKind::SalesPersonSummary, params)
        }
        ActionKind::GetSalesPersonCount => {
            aggregate_action(AggregateKind::SalesPersonCount, params)
        }
        ActionKind::GetSalesPersonNames => {
            aggregate_action(AggregateKind::SalesPersonNames, params)
        }
        ActionKind::GetSalesPersonsByGroup => {
            aggregate_action(AggregateKind::SalesPersonsByGroup, params)
        }
    }
}

fn aggregate_action(kind: AggregateKind, params: &Params<'_>) -> Action {
    Action::Aggregate {
        kind,
        params: AggregateParams {
            limit: params.number("limit"),
            order_by: params.string("order_by"),
            from_date: params.string("from_date"),
            to_date: params.string("to_date"),
            customer_group: params.string("customer_group"),
            territory: params.string("territory"),
            item_code: params.string("item_code"),
            item_group: params.string("item_group"),
            sales_person: params.string("sales_person"),
            filters: params.map("filters"),
        },
    }
}

/// Lenient accessors over the descriptor object.
struct Params<'a> {
    object: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    fn get(&self, key: &str) -> Option<&'a Value> {
        if let Some(value) = self.object.get(key) {
            return Some(value);
        }
        ["params", "parameters"]
            .iter()
            .filter_map(|nested| self.object.get(*nested).and_then(Value::as_object))
            .find_map(|nested| nested.get(key))
    }

    fn string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn number(&self, key: &str) -> Option<u32> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn map(&self, key: &str) -> Option<Map<String, Value>> {
        match self.get(key)? {
            Value::Object(map) => Some(map.clone()),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            },
            _ => None,
        }
    }

    fn question(&self) -> Option<String> {
        self.string("question")
            .or_else(|| self.string("user_question"))
    }
}
