mod common;

use common::ScriptedBackend;
use erpa_application::ActionDispatcher;
use erpa_core::action::{AggregateKind, ActionDescriptor};
use erpa_core::backend::Endpoint;
use erpa_core::session::{ChatContext, QueryContext};
use serde_json::{Value, json};

fn descriptor(value: Value) -> ActionDescriptor {
    ActionDescriptor::from_value(&value).unwrap()
}

fn last_text(ctx: &ChatContext) -> String {
    ctx.last_turn().unwrap().content.to_plain_text()
}

#[tokio::test]
async fn test_missing_required_parameter_makes_no_call() {
    let backend = ScriptedBackend::new();
    let dispatcher = ActionDispatcher::new(backend.clone());
    let mut ctx = ChatContext::new();

    dispatcher
        .dispatch(&mut ctx, &descriptor(json!({"action": "get_orders_by_territory"})))
        .await;

    assert!(backend.calls().is_empty());
    assert_eq!(last_text(&ctx), "❌ Missing required parameter: territory");
}

#[tokio::test]
async fn test_search_customers_requires_query() {
    let backend = ScriptedBackend::new();
    let dispatcher = ActionDispatcher::new(backend.clone());
    let mut ctx = ChatContext::new();

    dispatcher
        .dispatch(&mut ctx, &descriptor(json!({"action": "search_customers"})))
        .await;

    assert!(backend.calls().is_empty());
    assert_eq!(last_text(&ctx), "❌ Missing required parameter: query");
}

#[tokio::test]
async fn test_legacy_search_lists_customers_and_refreshes_context() {
    let backend = ScriptedBackend::new();
    backend.reply(json!({"message": {
        "status": "success",
        "count": 2,
        "filters_applied": [{"customer_name": {"$like": "%Acme%"}}],
        "customers": [
            {"name": "CUST-1", "customer_name": "Acme Corp", "territory": "India"},
            {"name": "CUST-2", "customer_name": "Acme Ltd"}
        ]
    }}));
    let dispatcher = ActionDispatcher::new(backend.clone()).with_default_limit(15);
    let mut ctx = ChatContext::new();

    dispatcher
        .dispatch(
            &mut ctx,
            &descriptor(json!({"action": "search_customer", "query": "Acme"})),
        )
        .await;

    let call = &backend.calls()[0];
    assert_eq!(call.endpoint, Endpoint::DynamicSearch);
    assert_eq!(call.params["doctype"], json!("Customer"));
    assert_eq!(call.params["limit"], json!(15));
    assert_eq!(
        call.params["filters"],
        json!({"customer_name": {"$like": "%Acme%"}})
    );

    let html = ctx.last_turn().unwrap().content.as_str().to_string();
    assert!(html.contains("Found <strong>2</strong> customers:"));
    assert!(html.contains("<a href=\"/app/customer/CUST-1\">Acme Corp</a>"));
    assert_eq!(
        ctx.query_context(),
        Some(&QueryContext::new(
            "Customer",
            2,
            vec!["CUST-1".into(), "CUST-2".into()]
        ))
    );
}

#[tokio::test]
async fn test_long_result_list_is_capped() {
    let customers: Vec<Value> = (1..=14)
        .map(|n| json!({"name": format!("CUST-{n}"), "customer_name": format!("Customer {n}")}))
        .collect();
    let backend = ScriptedBackend::new();
    backend.reply(json!({"status": "success", "count": 14, "customers": customers}));
    let dispatcher = ActionDispatcher::new(backend.clone());
    let mut ctx = ChatContext::new();

    dispatcher
        .dispatch(&mut ctx, &descriptor(json!({"action": "dynamic_search"})))
        .await;

    let html = ctx.last_turn().unwrap().content.as_str().to_string();
    assert_eq!(html.matches("<li>").count(), 10);
    assert!(html.contains("…and 4 more"));
}

#[tokio::test]
async fn test_details_follow_up_uses_single_document_context() {
    let backend = ScriptedBackend::new();
    backend.reply(json!({"message": {
        "status": "success",
        "customer": {
            "name": "CUST-1",
            "customer_name": "Acme Corp",
            "email_id": "ops@acme.test"
        }
    }}));
    let dispatcher = ActionDispatcher::new(backend.clone());
    let mut ctx = ChatContext::new();
    ctx.set_query_context(QueryContext::new("Customer", 1, vec!["CUST-1".into()]));

    dispatcher
        .dispatch(
            &mut ctx,
            &descriptor(json!({"action": "get_document_details", "doctype": "Customer"})),
        )
        .await;

    assert_eq!(backend.calls()[0].params["name"], json!("CUST-1"));
    let html = ctx.last_turn().unwrap().content.as_str().to_string();
    assert!(html.starts_with("<h4>📄 Customer: Acme Corp</h4>"));
    assert!(html.contains("<li><strong>Email Id:</strong> ops@acme.test</li>"));
}

#[tokio::test]
async fn test_details_without_name_or_context_is_a_validation_error() {
    let backend = ScriptedBackend::new();
    let dispatcher = ActionDispatcher::new(backend.clone());
    let mut ctx = ChatContext::new();
    ctx.set_query_context(QueryContext::new(
        "Customer",
        2,
        vec!["CUST-1".into(), "CUST-2".into()],
    ));

    dispatcher
        .dispatch(
            &mut ctx,
            &descriptor(json!({"action": "get_document_details", "doctype": "Customer"})),
        )
        .await;

    assert!(backend.calls().is_empty());
    assert_eq!(last_text(&ctx), "❌ Missing required parameter: name");
}

#[tokio::test]
async fn test_specific_question_is_answered_by_the_assistant() {
    let backend = ScriptedBackend::new();
    backend
        .reply(json!({
            "status": "success",
            "sales_order_data": {"name": "SO-0003", "customer_name": "Acme", "grand_total": 300}
        }))
        .reply(json!({"status": "success", "response": "The grand total is **300**."}));
    let dispatcher = ActionDispatcher::new(backend.clone());
    let mut ctx = ChatContext::new();

    dispatcher
        .dispatch(
            &mut ctx,
            &descriptor(json!({
                "action": "get_document_details",
                "doctype": "Sales Order",
                "name": "SO-0003",
                "question": "what is the grand total?"
            })),
        )
        .await;

    assert_eq!(
        backend.endpoints(),
        vec![Endpoint::GetDocumentDetails, Endpoint::SendMessage]
    );
    let question = backend.calls()[1].params["message"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(question.contains("what is the grand total?"));
    assert!(question.contains("SO-0003"));
    assert_eq!(
        ctx.last_turn().unwrap().content.as_str(),
        "<p>The grand total is <strong>300</strong>.</p>"
    );
}

#[tokio::test]
async fn test_directive_in_answer_is_cleaned_and_not_run() {
    let backend = ScriptedBackend::new();
    backend
        .reply(json!({
            "status": "success",
            "customer": {"name": "CUST-1", "customer_name": "Acme", "email_id": "ops@acme.test"}
        }))
        .reply(json!({
            "status": "success",
            "response": "The email on file is ops@acme.test. {\"suggested_action\": {\"action\": \"dynamic_search\", \"doctype\": \"Customer\"}}",
            "suggested_action": {"action": "dynamic_search", "doctype": "Customer"}
        }));
    let dispatcher = ActionDispatcher::new(backend.clone());
    let mut ctx = ChatContext::new();

    dispatcher
        .dispatch(
            &mut ctx,
            &descriptor(json!({
                "action": "get_document_details",
                "doctype": "Customer",
                "name": "CUST-1",
                "question": "what is their email?"
            })),
        )
        .await;

    assert_eq!(
        backend.endpoints(),
        vec![Endpoint::GetDocumentDetails, Endpoint::SendMessage]
    );
    let turn = ctx.last_turn().unwrap();
    let html = turn.content.as_str();
    assert!(html.contains("The email on file is ops@acme.test."));
    assert!(!html.contains("suggested_action"));
    assert!(!html.contains('{'));
    assert!(turn.affordances.is_empty());
}

#[tokio::test]
async fn test_full_details_question_renders_detail_view() {
    let backend = ScriptedBackend::new();
    backend.reply(json!({
        "status": "success",
        "document": {"name": "ITEM-9", "item_name": "Widget", "stock_uom": "Nos"}
    }));
    let dispatcher = ActionDispatcher::new(backend.clone());
    let mut ctx = ChatContext::new();

    dispatcher
        .dispatch(
            &mut ctx,
            &descriptor(json!({
                "action": "get_document_details",
                "doctype": "Item",
                "name": "ITEM-9",
                "question": "show me all details"
            })),
        )
        .await;

    assert_eq!(backend.endpoints(), vec![Endpoint::GetDocumentDetails]);
    assert!(last_text(&ctx).contains("Item: Widget"));
}

#[tokio::test]
async fn test_backend_error_is_shown_verbatim() {
    let backend = ScriptedBackend::new();
    backend.reply(json!({"message": {
        "status": "error",
        "message": "You do not have permission to read Customer"
    }}));
    let dispatcher = ActionDispatcher::new(backend.clone());
    let mut ctx = ChatContext::new();
    ctx.set_query_context(QueryContext::new("Item", 5, vec![]));

    dispatcher
        .dispatch(&mut ctx, &descriptor(json!({"action": "count_customers"})))
        .await;

    assert_eq!(
        last_text(&ctx),
        "❌ You do not have permission to read Customer"
    );
    assert_eq!(ctx.query_context().map(|c| c.doctype.as_str()), Some("Item"));
}

#[tokio::test]
async fn test_create_document_requires_fields() {
    let backend = ScriptedBackend::new();
    let dispatcher = ActionDispatcher::new(backend.clone());
    let mut ctx = ChatContext::new();

    dispatcher
        .dispatch(
            &mut ctx,
            &descriptor(json!({"action": "create_document", "doctype": "Customer"})),
        )
        .await;

    assert!(backend.calls().is_empty());
    assert!(ctx.last_turn().unwrap().is_failure());
}

#[tokio::test]
async fn test_create_document_links_new_record() {
    let backend = ScriptedBackend::new();
    backend.reply(json!({
        "status": "success",
        "doctype": "Customer",
        "name": "CUST-0042",
        "message": "Customer created"
    }));
    let dispatcher = ActionDispatcher::new(backend.clone());
    let mut ctx = ChatContext::new();

    dispatcher
        .dispatch(
            &mut ctx,
            &descriptor(json!({
                "action": "create_document",
                "doctype": "Customer",
                "fields": {"customer_name": "Globex", "customer_type": "Company"},
                "execute_immediately": true
            })),
        )
        .await;

    assert_eq!(
        backend.calls()[0].params["fields"],
        json!({"customer_name": "Globex", "customer_type": "Company"})
    );
    assert!(
        ctx.last_turn()
            .unwrap()
            .content
            .as_str()
            .contains("<a href=\"/app/customer/CUST-0042\">CUST-0042</a>")
    );
}

#[tokio::test]
async fn test_aggregate_applies_default_ordering() {
    let backend = ScriptedBackend::new();
    backend.reply(json!({"message": {
        "status": "success",
        "count": 2,
        "results": [
            {"customer": "CUST-1", "customer_name": "Acme", "order_count": 12},
            {"customer": "CUST-2", "customer_name": "Globex", "order_count": 9}
        ]
    }}));
    let dispatcher = ActionDispatcher::new(backend.clone());
    let mut ctx = ChatContext::new();

    dispatcher
        .dispatch(
            &mut ctx,
            &descriptor(json!({"action": "get_customers_by_order_count", "limit": 2})),
        )
        .await;

    let call = &backend.calls()[0];
    assert_eq!(
        call.endpoint,
        Endpoint::Aggregate(AggregateKind::CustomersByOrderCount)
    );
    assert_eq!(call.params["order_by"], json!("order_count desc"));
    assert_eq!(call.params["limit"], json!(2));
    let html = ctx.last_turn().unwrap().content.as_str().to_string();
    assert!(html.contains("<a href=\"/app/customer/CUST-1\">Acme</a>"));
}

#[tokio::test]
async fn test_malformed_reply_is_reported() {
    let backend = ScriptedBackend::new();
    backend.reply(json!("not an object"));
    let dispatcher = ActionDispatcher::new(backend.clone());
    let mut ctx = ChatContext::new();

    dispatcher
        .dispatch(&mut ctx, &descriptor(json!({"action": "find_duplicates"})))
        .await;

    let turn = ctx.last_turn().unwrap();
    assert!(turn.is_failure());
    assert!(turn.content.to_plain_text().contains("Expected a JSON object"));
}
