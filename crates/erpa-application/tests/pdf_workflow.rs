mod common;

use common::ScriptedBackend;
use erpa_application::ChatUseCase;
use erpa_core::backend::{Attachment, AttachmentKind, Endpoint};
use erpa_core::session::{Affordance, ChatContext};
use erpa_core::workflow::{ExtractionState, WorkflowCommand};
use serde_json::json;

fn extraction_reply() -> serde_json::Value {
    json!({"message": {
        "status": "success",
        "response": "I extracted a sales order for **Acme** with 2 items.\n\nPlease confirm.",
        "requires_action": true
    }})
}

fn workflow_affordance(ctx: &ChatContext, wanted: &WorkflowCommand) -> Affordance {
    ctx.latest_affordances()
        .iter()
        .find(|affordance| {
            matches!(affordance, Affordance::Workflow { command, .. } if command == wanted)
        })
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn test_upload_then_confirm_creates_order() {
    let backend = ScriptedBackend::new();
    backend.reply(extraction_reply()).reply(json!({"message": {
        "status": "success",
        "message": "Sales Order created successfully",
        "sales_order_name": "SO-0007",
        "customer_name": "Acme",
        "grand_total": 1500,
        "requires_action": false
    }}));
    let usecase = ChatUseCase::new(backend.clone());
    let mut ctx = ChatContext::new();
    let attachment = Attachment::new("order.pdf", b"%PDF-1.4".to_vec());

    usecase
        .submit_message(&mut ctx, "", Some(attachment))
        .await
        .unwrap();

    let upload = &backend.calls()[0];
    assert_eq!(upload.endpoint, Endpoint::SendMessage);
    assert!(!upload.params.contains_key("message"));
    assert_eq!(
        upload.attachment.as_ref().map(|file| file.kind),
        Some(AttachmentKind::Pdf)
    );
    assert_eq!(ctx.latest_affordances().len(), 3);
    assert_eq!(
        ctx.pending_extraction().map(|pending| pending.state),
        Some(ExtractionState::Extracted)
    );

    let confirm = workflow_affordance(&ctx, &WorkflowCommand::Confirm);
    usecase.invoke_affordance(&mut ctx, &confirm).await;

    let respond = &backend.calls()[1];
    assert_eq!(respond.endpoint, Endpoint::PdfWorkflowRespond);
    assert_eq!(respond.params["conversation_id"], json!(ctx.session_id()));
    assert_eq!(respond.params["user_message"], json!("confirm"));

    let last = ctx.last_turn().unwrap();
    assert!(last.content.to_plain_text().contains("SO-0007"));
    assert!(last.affordances.is_empty());
    assert!(ctx.pending_extraction().is_none());
    assert!(!ctx.typing.is_visible());
}

#[tokio::test]
async fn test_show_data_keeps_extraction_pending() {
    let backend = ScriptedBackend::new();
    backend.reply(extraction_reply()).reply(json!({
        "status": "success",
        "message": "**Customer:** Acme\n\n1. Widget x 2\n2. Gadget x 1",
        "requires_action": true
    }));
    let usecase = ChatUseCase::new(backend.clone());
    let mut ctx = ChatContext::new();
    usecase
        .submit_message(&mut ctx, "", Some(Attachment::new("po.pdf", vec![1])))
        .await
        .unwrap();

    let show = workflow_affordance(&ctx, &WorkflowCommand::ShowData);
    usecase.invoke_affordance(&mut ctx, &show).await;

    assert_eq!(backend.calls()[1].params["user_message"], json!("show data"));
    let last = ctx.last_turn().unwrap();
    assert!(last.content.as_str().contains("<ol><li>Widget x 2</li><li>Gadget x 1</li></ol>"));
    assert_eq!(last.affordances.len(), 3);
    assert_eq!(
        ctx.pending_extraction().map(|pending| pending.state),
        Some(ExtractionState::DataShown)
    );
}

#[tokio::test]
async fn test_cancel_twice_is_forwarded_twice() {
    let backend = ScriptedBackend::new();
    backend
        .reply(extraction_reply())
        .reply(json!({"status": "success", "message": "Sales order creation cancelled."}))
        .reply(json!({
            "status": "error",
            "message": "No active PDF session found. Please upload a PDF first."
        }));
    let usecase = ChatUseCase::new(backend.clone());
    let mut ctx = ChatContext::new();
    usecase
        .submit_message(&mut ctx, "", Some(Attachment::new("po.pdf", vec![1])))
        .await
        .unwrap();

    let cancel = workflow_affordance(&ctx, &WorkflowCommand::Cancel);
    usecase.invoke_affordance(&mut ctx, &cancel).await;
    assert!(ctx.pending_extraction().is_none());

    usecase.invoke_affordance(&mut ctx, &cancel).await;

    assert_eq!(
        backend.endpoints(),
        vec![
            Endpoint::SendMessage,
            Endpoint::PdfWorkflowRespond,
            Endpoint::PdfWorkflowRespond
        ]
    );
    assert_eq!(
        ctx.last_turn().unwrap().content.to_plain_text(),
        "❌ No active PDF session found. Please upload a PDF first."
    );
    assert!(!ctx.typing.is_visible());
}

#[tokio::test]
async fn test_modify_command_uses_free_text() {
    let backend = ScriptedBackend::new();
    backend.reply(json!({
        "status": "success",
        "message": "Updated item 1 quantity to 20.",
        "requires_action": true
    }));
    let usecase = ChatUseCase::new(backend.clone());
    let mut ctx = ChatContext::new();
    ctx.start_extraction();

    usecase
        .respond_to_extraction(
            &mut ctx,
            WorkflowCommand::Modify("change item 1 qty to 20".into()),
        )
        .await;

    let call = &backend.calls()[0];
    assert_eq!(call.params["user_message"], json!("change item 1 qty to 20"));
    assert_eq!(call.params["conversation_id"], json!(ctx.session_id()));
    assert_eq!(
        ctx.pending_extraction().map(|pending| pending.state),
        Some(ExtractionState::Extracted)
    );
}

#[tokio::test]
async fn test_check_context_restores_pending_marker() {
    let backend = ScriptedBackend::new();
    backend.reply(json!({"message": {
        "has_context": true,
        "status": "pending_confirmation",
        "session_id": "pdf-1"
    }}));
    let usecase = ChatUseCase::new(backend.clone());
    let mut ctx = ChatContext::new();

    let restored = usecase.workflow().check_context(&mut ctx).await.unwrap();

    assert!(restored);
    assert_eq!(backend.endpoints(), vec![Endpoint::CheckPdfContext]);
    assert_eq!(
        backend.calls()[0].params["conversation_id"],
        json!(ctx.session_id())
    );
    assert!(ctx.pending_extraction().is_some());
}
