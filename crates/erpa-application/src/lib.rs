pub mod chat_usecase;
pub mod handlers;
pub mod outcome;
pub mod pdf_workflow;

pub use chat_usecase::ChatUseCase;
pub use handlers::ActionDispatcher;
pub use pdf_workflow::PdfWorkflow;
