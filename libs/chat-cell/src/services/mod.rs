pub mod flow;
pub mod gateway;
pub mod orchestrator;
pub mod reminders;
pub mod sessions;
pub mod templates;

pub use flow::FlowEngine;
pub use gateway::{MessageSender, WhatsAppGateway};
pub use orchestrator::WebhookOrchestrator;
pub use reminders::ReminderDispatcher;
pub use sessions::{DedupGuard, SessionStore};
