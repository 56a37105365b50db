pub mod brevo;
pub mod templates;

pub use brevo::{BrevoMailer, Mailer};
