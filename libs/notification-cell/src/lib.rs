pub mod services;

pub use services::{BrevoMailer, Mailer};
