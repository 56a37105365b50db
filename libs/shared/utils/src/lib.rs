pub mod phone;
pub mod validators;
