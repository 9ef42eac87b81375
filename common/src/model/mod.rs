pub mod accounting;
pub mod custom_field;
pub mod dashboard;
pub mod export;
pub mod import;
pub mod message;
pub mod pagination;
pub mod portal;
pub mod timesheet;
