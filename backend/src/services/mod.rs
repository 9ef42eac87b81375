pub mod accounting;
pub mod auth;
pub mod custom_fields;
pub mod dashboard;
pub mod imports;
pub mod messages;
pub mod portal;
pub mod realtime;
pub mod time_entries;
pub mod timesheets;
