pub mod chat;
pub mod dashboard;
pub mod imports;
pub mod infinite_list;
pub mod login;
pub mod portal;
