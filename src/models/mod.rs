pub mod entry;
pub mod medication;
pub mod user;
