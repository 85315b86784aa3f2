pub mod auth;
pub mod entries;
pub mod health;
pub mod medications;
pub mod settings;
