pub mod admin_user;
pub mod auth;
pub mod error;
pub mod health;
