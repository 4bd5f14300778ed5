pub mod admin_user;
pub mod health;
pub mod session;
