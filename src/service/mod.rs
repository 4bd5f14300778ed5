pub mod admin;
pub mod authorization;
pub mod password;
pub mod role_guard;
pub mod session;
pub mod token;
