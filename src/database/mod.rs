pub mod admin_user;
pub mod postgres_repository;
pub mod session;

use crate::database::admin_user::AdminUserRepository;
use crate::database::session::SessionRepository;
use std::sync::Arc;

/// Everything the session and authorization core needs from persistent storage.
pub trait AdminStore: AdminUserRepository + SessionRepository + Send + Sync {}

impl<T> AdminStore for T where T: AdminUserRepository + SessionRepository + Send + Sync {}

pub type SharedStore = Arc<dyn AdminStore>;
