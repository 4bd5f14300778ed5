use crate::config::SessionConfig;
use crate::database::{AdminStore, SharedStore};
use crate::service::admin::AdminService;
use crate::service::password::CredentialHasher;
use crate::service::session::SessionManager;
use chrono::Duration;
use std::sync::Arc;

/// Request-independent collaborators shared by every handler.
pub struct AppState {
    pub store: SharedStore,
    pub hasher: Arc<dyn CredentialHasher>,
    pub session: SessionConfig,
}

impl AppState {
    pub fn new(store: SharedStore, hasher: Arc<dyn CredentialHasher>, session: SessionConfig) -> Self {
        Self { store, hasher, session }
    }

    pub fn session_manager(&self) -> SessionManager<'_, dyn AdminStore> {
        SessionManager::new(self.store.as_ref(), self.hasher.as_ref()).with_ttl(Duration::seconds(self.session.ttl_seconds))
    }

    pub fn admin_service(&self) -> AdminService<'_, dyn AdminStore> {
        AdminService::new(self.store.as_ref(), self.hasher.as_ref())
    }
}
