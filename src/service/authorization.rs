use crate::database::admin_user::AdminUserRepository;
use crate::database::session::SessionRepository;
use crate::error::app_error::AppError;
use crate::models::admin_user::{AdminRole, AdminUser};
use crate::service::session::SessionManager;
use tracing::debug;

/// Guard levels, ordered like the roles they require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// Any signed-in admin.
    AnyAdmin,
    /// Only `SYSTEM` admins.
    SystemAdmin,
}

impl AccessLevel {
    pub fn minimum_role(self) -> AdminRole {
        match self {
            AccessLevel::AnyAdmin => AdminRole::Admin,
            AccessLevel::SystemAdmin => AdminRole::System,
        }
    }
}

pub fn authorize(admin: &AdminUser, level: AccessLevel) -> Result<(), AppError> {
    if admin.role >= level.minimum_role() {
        Ok(())
    } else {
        debug!(admin_id = %admin.id, role = %admin.role, required = %level.minimum_role(), "access denied");
        Err(AppError::Forbidden)
    }
}

impl<S> SessionManager<'_, S>
where
    S: AdminUserRepository + SessionRepository + ?Sized,
{
    pub async fn require_access(&self, token: Option<&str>, level: AccessLevel) -> Result<AdminUser, AppError> {
        let admin = self.require_session(token).await?;
        authorize(&admin, level)?;
        Ok(admin)
    }

    pub async fn require_system_admin(&self, token: Option<&str>) -> Result<AdminUser, AppError> {
        self.require_access(token, AccessLevel::SystemAdmin).await
    }
}
