use crate::database::admin_user::AdminUserRepository;
use crate::error::app_error::AppError;
use crate::models::admin_user::{AdminChanges, AdminRole, AdminUser, NewAdmin, UpdateAdminRequest};
use crate::service::authorization::{AccessLevel, authorize};
use crate::service::password::CredentialHasher;
use crate::service::role_guard::{check_role_request, check_system_admin_retained};
use crate::service::session::required;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Admin management performed by a signed-in `SYSTEM` admin.
pub struct AdminService<'a, S: ?Sized> {
    store: &'a S,
    hasher: &'a dyn CredentialHasher,
}

impl<'a, S> AdminService<'a, S>
where
    S: AdminUserRepository + ?Sized,
{
    pub fn new(store: &'a S, hasher: &'a dyn CredentialHasher) -> Self {
        AdminService { store, hasher }
    }

    pub async fn list_admins(&self, actor: &AdminUser) -> Result<Vec<AdminUser>, AppError> {
        authorize(actor, AccessLevel::SystemAdmin)?;
        self.store.list_admins().await
    }

    /// Create an admin account. No session is issued for the new admin.
    pub async fn create_admin(&self, actor: &AdminUser, name: &str, email: &str, password: &str, role: &str) -> Result<AdminUser, AppError> {
        authorize(actor, AccessLevel::SystemAdmin)?;

        let name = required(name, "Name")?;
        let email = required(email, "Email")?;
        if password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }
        let role = AdminRole::from_str(role)?;

        let new_admin = NewAdmin {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: self.hasher.hash(password)?,
            role,
        };
        let admin = self.store.create_admin(&new_admin).await?;

        info!(actor_id = %actor.id, admin_id = %admin.id, role = %admin.role, "admin created");

        Ok(admin)
    }

    /// Partial update of name, email and role.
    ///
    /// Role changes go through the role guard; the last-system-admin check here is a
    /// read-then-write, and the store re-checks it when applying the change.
    pub async fn update_admin(&self, actor: &AdminUser, target_id: &Uuid, request: &UpdateAdminRequest) -> Result<AdminUser, AppError> {
        authorize(actor, AccessLevel::SystemAdmin)?;

        let mut changes = AdminChanges {
            name: request.name.as_deref().map(|name| required(name, "Name")).transpose()?.map(str::to_string),
            email: request.email.as_deref().map(|email| required(email, "Email")).transpose()?.map(str::to_string),
            role: None,
        };

        if let Some(requested_role) = request.role.as_deref() {
            changes.role = Some(check_role_request(actor, target_id, requested_role)?);
        }

        if changes.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }

        let target = self.admin_or_not_found(target_id).await?;

        if let Some(new_role) = changes.role {
            let system_admins = self.store.count_admins_with_role(AdminRole::System).await?;
            check_system_admin_retained(&target, new_role, system_admins)?;
        }

        let updated = self
            .store
            .update_admin(target_id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

        info!(
            actor_id = %actor.id,
            admin_id = %updated.id,
            role_changed = changes.role.is_some(),
            role = %updated.role,
            "admin updated"
        );

        Ok(updated)
    }

    async fn admin_or_not_found(&self, id: &Uuid) -> Result<AdminUser, AppError> {
        self.store
            .get_admin_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))
    }
}
