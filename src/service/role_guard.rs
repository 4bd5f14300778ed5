//! Invariants checked before an admin's role is written.
//!
//! Rules run in order: the actor must be a `SYSTEM` admin, an admin may not change
//! their own role, the last `SYSTEM` admin may not be demoted, and the requested role
//! must be one of the enumerated values. Updates that do not touch the role skip
//! everything but the first rule.

use crate::error::app_error::AppError;
use crate::models::admin_user::{AdminRole, AdminUser};
use crate::service::authorization::{AccessLevel, authorize};
use std::str::FromStr;
use uuid::Uuid;

/// Rules that need no store access: actor level, self-change ban, role validity.
pub fn check_role_request(actor: &AdminUser, target_id: &Uuid, requested_role: &str) -> Result<AdminRole, AppError> {
    authorize(actor, AccessLevel::SystemAdmin)?;

    if actor.id == *target_id {
        return Err(AppError::InvalidOperation("Cannot change your own role".to_string()));
    }

    AdminRole::from_str(requested_role)
}

/// Reject demoting `target` when it is the only `SYSTEM` admin among `system_admin_count`.
pub fn check_system_admin_retained(target: &AdminUser, new_role: AdminRole, system_admin_count: i64) -> Result<(), AppError> {
    let is_demotion = target.is_system() && new_role < AdminRole::System;
    if is_demotion && system_admin_count <= 1 {
        return Err(AppError::last_system_admin());
    }
    Ok(())
}
