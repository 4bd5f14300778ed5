use crate::config::DEFAULT_SESSION_TTL_SECONDS;
use crate::database::admin_user::AdminUserRepository;
use crate::database::session::SessionRepository;
use crate::error::app_error::AppError;
use crate::models::admin_user::{AdminRole, AdminUser, NewAdmin};
use crate::models::session::IssuedSession;
use crate::service::password::CredentialHasher;
use crate::service::token::generate_session_token;
use chrono::{Duration, Utc};
use tracing::{debug, error, info};

/// Sign-up, sign-in, session validation and sign-out for admin users.
///
/// The bearer token is threaded in explicitly by the caller; the manager never reads
/// or writes cookies itself.
pub struct SessionManager<'a, S: ?Sized> {
    store: &'a S,
    hasher: &'a dyn CredentialHasher,
    ttl: Duration,
}

impl<'a, S> SessionManager<'a, S>
where
    S: AdminUserRepository + SessionRepository + ?Sized,
{
    pub fn new(store: &'a S, hasher: &'a dyn CredentialHasher) -> Self {
        SessionManager {
            store,
            hasher,
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECONDS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// `false` while the system is waiting for its first admin to sign up.
    pub async fn has_any_admin(&self) -> Result<bool, AppError> {
        Ok(self.store.count_admins().await? > 0)
    }

    /// Bootstrap the first admin (always `SYSTEM`) and sign them in.
    ///
    /// Only possible while no admin exists; afterwards every call is a conflict,
    /// whatever the input.
    pub async fn sign_up(&self, name: &str, email: &str, password: &str, confirm_password: &str) -> Result<IssuedSession, AppError> {
        if self.has_any_admin().await? {
            return Err(AppError::Conflict("A system admin already exists".to_string()));
        }

        let name = required(name, "Name")?;
        let email = required(email, "Email")?;
        if password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }
        if password != confirm_password {
            return Err(AppError::validation("Passwords do not match"));
        }

        let new_admin = NewAdmin {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: self.hasher.hash(password)?,
            role: AdminRole::System,
        };

        let admin = self
            .store
            .create_first_admin(&new_admin)
            .await?
            .ok_or_else(|| AppError::Conflict("A system admin already exists".to_string()))?;

        info!(admin_id = %admin.id, "system admin bootstrapped");

        self.issue_session(admin).await
    }

    /// Unknown email and wrong password fail identically.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedSession, AppError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::validation("Email and password are required"));
        }

        let admin = match self.store.get_admin_by_email(email).await? {
            Some(admin) => admin,
            None => {
                self.hasher.dummy_verify(password);
                return Err(AppError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(password, &admin.password_hash) {
            debug!(admin_id = %admin.id, "password verification failed");
            return Err(AppError::InvalidCredentials);
        }

        info!(admin_id = %admin.id, "admin signed in");

        self.issue_session(admin).await
    }

    async fn issue_session(&self, admin: AdminUser) -> Result<IssuedSession, AppError> {
        let token = generate_session_token();
        let expires_at = Utc::now() + self.ttl;

        let session = self.store.create_session(&admin.id, &token, expires_at).await?;
        debug!(admin_id = %admin.id, session_id = %session.id, expires_at = %session.expires_at, "session issued");

        Ok(IssuedSession {
            token,
            expires_at: session.expires_at,
            admin,
        })
    }

    /// Resolve the admin behind `token`.
    ///
    /// Missing, unknown and expired tokens all yield `None`. Store failures also yield
    /// `None`: this runs on read paths, which fail closed instead of erroring.
    pub async fn get_session(&self, token: Option<&str>) -> Option<AdminUser> {
        let token = token.filter(|token| !token.is_empty())?;

        match self.store.find_session(token).await {
            Ok(Some(found)) if found.session.is_active_at(Utc::now()) => Some(found.admin),
            Ok(Some(found)) => {
                debug!(session_id = %found.session.id, "session expired");
                None
            }
            Ok(None) => None,
            Err(err) => {
                error!(error = ?err, "session lookup failed, treating request as signed out");
                None
            }
        }
    }

    pub async fn require_session(&self, token: Option<&str>) -> Result<AdminUser, AppError> {
        self.get_session(token).await.ok_or(AppError::Unauthenticated)
    }

    /// Idempotent: an absent or already deleted token is not an error.
    pub async fn sign_out(&self, token: Option<&str>) -> Result<(), AppError> {
        if let Some(token) = token.filter(|token| !token.is_empty()) {
            let removed = self.store.delete_session(token).await?;
            debug!(removed, "session signed out");
        }

        Ok(())
    }
}

/// Trimmed value, or a validation error naming `field` when nothing is left.
pub(crate) fn required<'v>(value: &'v str, field: &str) -> Result<&'v str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}
