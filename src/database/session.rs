use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::admin_user::{AdminRole, AdminUser};
use crate::models::session::{Session, SessionAdmin};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait SessionRepository {
    /// A token collision surfaces as a store error; it is never retried.
    async fn create_session(&self, user_id: &Uuid, token: &str, expires_at: DateTime<Utc>) -> Result<Session, AppError>;
    /// Looks a session up by its exact token, expired or not.
    async fn find_session(&self, token: &str) -> Result<Option<SessionAdmin>, AppError>;
    /// Returns the number of rows removed (0 when the token is unknown).
    async fn delete_session(&self, token: &str) -> Result<u64, AppError>;
}

#[derive(Debug, sqlx::FromRow)]
struct SessionAdminRow {
    session_id: Uuid,
    token: String,
    expires_at: DateTime<Utc>,
    session_created_at: DateTime<Utc>,
    user_id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: AdminRole,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SessionAdminRow> for SessionAdmin {
    fn from(row: SessionAdminRow) -> Self {
        SessionAdmin {
            session: Session {
                id: row.session_id,
                user_id: row.user_id,
                token: row.token,
                expires_at: row.expires_at,
                created_at: row.session_created_at,
            },
            admin: AdminUser {
                id: row.user_id,
                name: row.name,
                email: row.email,
                password_hash: row.password_hash,
                role: row.role,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

impl PostgresRepository {
    pub async fn delete_expired_sessions_for_user(&self, user_id: &Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE user_id = $1 AND expires_at <= now()")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl SessionRepository for PostgresRepository {
    async fn create_session(&self, user_id: &Uuid, token: &str, expires_at: DateTime<Utc>) -> Result<Session, AppError> {
        self.delete_expired_sessions_for_user(user_id).await?;

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO admin_sessions (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::db("Failed to create session", e))?;

        Ok(session)
    }

    async fn find_session(&self, token: &str) -> Result<Option<SessionAdmin>, AppError> {
        let row = sqlx::query_as::<_, SessionAdminRow>(
            r#"
            SELECT
                s.id AS session_id,
                s.token,
                s.expires_at,
                s.created_at AS session_created_at,
                u.id AS user_id,
                u.name,
                u.email,
                u.password_hash,
                u.role,
                u.created_at,
                u.updated_at
            FROM admin_sessions s
            JOIN admin_users u ON u.id = s.user_id
            WHERE s.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionAdmin::from))
    }

    async fn delete_session(&self, token: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE token = $1").bind(token).execute(&self.pool).await?;

        Ok(result.rows_affected())
    }
}
