use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::admin_user::{AdminChanges, AdminRole, AdminUser, NewAdmin};
use uuid::Uuid;

/// Serialises first-admin bootstrap across concurrent sign-ups.
const BOOTSTRAP_LOCK_KEY: i64 = 0x5653_4144_4d49_4e31;

#[async_trait::async_trait]
pub trait AdminUserRepository {
    async fn count_admins(&self) -> Result<i64, AppError>;
    async fn count_admins_with_role(&self, role: AdminRole) -> Result<i64, AppError>;
    async fn get_admin_by_email(&self, email: &str) -> Result<Option<AdminUser>, AppError>;
    async fn get_admin_by_id(&self, id: &Uuid) -> Result<Option<AdminUser>, AppError>;
    async fn list_admins(&self) -> Result<Vec<AdminUser>, AppError>;
    /// Fails with `AppError::Conflict` when the email is already taken.
    async fn create_admin(&self, admin: &NewAdmin) -> Result<AdminUser, AppError>;
    /// Inserts only while the table is empty; `None` means an admin already exists.
    async fn create_first_admin(&self, admin: &NewAdmin) -> Result<Option<AdminUser>, AppError>;
    /// Applies `changes` and returns the updated row, or `None` when `id` is unknown.
    /// A demotion that would leave no `SYSTEM` admin fails with `AppError::InvariantViolation`.
    async fn update_admin(&self, id: &Uuid, changes: &AdminChanges) -> Result<Option<AdminUser>, AppError>;
}

#[async_trait::async_trait]
impl AdminUserRepository for PostgresRepository {
    async fn count_admins(&self) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admin_users").fetch_one(&self.pool).await?;

        Ok(count.0)
    }

    async fn count_admins_with_role(&self, role: AdminRole) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admin_users WHERE role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn get_admin_by_email(&self, email: &str) -> Result<Option<AdminUser>, AppError> {
        let admin = sqlx::query_as::<_, AdminUser>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM admin_users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    async fn get_admin_by_id(&self, id: &Uuid) -> Result<Option<AdminUser>, AppError> {
        let admin = sqlx::query_as::<_, AdminUser>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM admin_users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    async fn list_admins(&self) -> Result<Vec<AdminUser>, AppError> {
        let admins = sqlx::query_as::<_, AdminUser>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM admin_users
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(admins)
    }

    async fn create_admin(&self, admin: &NewAdmin) -> Result<AdminUser, AppError> {
        let created = sqlx::query_as::<_, AdminUser>(
            r#"
            INSERT INTO admin_users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn create_first_admin(&self, admin: &NewAdmin) -> Result<Option<AdminUser>, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| AppError::db("Failed to begin bootstrap transaction", e))?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(BOOTSTRAP_LOCK_KEY).execute(&mut *tx).await?;

        let created = sqlx::query_as::<_, AdminUser>(
            r#"
            INSERT INTO admin_users (name, email, password_hash, role)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM admin_users)
            RETURNING id, name, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.role)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await.map_err(|e| AppError::db("Failed to commit bootstrap transaction", e))?;

        Ok(created)
    }

    async fn update_admin(&self, id: &Uuid, changes: &AdminChanges) -> Result<Option<AdminUser>, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| AppError::db("Failed to begin admin update", e))?;

        if changes.role == Some(AdminRole::Admin) {
            // Row locks make concurrent demotions queue behind each other and re-read the set.
            let system_ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM admin_users WHERE role = 'SYSTEM' FOR UPDATE")
                .fetch_all(&mut *tx)
                .await?;

            if system_ids.contains(id) && system_ids.len() <= 1 {
                return Err(AppError::last_system_admin());
            }
        }

        let updated = sqlx::query_as::<_, AdminUser>(
            r#"
            UPDATE admin_users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.role)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await.map_err(|e| AppError::db("Failed to commit admin update", e))?;

        Ok(updated)
    }
}
