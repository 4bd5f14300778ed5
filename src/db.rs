use crate::config::{DatabaseConfig, SessionConfig};
use crate::database::SharedStore;
use crate::database::postgres_repository::PostgresRepository;
use crate::service::password::CredentialHasher;
use crate::state::AppState;
use rocket::fairing::AdHoc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

fn pool_options(db_config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.acquire_timeout))
        .idle_timeout(Duration::from_secs(30))
        .max_lifetime(Duration::from_secs(1800))
}

async fn init_pool(db_config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    pool_options(db_config).connect(&db_config.url).await
}

/// Connect to Postgres, apply migrations, and manage the resulting `AppState`.
pub fn stage_db(db_config: DatabaseConfig, session_config: SessionConfig, hasher: Arc<dyn CredentialHasher>) -> AdHoc {
    AdHoc::try_on_ignite("Postgres (sqlx)", |rocket| async move {
        let pool = match init_pool(&db_config).await {
            Ok(pool) => pool,
            Err(e) => {
                tracing::error!("Failed to initialize database pool: {}", e);
                return Err(rocket);
            }
        };
        tracing::info!("Database pool initialized successfully");

        if db_config.run_migrations {
            if let Err(e) = sqlx::migrate!().run(&pool).await {
                tracing::error!("Failed to run database migrations: {}", e);
                return Err(rocket);
            }
            tracing::info!("Database migrations applied");
        }

        let store: SharedStore = Arc::new(PostgresRepository::new(pool));
        Ok(rocket.manage(AppState::new(store, hasher, session_config)))
    })
}
