use crate::database::admin_user::AdminUserRepository;
use crate::database::session::SessionRepository;
use crate::error::app_error::AppError;
use crate::models::admin_user::{AdminChanges, AdminRole, AdminUser, NewAdmin};
use crate::models::session::{Session, SessionAdmin};
use crate::service::password::Argon2Hasher;
use crate::{Config, build_rocket_with_store};
use argon2::Params;
use chrono::{DateTime, Duration, Utc};
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Argon2id with the smallest legal cost so tests stay fast.
pub fn fast_hasher() -> Argon2Hasher {
    Argon2Hasher::new(Params::new(8, 1, 1, None).expect("valid argon2 params"))
}

pub fn admin_fixture(name: &str, email: &str, role: AdminRole) -> AdminUser {
    let now = Utc::now();
    AdminUser {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$v=19$fixture".to_string(),
        role,
        created_at: now,
        updated_at: now,
    }
}

/// A tracked client over a fresh in-memory store; the store handle is returned for assertions.
pub async fn test_client() -> (Client, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let mut config = Config::default();
    config.session.cookie_secure = false;

    let rocket = build_rocket_with_store(config, store.clone(), Arc::new(fast_hasher()));
    let client = Client::tracked(rocket).await.expect("valid rocket instance");
    (client, store)
}

pub async fn sign_up_alice(client: &Client) {
    let response = client
        .post("/api/auth/signup")
        .header(ContentType::JSON)
        .body(r#"{"name":"Alice","email":"alice@x.com","password":"pw123456","confirmPassword":"pw123456"}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
}

pub async fn sign_in(client: &Client, email: &str, password: &str) {
    let response = client
        .post("/api/auth/signin")
        .header(ContentType::JSON)
        .body(serde_json::json!({ "email": email, "password": password }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
}

#[derive(Default)]
struct StoreState {
    admins: Vec<AdminUser>,
    sessions: Vec<Session>,
}

/// In-memory stand-in for Postgres with the same uniqueness and invariant rules.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("store lock poisoned")
    }

    pub fn insert_admin(&self, name: &str, email: &str, role: AdminRole, password_hash: &str) -> AdminUser {
        let mut state = self.lock();
        let mut admin = admin_fixture(name, email, role);
        admin.password_hash = password_hash.to_string();
        // Keep creation order observable even when the clock does not advance.
        if let Some(last) = state.admins.last() {
            admin.created_at = last.created_at + Duration::milliseconds(1);
            admin.updated_at = admin.created_at;
        }
        state.admins.push(admin.clone());
        admin
    }

    pub fn insert_session(&self, user_id: &Uuid, token: &str, expires_at: DateTime<Utc>) {
        self.lock().sessions.push(Session {
            id: Uuid::new_v4(),
            user_id: *user_id,
            token: token.to_string(),
            expires_at,
            created_at: Utc::now(),
        });
    }

    pub fn admin_count(&self) -> usize {
        self.lock().admins.len()
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    fn insert_new(state: &mut StoreState, admin: &NewAdmin) -> Result<AdminUser, AppError> {
        if state.admins.iter().any(|existing| existing.email == admin.email) {
            return Err(AppError::email_taken());
        }

        let now = state
            .admins
            .last()
            .map(|last| last.created_at + Duration::milliseconds(1))
            .unwrap_or_else(Utc::now)
            .max(Utc::now());
        let created = AdminUser {
            id: Uuid::new_v4(),
            name: admin.name.clone(),
            email: admin.email.clone(),
            password_hash: admin.password_hash.clone(),
            role: admin.role,
            created_at: now,
            updated_at: now,
        };
        state.admins.push(created.clone());
        Ok(created)
    }
}

#[async_trait::async_trait]
impl AdminUserRepository for InMemoryStore {
    async fn count_admins(&self) -> Result<i64, AppError> {
        Ok(self.lock().admins.len() as i64)
    }

    async fn count_admins_with_role(&self, role: AdminRole) -> Result<i64, AppError> {
        Ok(self.lock().admins.iter().filter(|admin| admin.role == role).count() as i64)
    }

    async fn get_admin_by_email(&self, email: &str) -> Result<Option<AdminUser>, AppError> {
        Ok(self.lock().admins.iter().find(|admin| admin.email == email).cloned())
    }

    async fn get_admin_by_id(&self, id: &Uuid) -> Result<Option<AdminUser>, AppError> {
        Ok(self.lock().admins.iter().find(|admin| admin.id == *id).cloned())
    }

    async fn list_admins(&self) -> Result<Vec<AdminUser>, AppError> {
        let mut admins = self.lock().admins.clone();
        admins.sort_by_key(|admin| admin.created_at);
        Ok(admins)
    }

    async fn create_admin(&self, admin: &NewAdmin) -> Result<AdminUser, AppError> {
        Self::insert_new(&mut self.lock(), admin)
    }

    async fn create_first_admin(&self, admin: &NewAdmin) -> Result<Option<AdminUser>, AppError> {
        let mut state = self.lock();
        if !state.admins.is_empty() {
            return Ok(None);
        }
        Self::insert_new(&mut state, admin).map(Some)
    }

    async fn update_admin(&self, id: &Uuid, changes: &AdminChanges) -> Result<Option<AdminUser>, AppError> {
        let mut state = self.lock();
        let system_admins = state.admins.iter().filter(|admin| admin.role == AdminRole::System).count();

        if let Some(email) = &changes.email
            && state.admins.iter().any(|admin| admin.id != *id && admin.email == *email)
        {
            return Err(AppError::email_taken());
        }

        let Some(admin) = state.admins.iter_mut().find(|admin| admin.id == *id) else {
            return Ok(None);
        };

        if changes.role == Some(AdminRole::Admin) && admin.role == AdminRole::System && system_admins <= 1 {
            return Err(AppError::last_system_admin());
        }

        if let Some(name) = &changes.name {
            admin.name = name.clone();
        }
        if let Some(email) = &changes.email {
            admin.email = email.clone();
        }
        if let Some(role) = changes.role {
            admin.role = role;
        }
        admin.updated_at = Utc::now();

        Ok(Some(admin.clone()))
    }
}

#[async_trait::async_trait]
impl SessionRepository for InMemoryStore {
    async fn create_session(&self, user_id: &Uuid, token: &str, expires_at: DateTime<Utc>) -> Result<Session, AppError> {
        let mut state = self.lock();
        if !state.admins.iter().any(|admin| admin.id == *user_id) {
            return Err(AppError::db("Failed to create session", sqlx::Error::Protocol("unknown session owner".to_string())));
        }
        if state.sessions.iter().any(|session| session.token == token) {
            return Err(AppError::db("Failed to create session", sqlx::Error::Protocol("duplicate session token".to_string())));
        }

        let session = Session {
            id: Uuid::new_v4(),
            user_id: *user_id,
            token: token.to_string(),
            expires_at,
            created_at: Utc::now(),
        };
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_session(&self, token: &str) -> Result<Option<SessionAdmin>, AppError> {
        let state = self.lock();
        let Some(session) = state.sessions.iter().find(|session| session.token == token) else {
            return Ok(None);
        };
        let admin = state.admins.iter().find(|admin| admin.id == session.user_id);

        Ok(admin.map(|admin| SessionAdmin {
            session: session.clone(),
            admin: admin.clone(),
        }))
    }

    async fn delete_session(&self, token: &str) -> Result<u64, AppError> {
        let mut state = self.lock();
        let before = state.sessions.len();
        state.sessions.retain(|session| session.token != token);
        Ok((before - state.sessions.len()) as u64)
    }
}

/// A store whose every call fails as if the database were down.
pub struct UnreachableStore;

fn unreachable() -> AppError {
    AppError::db("Database unreachable", sqlx::Error::PoolTimedOut)
}

#[async_trait::async_trait]
impl AdminUserRepository for UnreachableStore {
    async fn count_admins(&self) -> Result<i64, AppError> {
        Err(unreachable())
    }

    async fn count_admins_with_role(&self, _role: AdminRole) -> Result<i64, AppError> {
        Err(unreachable())
    }

    async fn get_admin_by_email(&self, _email: &str) -> Result<Option<AdminUser>, AppError> {
        Err(unreachable())
    }

    async fn get_admin_by_id(&self, _id: &Uuid) -> Result<Option<AdminUser>, AppError> {
        Err(unreachable())
    }

    async fn list_admins(&self) -> Result<Vec<AdminUser>, AppError> {
        Err(unreachable())
    }

    async fn create_admin(&self, _admin: &NewAdmin) -> Result<AdminUser, AppError> {
        Err(unreachable())
    }

    async fn create_first_admin(&self, _admin: &NewAdmin) -> Result<Option<AdminUser>, AppError> {
        Err(unreachable())
    }

    async fn update_admin(&self, _id: &Uuid, _changes: &AdminChanges) -> Result<Option<AdminUser>, AppError> {
        Err(unreachable())
    }
}

#[async_trait::async_trait]
impl SessionRepository for UnreachableStore {
    async fn create_session(&self, _user_id: &Uuid, _token: &str, _expires_at: DateTime<Utc>) -> Result<Session, AppError> {
        Err(unreachable())
    }

    async fn find_session(&self, _token: &str) -> Result<Option<SessionAdmin>, AppError> {
        Err(unreachable())
    }

    async fn delete_session(&self, _token: &str) -> Result<u64, AppError> {
        Err(unreachable())
    }
}
