use rocket::http::{ContentType, Status};
use rocket::response::Responder;
use rocket::{Request, Response};
use rocket_okapi::OpenApiError;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::response::OpenApiResponderInner;
use schemars::JsonSchema;
use serde::Serialize;
use std::io::Cursor;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

pub const SIGN_IN_PATH: &str = "/signin";
pub const DEFAULT_PAGE_PATH: &str = "/";

const ADMIN_EMAIL_UNIQUE_CONSTRAINT: &str = "admin_users_email_key";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    Db {
        message: String,
        #[source]
        source: sqlx::error::Error,
    },
    #[error("Internal server error")]
    PasswordHash { message: String },
    #[error("{0}")]
    Validation(String),
    #[error("Validation error: {0}")]
    ValidationErrors(#[from] ValidationErrors),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Insufficient permissions")]
    Forbidden,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidOperation(String),
    #[error("{0}")]
    InvariantViolation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Internal server error")]
    Internal(String),
    #[error("Internal server error")]
    ConfigurationError {
        message: String,
        #[source]
        source: figment::Error,
    },
}

impl AppError {
    pub fn db(message: impl Into<String>, source: sqlx::error::Error) -> Self {
        Self::Db {
            message: message.into(),
            source,
        }
    }

    pub fn password_hash(message: impl Into<String>, source: password_hash::Error) -> Self {
        Self::PasswordHash {
            message: format!("{}: {}", message.into(), source),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn email_taken() -> Self {
        Self::Conflict("Email already exists".to_string())
    }

    pub fn last_system_admin() -> Self {
        Self::InvariantViolation("Must retain at least one system admin".to_string())
    }

    /// Where the presentation layer should navigate instead of rendering an error.
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            AppError::Unauthenticated => Some(SIGN_IN_PATH),
            AppError::Forbidden => Some(DEFAULT_PAGE_PATH),
            _ => None,
        }
    }
}

impl From<password_hash::Error> for AppError {
    fn from(e: password_hash::Error) -> Self {
        AppError::password_hash("Password hashing failed", e)
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::ConfigurationError {
            message: "Failed to read configuration".to_string(),
            source: e,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() && db_err.constraint() == Some(ADMIN_EMAIL_UNIQUE_CONSTRAINT) => {
                AppError::email_taken()
            }
            _ => AppError::db("Database error", e),
        }
    }
}

/// The one place error kinds are mapped onto HTTP statuses.
impl From<&AppError> for Status {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::Validation(_) => Status::BadRequest,
            AppError::ValidationErrors(_) => Status::BadRequest,
            AppError::InvalidCredentials => Status::BadRequest,
            AppError::Conflict(_) => Status::BadRequest,
            AppError::InvalidOperation(_) => Status::BadRequest,
            AppError::InvariantViolation(_) => Status::BadRequest,
            AppError::Unauthenticated => Status::Unauthorized,
            AppError::Forbidden => Status::Forbidden,
            AppError::NotFound(_) => Status::NotFound,
            AppError::Db { .. } => Status::InternalServerError,
            AppError::PasswordHash { .. } => Status::InternalServerError,
            AppError::Internal(_) => Status::InternalServerError,
            AppError::ConfigurationError { .. } => Status::InternalServerError,
        }
    }
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub redirect: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, redirect: Option<&str>) -> Self {
        Self {
            success: false,
            message: message.into(),
            redirect: redirect.map(str::to_string),
        }
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(e: &AppError) -> Self {
        ErrorResponse::new(e.to_string(), e.redirect())
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &Request<'_>) -> rocket::response::Result<'static> {
        let method = req.method();
        let uri = req.uri();

        let request_id = req
            .local_cache(|| None::<crate::middleware::RequestId>)
            .as_ref()
            .map(|r| r.0.as_str())
            .unwrap_or("unknown");

        let admin_id = req
            .local_cache(|| None::<crate::auth::CurrentAdmin>)
            .as_ref()
            .map(|admin| admin.id.to_string())
            .unwrap_or_else(|| "anonymous".to_string());

        let status = Status::from(&self);
        if status.class().is_server_error() {
            error!(
                error = ?self,
                request_id = %request_id,
                admin_id = %admin_id,
                method = %method,
                uri = %uri,
                "request failed"
            );
        } else {
            warn!(
                error = %self,
                request_id = %request_id,
                admin_id = %admin_id,
                method = %method,
                uri = %uri,
                "request rejected"
            );
        }

        let body = serde_json::to_string(&ErrorResponse::from(&self)).unwrap_or_else(|_| r#"{"success":false}"#.to_string());

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

impl OpenApiResponderInner for AppError {
    fn responses(_gen: &mut OpenApiGenerator) -> Result<Responses, OpenApiError> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse};
        let mut responses = Responses::default();
        for (code, description) in [
            ("400", "Bad Request"),
            ("401", "Unauthorized - Authentication required"),
            ("403", "Forbidden - System admin required"),
            ("404", "Not Found"),
            ("500", "Internal Server Error"),
        ] {
            responses.responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }
        Ok(responses)
    }
}
