use crate::error::app_error::AppError;
use crate::models::admin_user::AdminUser;
use crate::models::session::IssuedSession;
use crate::service::authorization::AccessLevel;
use crate::state::AppState;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, Responses, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use std::ops::Deref;
use tracing::debug;
use uuid::Uuid;

/// Build the bearer cookie for `token`.
pub fn session_cookie(name: &str, token: &str, ttl_seconds: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(rocket::time::Duration::seconds(ttl_seconds))
        .build()
}

/// The session cookie of the current request: read once, written only on sign-in/out.
pub struct SessionCookie<'r> {
    jar: &'r CookieJar<'r>,
    state: &'r AppState,
}

impl SessionCookie<'_> {
    pub fn token(&self) -> Option<String> {
        self.jar.get(&self.state.session.cookie_name).map(|cookie| cookie.value().to_string())
    }

    pub fn issue(&self, issued: &IssuedSession) {
        let session = &self.state.session;
        self.jar
            .add(session_cookie(&session.cookie_name, &issued.token, session.ttl_seconds, session.cookie_secure));
        debug!(admin_id = %issued.admin.id, expires_at = %issued.expires_at, "session cookie issued");
    }

    pub fn clear(&self) {
        self.jar.remove(Cookie::build(self.state.session.cookie_name.clone()).path("/"));
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionCookie<'r> {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        match req.rocket().state::<AppState>() {
            Some(state) => Outcome::Success(SessionCookie { jar: req.cookies(), state }),
            None => {
                let err = AppError::Internal("Application state is not managed".to_string());
                Outcome::Error((Status::InternalServerError, err))
            }
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for SessionCookie<'a> {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }
}

/// Any signed-in admin.
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: Uuid,
    pub admin: AdminUser,
}

impl Deref for CurrentAdmin {
    type Target = AdminUser;

    fn deref(&self) -> &Self::Target {
        &self.admin
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentAdmin {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let cached = req
            .local_cache_async(async {
                let state = req.rocket().state::<AppState>()?;
                let token = session_token(req, state);
                let admin = state
                    .session_manager()
                    .require_access(token.as_deref(), AccessLevel::AnyAdmin)
                    .await
                    .ok()?;
                Some(CurrentAdmin { id: admin.id, admin })
            })
            .await;

        match cached {
            Some(current) => Outcome::Success(current.clone()),
            None => Outcome::Error((Status::Unauthorized, AppError::Unauthenticated)),
        }
    }
}

fn session_token(req: &Request<'_>, state: &AppState) -> Option<String> {
    req.cookies().get(&state.session.cookie_name).map(|cookie| cookie.value().to_string())
}

fn cookie_security_input(description: &str) -> RequestHeaderInput {
    let security_scheme = SecurityScheme {
        description: Some(description.to_string()),
        data: SecuritySchemeData::ApiKey {
            name: "session".to_string(),
            location: "cookie".to_string(),
        },
        extensions: Object::default(),
    };

    let mut security_req = SecurityRequirement::new();
    security_req.insert("cookieAuth".to_string(), Vec::new());

    RequestHeaderInput::Security("cookieAuth".to_string(), security_scheme, security_req)
}

fn guard_responses(codes: &[(&str, &str)]) -> Responses {
    use rocket_okapi::okapi::openapi3::{RefOr, Response};
    let mut responses = Responses::default();
    for (code, description) in codes {
        responses.responses.insert(
            code.to_string(),
            RefOr::Object(Response {
                description: description.to_string(),
                ..Default::default()
            }),
        );
    }
    responses
}

impl<'a> OpenApiFromRequest<'a> for CurrentAdmin {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(cookie_security_input(
            "Cookie-based session. Sign in via POST /api/auth/signin to obtain the session cookie.",
        ))
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        Ok(guard_responses(&[("401", "Unauthorized - Authentication required")]))
    }
}

/// A signed-in admin holding the `SYSTEM` role.
#[derive(Debug, Clone)]
pub struct SystemAdmin(pub CurrentAdmin);

impl Deref for SystemAdmin {
    type Target = AdminUser;

    fn deref(&self) -> &Self::Target {
        &self.0.admin
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SystemAdmin {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let Some(state) = req.rocket().state::<AppState>() else {
            return Outcome::Error((Status::Unauthorized, AppError::Unauthenticated));
        };
        let token = session_token(req, state);

        match state.session_manager().require_system_admin(token.as_deref()).await {
            Ok(admin) => {
                let current = CurrentAdmin { id: admin.id, admin };
                // Seeds the per-request cache the logging fairing reads.
                req.local_cache(|| Some(current.clone()));
                Outcome::Success(SystemAdmin(current))
            }
            Err(err @ AppError::Forbidden) => Outcome::Error((Status::Forbidden, err)),
            Err(err) => Outcome::Error((Status::Unauthorized, err)),
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for SystemAdmin {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(cookie_security_input("Cookie-based session of an admin with the SYSTEM role."))
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        Ok(guard_responses(&[
            ("401", "Unauthorized - Authentication required"),
            ("403", "Forbidden - System admin required"),
        ]))
    }
}
