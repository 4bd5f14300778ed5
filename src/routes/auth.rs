use crate::auth::{CurrentAdmin, SessionCookie};
use crate::error::app_error::AppError;
use crate::models::admin_user::AdminUserResponse;
use crate::models::session::{FirstRunResponse, SignInRequest, SignUpRequest, SuccessResponse};
use crate::state::AppState;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use tracing::error;
use validator::Validate;

/// Whether the first system admin has been created yet
#[openapi(tag = "Auth")]
#[get("/first-run")]
pub async fn get_first_run(state: &State<AppState>) -> Result<Json<FirstRunResponse>, AppError> {
    let exists = state.session_manager().has_any_admin().await?;
    Ok(Json(FirstRunResponse { exists }))
}

/// Bootstrap the first system admin and sign them in
#[openapi(tag = "Auth")]
#[post("/signup", data = "<payload>")]
pub async fn post_sign_up(state: &State<AppState>, cookies: SessionCookie<'_>, payload: Json<SignUpRequest>) -> Result<Json<SuccessResponse>, AppError> {
    payload.validate()?;

    let issued = state
        .session_manager()
        .sign_up(&payload.name, &payload.email, &payload.password, &payload.confirm_password)
        .await?;
    cookies.issue(&issued);

    Ok(Json(SuccessResponse::ok()))
}

/// Sign in with email and password
#[openapi(tag = "Auth")]
#[post("/signin", data = "<payload>")]
pub async fn post_sign_in(state: &State<AppState>, cookies: SessionCookie<'_>, payload: Json<SignInRequest>) -> Result<Json<SuccessResponse>, AppError> {
    let manager = state.session_manager();
    if !manager.has_any_admin().await? {
        return Err(AppError::validation("System admin not initialised, sign up first"));
    }

    let issued = manager.sign_in(&payload.email, &payload.password).await?;
    cookies.issue(&issued);

    Ok(Json(SuccessResponse::ok()))
}

/// Sign out; succeeds whether or not a session was present
#[openapi(tag = "Auth")]
#[post("/signout")]
pub async fn post_sign_out(state: &State<AppState>, cookies: SessionCookie<'_>) -> Json<SuccessResponse> {
    let token = cookies.token();
    cookies.clear();

    // The browser is signed out either way; a stale row expires on its own.
    if let Err(err) = state.session_manager().sign_out(token.as_deref()).await {
        error!(error = ?err, "failed to delete session on sign-out");
    }

    Json(SuccessResponse::ok())
}

/// The signed-in admin, for role-gated navigation
#[openapi(tag = "Auth")]
#[get("/me")]
pub async fn get_me(current: CurrentAdmin) -> Json<AdminUserResponse> {
    Json(AdminUserResponse::from(&current.admin))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![get_first_run, post_sign_up, post_sign_in, post_sign_out, get_me]
}
