use crate::error::app_error::{DEFAULT_PAGE_PATH, ErrorResponse, SIGN_IN_PATH};
use rocket::serde::json::Json;
use rocket::{Request, catch};

#[catch(400)]
pub fn bad_request(_: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Bad request", None))
}

#[catch(401)]
pub fn unauthorized(_: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Authentication required", Some(SIGN_IN_PATH)))
}

#[catch(403)]
pub fn forbidden(_: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Insufficient permissions", Some(DEFAULT_PAGE_PATH)))
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Not found", None))
}

// Rocket answers malformed JSON bodies with 422.
#[catch(422)]
pub fn unprocessable_entity(_: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Invalid request body", None))
}

#[catch(500)]
pub fn internal_error(_: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Internal server error", None))
}
