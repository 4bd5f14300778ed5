use crate::auth::SystemAdmin;
use crate::error::app_error::AppError;
use crate::models::admin_user::{AdminCreatedResponse, AdminUserListResponse, AdminUserResponse, CreateAdminRequest, UpdateAdminRequest};
use crate::models::session::SuccessResponse;
use crate::state::AppState;
use rocket::serde::json::Json;
use rocket::{State, get, patch, post};
use rocket_okapi::openapi;
use uuid::Uuid;
use validator::Validate;

fn parse_admin_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::validation("Invalid admin id"))
}

/// List all admin accounts, oldest first
#[openapi(tag = "Admin Users")]
#[get("/")]
pub async fn list_admin_users(state: &State<AppState>, actor: SystemAdmin) -> Result<Json<AdminUserListResponse>, AppError> {
    let admins = state.admin_service().list_admins(&actor).await?;

    Ok(Json(AdminUserListResponse {
        items: admins.iter().map(AdminUserResponse::from).collect(),
    }))
}

/// Create an admin account; the caller stays signed in as themselves
#[openapi(tag = "Admin Users")]
#[post("/", data = "<payload>")]
pub async fn create_admin_user(
    state: &State<AppState>,
    actor: SystemAdmin,
    payload: Json<CreateAdminRequest>,
) -> Result<Json<AdminCreatedResponse>, AppError> {
    payload.validate()?;

    let created = state
        .admin_service()
        .create_admin(&actor, &payload.name, &payload.email, &payload.password, &payload.role)
        .await?;

    Ok(Json(AdminCreatedResponse { id: created.id }))
}

/// Change another admin's name, email or role
#[openapi(tag = "Admin Users")]
#[patch("/<id>", data = "<payload>")]
pub async fn patch_admin_user(
    state: &State<AppState>,
    actor: SystemAdmin,
    id: &str,
    payload: Json<UpdateAdminRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let target_id = parse_admin_id(id)?;
    payload.validate()?;

    state.admin_service().update_admin(&actor, &target_id, &payload).await?;

    Ok(Json(SuccessResponse::ok()))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list_admin_users, create_admin_user, patch_admin_user]
}

#[cfg(test)]
mod tests {
    use super::parse_admin_id;
    use crate::test_utils::{sign_in, sign_up_alice, test_client};
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::{Value, json};

    async fn create_admin(client: &Client, name: &str, email: &str, role: &str) -> String {
        let response = client
            .post("/api/admin-users")
            .header(ContentType::JSON)
            .body(json!({ "name": name, "email": email, "password": "pw123456", "role": role }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.expect("json body");
        body["id"].as_str().expect("created id").to_string()
    }

    async fn patch_admin(client: &Client, id: &str, body: Value) -> (Status, Value) {
        let response = client
            .patch(format!("/api/admin-users/{}", id))
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await;
        let status = response.status();
        (status, response.into_json().await.unwrap_or(Value::Null))
    }

    async fn own_id(client: &Client) -> String {
        let me: Value = client.get("/api/auth/me").dispatch().await.into_json().await.expect("json body");
        me["id"].as_str().expect("own id").to_string()
    }

    #[test]
    fn malformed_ids_are_validation_errors() {
        assert!(parse_admin_id("not-a-uuid").is_err());
        assert!(parse_admin_id("6f1c1d52-9a0e-4a57-9f57-2f3b0c2bd1a4").is_ok());
    }

    #[rocket::async_test]
    async fn anonymous_callers_are_sent_to_sign_in() {
        let (client, _store) = test_client().await;
        sign_up_alice(&client).await;
        client.post("/api/auth/signout").dispatch().await;

        let response = client.get("/api/admin-users").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
        let body: Value = response.into_json().await.expect("json body");
        assert_eq!(body["success"], false);
        assert_eq!(body["redirect"], "/signin");
    }

    #[rocket::async_test]
    async fn plain_admins_are_forbidden() {
        let (client, store) = test_client().await;
        sign_up_alice(&client).await;
        create_admin(&client, "Bob", "bob@x.com", "ADMIN").await;

        sign_in(&client, "bob@x.com", "pw123456").await;

        let response = client.get("/api/admin-users").dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);
        let body: Value = response.into_json().await.expect("json body");
        assert_eq!(body["redirect"], "/");

        let response = client
            .post("/api/admin-users")
            .header(ContentType::JSON)
            .body(r#"{"name":"Eve","email":"eve@x.com","password":"pw","role":"SYSTEM"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
        assert_eq!(store.admin_count(), 2);
    }

    #[rocket::async_test]
    async fn create_then_list_in_creation_order() {
        let (client, _store) = test_client().await;
        sign_up_alice(&client).await;
        create_admin(&client, "Bob", "bob@x.com", "ADMIN").await;
        create_admin(&client, "Carol", "carol@x.com", "SYSTEM").await;

        let response = client.get("/api/admin-users").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.expect("json body");
        let emails: Vec<&str> = body["items"]
            .as_array()
            .expect("items")
            .iter()
            .map(|item| item["email"].as_str().expect("email"))
            .collect();
        assert_eq!(emails, vec!["alice@x.com", "bob@x.com", "carol@x.com"]);
        assert!(body["items"][0].get("password_hash").is_none());

        // Creating an account must not switch the caller's session.
        let me: Value = client.get("/api/auth/me").dispatch().await.into_json().await.expect("json body");
        assert_eq!(me["email"], "alice@x.com");
    }

    #[rocket::async_test]
    async fn duplicate_email_and_bad_role_are_rejected() {
        let (client, store) = test_client().await;
        sign_up_alice(&client).await;

        for body in [
            json!({ "name": "Dup", "email": "alice@x.com", "password": "pw", "role": "ADMIN" }),
            json!({ "name": "Root", "email": "root@x.com", "password": "pw", "role": "ROOT" }),
        ] {
            let response = client
                .post("/api/admin-users")
                .header(ContentType::JSON)
                .body(body.to_string())
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::BadRequest);
        }

        assert_eq!(store.admin_count(), 1);
    }

    #[rocket::async_test]
    async fn self_role_change_is_refused() {
        let (client, _store) = test_client().await;
        sign_up_alice(&client).await;
        let alice_id = own_id(&client).await;

        let (status, body) = patch_admin(&client, &alice_id, json!({ "role": "SYSTEM" })).await;
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["message"], "Cannot change your own role");
    }

    #[rocket::async_test]
    async fn renaming_yourself_is_allowed() {
        let (client, _store) = test_client().await;
        sign_up_alice(&client).await;
        let alice_id = own_id(&client).await;

        let (status, _) = patch_admin(&client, &alice_id, json!({ "name": "  Alice Smith " })).await;
        assert_eq!(status, Status::Ok);

        let me: Value = client.get("/api/auth/me").dispatch().await.into_json().await.expect("json body");
        assert_eq!(me["name"], "Alice Smith");
    }

    #[rocket::async_test]
    async fn last_system_admin_cannot_be_demoted() {
        let (client, _store) = test_client().await;
        sign_up_alice(&client).await;
        let carol_id = create_admin(&client, "Carol", "carol@x.com", "SYSTEM").await;

        // Two system admins: demoting Carol is fine.
        let (status, _) = patch_admin(&client, &carol_id, json!({ "role": "ADMIN" })).await;
        assert_eq!(status, Status::Ok);

        // Now a plain admin, Carol cannot reach the endpoint at all.
        sign_in(&client, "carol@x.com", "pw123456").await;
        let (status, _) = patch_admin(&client, &carol_id, json!({ "role": "SYSTEM" })).await;
        assert_eq!(status, Status::Forbidden);
    }

    #[rocket::async_test]
    async fn empty_and_malformed_updates_are_rejected() {
        let (client, _store) = test_client().await;
        sign_up_alice(&client).await;
        let bob_id = create_admin(&client, "Bob", "bob@x.com", "ADMIN").await;

        let (status, body) = patch_admin(&client, &bob_id, json!({})).await;
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["message"], "No fields to update");

        let (status, _) = patch_admin(&client, "not-a-uuid", json!({ "name": "X" })).await;
        assert_eq!(status, Status::BadRequest);

        let (status, _) = patch_admin(&client, "6f1c1d52-9a0e-4a57-9f57-2f3b0c2bd1a4", json!({ "name": "X" })).await;
        assert_eq!(status, Status::NotFound);
    }

    #[rocket::async_test]
    async fn email_conflict_on_update() {
        let (client, _store) = test_client().await;
        sign_up_alice(&client).await;
        let bob_id = create_admin(&client, "Bob", "bob@x.com", "ADMIN").await;

        let (status, body) = patch_admin(&client, &bob_id, json!({ "email": "alice@x.com" })).await;
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["message"], "Email already exists");
    }
}
