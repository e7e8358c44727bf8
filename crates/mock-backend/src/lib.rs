//! Mock user/group backend.
//!
//! A small Axum application standing in for the real administration
//! backend during development and in tests:
//!
//! | Route                     | Auth   | Description                               |
//! |---------------------------|--------|-------------------------------------------|
//! | `POST /login`             | none   | `{username, password_hash}` → `{token}`   |
//! | `GET /api/status`         | bearer | Token expiry and identity                 |
//! | `GET /api/logout`         | bearer | Recorded; always answered                 |
//! | `/api/users[/{id}]`       | bearer | CRUD; mutations need an administrator     |
//! | `/api/groups[/{id}]`      | bearer | CRUD; mutations need an administrator     |
//!
//! Tokens are HS512 JWTs whose payload is a [`ClaimSet`].

pub mod config;
pub mod error;
pub mod state;
pub mod token;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{error, info};
use usergroup_models::{ClaimSet, Credential, Group, NewGroup, NewUser, User};

pub use crate::config::MockConfig;
pub use crate::error::MockError;
pub use crate::state::MockState;

type Shared = State<Arc<MockState>>;

// ---------------------------------------------------------------------------
// Request / Response DTOs
// ---------------------------------------------------------------------------

/// Response of `POST /login`.
#[derive(Serialize)]
struct LoginResponse {
    token: String,
}

// ---------------------------------------------------------------------------
// Auth helpers
// ---------------------------------------------------------------------------

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn authenticate(state: &MockState, headers: &HeaderMap) -> Result<ClaimSet, MockError> {
    let token =
        bearer(headers).ok_or_else(|| MockError::Unauthorized("missing bearer token".into()))?;
    token::verify(state.secret(), token)
}

fn require_admin(state: &MockState, headers: &HeaderMap) -> Result<ClaimSet, MockError> {
    let claims = authenticate(state, headers)?;
    if !claims.user.is_admin {
        return Err(MockError::Forbidden);
    }
    Ok(claims)
}

// ---------------------------------------------------------------------------
// Session handlers
// ---------------------------------------------------------------------------

/// `POST /login`: check the credential and sign a session token.
async fn login(
    State(state): Shared,
    Json(credential): Json<Credential>,
) -> Result<Json<LoginResponse>, MockError> {
    let user = state.authenticate(&credential.username, &credential.password_hash)?;
    let token = token::issue(state.secret(), state.ttl(), &user)?;
    info!(user_id = user.id, login = %user.username, "token issued");
    Ok(Json(LoginResponse { token }))
}

/// `GET /api/status`: report whether the presented token is honored.
async fn status(State(state): Shared, headers: HeaderMap) -> Result<Json<Value>, MockError> {
    let claims = authenticate(&state, &headers)?;
    Ok(Json(json!({
        "exp": claims.expires_at_epoch_seconds,
        "user_id": claims.user.user_id,
        "login": claims.user.login,
    })))
}

/// `GET /api/logout`: record the call and acknowledge a valid token.
async fn logout(State(state): Shared, headers: HeaderMap) -> Result<Json<Value>, MockError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.record_logout(header);

    let claims = authenticate(&state, &headers)?;
    info!(user_id = claims.user.user_id, "logged out");
    Ok(Json(json!({ "message": "logged out" })))
}

// ---------------------------------------------------------------------------
// User handlers
// ---------------------------------------------------------------------------

async fn list_users(State(state): Shared, headers: HeaderMap) -> Result<Json<Vec<User>>, MockError> {
    authenticate(&state, &headers)?;
    Ok(Json(state.users()))
}

async fn get_user(
    State(state): Shared,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<User>, MockError> {
    authenticate(&state, &headers)?;
    Ok(Json(state.user(id)?))
}

async fn create_user(
    State(state): Shared,
    headers: HeaderMap,
    Json(new): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), MockError> {
    require_admin(&state, &headers)?;
    let user = state.create_user(new)?;
    info!(user_id = user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): Shared,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(user): Json<User>,
) -> Result<Json<User>, MockError> {
    require_admin(&state, &headers)?;
    Ok(Json(state.update_user(id, user)?))
}

async fn delete_user(
    State(state): Shared,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, MockError> {
    require_admin(&state, &headers)?;
    state.delete_user(id)?;
    info!(user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Group handlers
// ---------------------------------------------------------------------------

async fn list_groups(
    State(state): Shared,
    headers: HeaderMap,
) -> Result<Json<Vec<Group>>, MockError> {
    authenticate(&state, &headers)?;
    Ok(Json(state.groups()))
}

async fn get_group(
    State(state): Shared,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Group>, MockError> {
    authenticate(&state, &headers)?;
    Ok(Json(state.group(id)?))
}

async fn create_group(
    State(state): Shared,
    headers: HeaderMap,
    Json(new): Json<NewGroup>,
) -> Result<(StatusCode, Json<Group>), MockError> {
    let claims = require_admin(&state, &headers)?;
    let group = state.create_group(new, claims.user.user_id)?;
    info!(group_id = group.id, "group created");
    Ok((StatusCode::CREATED, Json(group)))
}

async fn update_group(
    State(state): Shared,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(group): Json<Group>,
) -> Result<Json<Group>, MockError> {
    require_admin(&state, &headers)?;
    Ok(Json(state.update_group(id, group)?))
}

async fn delete_group(
    State(state): Shared,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, MockError> {
    require_admin(&state, &headers)?;
    state.delete_group(id)?;
    info!(group_id = id, "group deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Router / server
// ---------------------------------------------------------------------------

/// Every route of the mock backend over `state`.
pub fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/api/status", get(status))
        .route("/api/logout", get(logout))
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/groups", get(list_groups).post(create_group))
        .route(
            "/api/groups/{id}",
            get(get_group).put(update_group).delete(delete_group),
        )
        .with_state(state)
}

/// Serve `state` on an ephemeral loopback port in a background task.
///
/// Returns the bound address. The server runs until the runtime shuts
/// down.
pub async fn spawn(state: Arc<MockState>) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router(state)).await {
            error!(error = %e, "mock backend stopped");
        }
    });
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use axum_test::TestServer;
    use chrono::Duration;
    use sha2::{Digest, Sha256};

    use super::*;

    fn server(ttl: Duration) -> (TestServer, Arc<MockState>) {
        let state = Arc::new(MockState::seeded("test-secret", ttl));
        let server = TestServer::new(router(Arc::clone(&state))).unwrap();
        (server, state)
    }

    fn hash(password: &str) -> String {
        hex::encode(Sha256::digest(password.as_bytes()))
    }

    fn bearer_value(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
    }

    async fn login_token(server: &TestServer, username: &str, password: &str) -> String {
        let res = server
            .post("/login")
            .json(&json!({ "username": username, "password_hash": hash(password) }))
            .await;
        res.assert_status_ok();
        res.json::<Value>()["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let (server, state) = server(Duration::minutes(5));
        let token = login_token(&server, "zoe", "zoe").await;

        let claims = token::verify(state.secret(), &token).unwrap();
        assert_eq!(claims.user.login, "zoe");
        assert_eq!(claims.user.name, "Zoë Müller-Ñúñez");
        assert_eq!(claims.user.group_ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let (server, _) = server(Duration::minutes(5));
        let res = server
            .post("/login")
            .json(&json!({ "username": "admin", "password_hash": hash("guess") }))
            .await;
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.json::<Value>()["error"], "invalid username or password");
    }

    #[tokio::test]
    async fn status_reports_expiry() {
        let (server, _) = server(Duration::minutes(5));
        let token = login_token(&server, "admin", "admin").await;

        let res = server
            .get("/api/status")
            .add_header(AUTHORIZATION, bearer_value(&token))
            .await;
        res.assert_status_ok();
        let body = res.json::<Value>();
        assert_eq!(body["user_id"], 1);
        assert!(body["exp"].as_i64().unwrap() > chrono::Utc::now().timestamp());
    }

    #[tokio::test]
    async fn status_without_token_is_unauthorized() {
        let (server, _) = server(Duration::minutes(5));
        let res = server.get("/api/status").await;
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_rejected_by_status() {
        let (server, _) = server(Duration::minutes(-10));
        let token = login_token(&server, "admin", "admin").await;
        let res = server
            .get("/api/status")
            .add_header(AUTHORIZATION, bearer_value(&token))
            .await;
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_with_out_of_range_lifetime_fails_cleanly() {
        let (server, _) = server(Duration::try_minutes(1_000_000_000_000).unwrap());
        let res = server
            .post("/login")
            .json(&json!({ "username": "admin", "password_hash": hash("admin") }))
            .await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.json::<Value>()["error"]
            .as_str()
            .unwrap()
            .contains("out of range"));
    }

    #[tokio::test]
    async fn logout_is_recorded() {
        let (server, state) = server(Duration::minutes(5));
        let token = login_token(&server, "admin", "admin").await;

        server
            .get("/api/logout")
            .add_header(AUTHORIZATION, bearer_value(&token))
            .await
            .assert_status_ok();
        let res = server.get("/api/logout").await;
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

        assert_eq!(
            state.logout_requests(),
            vec![Some(format!("Bearer {token}")), None]
        );
    }

    #[tokio::test]
    async fn non_admin_cannot_create_groups() {
        let (server, _) = server(Duration::minutes(5));
        let token = login_token(&server, "zoe", "zoe").await;

        let res = server
            .post("/api/groups")
            .add_header(AUTHORIZATION, bearer_value(&token))
            .json(&json!({ "name": "audit" }))
            .await;
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

        let res = server
            .get("/api/groups")
            .add_header(AUTHORIZATION, bearer_value(&token))
            .await;
        assert_eq!(res.json::<Vec<Group>>().len(), 2);
    }

    #[tokio::test]
    async fn admin_manages_users() {
        let (server, _) = server(Duration::minutes(5));
        let token = login_token(&server, "admin", "admin").await;

        let res = server
            .post("/api/users")
            .add_header(AUTHORIZATION, bearer_value(&token))
            .json(&json!({
                "name": "Carlos Gil",
                "email": "carlos@example.com",
                "username": "cgil",
                "password_hash": hash("pw"),
            }))
            .await;
        assert_eq!(res.status_code(), StatusCode::CREATED);
        let created = res.json::<User>();
        assert_eq!(created.id, 3);

        let res = server
            .delete("/api/users/3")
            .add_header(AUTHORIZATION, bearer_value(&token))
            .await;
        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

        let res = server
            .get("/api/users/3")
            .add_header(AUTHORIZATION, bearer_value(&token))
            .await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.json::<Value>()["error"], "user 3 not found");
    }
}
