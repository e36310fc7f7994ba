//! Registration, login and the request extractors that resolve a [`Principal`].

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_password, validate_username};
use crate::auth::{hash_password, resolve_principal, try_resolve_principal, AccessError, Principal};
use crate::db::{AccountResponse, AccountStore, LoginRequest, LoginResponse, MeResponse, RegisterRequest};
use crate::AppState;

/// Strict extractor: the request fails with 401 unless a valid credential
/// for an existing account is presented.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        resolve_principal(
            &parts.headers,
            &state.tokens,
            &state.config.auth.cookie_name,
            &state.db,
        )
        .await
        .map_err(ApiError::from)
    }
}

/// Best-effort extractor for pages that redirect instead of failing
pub struct MaybePrincipal(pub Option<Principal>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybePrincipal {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybePrincipal(
            try_resolve_principal(&parts.headers, &state.tokens, &state.db).await,
        ))
    }
}

/// Create an account. Usernames and emails are unique.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("username", validate_username(&req.username))
        .check("email", validate_email(&req.email))
        .check("password", validate_password(&req.password));
    errors.finish()?;

    for identifier in [&req.username, &req.email] {
        if state
            .db
            .find_account_by_username_or_email(identifier)
            .await?
            .is_some()
        {
            return Err(AccessError::Conflict(
                "Username or email is already registered".to_string(),
            )
            .into());
        }
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to hash password")
    })?;

    let account = state
        .db
        .insert_account(&req.username, &req.email, &password_hash, req.role)
        .await?;

    tracing::info!(user_id = account.id, role = %account.role, "Account registered");
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// Exchange a username (or email) and password for an access token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let account = state
        .db
        .find_account_by_username_or_email(&req.username)
        .await?
        .filter(|account| state.passwords.verify(&req.password, &account.password_hash))
        .ok_or_else(|| {
            tracing::debug!("Login rejected");
            ApiError::bad_request("Incorrect username or password")
        })?;

    let access_token = state.tokens.issue(&account).map_err(|e| {
        tracing::error!("Failed to sign access token: {}", e);
        ApiError::internal("Failed to issue access token")
    })?;

    tracing::info!(user_id = account.id, "User logged in");
    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// Tokens are stateless; logout only confirms the credential was valid
pub async fn logout(principal: Principal) -> Json<serde_json::Value> {
    tracing::debug!(user_id = principal.id, "User logged out");
    Json(json!({ "detail": "Logged out" }))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<MeResponse>, ApiError> {
    let account = state
        .db
        .find_account_by_id(principal.id)
        .await?
        .ok_or(AccessError::Unauthenticated)?;

    Ok(Json(MeResponse {
        id: account.id,
        username: account.username,
        role: principal.role,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::db::testing::{insert_account, TEST_PASSWORD};
    use crate::db::Role;
    use axum::http::{header, Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_register_then_login_by_username_and_email() {
        let state = test_state().await;

        let (status, body) = send(
            &state,
            json_request(
                Method::POST,
                "/auth/register",
                None,
                json!({
                    "username": "finn",
                    "email": "finn@example.com",
                    "password": "s3cret-enough",
                    "role": "freelancer"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "freelancer");
        assert!(body.get("password_hash").is_none());

        for identifier in ["finn", "finn@example.com"] {
            let (status, body) = send(
                &state,
                json_request(
                    Method::POST,
                    "/auth/login",
                    None,
                    json!({ "username": identifier, "password": "s3cret-enough" }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["token_type"], "bearer");
            assert!(body["access_token"].as_str().is_some());
        }
    }

    #[tokio::test]
    async fn test_register_defaults_to_client() {
        let state = test_state().await;
        let (status, body) = send(
            &state,
            json_request(
                Method::POST,
                "/auth/register",
                None,
                json!({ "username": "cleo", "email": "cleo@example.com", "password": "s3cret-enough" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "client");
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let state = test_state().await;
        insert_account(&state.db, "cleo", Role::Client).await;

        let (status, body) = send(
            &state,
            json_request(
                Method::POST,
                "/auth/register",
                None,
                json!({ "username": "other", "email": "cleo@example.com", "password": "s3cret-enough" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "conflict");
    }

    #[tokio::test]
    async fn test_register_validates_fields() {
        let state = test_state().await;
        let (status, body) = send(
            &state,
            json_request(
                Method::POST,
                "/auth/register",
                None,
                json!({ "username": "x", "email": "nope", "password": "short" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
        let details = body["error"]["details"].as_object().unwrap();
        assert!(details.contains_key("username"));
        assert!(details.contains_key("email"));
        assert!(details.contains_key("password"));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password() {
        let state = test_state().await;
        insert_account(&state.db, "cleo", Role::Client).await;

        let (status, body) = send(
            &state,
            json_request(
                Method::POST,
                "/auth/login",
                None,
                json!({ "username": "cleo", "password": "wrong password" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Incorrect username or password");

        let (status, _) = send(
            &state,
            json_request(
                Method::POST,
                "/auth/login",
                None,
                json!({ "username": "nobody", "password": TEST_PASSWORD }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_me_uses_bearer_or_cookie() {
        let state = test_state().await;
        let account = insert_account(&state.db, "ada", Role::Admin).await;
        let token = token_for(&state, &account);

        let (status, body) = send(&state, empty_request(Method::GET, "/users/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "ada");
        assert_eq!(body["role"], "admin");

        let request = axum::http::Request::builder()
            .uri("/users/me")
            .header(header::COOKIE, format!("access_token={}", token))
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], account.id);
    }

    #[tokio::test]
    async fn test_me_without_credential_is_unauthorized() {
        let state = test_state().await;
        let (status, body) = send(&state, empty_request(Method::GET, "/users/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Could not validate credentials");

        let (status, _) =
            send(&state, empty_request(Method::GET, "/users/me", Some("not.a.token"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_requires_credential() {
        let state = test_state().await;
        let account = insert_account(&state.db, "cleo", Role::Client).await;

        let (status, _) = send(&state, empty_request(Method::POST, "/auth/logout", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = token_for(&state, &account);
        let (status, body) =
            send(&state, empty_request(Method::POST, "/auth/logout", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["detail"], "Logged out");
    }
}
