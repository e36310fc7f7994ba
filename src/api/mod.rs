pub mod auth;
mod availability;
mod bookings;
pub mod error;
mod favorites;
mod pages;
mod reviews;
mod services;
mod validation;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout));

    let service_routes = Router::new()
        .route("/", get(services::list_services).post(services::create_service))
        .route(
            "/:id",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        );

    let availability_routes = Router::new()
        .route("/", get(availability::list_slots).post(availability::create_slot))
        .route("/:id", delete(availability::delete_slot));

    let booking_routes = Router::new()
        .route("/", get(bookings::list_bookings).post(bookings::create_booking))
        .route("/:id", delete(bookings::delete_booking))
        .route(
            "/:id/status",
            put(bookings::update_status).patch(bookings::override_status),
        );

    let review_routes = Router::new()
        .route("/", get(reviews::list_reviews).post(reviews::create_review))
        .route("/:id", put(reviews::update_review).delete(reviews::delete_review));

    let favorite_routes = Router::new()
        .route("/", get(favorites::list_favorites).post(favorites::add_favorite))
        .route("/:service_id", delete(favorites::remove_favorite))
        .route("/check/:service_id", get(favorites::check_favorite));

    Router::new()
        .route("/health", get(health_check))
        .route("/users/me", get(auth::me))
        .route("/dashboard", get(pages::dashboard))
        .nest("/auth", auth_routes)
        .nest("/services", service_routes)
        .nest("/availability", availability_routes)
        .nest("/bookings", booking_routes)
        .nest("/reviews", review_routes)
        .nest("/favorites", favorite_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
pub(crate) mod testing {
    //! Router-level helpers for handler tests.

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::db::testing::memory_pool;
    use crate::db::Account;
    use crate::AppState;

    pub async fn test_state() -> Arc<AppState> {
        let mut config = Config::default();
        config.auth.jwt_secret = "router-test-secret".to_string();
        Arc::new(AppState::new(config, memory_pool().await).unwrap())
    }

    pub fn token_for(state: &AppState, account: &Account) -> String {
        state.tokens.issue(account).unwrap()
    }

    fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match token {
            Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
        builder(method, uri, token).body(Body::empty()).unwrap()
    }

    pub fn json_request(
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> Request<Body> {
        builder(method, uri, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn raw_send(state: &Arc<AppState>, request: Request<Body>) -> Response {
        super::create_router(state.clone())
            .oneshot(request)
            .await
            .unwrap()
    }

    /// Status plus the JSON body, or `Null` for empty and non-JSON bodies
    pub async fn send(
        state: &Arc<AppState>,
        request: Request<Body>,
    ) -> (StatusCode, serde_json::Value) {
        let response = raw_send(state, request).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_health_check() {
        let state = test_state().await;
        let response = raw_send(&state, empty_request(Method::GET, "/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
