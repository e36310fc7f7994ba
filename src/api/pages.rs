use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use super::auth::MaybePrincipal;

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Send visitors to their role's dashboard, or to login
pub async fn dashboard(MaybePrincipal(principal): MaybePrincipal) -> Response {
    match principal {
        Some(principal) => found(&format!("/dashboard/{}", principal.role)),
        None => found("/login?reason=auth"),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::db::testing::insert_account;
    use crate::db::Role;
    use axum::http::{header, Method, StatusCode};

    async fn redirect_target(
        state: &std::sync::Arc<crate::AppState>,
        token: Option<&str>,
    ) -> (StatusCode, String) {
        let response = raw_send(state, empty_request(Method::GET, "/dashboard", token)).await;
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        (response.status(), location)
    }

    #[tokio::test]
    async fn test_dashboard_redirects_by_role() {
        let state = test_state().await;
        for (name, role) in [
            ("cleo", Role::Client),
            ("finn", Role::Freelancer),
            ("ada", Role::Admin),
        ] {
            let account = insert_account(&state.db, name, role).await;
            let (status, location) = redirect_target(&state, Some(&token_for(&state, &account))).await;
            assert_eq!(status, StatusCode::FOUND);
            assert_eq!(location, format!("/dashboard/{}", role));
        }
    }

    #[tokio::test]
    async fn test_dashboard_without_credential_goes_to_login() {
        let state = test_state().await;
        let (status, location) = redirect_target(&state, None).await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(location, "/login?reason=auth");

        let (_, location) = redirect_target(&state, Some("garbage")).await;
        assert_eq!(location, "/login?reason=auth");
    }

    #[tokio::test]
    async fn test_dashboard_ignores_cookie() {
        let state = test_state().await;
        let account = insert_account(&state.db, "cleo", Role::Client).await;
        let request = axum::http::Request::builder()
            .uri("/dashboard")
            .header(header::COOKIE, format!("access_token={}", token_for(&state, &account)))
            .body(axum::body::Body::empty())
            .unwrap();
        let response = raw_send(&state, request).await;
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?reason=auth"
        );
    }
}
