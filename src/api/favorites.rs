use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::error::ApiError;
use crate::auth::{AccessError, Principal};
use crate::db::{
    CreateFavoriteRequest, Favorite, FavoriteCheckResponse, FavoriteWithService, ServiceStore,
};
use crate::AppState;

async fn find_favorite(
    state: &AppState,
    user_id: i64,
    service_id: i64,
) -> Result<Option<Favorite>, sqlx::Error> {
    sqlx::query_as::<_, Favorite>("SELECT * FROM favorites WHERE user_id = ? AND service_id = ?")
        .bind(user_id)
        .bind(service_id)
        .fetch_optional(&state.db)
        .await
}

pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(req): Json<CreateFavoriteRequest>,
) -> Result<(StatusCode, Json<Favorite>), ApiError> {
    state
        .db
        .find_service_by_id(req.service_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;

    if find_favorite(&state, principal.id, req.service_id).await?.is_some() {
        return Err(AccessError::Conflict("Service already in favorites".to_string()).into());
    }

    let favorite = sqlx::query_as::<_, Favorite>(
        "INSERT INTO favorites (user_id, service_id) VALUES (?, ?) RETURNING *",
    )
    .bind(principal.id)
    .bind(req.service_id)
    .fetch_one(&state.db)
    .await?;

    tracing::debug!(user_id = principal.id, service_id = req.service_id, "Favorite added");
    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<FavoriteWithService>>, ApiError> {
    let favorites = sqlx::query_as::<_, FavoriteWithService>(
        r#"
        SELECT f.id, f.service_id, s.title AS service_title, s.price AS service_price, f.created_at
        FROM favorites f
        LEFT JOIN services s ON s.id = f.service_id
        WHERE f.user_id = ?
        ORDER BY f.id
        "#,
    )
    .bind(principal.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(favorites))
}

pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(service_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let favorite = find_favorite(&state, principal.id, service_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Favorite not found"))?;

    sqlx::query("DELETE FROM favorites WHERE id = ?")
        .bind(favorite.id)
        .execute(&state.db)
        .await?;

    tracing::debug!(user_id = principal.id, service_id, "Favorite removed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn check_favorite(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(service_id): Path<i64>,
) -> Result<Json<FavoriteCheckResponse>, ApiError> {
    let is_favorite = find_favorite(&state, principal.id, service_id)
        .await?
        .is_some();
    Ok(Json(FavoriteCheckResponse { is_favorite }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::db::testing::{insert_account, insert_service};
    use crate::db::Role;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_favorite_lifecycle() {
        let state = test_state().await;
        let cleo = insert_account(&state.db, "cleo", Role::Client).await;
        let finn = insert_account(&state.db, "finn", Role::Freelancer).await;
        let service = insert_service(&state.db, finn.id, 60).await;
        let token = token_for(&state, &cleo);
        let check_uri = format!("/favorites/check/{}", service.id);

        let (_, body) = send(&state, empty_request(Method::GET, &check_uri, Some(&token))).await;
        assert_eq!(body["is_favorite"], false);

        let add = json!({ "service_id": service.id });
        let (status, _) = send(
            &state,
            json_request(Method::POST, "/favorites", Some(&token), add.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) =
            send(&state, json_request(Method::POST, "/favorites", Some(&token), add)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["message"], "Service already in favorites");

        let (status, body) =
            send(&state, empty_request(Method::GET, "/favorites", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["service_title"], service.title);

        let (_, body) = send(&state, empty_request(Method::GET, &check_uri, Some(&token))).await;
        assert_eq!(body["is_favorite"], true);

        let uri = format!("/favorites/{}", service.id);
        let (status, _) = send(&state, empty_request(Method::DELETE, &uri, Some(&token))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, empty_request(Method::DELETE, &uri, Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_favorite_unknown_service() {
        let state = test_state().await;
        let cleo = insert_account(&state.db, "cleo", Role::Client).await;
        let (status, _) = send(
            &state,
            json_request(
                Method::POST,
                "/favorites",
                Some(&token_for(&state, &cleo)),
                json!({ "service_id": 404 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
