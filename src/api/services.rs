use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_duration, validate_price, validate_title};
use crate::auth::{authorize, policy, Principal};
use crate::db::{CreateServiceRequest, Service, ServiceStore, UpdateServiceRequest};
use crate::AppState;

async fn service_or_404(state: &AppState, id: i64) -> Result<Service, ApiError> {
    state
        .db
        .find_service_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))
}

/// Catalogue listing for admins and freelancers
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<Service>>, ApiError> {
    authorize(&principal, &policy::SERVICE_VIEWERS, None)
        .map_err(|_| ApiError::forbidden("Not authorized to view services"))?;

    let services = sqlx::query_as::<_, Service>("SELECT * FROM services ORDER BY created_at DESC, id DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(services))
}

pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Service>, ApiError> {
    Ok(Json(service_or_404(&state, id).await?))
}

/// Publish a service owned by the caller
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(req): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    authorize(&principal, &policy::SERVICE_AUTHORS, None)
        .map_err(|_| ApiError::forbidden("Only freelancers and admins can create services"))?;

    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("title", validate_title(&req.title))
        .check("price", validate_price(req.price))
        .check("duration", validate_duration(req.duration));
    errors.finish()?;

    let service = sqlx::query_as::<_, Service>(
        r#"
        INSERT INTO services (freelancer_id, title, description, price, duration, created_by_role)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(principal.id)
    .bind(req.title.trim())
    .bind(req.description.unwrap_or_default())
    .bind(req.price)
    .bind(req.duration)
    .bind(principal.role)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(service_id = service.id, user_id = principal.id, "Service created");
    Ok((StatusCode::CREATED, Json(service)))
}

/// Partial update by an admin or the owning freelancer
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i64>,
    Json(req): Json<UpdateServiceRequest>,
) -> Result<Json<Service>, ApiError> {
    let mut service = service_or_404(&state, id).await?;
    authorize(&principal, &policy::SERVICE_EDITORS, Some(&service))?;

    let mut errors = ValidationErrorBuilder::new();
    if let Some(title) = &req.title {
        errors.check("title", validate_title(title));
    }
    if let Some(price) = req.price {
        errors.check("price", validate_price(price));
    }
    if let Some(duration) = req.duration {
        errors.check("duration", validate_duration(duration));
    }
    errors.finish()?;

    if let Some(title) = req.title {
        service.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        service.description = description;
    }
    if let Some(price) = req.price {
        service.price = price;
    }
    if let Some(duration) = req.duration {
        service.duration = duration;
    }

    let service = sqlx::query_as::<_, Service>(
        r#"
        UPDATE services SET title = ?, description = ?, price = ?, duration = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&service.title)
    .bind(&service.description)
    .bind(service.price)
    .bind(service.duration)
    .bind(service.id)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(service_id = id, user_id = principal.id, "Service updated");
    Ok(Json(service))
}

pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let service = service_or_404(&state, id).await?;
    authorize(&principal, &policy::ADMIN_ONLY, None)
        .map_err(|_| ApiError::forbidden("Only admins can delete services"))?;

    sqlx::query("DELETE FROM services WHERE id = ?")
        .bind(service.id)
        .execute(&state.db)
        .await?;

    tracing::info!(service_id = id, user_id = principal.id, "Service deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::db::testing::{insert_account, insert_service};
    use crate::db::Role;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_service_records_owner_and_role() {
        let state = test_state().await;
        let freelancer = insert_account(&state.db, "finn", Role::Freelancer).await;
        let token = token_for(&state, &freelancer);

        let (status, body) = send(
            &state,
            json_request(
                Method::POST,
                "/services",
                Some(&token),
                json!({ "title": "Logo design", "price": 120.0, "duration": 90 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["freelancer_id"], freelancer.id);
        assert_eq!(body["created_by_role"], "freelancer");
        assert_eq!(body["description"], "");
    }

    #[tokio::test]
    async fn test_clients_cannot_create_or_list_services() {
        let state = test_state().await;
        let client = insert_account(&state.db, "cleo", Role::Client).await;
        let token = token_for(&state, &client);

        let (status, _) = send(
            &state,
            json_request(
                Method::POST,
                "/services",
                Some(&token),
                json!({ "title": "Nope", "price": 1.0, "duration": 30 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&state, empty_request(Method::GET, "/services", Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_get_service_is_public() {
        let state = test_state().await;
        let freelancer = insert_account(&state.db, "finn", Role::Freelancer).await;
        let service = insert_service(&state.db, freelancer.id, 60).await;

        let uri = format!("/services/{}", service.id);
        let (status, body) = send(&state, empty_request(Method::GET, &uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], service.id);

        let (status, _) = send(&state, empty_request(Method::GET, "/services/999", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_service_owner_or_admin() {
        let state = test_state().await;
        let owner = insert_account(&state.db, "finn", Role::Freelancer).await;
        let other = insert_account(&state.db, "fay", Role::Freelancer).await;
        let admin = insert_account(&state.db, "ada", Role::Admin).await;
        let service = insert_service(&state.db, owner.id, 60).await;
        let uri = format!("/services/{}", service.id);

        let (status, _) = send(
            &state,
            json_request(Method::PUT, &uri, Some(&token_for(&state, &other)), json!({ "price": 1.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &state,
            json_request(Method::PUT, &uri, Some(&token_for(&state, &owner)), json!({ "price": 99.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], 99.5);
        assert_eq!(body["title"], service.title);

        let (status, body) = send(
            &state,
            json_request(
                Method::PUT,
                &uri,
                Some(&token_for(&state, &admin)),
                json!({ "duration": 45 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["duration"], 45);
    }

    #[tokio::test]
    async fn test_delete_service_admin_only() {
        let state = test_state().await;
        let owner = insert_account(&state.db, "finn", Role::Freelancer).await;
        let admin = insert_account(&state.db, "ada", Role::Admin).await;
        let service = insert_service(&state.db, owner.id, 60).await;
        let uri = format!("/services/{}", service.id);

        let (status, _) =
            send(&state, empty_request(Method::DELETE, &uri, Some(&token_for(&state, &owner)))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) =
            send(&state, empty_request(Method::DELETE, &uri, Some(&token_for(&state, &admin)))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) =
            send(&state, empty_request(Method::DELETE, &uri, Some(&token_for(&state, &admin)))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
