use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::repository;
use crate::modules::auth::middleware::UserAuth;
use crate::modules::restaurant;
use crate::types::Context;

async fn get_favorites(State(ctx): State<Arc<Context>>, auth: UserAuth) -> impl IntoResponse {
    match repository::find_many_by_user_id(&ctx.db_conn.pool, auth.identity.id).await {
        Ok(favorites) => (StatusCode::OK, Json(json!({ "favorites": favorites }))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch favorites" })),
        ),
    }
}

#[derive(Deserialize)]
struct AddFavoritePayload {
    restaurant_id: Option<String>,
}

async fn add_favorite(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    Json(payload): Json<AddFavoritePayload>,
) -> impl IntoResponse {
    let Some(restaurant_id) = payload.restaurant_id else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Restaurant ID is required" })),
        );
    };

    match restaurant::repository::find_by_id(&ctx.db_conn.pool, restaurant_id.clone()).await {
        Ok(Some(_)) => (),
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Restaurant not found" })),
            );
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to add to favorites" })),
            );
        }
    }

    match repository::create(&ctx.db_conn.pool, auth.identity.id, restaurant_id).await {
        Ok(favorite) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Restaurant added to favorites",
                "favorite": favorite,
            })),
        ),
        Err(repository::Error::Duplicate) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Restaurant is already in favorites" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to add to favorites" })),
        ),
    }
}

#[derive(Deserialize)]
struct RemoveFavoriteParams {
    restaurant_id: Option<String>,
}

async fn remove_favorite(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    Query(params): Query<RemoveFavoriteParams>,
) -> impl IntoResponse {
    let Some(restaurant_id) = params.restaurant_id else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Restaurant ID is required" })),
        );
    };

    match repository::delete(&ctx.db_conn.pool, auth.identity.id, restaurant_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Restaurant removed from favorites" })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Restaurant not found in favorites" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to remove from favorites" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route(
        "/",
        get(get_favorites).post(add_favorite).delete(remove_favorite),
    )
}
