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
use crate::modules::auth::middleware::{Auth, UserAuth};
use crate::modules::auth::service::token::IdentityKind;
use crate::modules::restaurant;
use crate::types::Context;
use crate::utils::pagination::Pagination;

#[derive(Deserialize)]
struct Filters {
    restaurant_id: Option<String>,
}

async fn get_reviews(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    pagination: Pagination,
    Query(filters): Query<Filters>,
) -> impl IntoResponse {
    // A restaurant identity only ever sees reviews of its own restaurant.
    let filters = match auth.identity.kind {
        IdentityKind::Restaurant => repository::ReviewFilters {
            restaurant_id: Some(auth.identity.id.clone()),
        },
        IdentityKind::User => repository::ReviewFilters {
            restaurant_id: filters.restaurant_id,
        },
    };

    match repository::find_many(&ctx.db_conn.pool, filters, pagination).await {
        Ok(reviews) => (StatusCode::OK, Json(json!(reviews))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch reviews" })),
        ),
    }
}

#[derive(Deserialize)]
struct CreateReviewPayload {
    restaurant_id: Option<String>,
    rating: Option<i32>,
    comment: Option<String>,
    order_id: Option<String>,
}

async fn create_review(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    Json(payload): Json<CreateReviewPayload>,
) -> impl IntoResponse {
    let (Some(restaurant_id), Some(rating)) = (payload.restaurant_id, payload.rating) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Restaurant ID and rating are required" })),
        );
    };

    if !(1..=5).contains(&rating) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Rating must be between 1 and 5" })),
        );
    }

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
                Json(json!({ "error": "Failed to create review" })),
            );
        }
    }

    match repository::create(
        &ctx.db_conn.pool,
        repository::CreateReviewPayload {
            rating,
            comment: payload.comment,
            user_id: auth.identity.id,
            restaurant_id,
            order_id: payload.order_id,
        },
    )
    .await
    {
        Ok(review) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Review created successfully",
                "review": review,
            })),
        ),
        Err(repository::Error::Duplicate) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "You have already reviewed this restaurant" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create review" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/", get(get_reviews).post(create_review))
}
