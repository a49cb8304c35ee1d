use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::repository::{self, BusinessHour, Restaurant, RestaurantFilters};
use crate::modules::menu;
use crate::modules::review;
use crate::types::Context;
use crate::utils::pagination::Pagination;

const RECENT_REVIEWS: i64 = 10;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Deserialize)]
struct Filters {
    cuisine: Option<String>,
    is_open: Option<bool>,
    featured: Option<bool>,
    search: Option<String>,
}

async fn get_restaurants(
    State(ctx): State<Arc<Context>>,
    pagination: Pagination,
    Query(filters): Query<Filters>,
) -> impl IntoResponse {
    let filters = RestaurantFilters {
        // "All" is the client's way of clearing the cuisine filter.
        cuisine: filters.cuisine.filter(|cuisine| cuisine != "All"),
        is_open: filters.is_open,
        featured: filters.featured,
        search: filters.search,
    };

    match repository::find_many(&ctx.db_conn.pool, filters, pagination).await {
        Ok(restaurants) => (StatusCode::OK, Json(json!(restaurants))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch restaurants" })),
        ),
    }
}

#[derive(Serialize)]
struct CategoryWithItems {
    #[serde(flatten)]
    category: menu::repository::Category,
    menu_items: Vec<menu::repository::MenuItem>,
}

#[derive(Serialize)]
struct BusinessHourView {
    #[serde(flatten)]
    hour: BusinessHour,
    day_name: &'static str,
}

#[derive(Serialize)]
struct RestaurantDetail {
    #[serde(flatten)]
    restaurant: Restaurant,
    categories: Vec<CategoryWithItems>,
    reviews: Vec<review::repository::ReviewWithNames>,
    business_hours: Vec<BusinessHourView>,
    review_count: i64,
}

async fn get_restaurant_by_id(
    Path(id): Path<String>,
    State(ctx): State<Arc<Context>>,
) -> impl IntoResponse {
    let mut restaurant = match repository::find_by_id(&ctx.db_conn.pool, id.clone()).await {
        Ok(Some(restaurant)) => restaurant,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Restaurant not found" })),
            );
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch restaurant" })),
            );
        }
    };

    let categories =
        match menu::repository::find_active_categories_by_restaurant_id(&ctx.db_conn.pool, id.clone())
            .await
        {
            Ok(categories) => categories,
            Err(_) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch restaurant" })),
                );
            }
        };

    let items = match menu::repository::find_available_items_by_restaurant_id(
        &ctx.db_conn.pool,
        id.clone(),
    )
    .await
    {
        Ok(items) => items,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch restaurant" })),
            );
        }
    };

    let reviews = match review::repository::find_recent_by_restaurant_id(
        &ctx.db_conn.pool,
        id.clone(),
        RECENT_REVIEWS,
    )
    .await
    {
        Ok(reviews) => reviews,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch restaurant" })),
            );
        }
    };

    let business_hours =
        match repository::find_business_hours_by_restaurant_id(&ctx.db_conn.pool, id.clone()).await
        {
            Ok(hours) => hours,
            Err(_) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch restaurant" })),
                );
            }
        };

    let review_count =
        match repository::count_reviews_by_restaurant_id(&ctx.db_conn.pool, id.clone()).await {
            Ok(count) => count,
            Err(_) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch restaurant" })),
                );
            }
        };

    match repository::average_rating_by_restaurant_id(&ctx.db_conn.pool, id).await {
        Ok(Some(average)) => restaurant.rating = average,
        Ok(None) => (),
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch restaurant" })),
            );
        }
    }

    let mut items_by_category = items
        .into_iter()
        .map(|item| (item.category_id.clone(), item))
        .into_group_map();
    let categories = categories
        .into_iter()
        .map(|category| CategoryWithItems {
            menu_items: items_by_category.remove(&category.id).unwrap_or_default(),
            category,
        })
        .collect::<Vec<_>>();

    let business_hours = business_hours
        .into_iter()
        .map(|hour| BusinessHourView {
            day_name: DAY_NAMES
                .get(hour.day_of_week as usize)
                .copied()
                .unwrap_or("Unknown"),
            hour,
        })
        .collect::<Vec<_>>();

    (
        StatusCode::OK,
        Json(json!(RestaurantDetail {
            restaurant,
            categories,
            reviews,
            business_hours,
            review_count,
        })),
    )
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(get_restaurants))
        .nest("/reviews", review::get_router())
        .route("/:id", get(get_restaurant_by_id))
}
