use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::lifecycle::{OrderStatus, PaymentStatus};
use super::{repository, service};
use crate::modules::auth::middleware::{Auth, UserAuth};
use crate::modules::auth::service::token::IdentityKind;
use crate::modules::{restaurant, user};
use crate::types::Context;
use crate::utils::pagination::{Paginated, Pagination};

#[derive(Serialize)]
struct OrderWithItems {
    #[serde(flatten)]
    order: repository::Order,
    items: Vec<repository::FullOrderItem>,
}

#[derive(Serialize)]
struct CustomerCard {
    name: String,
    email: String,
    phone: String,
}

#[derive(Serialize)]
struct VenueCard {
    name: String,
    phone: String,
}

#[derive(Serialize)]
struct OrderDetail {
    #[serde(flatten)]
    order: repository::Order,
    items: Vec<repository::FullOrderItem>,
    user: CustomerCard,
    restaurant: VenueCard,
}

fn is_owner(order: &repository::Order, auth: &Auth) -> bool {
    match auth.identity.kind {
        IdentityKind::User => order.user_id == auth.identity.id,
        IdentityKind::Restaurant => order.restaurant_id == auth.identity.id,
    }
}

fn default_quantity() -> i32 {
    1
}

#[derive(Deserialize)]
struct CreateOrderItemPayload {
    menu_item_id: String,
    #[serde(default = "default_quantity")]
    quantity: i32,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct CreateOrderPayload {
    restaurant_id: Option<String>,
    items: Option<Vec<CreateOrderItemPayload>>,
    booking_date_time: Option<DateTime<Utc>>,
    guests: Option<i32>,
    special_requests: Option<String>,
}

async fn create_order(
    State(ctx): State<Arc<Context>>,
    auth: UserAuth,
    Json(payload): Json<CreateOrderPayload>,
) -> impl IntoResponse {
    let (Some(restaurant_id), Some(items), Some(booking_date_time)) = (
        payload.restaurant_id,
        payload.items,
        payload.booking_date_time,
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing required fields" })),
        );
    };

    let items = items
        .into_iter()
        .map(|item| service::CreateOrderItem {
            menu_item_id: item.menu_item_id,
            quantity: item.quantity,
            notes: item.notes,
        })
        .collect();

    match service::create_order(
        ctx,
        service::CreateOrderPayload {
            restaurant_id,
            items,
            booking_date_time: booking_date_time.naive_utc(),
            guests: payload.guests.unwrap_or(1),
            special_requests: payload.special_requests,
            user_id: auth.identity.id,
        },
    )
    .await
    {
        Ok((order, items)) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Order created successfully",
                "order": OrderWithItems { order, items },
            })),
        ),
        Err(service::CreateOrderError::RestaurantNotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Restaurant not found" })),
        ),
        Err(service::CreateOrderError::RestaurantClosed) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Restaurant is currently closed" })),
        ),
        Err(service::CreateOrderError::EmptyOrder) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Order must contain at least one item" })),
        ),
        Err(service::CreateOrderError::InvalidQuantity) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Item quantity must be at least 1" })),
        ),
        Err(service::CreateOrderError::InvalidGuestCount) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Guest count must be at least 1" })),
        ),
        Err(service::CreateOrderError::MenuItemUnavailable(name)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Menu item {} is not available", name) })),
        ),
        Err(service::CreateOrderError::OrderNumberCollision) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Failed to allocate a unique order number" })),
        ),
        Err(service::CreateOrderError::UnexpectedError) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create order" })),
        ),
    }
}

#[derive(Deserialize)]
struct Filters {
    status: Option<String>,
}

async fn get_orders(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    pagination: Pagination,
    Query(filters): Query<Filters>,
) -> impl IntoResponse {
    let status = match filters.status.as_deref() {
        None | Some("all") => None,
        Some(raw) => match raw.parse::<OrderStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Invalid status" })),
                );
            }
        },
    };

    // Callers only ever see their own side of the ledger.
    let filters = match auth.identity.kind {
        IdentityKind::User => repository::OrderFilters {
            status,
            user_id: Some(auth.identity.id.clone()),
            restaurant_id: None,
        },
        IdentityKind::Restaurant => repository::OrderFilters {
            status,
            user_id: None,
            restaurant_id: Some(auth.identity.id.clone()),
        },
    };

    let orders = match repository::find_many(&ctx.db_conn.pool, filters, pagination).await {
        Ok(orders) => orders,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch orders" })),
            );
        }
    };

    let order_ids = orders
        .items
        .iter()
        .map(|order| order.id.clone())
        .collect::<Vec<_>>();
    let mut items_by_order =
        match repository::find_full_items_by_order_ids(&ctx.db_conn.pool, order_ids).await {
            Ok(items) => items
                .into_iter()
                .map(|item| (item.order_id.clone(), item))
                .into_group_map(),
            Err(_) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch orders" })),
                );
            }
        };

    let meta = orders.meta.clone();
    let orders = orders
        .items
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems { order, items }
        })
        .collect::<Vec<_>>();

    (
        StatusCode::OK,
        Json(json!(Paginated::new(
            orders,
            meta.total,
            meta.page,
            meta.per_page
        ))),
    )
}

async fn get_order_by_id(
    Path(id): Path<String>,
    State(ctx): State<Arc<Context>>,
    auth: Auth,
) -> impl IntoResponse {
    let order = match repository::find_by_id(&ctx.db_conn.pool, id).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Order not found" })),
            );
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch order" })),
            );
        }
    };

    if !is_owner(&order, &auth) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Unauthorized" })),
        );
    }

    let items =
        match repository::find_full_items_by_order_id(&ctx.db_conn.pool, order.id.clone()).await {
            Ok(items) => items,
            Err(_) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch order" })),
                );
            }
        };

    let customer = match user::repository::find_by_id(&ctx.db_conn.pool, order.user_id.clone())
        .await
    {
        Ok(Some(customer)) => customer,
        _ => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch order owner" })),
            );
        }
    };

    let venue =
        match restaurant::repository::find_by_id(&ctx.db_conn.pool, order.restaurant_id.clone())
            .await
        {
            Ok(Some(venue)) => venue,
            _ => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch order restaurant" })),
                );
            }
        };

    let detail = OrderDetail {
        order,
        items,
        user: CustomerCard {
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
        },
        restaurant: VenueCard {
            name: venue.name,
            phone: venue.phone,
        },
    };

    (StatusCode::OK, Json(json!({ "order": detail })))
}

#[derive(Deserialize)]
struct UpdateOrderPayload {
    status: Option<String>,
    payment_status: Option<String>,
}

async fn update_order(
    Path(id): Path<String>,
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Json(payload): Json<UpdateOrderPayload>,
) -> impl IntoResponse {
    // Both enum values are validated before anything is read or written.
    let status = match payload.status.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<OrderStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Invalid status" })),
                );
            }
        },
    };
    let payment_status = match payload.payment_status.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<PaymentStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Invalid payment status" })),
                );
            }
        },
    };

    let order = match repository::find_by_id(&ctx.db_conn.pool, id).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Order not found" })),
            );
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch order" })),
            );
        }
    };

    if !is_owner(&order, &auth) {
        let message = match auth.identity.kind {
            IdentityKind::User => "Can only update your own orders",
            IdentityKind::Restaurant => "Can only update orders for your restaurant",
        };
        return (StatusCode::FORBIDDEN, Json(json!({ "error": message })));
    }

    if let Some(next) = status {
        if !order.status.can_transition_to(next) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid status transition" })),
            );
        }
    }

    if let Some(next) = payment_status {
        if !order.payment_status.can_transition_to(next) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid payment status transition" })),
            );
        }
    }

    let updated = match repository::update_by_id(
        &ctx.db_conn.pool,
        order.id.clone(),
        repository::UpdateOrderPayload {
            status,
            payment_status,
        },
    )
    .await
    {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Order not found" })),
            );
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to update order" })),
            );
        }
    };

    let items =
        match repository::find_full_items_by_order_id(&ctx.db_conn.pool, updated.id.clone()).await
        {
            Ok(items) => items,
            Err(_) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to update order" })),
                );
            }
        };

    (
        StatusCode::OK,
        Json(json!({
            "message": "Order updated successfully",
            "order": OrderWithItems {
                order: updated,
                items,
            },
        })),
    )
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", post(create_order).get(get_orders))
        .route("/:id", get(get_order_by_id).patch(update_order))
}
