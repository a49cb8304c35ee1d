use chrono::{NaiveDateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use ulid::Ulid;

use super::{pricing, repository};
use crate::modules::{menu, restaurant};
use crate::types::Context;

const ORDER_NUMBER_ATTEMPTS: u32 = 3;

/// `ORD-<creation millis>-<random suffix>`; the suffix is the random tail of
/// a fresh ULID, so collisions require two orders in the same millisecond
/// drawing the same 9 characters.
fn generate_order_number() -> String {
    let ulid = Ulid::new().to_string();
    let suffix = &ulid[ulid.len() - 9..];
    format!("ORD-{}-{}", Utc::now().timestamp_millis(), suffix)
}

pub struct CreateOrderItem {
    pub menu_item_id: String,
    pub quantity: i32,
    pub notes: Option<String>,
}

pub struct CreateOrderPayload {
    pub restaurant_id: String,
    pub items: Vec<CreateOrderItem>,
    pub booking_date_time: NaiveDateTime,
    pub guests: i32,
    pub special_requests: Option<String>,
    pub user_id: String,
}

pub enum CreateOrderError {
    RestaurantNotFound,
    RestaurantClosed,
    EmptyOrder,
    InvalidQuantity,
    InvalidGuestCount,
    MenuItemUnavailable(String),
    OrderNumberCollision,
    UnexpectedError,
}

pub async fn create_order(
    ctx: Arc<Context>,
    payload: CreateOrderPayload,
) -> Result<(repository::Order, Vec<repository::FullOrderItem>), CreateOrderError> {
    if payload.items.is_empty() {
        return Err(CreateOrderError::EmptyOrder);
    }

    if payload.items.iter().any(|item| item.quantity < 1) {
        return Err(CreateOrderError::InvalidQuantity);
    }

    if payload.guests < 1 {
        return Err(CreateOrderError::InvalidGuestCount);
    }

    let restaurant =
        restaurant::repository::find_by_id(&ctx.db_conn.pool, payload.restaurant_id.clone())
            .await
            .map_err(|_| CreateOrderError::UnexpectedError)?
            .ok_or(CreateOrderError::RestaurantNotFound)?;

    if !restaurant.is_open {
        return Err(CreateOrderError::RestaurantClosed);
    }

    // Every line is priced against the live menu; one missing or
    // unavailable item rejects the whole order.
    let menu_item_ids = payload
        .items
        .iter()
        .map(|item| item.menu_item_id.clone())
        .collect::<Vec<_>>();
    let menu_items = menu::repository::find_many_by_ids(&ctx.db_conn.pool, menu_item_ids)
        .await
        .map_err(|_| CreateOrderError::UnexpectedError)?
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect::<HashMap<_, _>>();

    let mut item_payloads = Vec::with_capacity(payload.items.len());
    let mut line_items = Vec::with_capacity(payload.items.len());

    for item in &payload.items {
        let menu_item = match menu_items.get(&item.menu_item_id) {
            Some(menu_item) if menu_item.is_available => menu_item,
            Some(menu_item) => {
                return Err(CreateOrderError::MenuItemUnavailable(menu_item.name.clone()))
            }
            None => {
                return Err(CreateOrderError::MenuItemUnavailable(
                    item.menu_item_id.clone(),
                ))
            }
        };

        line_items.push(pricing::LineItem {
            unit_price: menu_item.price.clone(),
            quantity: item.quantity,
            discount: menu_item.discount,
        });
        item_payloads.push(repository::CreateOrderItemPayload {
            menu_item_id: menu_item.id.clone(),
            quantity: item.quantity,
            price: menu_item.price.clone(),
            discount: menu_item.discount,
            notes: item.notes.clone(),
        });
    }

    let subtotal = pricing::round_money(pricing::subtotal(&line_items));
    let platform_fee = pricing::platform_fee(&subtotal);
    let total = pricing::total(&subtotal, &platform_fee);

    // Order and items are written in one transaction; a duplicate order
    // number aborts the whole insert and gets retried with a fresh number.
    for _attempt in 0..ORDER_NUMBER_ATTEMPTS {
        let mut tx = ctx.db_conn.pool.begin().await.map_err(|err| {
            tracing::error!("Failed to start database transaction: {}", err);
            CreateOrderError::UnexpectedError
        })?;

        let result = repository::create(
            &mut tx,
            repository::CreateOrderPayload {
                order_number: generate_order_number(),
                subtotal: subtotal.clone(),
                platform_fee: platform_fee.clone(),
                total: total.clone(),
                booking_date_time: payload.booking_date_time,
                guests: payload.guests,
                special_requests: payload.special_requests.clone(),
                user_id: payload.user_id.clone(),
                restaurant_id: payload.restaurant_id.clone(),
                items: item_payloads.clone(),
            },
        )
        .await;

        match result {
            Ok(order) => {
                tx.commit().await.map_err(|err| {
                    tracing::error!("Failed to commit database transaction: {}", err);
                    CreateOrderError::UnexpectedError
                })?;

                let items =
                    repository::find_full_items_by_order_id(&ctx.db_conn.pool, order.id.clone())
                        .await
                        .map_err(|_| CreateOrderError::UnexpectedError)?;

                return Ok((order, items));
            }
            Err(repository::Error::DuplicateOrderNumber) => {
                let _ = tx.rollback().await;
                tracing::warn!("Order number collision, retrying with a fresh number");
            }
            Err(_) => {
                let _ = tx.rollback().await;
                return Err(CreateOrderError::UnexpectedError);
            }
        }
    }

    Err(CreateOrderError::OrderNumberCollision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_shape() {
        let number = generate_order_number();
        let mut segments = number.split('-');

        assert_eq!(segments.next(), Some("ORD"));

        let millis = segments.next().unwrap();
        assert!(millis.parse::<i64>().is_ok());

        let suffix = segments.next().unwrap();
        assert_eq!(suffix.len(), 9);
        assert!(segments.next().is_none());
    }

    #[test]
    fn order_numbers_differ() {
        assert_ne!(generate_order_number(), generate_order_number());
    }
}
