use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgTypeInfo, PgValueRef};
use sqlx::types::BigDecimal;
use sqlx::{PgExecutor, Postgres, Transaction};
use ulid::Ulid;

use super::lifecycle::{OrderStatus, PaymentStatus};
use crate::utils::pagination::{Paginated, Pagination};

// Status columns are plain VARCHAR; decode through FromStr so an unknown
// value in the database surfaces as a column-decode error instead of a
// panic.
impl sqlx::Type<Postgres> for OrderStatus {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, Postgres> for OrderStatus {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let value = <&str as sqlx::Decode<Postgres>>::decode(value)?;
        value.parse::<OrderStatus>().map_err(Into::into)
    }
}

impl sqlx::Type<Postgres> for PaymentStatus {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, Postgres> for PaymentStatus {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let value = <&str as sqlx::Decode<Postgres>>::decode(value)?;
        value.parse::<PaymentStatus>().map_err(Into::into)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: BigDecimal,
    pub platform_fee: BigDecimal,
    pub total: BigDecimal,
    pub booking_date_time: NaiveDateTime,
    pub guests: i32,
    pub special_requests: Option<String>,
    pub user_id: String,
    pub restaurant_id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// An order line joined with the menu item it snapshotted.
#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct FullOrderItem {
    pub id: String,
    pub order_id: String,
    pub menu_item_id: String,
    pub quantity: i32,
    pub price: BigDecimal,
    pub discount: i32,
    pub notes: Option<String>,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct OrderFilters {
    pub status: Option<OrderStatus>,
    pub user_id: Option<String>,
    pub restaurant_id: Option<String>,
}

#[derive(Clone)]
pub struct CreateOrderItemPayload {
    pub menu_item_id: String,
    pub quantity: i32,
    pub price: BigDecimal,
    pub discount: i32,
    pub notes: Option<String>,
}

pub struct CreateOrderPayload {
    pub order_number: String,
    pub subtotal: BigDecimal,
    pub platform_fee: BigDecimal,
    pub total: BigDecimal,
    pub booking_date_time: NaiveDateTime,
    pub guests: i32,
    pub special_requests: Option<String>,
    pub user_id: String,
    pub restaurant_id: String,
    pub items: Vec<CreateOrderItemPayload>,
}

#[derive(Debug)]
pub enum Error {
    DuplicateOrderNumber,
    UnexpectedError,
}

fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

/// Inserts the order and all of its items inside the supplied transaction;
/// a failure on any row leaves nothing behind once the caller rolls back.
pub async fn create(
    tx: &mut Transaction<'_, Postgres>,
    payload: CreateOrderPayload,
) -> Result<Order, Error> {
    let order = sqlx::query_as::<_, Order>(
        "
        INSERT INTO orders (
            id,
            order_number,
            status,
            payment_status,
            subtotal,
            platform_fee,
            total,
            booking_date_time,
            guests,
            special_requests,
            user_id,
            restaurant_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.order_number)
    .bind(OrderStatus::Pending.to_string())
    .bind(PaymentStatus::Pending.to_string())
    .bind(payload.subtotal)
    .bind(payload.platform_fee)
    .bind(payload.total)
    .bind(payload.booking_date_time)
    .bind(payload.guests)
    .bind(payload.special_requests)
    .bind(payload.user_id)
    .bind(payload.restaurant_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(|err| {
        if is_unique_violation(&err, "orders_order_number_key") {
            return Error::DuplicateOrderNumber;
        }
        tracing::error!("Error occurred while trying to create an order: {}", err);
        Error::UnexpectedError
    })?;

    for item in payload.items {
        sqlx::query(
            "
            INSERT INTO order_items (id, order_id, menu_item_id, quantity, price, discount, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(Ulid::new().to_string())
        .bind(order.id.clone())
        .bind(item.menu_item_id)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.discount)
        .bind(item.notes)
        .execute(&mut **tx)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while trying to create an order item: {}", err);
            Error::UnexpectedError
        })?;
    }

    Ok(order)
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<Option<Order>, Error> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while trying to fetch order by id: {}", err);
            Error::UnexpectedError
        })
}

pub async fn find_many<'e, E: PgExecutor<'e> + Clone>(
    e: E,
    filters: OrderFilters,
    pagination: Pagination,
) -> Result<Paginated<Order>, Error> {
    let status = filters.status.map(|status| status.to_string());

    let orders = sqlx::query_as::<_, Order>(
        "
        SELECT * FROM orders
        WHERE ($1::VARCHAR IS NULL OR status = $1)
          AND ($2::VARCHAR IS NULL OR user_id = $2)
          AND ($3::VARCHAR IS NULL OR restaurant_id = $3)
        ORDER BY created_at DESC
        LIMIT $4
        OFFSET $5
        ",
    )
    .bind(status.clone())
    .bind(filters.user_id.clone())
    .bind(filters.restaurant_id.clone())
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(e.clone())
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to fetch many orders: {}", err);
        Error::UnexpectedError
    })?;

    let total = sqlx::query_scalar::<_, i64>(
        "
        SELECT COUNT(*) FROM orders
        WHERE ($1::VARCHAR IS NULL OR status = $1)
          AND ($2::VARCHAR IS NULL OR user_id = $2)
          AND ($3::VARCHAR IS NULL OR restaurant_id = $3)
        ",
    )
    .bind(status)
    .bind(filters.user_id)
    .bind(filters.restaurant_id)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to count orders: {}", err);
        Error::UnexpectedError
    })?;

    Ok(Paginated::new(
        orders,
        total as u32,
        pagination.page,
        pagination.per_page,
    ))
}

pub async fn find_full_items_by_order_id<'e, E: PgExecutor<'e>>(
    e: E,
    order_id: String,
) -> Result<Vec<FullOrderItem>, Error> {
    sqlx::query_as::<_, FullOrderItem>(
        "
        SELECT
            order_items.id,
            order_items.order_id,
            order_items.menu_item_id,
            order_items.quantity,
            order_items.price,
            order_items.discount,
            order_items.notes,
            menu_items.name,
            menu_items.description
        FROM order_items
        INNER JOIN menu_items ON order_items.menu_item_id = menu_items.id
        WHERE order_items.order_id = $1
        ",
    )
    .bind(order_id)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to fetch order items by order id: {}",
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_full_items_by_order_ids<'e, E: PgExecutor<'e>>(
    e: E,
    order_ids: Vec<String>,
) -> Result<Vec<FullOrderItem>, Error> {
    sqlx::query_as::<_, FullOrderItem>(
        "
        SELECT
            order_items.id,
            order_items.order_id,
            order_items.menu_item_id,
            order_items.quantity,
            order_items.price,
            order_items.discount,
            order_items.notes,
            menu_items.name,
            menu_items.description
        FROM order_items
        INNER JOIN menu_items ON order_items.menu_item_id = menu_items.id
        WHERE order_items.order_id = ANY($1)
        ",
    )
    .bind(order_ids)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to fetch order items by order ids: {}",
            err
        );
        Error::UnexpectedError
    })
}

pub struct UpdateOrderPayload {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

pub async fn update_by_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    payload: UpdateOrderPayload,
) -> Result<Option<Order>, Error> {
    sqlx::query_as::<_, Order>(
        "
        UPDATE orders SET
            status = COALESCE($2, status),
            payment_status = COALESCE($3, payment_status),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id)
    .bind(payload.status.map(|status| status.to_string()))
    .bind(payload.payment_status.map(|status| status.to_string()))
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to update order by id: {}", err);
        Error::UnexpectedError
    })
}
