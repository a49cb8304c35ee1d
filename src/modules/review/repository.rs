use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use ulid::Ulid;

use crate::utils::pagination::{Paginated, Pagination};

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Review {
    pub id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub user_id: String,
    pub restaurant_id: String,
    pub order_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// A review joined with the display names on both sides.
#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct ReviewWithNames {
    pub id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub order_id: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Default)]
pub struct ReviewFilters {
    pub restaurant_id: Option<String>,
}

pub struct CreateReviewPayload {
    pub rating: i32,
    pub comment: Option<String>,
    pub user_id: String,
    pub restaurant_id: String,
    pub order_id: Option<String>,
}

#[derive(Debug)]
pub enum Error {
    Duplicate,
    UnexpectedError,
}

pub async fn find_many<'e, E: PgExecutor<'e> + Clone>(
    e: E,
    filters: ReviewFilters,
    pagination: Pagination,
) -> Result<Paginated<ReviewWithNames>, Error> {
    let reviews = sqlx::query_as::<_, ReviewWithNames>(
        "
        SELECT
            reviews.id,
            reviews.rating,
            reviews.comment,
            reviews.user_id,
            users.name AS user_name,
            reviews.restaurant_id,
            restaurants.name AS restaurant_name,
            reviews.order_id,
            reviews.created_at
        FROM reviews
        INNER JOIN users ON reviews.user_id = users.id
        INNER JOIN restaurants ON reviews.restaurant_id = restaurants.id
        WHERE ($1::VARCHAR IS NULL OR reviews.restaurant_id = $1)
        ORDER BY reviews.created_at DESC
        LIMIT $2
        OFFSET $3
        ",
    )
    .bind(filters.restaurant_id.clone())
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(e.clone())
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to fetch many reviews: {}", err);
        Error::UnexpectedError
    })?;

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM reviews WHERE ($1::VARCHAR IS NULL OR restaurant_id = $1)",
    )
    .bind(filters.restaurant_id)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to count reviews: {}", err);
        Error::UnexpectedError
    })?;

    Ok(Paginated::new(
        reviews,
        total as u32,
        pagination.page,
        pagination.per_page,
    ))
}

pub async fn find_recent_by_restaurant_id<'e, E: PgExecutor<'e>>(
    e: E,
    restaurant_id: String,
    limit: i64,
) -> Result<Vec<ReviewWithNames>, Error> {
    sqlx::query_as::<_, ReviewWithNames>(
        "
        SELECT
            reviews.id,
            reviews.rating,
            reviews.comment,
            reviews.user_id,
            users.name AS user_name,
            reviews.restaurant_id,
            restaurants.name AS restaurant_name,
            reviews.order_id,
            reviews.created_at
        FROM reviews
        INNER JOIN users ON reviews.user_id = users.id
        INNER JOIN restaurants ON reviews.restaurant_id = restaurants.id
        WHERE reviews.restaurant_id = $1
        ORDER BY reviews.created_at DESC
        LIMIT $2
        ",
    )
    .bind(restaurant_id)
    .bind(limit)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to fetch recent reviews: {}",
            err
        );
        Error::UnexpectedError
    })
}

/// One review per `(user, restaurant)`; the unique constraint settles
/// concurrent submissions.
pub async fn create<'e, E: PgExecutor<'e>>(
    e: E,
    payload: CreateReviewPayload,
) -> Result<Review, Error> {
    sqlx::query_as::<_, Review>(
        "
        INSERT INTO reviews (id, rating, comment, user_id, restaurant_id, order_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.rating)
    .bind(payload.comment)
    .bind(payload.user_id)
    .bind(payload.restaurant_id)
    .bind(payload.order_id)
    .fetch_one(e)
    .await
    .map_err(|err| {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return Error::Duplicate;
            }
        }
        tracing::error!("Error occurred while trying to create a review: {}", err);
        Error::UnexpectedError
    })
}
