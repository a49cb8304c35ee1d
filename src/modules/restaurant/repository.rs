use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use sqlx::PgExecutor;
use ulid::Ulid;

use crate::utils::pagination::{Paginated, Pagination};

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Restaurant {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub phone: String,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub address: Option<String>,
    pub image: Option<String>,
    pub rating: BigDecimal,
    pub estimated_time: Option<String>,
    pub is_open: bool,
    pub featured: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// Public listing row; the stored rating is replaced by the average of the
/// restaurant's review ratings whenever at least one review exists.
#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct RestaurantListing {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub address: Option<String>,
    pub image: Option<String>,
    pub rating: BigDecimal,
    pub estimated_time: Option<String>,
    pub is_open: bool,
    pub featured: bool,
    pub review_count: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct BusinessHour {
    pub id: String,
    pub restaurant_id: String,
    pub day_of_week: i32,
    pub open_time: String,
    pub close_time: String,
    pub is_closed: bool,
}

/// One optional field per supported filter dimension; `None` leaves the
/// dimension unconstrained.
#[derive(Clone, Debug, Default)]
pub struct RestaurantFilters {
    pub cuisine: Option<String>,
    pub is_open: Option<bool>,
    pub featured: Option<bool>,
    pub search: Option<String>,
}

pub struct CreateRestaurantPayload {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub async fn create<'e, E: PgExecutor<'e>>(
    e: E,
    payload: CreateRestaurantPayload,
) -> Result<Restaurant, Error> {
    sqlx::query_as::<_, Restaurant>(
        "
        INSERT INTO restaurants (id, email, password, name, phone, description, cuisine, address)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.email)
    .bind(payload.password)
    .bind(payload.name)
    .bind(payload.phone)
    .bind(payload.description)
    .bind(payload.cuisine)
    .bind(payload.address)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to create a restaurant: {}", err);
        Error::UnexpectedError
    })
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
) -> Result<Option<Restaurant>, Error> {
    sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants WHERE id = $1")
        .bind(id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to fetch restaurant by id: {}",
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_by_email<'e, E: PgExecutor<'e>>(
    e: E,
    email: String,
) -> Result<Option<Restaurant>, Error> {
    sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants WHERE email = $1")
        .bind(email)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to fetch restaurant by email: {}",
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_many<'e, E: PgExecutor<'e> + Clone>(
    e: E,
    filters: RestaurantFilters,
    pagination: Pagination,
) -> Result<Paginated<RestaurantListing>, Error> {
    let listings = sqlx::query_as::<_, RestaurantListing>(
        "
        SELECT
            restaurants.id,
            restaurants.name,
            restaurants.phone,
            restaurants.description,
            restaurants.cuisine,
            restaurants.address,
            restaurants.image,
            ROUND(COALESCE(AVG(reviews.rating), restaurants.rating), 1) AS rating,
            restaurants.estimated_time,
            restaurants.is_open,
            restaurants.featured,
            COUNT(reviews.id) AS review_count,
            restaurants.created_at
        FROM restaurants
        LEFT JOIN reviews ON reviews.restaurant_id = restaurants.id
        WHERE ($1::VARCHAR IS NULL OR restaurants.cuisine = $1)
          AND ($2::BOOLEAN IS NULL OR restaurants.is_open = $2)
          AND ($3::BOOLEAN IS NULL OR restaurants.featured = $3)
          AND (
            $4::VARCHAR IS NULL
            OR restaurants.name ILIKE '%' || $4 || '%'
            OR restaurants.description ILIKE '%' || $4 || '%'
            OR restaurants.cuisine ILIKE '%' || $4 || '%'
          )
        GROUP BY restaurants.id
        ORDER BY restaurants.featured DESC, rating DESC, restaurants.name ASC
        LIMIT $5
        OFFSET $6
        ",
    )
    .bind(filters.cuisine.clone())
    .bind(filters.is_open)
    .bind(filters.featured)
    .bind(filters.search.clone())
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(e.clone())
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to fetch many restaurants: {}",
            err
        );
        Error::UnexpectedError
    })?;

    let total = sqlx::query_scalar::<_, i64>(
        "
        SELECT COUNT(*)
        FROM restaurants
        WHERE ($1::VARCHAR IS NULL OR restaurants.cuisine = $1)
          AND ($2::BOOLEAN IS NULL OR restaurants.is_open = $2)
          AND ($3::BOOLEAN IS NULL OR restaurants.featured = $3)
          AND (
            $4::VARCHAR IS NULL
            OR restaurants.name ILIKE '%' || $4 || '%'
            OR restaurants.description ILIKE '%' || $4 || '%'
            OR restaurants.cuisine ILIKE '%' || $4 || '%'
          )
        ",
    )
    .bind(filters.cuisine)
    .bind(filters.is_open)
    .bind(filters.featured)
    .bind(filters.search)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to count restaurants: {}", err);
        Error::UnexpectedError
    })?;

    Ok(Paginated::new(
        listings,
        total as u32,
        pagination.page,
        pagination.per_page,
    ))
}

pub async fn find_business_hours_by_restaurant_id<'e, E: PgExecutor<'e>>(
    e: E,
    restaurant_id: String,
) -> Result<Vec<BusinessHour>, Error> {
    sqlx::query_as::<_, BusinessHour>(
        "SELECT * FROM business_hours WHERE restaurant_id = $1 ORDER BY day_of_week ASC",
    )
    .bind(restaurant_id)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to fetch business hours: {}",
            err
        );
        Error::UnexpectedError
    })
}

pub async fn count_reviews_by_restaurant_id<'e, E: PgExecutor<'e>>(
    e: E,
    restaurant_id: String,
) -> Result<i64, Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE restaurant_id = $1")
        .bind(restaurant_id)
        .fetch_one(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while trying to count reviews: {}", err);
            Error::UnexpectedError
        })
}

pub async fn average_rating_by_restaurant_id<'e, E: PgExecutor<'e>>(
    e: E,
    restaurant_id: String,
) -> Result<Option<BigDecimal>, Error> {
    sqlx::query_scalar::<_, Option<BigDecimal>>(
        "SELECT ROUND(AVG(rating), 1) FROM reviews WHERE restaurant_id = $1",
    )
    .bind(restaurant_id)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to compute restaurant rating: {}",
            err
        );
        Error::UnexpectedError
    })
}
