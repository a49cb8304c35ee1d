use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use sqlx::PgExecutor;
use ulid::Ulid;

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct FavoriteRestaurant {
    pub id: String,
    pub user_id: String,
    pub restaurant_id: String,
    pub created_at: NaiveDateTime,
}

/// The slice of a restaurant shown on a favorites shelf.
#[derive(Serialize, Clone, Debug)]
pub struct RestaurantCard {
    pub id: String,
    pub name: String,
    pub cuisine: Option<String>,
    pub rating: BigDecimal,
    pub address: Option<String>,
    pub phone: String,
    pub description: Option<String>,
    pub estimated_time: Option<String>,
    pub is_open: bool,
    pub featured: bool,
    pub image: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct FavoriteWithRestaurant {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub restaurant: RestaurantCard,
}

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    id: String,
    created_at: NaiveDateTime,
    restaurant_id: String,
    name: String,
    cuisine: Option<String>,
    rating: BigDecimal,
    address: Option<String>,
    phone: String,
    description: Option<String>,
    estimated_time: Option<String>,
    is_open: bool,
    featured: bool,
    image: Option<String>,
}

impl From<FavoriteRow> for FavoriteWithRestaurant {
    fn from(row: FavoriteRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            restaurant: RestaurantCard {
                id: row.restaurant_id,
                name: row.name,
                cuisine: row.cuisine,
                rating: row.rating,
                address: row.address,
                phone: row.phone,
                description: row.description,
                estimated_time: row.estimated_time,
                is_open: row.is_open,
                featured: row.featured,
                image: row.image,
            },
        }
    }
}

#[derive(Debug)]
pub enum Error {
    Duplicate,
    UnexpectedError,
}

pub async fn find_many_by_user_id<'e, E: PgExecutor<'e>>(
    e: E,
    user_id: String,
) -> Result<Vec<FavoriteWithRestaurant>, Error> {
    sqlx::query_as::<_, FavoriteRow>(
        "
        SELECT
            favorite_restaurants.id,
            favorite_restaurants.created_at,
            restaurants.id AS restaurant_id,
            restaurants.name,
            restaurants.cuisine,
            restaurants.rating,
            restaurants.address,
            restaurants.phone,
            restaurants.description,
            restaurants.estimated_time,
            restaurants.is_open,
            restaurants.featured,
            restaurants.image
        FROM favorite_restaurants
        INNER JOIN restaurants ON favorite_restaurants.restaurant_id = restaurants.id
        WHERE favorite_restaurants.user_id = $1
        ORDER BY favorite_restaurants.created_at DESC
        ",
    )
    .bind(user_id)
    .fetch_all(e)
    .await
    .map(|rows| rows.into_iter().map(Into::into).collect())
    .map_err(|err| {
        tracing::error!("Error occurred while trying to fetch favorites: {}", err);
        Error::UnexpectedError
    })
}

/// The `(user_id, restaurant_id)` unique constraint decides concurrent
/// inserts; the second writer gets `Duplicate`, never a silent copy.
pub async fn create<'e, E: PgExecutor<'e>>(
    e: E,
    user_id: String,
    restaurant_id: String,
) -> Result<FavoriteRestaurant, Error> {
    sqlx::query_as::<_, FavoriteRestaurant>(
        "
        INSERT INTO favorite_restaurants (id, user_id, restaurant_id)
        VALUES ($1, $2, $3)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(user_id)
    .bind(restaurant_id)
    .fetch_one(e)
    .await
    .map_err(|err| {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return Error::Duplicate;
            }
        }
        tracing::error!("Error occurred while trying to create a favorite: {}", err);
        Error::UnexpectedError
    })
}

pub async fn delete<'e, E: PgExecutor<'e>>(
    e: E,
    user_id: String,
    restaurant_id: String,
) -> Result<bool, Error> {
    sqlx::query("DELETE FROM favorite_restaurants WHERE user_id = $1 AND restaurant_id = $2")
        .bind(user_id)
        .bind(restaurant_id)
        .execute(e)
        .await
        .map(|result| result.rows_affected() > 0)
        .map_err(|err| {
            tracing::error!("Error occurred while trying to delete a favorite: {}", err);
            Error::UnexpectedError
        })
}
