use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::{BigDecimal, Json};
use sqlx::PgExecutor;

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub restaurant_id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Nutrition {
    pub calories: i32,
    pub protein: i32,
    pub carbs: i32,
    pub fat: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub original_price: Option<BigDecimal>,
    pub discount: i32,
    pub image: Option<String>,
    pub is_available: bool,
    pub is_featured: bool,
    pub sort_order: i32,
    pub allergens: Json<Vec<String>>,
    pub nutrition: Option<Json<Nutrition>>,
    pub category_id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub async fn find_many_by_ids<'e, E: PgExecutor<'e>>(
    e: E,
    ids: Vec<String>,
) -> Result<Vec<MenuItem>, Error> {
    sqlx::query_as::<_, MenuItem>("SELECT * FROM menu_items WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to fetch menu items by ids: {}",
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_active_categories_by_restaurant_id<'e, E: PgExecutor<'e>>(
    e: E,
    restaurant_id: String,
) -> Result<Vec<Category>, Error> {
    sqlx::query_as::<_, Category>(
        "
        SELECT * FROM categories
        WHERE restaurant_id = $1 AND is_active = TRUE
        ORDER BY sort_order ASC
        ",
    )
    .bind(restaurant_id)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to fetch categories: {}", err);
        Error::UnexpectedError
    })
}

pub async fn find_available_items_by_restaurant_id<'e, E: PgExecutor<'e>>(
    e: E,
    restaurant_id: String,
) -> Result<Vec<MenuItem>, Error> {
    sqlx::query_as::<_, MenuItem>(
        "
        SELECT menu_items.* FROM menu_items
        INNER JOIN categories ON menu_items.category_id = categories.id
        WHERE categories.restaurant_id = $1
          AND categories.is_active = TRUE
          AND menu_items.is_available = TRUE
        ORDER BY menu_items.sort_order ASC
        ",
    )
    .bind(restaurant_id)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to fetch menu items: {}", err);
        Error::UnexpectedError
    })
}
