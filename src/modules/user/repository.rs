use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use ulid::Ulid;

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

pub struct CreateUserPayload {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub async fn create<'e, E: PgExecutor<'e>>(e: E, payload: CreateUserPayload) -> Result<User, Error> {
    sqlx::query_as::<_, User>(
        "
        INSERT INTO users (id, email, password, name, phone, address)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.email)
    .bind(payload.password)
    .bind(payload.name)
    .bind(payload.phone)
    .bind(payload.address)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to create a user: {}", err);
        Error::UnexpectedError
    })
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<Option<User>, Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while trying to fetch user by id: {}", err);
            Error::UnexpectedError
        })
}

pub async fn find_by_email<'e, E: PgExecutor<'e>>(
    e: E,
    email: String,
) -> Result<Option<User>, Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while trying to fetch user by email: {}", err);
            Error::UnexpectedError
        })
}
