use super::service::{
    credentials,
    token::{self, Identity, IdentityKind, Role, TOKEN_LIFETIME_DAYS},
};
use crate::modules::{restaurant, user};
use crate::types::{AppEnvironment, Context};
use crate::utils;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

#[derive(Deserialize, Validate)]
struct RegisterPayload {
    email: Option<String>,
    password: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[validate(custom(function = "utils::validation::validate_phone_number"))]
    phone: Option<String>,
    #[validate(length(max = 500, message = "Address must be less than 500 characters"))]
    address: Option<String>,
    #[validate(length(
        max = 1000,
        message = "Description must be less than 1000 characters"
    ))]
    description: Option<String>,
    #[validate(length(max = 100, message = "Cuisine type must be less than 100 characters"))]
    cuisine: Option<String>,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}

async fn register(
    State(ctx): State<Arc<Context>>,
    Json(payload): Json<RegisterPayload>,
) -> Response {
    let (Some(email), Some(password), Some(name), Some(kind)) = (
        payload.email.clone(),
        payload.password.clone(),
        payload.name.clone(),
        payload.kind.clone(),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Email, password, name, and type are required",
        );
    };

    let Some(phone) = payload.phone.clone() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Phone number is required for registration",
        );
    };

    if !credentials::is_valid_email(&email) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid email format");
    }

    if let Err(reason) = credentials::validate_password(&password) {
        return error_response(StatusCode::BAD_REQUEST, reason);
    }

    if kind != "user" && kind != "restaurant" {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Type must be either \"user\" or \"restaurant\"",
        );
    }

    if let Err(errors) = payload.validate() {
        return utils::validation::into_response(errors).into_response();
    }

    // One email namespace across both account kinds, so both tables are
    // consulted before either insert.
    let existing_user =
        match user::repository::find_by_email(&ctx.db_conn.pool, email.clone()).await {
            Ok(existing) => existing,
            Err(_) => {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Sign up failed!");
            }
        };
    let existing_restaurant =
        match restaurant::repository::find_by_email(&ctx.db_conn.pool, email.clone()).await {
            Ok(existing) => existing,
            Err(_) => {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Sign up failed!");
            }
        };

    if existing_user.is_some() || existing_restaurant.is_some() {
        return error_response(
            StatusCode::CONFLICT,
            "An account with this email already exists",
        );
    }

    let digest = credentials::hash_password(&password);

    let (identity, account) = if kind == "user" {
        let account = match user::repository::create(
            &ctx.db_conn.pool,
            user::repository::CreateUserPayload {
                email: email.clone(),
                password: digest,
                name,
                phone,
                address: payload.address,
            },
        )
        .await
        {
            Ok(account) => account,
            Err(_) => {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Sign up failed!");
            }
        };

        (
            Identity {
                id: account.id.clone(),
                email: account.email.clone(),
                role: Role::User,
                kind: IdentityKind::User,
            },
            json!(account),
        )
    } else {
        let account = match restaurant::repository::create(
            &ctx.db_conn.pool,
            restaurant::repository::CreateRestaurantPayload {
                email: email.clone(),
                password: digest,
                name,
                phone,
                description: payload.description,
                cuisine: payload.cuisine,
                address: payload.address,
            },
        )
        .await
        {
            Ok(account) => account,
            Err(_) => {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Sign up failed!");
            }
        };

        (
            Identity {
                id: account.id.clone(),
                email: account.email.clone(),
                role: Role::Restaurant,
                kind: IdentityKind::Restaurant,
            },
            json!(account),
        )
    };

    let token = match token::issue(&ctx.auth.token_secret, identity) {
        Ok(token) => token,
        Err(_) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Sign up failed!");
        }
    };

    (
        StatusCode::CREATED,
        axum::Json(json!({
            "message": "Registration successful",
            "token": token,
            "account": account,
            "type": kind,
        })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct LoginPayload {
    email: Option<String>,
    password: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn login(State(ctx): State<Arc<Context>>, Json(payload): Json<LoginPayload>) -> Response {
    let (Some(email), Some(password), Some(kind)) =
        (payload.email, payload.password, payload.kind)
    else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Email, password, and type are required",
        );
    };

    if !credentials::is_valid_email(&email) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid email format");
    }

    if kind != "user" && kind != "restaurant" {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Type must be either \"user\" or \"restaurant\"",
        );
    }

    let (identity, account) = if kind == "user" {
        let account = match user::repository::find_by_email(&ctx.db_conn.pool, email).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials");
            }
            Err(_) => {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Login failed!");
            }
        };

        if !credentials::verify_password(&password, &account.password) {
            return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials");
        }

        (
            Identity {
                id: account.id.clone(),
                email: account.email.clone(),
                role: Role::User,
                kind: IdentityKind::User,
            },
            json!(account),
        )
    } else {
        let account = match restaurant::repository::find_by_email(&ctx.db_conn.pool, email).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials");
            }
            Err(_) => {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Login failed!");
            }
        };

        if !credentials::verify_password(&password, &account.password) {
            return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials");
        }

        (
            Identity {
                id: account.id.clone(),
                email: account.email.clone(),
                role: Role::Restaurant,
                kind: IdentityKind::Restaurant,
            },
            json!(account),
        )
    };

    let token = match token::issue(&ctx.auth.token_secret, identity) {
        Ok(token) => token,
        Err(_) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Login failed!");
        }
    };

    let mut cookie = format!(
        "token={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        token,
        TOKEN_LIFETIME_DAYS * 24 * 60 * 60
    );
    if let AppEnvironment::Production = ctx.app.environment {
        cookie.push_str("; Secure");
    }

    let mut response = (
        StatusCode::OK,
        axum::Json(json!({
            "message": "Login successful",
            "token": token,
            "account": account,
            "type": kind,
        })),
    )
        .into_response();
    if let Ok(cookie) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }

    response
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
