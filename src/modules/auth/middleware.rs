use super::service::token::{self, Identity, IdentityKind};
use crate::types::Context;
use axum::http::{request::Parts, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{async_trait, extract::FromRequestParts, Extension, Json, RequestPartsExt};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use std::sync::Arc;

fn token_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "token")
        .map(|(_, value)| value.to_string())
}

async fn identity_from_request(ctx: Arc<Context>, parts: &mut Parts) -> Result<Identity, Response> {
    let bearer = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .ok()
        .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string());

    // Fail closed before any resource is looked up.
    let token = match bearer.or_else(|| token_from_cookies(&parts.headers)) {
        Some(token) => token,
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response())
        }
    };

    token::verify(&ctx.auth.token_secret, &token).ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid or expired token" })),
        )
            .into_response()
    })
}

async fn context_from_request(parts: &mut Parts) -> Result<Arc<Context>, Response> {
    parts
        .extract::<Extension<Arc<Context>>>()
        .await
        .map(|Extension(ctx)| ctx)
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Sorry, an error occurred" })),
            )
                .into_response()
        })
}

/// Any authenticated identity, user or restaurant.
#[derive(Clone)]
pub struct Auth {
    pub identity: Identity,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = context_from_request(parts).await?;
        identity_from_request(ctx, parts)
            .await
            .map(|identity| Self { identity })
    }
}

/// Only user-kind identities; a valid restaurant token is still rejected.
#[derive(Clone)]
pub struct UserAuth {
    pub identity: Identity,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UserAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Auth { identity } = Auth::from_request_parts(parts, state).await?;

        if identity.kind != IdentityKind::User {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "User access required" })),
            )
                .into_response());
        }

        Ok(Self { identity })
    }
}

/// Only restaurant-kind identities.
#[derive(Clone)]
pub struct RestaurantAuth {
    pub identity: Identity,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RestaurantAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Auth { identity } = Auth::from_request_parts(parts, state).await?;

        if identity.kind != IdentityKind::Restaurant {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Restaurant access required" })),
            )
                .into_response());
        }

        Ok(Self { identity })
    }
}
