use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{Validation, decode};
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    error::AppError,
    state::{AppState, AuthKeys},
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub role: String,
}

pub fn verify_token(keys: &AuthKeys, token: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(token, &keys.decoding, &Validation::default())
        .map_err(|_| AppError::TokenInvalid)?;
    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::TokenInvalid)?;
    Ok(AuthUser {
        user_id,
        name: decoded.claims.name,
        role: decoded.claims.role,
    })
}

/// Gate for ledger and report reads; `open_reads` skips the header entirely.
pub fn ensure_read_access(
    open_reads: bool,
    keys: &AuthKeys,
    authorization: Option<&str>,
) -> Result<(), AppError> {
    if open_reads {
        return Ok(());
    }
    let value = authorization.ok_or(AppError::Unauthenticated)?;
    let token = parse_bearer(value)?;
    verify_token(keys, token)?;
    Ok(())
}

fn parse_bearer(value: &str) -> Result<&str, AppError> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthenticated)
}

fn authorization_header(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let value = authorization_header(parts).ok_or(AppError::Unauthenticated)?;
        let token = parse_bearer(value)?;
        verify_token(&state.auth, token)
    }
}

#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(
            AuthUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReadAccess;

impl FromRequestParts<AppState> for ReadAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        ensure_read_access(
            state.config.open_reads,
            &state.auth,
            authorization_header(parts),
        )?;
        Ok(ReadAccess)
    }
}
