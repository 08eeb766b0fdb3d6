use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Header, encode};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{Claims, LoginRequest, LoginResponse},
    error::{AppError, AppResult},
    models::User,
    state::{AppState, AuthKeys},
};

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<LoginResponse> {
    // Usernames are stored lowercase, so trim + lowercase gives
    // case-insensitive lookup.
    let username = payload.username.trim().to_lowercase();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required.".into(),
        ));
    }

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(&username)
        .fetch_optional(&state.pool)
        .await?;

    // Unknown user and wrong password answer identically.
    let user = user.ok_or(AppError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Stored password hash is invalid")))?;

    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(&state.auth, user.id, &user.name, &user.role)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "login",
        Some("users"),
        Some(serde_json::json!({ "username": user.username })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(LoginResponse {
        success: true,
        token,
        id: user.id,
        name: user.name,
        role: user.role,
    })
}

pub fn issue_token(keys: &AuthKeys, id: Uuid, name: &str, role: &str) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set token expiration")))?;

    let claims = Claims {
        sub: id.to_string(),
        name: name.to_owned(),
        role: role.to_owned(),
        exp: expiration.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &keys.encoding)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}
