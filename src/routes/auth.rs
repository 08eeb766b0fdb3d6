use axum::{Json, extract::State};

use crate::{
    dto::auth::{LoginRequest, LoginResponse, ProtectedResponse, TokenIdentity},
    error::AppResult,
    middleware::auth::AuthUser,
    services::auth_service,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login", body = LoginResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let resp = auth_service::login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/protected",
    responses(
        (status = 200, description = "Token accepted", body = ProtectedResponse),
        (status = 401, description = "No token provided"),
        (status = 403, description = "Invalid or expired token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn protected(user: AuthUser) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        success: true,
        message: "Protected data accessed!".to_string(),
        user: TokenIdentity {
            id: user.user_id,
            name: user.name,
            role: user.role,
        },
    })
}
