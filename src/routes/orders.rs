use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::orders::{OrderDetails, OrderResponse, SubmitOrderRequest},
    error::AppResult,
    middleware::auth::{MaybeAuthUser, ReadAccess},
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_orders).post(submit_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "All orders, oldest first, items resolved", body = Vec<OrderDetails>),
        (status = 401, description = "No token provided"),
        (status = 403, description = "Invalid or expired token")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    _gate: ReadAccess,
) -> AppResult<Json<Vec<OrderDetails>>> {
    let orders = order_service::list_orders(&state).await?;
    Ok(Json(orders))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = SubmitOrderRequest,
    responses(
        (status = 200, description = "Order recorded", body = OrderResponse),
        (status = 400, description = "Invalid submission or total mismatch")
    ),
    tag = "Orders"
)]
pub async fn submit_order(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Json(payload): Json<SubmitOrderRequest>,
) -> AppResult<Json<OrderResponse>> {
    let order = order_service::submit_order(&state, user.as_ref(), payload).await?;
    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}
