use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::reports::{SalesReport, TopProduct},
    error::AppResult,
    middleware::auth::ReadAccess,
    services::report_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/today", get(sales_today))
        .route("/month", get(sales_this_month))
        .route("/top-products", get(top_products))
}

#[utoipa::path(
    get,
    path = "/api/reports/today",
    responses(
        (status = 200, description = "Sum of totals since UTC midnight", body = SalesReport)
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn sales_today(
    State(state): State<AppState>,
    _gate: ReadAccess,
) -> AppResult<Json<SalesReport>> {
    let report = report_service::sales_today(&state).await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/reports/month",
    responses(
        (status = 200, description = "Sum of totals for the current calendar month", body = SalesReport)
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn sales_this_month(
    State(state): State<AppState>,
    _gate: ReadAccess,
) -> AppResult<Json<SalesReport>> {
    let report = report_service::sales_this_month(&state).await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/reports/top-products",
    responses(
        (status = 200, description = "Catalog ranked by units sold", body = Vec<TopProduct>)
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn top_products(
    State(state): State<AppState>,
    _gate: ReadAccess,
) -> AppResult<Json<Vec<TopProduct>>> {
    let ranked = report_service::top_products(&state).await?;
    Ok(Json(ranked))
}
