use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitOrderRequest {
    pub customer_name: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    // Option so a missing total is a validation error, not a JSON rejection.
    pub subtotal: Option<i64>,
    pub tax: Option<i64>,
    pub total: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub success: bool,
    pub order: Order,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetails {
    pub id: Uuid,
    pub customer_name: Option<String>,
    pub items: Vec<ResolvedOrderItem>,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResolvedOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub product: Option<Product>,
}
