use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{OrderDetails, ResolvedOrderItem, SubmitOrderRequest},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as ItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus, Product},
    services::product_service::product_from_entity,
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
}

pub fn validate_submission(payload: &SubmitOrderRequest) -> AppResult<OrderTotals> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest(
            "Order must have at least one item.".into(),
        ));
    }
    if payload.items.iter().any(|item| item.quantity < 1) {
        return Err(AppError::BadRequest(
            "Each item quantity must be at least 1.".into(),
        ));
    }
    let (subtotal, tax, total) = match (payload.subtotal, payload.tax, payload.total) {
        (Some(subtotal), Some(tax), Some(total)) => (subtotal, tax, total),
        _ => {
            return Err(AppError::BadRequest(
                "Subtotal, tax, and total must be numbers.".into(),
            ));
        }
    };
    if subtotal.checked_add(tax) != Some(total) {
        return Err(AppError::BadRequest(
            "Subtotal plus tax must equal total.".into(),
        ));
    }
    Ok(OrderTotals {
        subtotal,
        tax,
        total,
    })
}

/// Basis-point tax in cents, rounding half up: 825 bps on 1000 cents is 83.
pub fn tax_for(subtotal: i64, rate_bps: u32) -> i64 {
    ((subtotal as i128 * rate_bps as i128 + 5_000) / 10_000) as i64
}

/// Overflow-safe distance check between a submitted and a recomputed total.
pub fn totals_diverge(submitted: i64, computed: i64, tolerance_cents: i64) -> bool {
    submitted.abs_diff(computed) > tolerance_cents.max(0) as u64
}

async fn price_order(state: &AppState, items: &[OrderItem]) -> AppResult<OrderTotals> {
    let mut ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let prices: HashMap<Uuid, i64> = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|product| (product.id, product.price))
        .collect();

    let mut subtotal: i128 = 0;
    for item in items {
        let price = match prices.get(&item.product_id) {
            Some(price) => *price,
            None => {
                return Err(AppError::BadRequest(format!(
                    "Unknown product {} in order.",
                    item.product_id
                )));
            }
        };
        subtotal += price as i128 * item.quantity as i128;
    }
    let subtotal = i64::try_from(subtotal)
        .map_err(|_| AppError::BadRequest("Order total is out of range.".into()))?;

    let tax = tax_for(subtotal, state.config.tax_rate_bps);
    let total = subtotal
        .checked_add(tax)
        .ok_or_else(|| AppError::BadRequest("Order total is out of range.".into()))?;
    Ok(OrderTotals {
        subtotal,
        tax,
        total,
    })
}

pub async fn submit_order(
    state: &AppState,
    submitted_by: Option<&AuthUser>,
    payload: SubmitOrderRequest,
) -> AppResult<Order> {
    let submitted = validate_submission(&payload)?;

    let totals = if state.config.trust_client_totals {
        submitted
    } else {
        // Catalog pricing happens outside the insert transaction; only the
        // server-computed figures get persisted.
        let computed = price_order(state, &payload.items).await?;
        if totals_diverge(
            submitted.total,
            computed.total,
            state.config.total_tolerance_cents,
        ) {
            return Err(AppError::PriceMismatch {
                submitted: submitted.total,
                computed: computed.total,
            });
        }
        computed
    };

    let txn = state.orm.begin().await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_name: Set(payload.customer_name),
        subtotal: Set(totals.subtotal),
        tax: Set(totals.tax),
        total: Set(totals.total),
        status: Set(OrderStatus::Open.as_str().to_owned()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    for (position, item) in payload.items.iter().enumerate() {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            position: Set(position as i32),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        submitted_by.map(|user| user.user_id),
        "order_submit",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": order.total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Order {
        id: order.id,
        customer_name: order.customer_name,
        items: payload.items,
        subtotal: order.subtotal,
        tax: order.tax,
        total: order.total,
        status: order.status,
        created_at: order.created_at.with_timezone(&Utc),
    })
}

pub async fn list_orders(state: &AppState) -> AppResult<Vec<OrderDetails>> {
    // Items come back in submission order, not physical tuple order.
    let orders = Orders::find()
        .find_with_related(OrderItems)
        .order_by_asc(OrderCol::CreatedAt)
        .order_by_asc(OrderCol::Id)
        .order_by_asc(ItemCol::Position)
        .all(&state.orm)
        .await?;

    let mut product_ids: Vec<Uuid> = orders
        .iter()
        .flat_map(|(_, items)| items.iter().map(|item| item.product_id))
        .collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    let products: HashMap<Uuid, Product> = if product_ids.is_empty() {
        HashMap::new()
    } else {
        Products::find()
            .filter(ProdCol::Id.is_in(product_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|model| (model.id, product_from_entity(model)))
            .collect()
    };

    let details = orders
        .into_iter()
        .map(|(order, items)| OrderDetails {
            id: order.id,
            customer_name: order.customer_name,
            items: items
                .into_iter()
                .map(|item| ResolvedOrderItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    product: products.get(&item.product_id).cloned(),
                })
                .collect(),
            subtotal: order.subtotal,
            tax: order.tax,
            total: order.total,
            status: order.status,
            created_at: order.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(details)
}
