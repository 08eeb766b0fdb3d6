use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    dto::reports::{SalesReport, TopProduct},
    entity::{
        order_items::Entity as OrderItems,
        orders::{Column as OrderCol, Entity as Orders},
    },
    error::AppResult,
    models::Product,
    services::product_service::list_products,
    state::AppState,
};

pub fn day_window(now: DateTime<Utc>) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let end = start
        .checked_add_signed(Duration::days(1))
        .ok_or_else(|| anyhow::anyhow!("day window end overflows the calendar"))?;
    Ok((start, end))
}

pub fn month_window(now: DateTime<Utc>) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let year = now.year();
    let month = now.month();
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| anyhow::anyhow!("invalid month start for {year}-{month}"))?
        .and_time(NaiveTime::MIN)
        .and_utc();
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| anyhow::anyhow!("invalid month end for {year}-{month}"))?
        .and_time(NaiveTime::MIN)
        .and_utc();
    Ok((start, end))
}

/// Sum of order totals with created_at in [start, end).
pub async fn window_total(
    state: &AppState,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<i64> {
    let orders = Orders::find()
        .filter(OrderCol::CreatedAt.gte(start))
        .filter(OrderCol::CreatedAt.lt(end))
        .all(&state.orm)
        .await?;
    Ok(orders.iter().map(|order| order.total).sum())
}

pub async fn sales_today(state: &AppState) -> AppResult<SalesReport> {
    let (start, end) = day_window(Utc::now())?;
    let total = window_total(state, start, end).await?;
    Ok(SalesReport { total })
}

pub async fn sales_this_month(state: &AppState) -> AppResult<SalesReport> {
    let (start, end) = month_window(Utc::now())?;
    let total = window_total(state, start, end).await?;
    Ok(SalesReport { total })
}

pub fn rank_products(catalog: &[Product], sold: &HashMap<Uuid, i64>) -> Vec<TopProduct> {
    let mut ranked: Vec<TopProduct> = catalog
        .iter()
        .map(|product| TopProduct {
            id: product.id,
            name: product.name.clone(),
            sales: sold.get(&product.id).copied().unwrap_or(0),
        })
        .collect();
    // Stable sort: ties keep catalog order.
    ranked.sort_by(|a, b| b.sales.cmp(&a.sales));
    ranked
}

pub async fn top_products(state: &AppState) -> AppResult<Vec<TopProduct>> {
    let mut sold: HashMap<Uuid, i64> = HashMap::new();
    for item in OrderItems::find().all(&state.orm).await? {
        *sold.entry(item.product_id).or_insert(0) += i64::from(item.quantity);
    }

    let catalog = list_products(state).await?;
    Ok(rank_products(&catalog, &sold))
}
