use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{format_description::well_known::Rfc3339, Date, OffsetDateTime, Time};
use uuid::Uuid;

use crate::{
    error::ApiError,
    movements::repo::{MovementReason, MovementType},
    products::repo::ProductStatus,
};

#[derive(Debug, Serialize)]
pub struct Overview {
    pub total_products: i64,
    pub low_stock_products: i64,
    pub total_users: i64,
    pub recent_movements: i64,
    pub inventory_value: f64,
}

/// Top seller over the trailing window: salida/venta movements only.
#[derive(Debug, Serialize, FromRow)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub sku: String,
    pub total_sold: i64,
    pub total_revenue: f64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CategoryStat {
    pub category_id: Uuid,
    pub name: String,
    pub color: String,
    pub count: i64,
    pub total_value: f64,
}

#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub overview: Overview,
    pub top_products: Vec<TopProduct>,
    pub category_stats: Vec<CategoryStat>,
}

#[derive(Debug, Deserialize)]
pub struct InventoryReportQuery {
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub low_stock: bool,
}

#[derive(Debug, Serialize, FromRow)]
pub struct InventoryRow {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub quantity: i32,
    pub min_stock: i32,
    pub price: f64,
    pub cost: f64,
    pub total_value: f64,
    pub is_low_stock: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct InventorySummary {
    pub total_products: i64,
    pub low_stock_items: i64,
    pub total_value: f64,
}

/// Folded in one pass over the already-filtered rows, like the rest of the
/// report it recomputes per request.
pub fn summarize(rows: &[InventoryRow]) -> InventorySummary {
    InventorySummary {
        total_products: rows.len() as i64,
        low_stock_items: rows.iter().filter(|r| r.is_low_stock).count() as i64,
        total_value: rows.iter().map(|r| r.total_value).sum(),
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryReport {
    pub summary: InventorySummary,
    pub products: Vec<InventoryRow>,
}

#[derive(Debug, Deserialize)]
pub struct MovementsReportQuery {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(rename = "type", default)]
    pub movement_type: Option<MovementType>,
    #[serde(default)]
    pub product: Option<Uuid>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize, FromRow)]
pub struct MovementReportRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub reason: MovementReason,
    pub reference: Option<String>,
    pub user_id: Uuid,
    pub user_name: String,
    pub cost: Option<f64>,
    pub created_at: OffsetDateTime,
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (taken as
/// midnight UTC).
pub fn parse_window_date(field: &str, raw: &str) -> Result<OffsetDateTime, ApiError> {
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(ts);
    }
    let format = time::macros::format_description!("[year]-[month]-[day]");
    Date::parse(raw, &format)
        .map(|date| date.with_time(Time::MIDNIGHT).assume_utc())
        .map_err(|_| ApiError::invalid(field, "expected an RFC 3339 timestamp or YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(quantity: i32, min_stock: i32, price: f64) -> InventoryRow {
        InventoryRow {
            id: Uuid::new_v4(),
            name: "item".into(),
            sku: "SKU0001".into(),
            category: "General".into(),
            quantity,
            min_stock,
            price,
            cost: 0.0,
            total_value: quantity as f64 * price,
            is_low_stock: quantity <= min_stock,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn summary_counts_low_stock_against_the_fixture() {
        // Three products, two at or below their minimum.
        let rows = vec![row(2, 5, 10.0), row(5, 5, 4.0), row(50, 5, 1.0)];
        let summary = summarize(&rows);
        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.low_stock_items, 2);
        assert!((summary.total_value - (20.0 + 20.0 + 50.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_of_no_rows_is_all_zeroes() {
        let summary = summarize(&[]);
        assert_eq!(
            summary,
            InventorySummary {
                total_products: 0,
                low_stock_items: 0,
                total_value: 0.0
            }
        );
    }

    #[test]
    fn window_dates_accept_both_forms() {
        assert!(parse_window_date("start_date", "2024-03-01").is_ok());
        assert!(parse_window_date("start_date", "2024-03-01T12:30:00Z").is_ok());
    }

    #[test]
    fn window_dates_reject_junk() {
        assert!(parse_window_date("start_date", "yesterday").is_err());
        assert!(parse_window_date("start_date", "03/01/2024").is_err());
    }
}
