use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    movements::repo::MovementType,
    products::repo::ProductStatus,
    reports::dto::{CategoryStat, InventoryRow, MovementReportRow, Overview, TopProduct},
};

pub async fn overview(db: &PgPool) -> anyhow::Result<Overview> {
    let total_products: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE status = 'active'")
            .fetch_one(db)
            .await?;

    let low_stock_products: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM products WHERE status = 'active' AND quantity <= min_stock",
    )
    .fetch_one(db)
    .await?;

    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active")
        .fetch_one(db)
        .await?;

    let recent_movements: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM movements WHERE created_at >= NOW() - INTERVAL '7 days'",
    )
    .fetch_one(db)
    .await?;

    let inventory_value: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity * price), 0) FROM products WHERE status = 'active'",
    )
    .fetch_one(db)
    .await?;

    Ok(Overview {
        total_products,
        low_stock_products,
        total_users,
        recent_movements,
        inventory_value,
    })
}

/// Best sellers over the trailing 30 days, by units moved out as sales.
pub async fn top_products(db: &PgPool) -> anyhow::Result<Vec<TopProduct>> {
    let rows = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT m.product_id, p.name, p.sku,
               SUM(m.quantity) AS total_sold,
               SUM(m.quantity * COALESCE(m.cost, 0)) AS total_revenue
        FROM movements m
        JOIN products p ON p.id = m.product_id
        WHERE m.type = 'salida'
          AND m.reason = 'venta'
          AND m.created_at >= NOW() - INTERVAL '30 days'
        GROUP BY m.product_id, p.name, p.sku
        ORDER BY total_sold DESC
        LIMIT 5
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn category_stats(db: &PgPool) -> anyhow::Result<Vec<CategoryStat>> {
    let rows = sqlx::query_as::<_, CategoryStat>(
        r#"
        SELECT c.id AS category_id, c.name, c.color,
               COUNT(*) AS count,
               COALESCE(SUM(p.quantity * p.price), 0) AS total_value
        FROM products p
        JOIN categories c ON c.id = p.category_id
        WHERE p.status = 'active'
        GROUP BY c.id, c.name, c.color
        ORDER BY count DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn inventory_rows(
    db: &PgPool,
    category: Option<Uuid>,
    status: ProductStatus,
    low_stock: bool,
) -> anyhow::Result<Vec<InventoryRow>> {
    let rows = sqlx::query_as::<_, InventoryRow>(
        r#"
        SELECT p.id, p.name, p.sku, c.name AS category, p.quantity, p.min_stock,
               p.price, p.cost,
               (p.quantity * p.price) AS total_value,
               (p.quantity <= p.min_stock) AS is_low_stock,
               p.created_at
        FROM products p
        JOIN categories c ON c.id = p.category_id
        WHERE p.status = $1
          AND ($2::uuid IS NULL OR p.category_id = $2)
          AND (NOT $3 OR p.quantity <= p.min_stock)
        ORDER BY p.name ASC
        "#,
    )
    .bind(status)
    .bind(category)
    .bind(low_stock)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[allow(clippy::too_many_arguments)]
pub async fn movement_rows(
    db: &PgPool,
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    movement_type: Option<MovementType>,
    product: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<MovementReportRow>> {
    let rows = sqlx::query_as::<_, MovementReportRow>(
        r#"
        SELECT m.id, m.product_id, p.name AS product_name, p.sku AS product_sku,
               m.type, m.quantity, m.previous_quantity, m.new_quantity, m.reason,
               m.reference, m.user_id, u.name AS user_name, m.cost, m.created_at
        FROM movements m
        JOIN products p ON p.id = m.product_id
        JOIN users u ON u.id = m.user_id
        WHERE ($1::timestamptz IS NULL OR m.created_at >= $1)
          AND ($2::timestamptz IS NULL OR m.created_at <= $2)
          AND ($3::text IS NULL OR m.type = $3)
          AND ($4::uuid IS NULL OR m.product_id = $4)
        ORDER BY m.created_at DESC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(start)
    .bind(end)
    .bind(movement_type)
    .bind(product)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
