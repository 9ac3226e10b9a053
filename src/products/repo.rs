use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::movements::repo::{Movement, MovementReason, MovementType, NewMovement};

/// Product lifecycle. Deleting a product only ever moves it to `Inactive`;
/// `Discontinued` is a terminal merchandising state set through updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
    Discontinued,
}

impl Default for ProductStatus {
    fn default() -> Self {
        Self::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Unit {
    Piezas,
    Kg,
    Litros,
    Metros,
    Cajas,
}

impl Default for Unit {
    fn default() -> Self {
        Self::Piezas
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub category_id: Uuid,
    pub price: f64,
    pub cost: f64,
    pub quantity: i32,
    pub min_stock: i32,
    pub max_stock: Option<i32>,
    pub unit: Unit,
    pub barcode: Option<String>,
    pub supplier: Option<String>,
    pub status: ProductStatus,
    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Product joined with category and audit names for API responses, including
/// the derived stock fields.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductWithCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_color: String,
    pub price: f64,
    pub cost: f64,
    pub quantity: i32,
    pub min_stock: i32,
    pub max_stock: Option<i32>,
    pub unit: Unit,
    pub barcode: Option<String>,
    pub supplier: Option<String>,
    pub status: ProductStatus,
    pub is_low_stock: bool,
    pub total_value: f64,
    pub created_by_name: String,
    pub updated_by_name: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct ProductFilter {
    pub status: ProductStatus,
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub low_stock: bool,
}

#[derive(Debug)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub category_id: Uuid,
    pub price: f64,
    pub cost: f64,
    pub quantity: i32,
    pub min_stock: i32,
    pub max_stock: Option<i32>,
    pub unit: Unit,
    pub barcode: Option<String>,
    pub supplier: Option<String>,
    pub created_by: Uuid,
}

const JOINED_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, p.sku, p.category_id,
           c.name AS category_name, c.color AS category_color,
           p.price, p.cost, p.quantity, p.min_stock, p.max_stock, p.unit,
           p.barcode, p.supplier, p.status,
           (p.quantity <= p.min_stock) AS is_low_stock,
           (p.quantity * p.price) AS total_value,
           cu.name AS created_by_name, uu.name AS updated_by_name,
           p.created_at, p.updated_at
    FROM products p
    JOIN categories c ON c.id = p.category_id
    JOIN users cu ON cu.id = p.created_by
    LEFT JOIN users uu ON uu.id = p.updated_by
"#;

impl Product {
    pub async fn list(
        db: &PgPool,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<ProductWithCategory>> {
        let sql = format!(
            r#"
            {JOINED_SELECT}
            WHERE p.status = $1
              AND ($2::text IS NULL
                   OR p.name ILIKE '%' || $2 || '%'
                   OR p.sku ILIKE '%' || $2 || '%'
                   OR p.description ILIKE '%' || $2 || '%')
              AND ($3::uuid IS NULL OR p.category_id = $3)
              AND (NOT $4 OR p.quantity <= p.min_stock)
            ORDER BY p.created_at DESC
            LIMIT $5 OFFSET $6
            "#
        );
        let rows = sqlx::query_as::<_, ProductWithCategory>(&sql)
            .bind(filter.status)
            .bind(filter.search.as_deref())
            .bind(filter.category_id)
            .bind(filter.low_stock)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn count(db: &PgPool, filter: &ProductFilter) -> anyhow::Result<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM products p
            WHERE p.status = $1
              AND ($2::text IS NULL
                   OR p.name ILIKE '%' || $2 || '%'
                   OR p.sku ILIKE '%' || $2 || '%'
                   OR p.description ILIKE '%' || $2 || '%')
              AND ($3::uuid IS NULL OR p.category_id = $3)
              AND (NOT $4 OR p.quantity <= p.min_stock)
            "#,
        )
        .bind(filter.status)
        .bind(filter.search.as_deref())
        .bind(filter.category_id)
        .bind(filter.low_stock)
        .fetch_one(db)
        .await?;
        Ok(total)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<ProductWithCategory>> {
        let sql = format!("{JOINED_SELECT} WHERE p.id = $1");
        let product = sqlx::query_as::<_, ProductWithCategory>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(product)
    }

    pub async fn sku_taken(db: &PgPool, sku: &str, exclude: Option<Uuid>) -> anyhow::Result<bool> {
        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM products WHERE sku = $1 AND ($2::uuid IS NULL OR id <> $2)",
        )
        .bind(sku)
        .bind(exclude)
        .fetch_optional(db)
        .await?;
        Ok(existing.is_some())
    }

    /// Inserts the product and, when it starts with stock, the opening ledger
    /// entry. Both writes commit together or not at all.
    pub async fn create(db: &PgPool, new: &NewProduct) -> anyhow::Result<Product> {
        let mut tx: Transaction<'_, Postgres> = db.begin().await?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, sku, category_id, price, cost,
                                  quantity, min_stock, max_stock, unit, barcode,
                                  supplier, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, name, description, sku, category_id, price, cost, quantity,
                      min_stock, max_stock, unit, barcode, supplier, status,
                      created_by, updated_by, created_at, updated_at
            "#,
        )
        .bind(&new.name)
        .bind(new.description.as_deref())
        .bind(&new.sku)
        .bind(new.category_id)
        .bind(new.price)
        .bind(new.cost)
        .bind(new.quantity)
        .bind(new.min_stock)
        .bind(new.max_stock)
        .bind(new.unit)
        .bind(new.barcode.as_deref())
        .bind(new.supplier.as_deref())
        .bind(new.created_by)
        .fetch_one(&mut *tx)
        .await?;

        if product.quantity > 0 {
            Movement::insert(
                &mut tx,
                &NewMovement {
                    product_id: product.id,
                    movement_type: MovementType::Entrada,
                    quantity: product.quantity,
                    previous_quantity: 0,
                    new_quantity: product.quantity,
                    reason: MovementReason::AjusteInventario,
                    reference: Some("Inventario inicial".into()),
                    notes: None,
                    user_id: new.created_by,
                    cost: Some(product.cost),
                },
            )
            .await?;
        }

        tx.commit().await?;
        Ok(product)
    }

    /// Quantity is deliberately absent: stock only changes through movements.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        sku: &str,
        category_id: Uuid,
        price: f64,
        cost: f64,
        min_stock: i32,
        max_stock: Option<i32>,
        unit: Unit,
        barcode: Option<&str>,
        supplier: Option<&str>,
        status: ProductStatus,
        updated_by: Uuid,
    ) -> anyhow::Result<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, description = $3, sku = $4, category_id = $5, price = $6,
                cost = $7, min_stock = $8, max_stock = $9, unit = $10, barcode = $11,
                supplier = $12, status = $13, updated_by = $14, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, sku, category_id, price, cost, quantity,
                      min_stock, max_stock, unit, barcode, supplier, status,
                      created_by, updated_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(sku)
        .bind(category_id)
        .bind(price)
        .bind(cost)
        .bind(min_stock)
        .bind(max_stock)
        .bind(unit)
        .bind(barcode)
        .bind(supplier)
        .bind(status)
        .bind(updated_by)
        .fetch_one(db)
        .await?;
        Ok(product)
    }

    pub async fn deactivate(db: &PgPool, id: Uuid, updated_by: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET status = 'inactive', updated_by = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(updated_by)
        .execute(db)
        .await?;
        Ok(())
    }
}

/// SKU fallback when the client does not send one: first three usable name
/// characters plus the last four digits of the unix millisecond clock.
pub fn generate_sku(name: &str, now: OffsetDateTime) -> String {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let prefix = if prefix.is_empty() { "PRD".to_string() } else { prefix };
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    format!("{}{:04}", prefix, millis % 10_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_uses_name_prefix_and_four_digits() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_123).unwrap();
        let sku = generate_sku("Cafetera industrial", now);
        assert!(sku.starts_with("CAF"));
        assert_eq!(sku.len(), 7);
        assert!(sku[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn sku_skips_non_alphanumeric_name_characters() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_123).unwrap();
        let sku = generate_sku("  ñ-café 12", now);
        assert!(sku.starts_with("CAF") || sku.starts_with("CA1"));
    }

    #[test]
    fn sku_falls_back_when_name_has_no_usable_characters() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_123).unwrap();
        let sku = generate_sku("ñ", now);
        assert!(sku.starts_with("PRD"));
    }

    #[test]
    fn default_status_is_active() {
        assert_eq!(ProductStatus::default(), ProductStatus::Active);
    }
}
