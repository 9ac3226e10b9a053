use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub is_active: bool,
    pub parent_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
}

/// Category joined with the number of products filed under it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryWithCount {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub is_active: bool,
    pub parent_id: Option<Uuid>,
    pub product_count: i64,
    pub created_at: OffsetDateTime,
}

impl Category {
    pub async fn list_active(db: &PgPool) -> anyhow::Result<Vec<CategoryWithCount>> {
        let rows = sqlx::query_as::<_, CategoryWithCount>(
            r#"
            SELECT c.id, c.name, c.description, c.color, c.icon, c.is_active,
                   c.parent_id, c.created_at,
                   COUNT(p.id) AS product_count
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id AND p.status = 'active'
            WHERE c.is_active
            GROUP BY c.id
            ORDER BY c.name ASC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, color, icon, is_active, parent_id,
                   created_by, created_at
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(category)
    }

    pub async fn name_taken(db: &PgPool, name: &str, exclude: Option<Uuid>) -> anyhow::Result<bool> {
        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM categories WHERE name = $1 AND ($2::uuid IS NULL OR id <> $2)",
        )
        .bind(name)
        .bind(exclude)
        .fetch_optional(db)
        .await?;
        Ok(existing.is_some())
    }

    pub async fn create(
        db: &PgPool,
        name: &str,
        description: Option<&str>,
        color: &str,
        icon: &str,
        parent_id: Option<Uuid>,
        created_by: Uuid,
    ) -> anyhow::Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description, color, icon, parent_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, color, icon, is_active, parent_id,
                      created_by, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(color)
        .bind(icon)
        .bind(parent_id)
        .bind(created_by)
        .fetch_one(db)
        .await?;
        Ok(category)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        color: &str,
        icon: &str,
        parent_id: Option<Uuid>,
    ) -> anyhow::Result<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $2, description = $3, color = $4, icon = $5, parent_id = $6
            WHERE id = $1
            RETURNING id, name, description, color, icon, is_active, parent_id,
                      created_by, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(color)
        .bind(icon)
        .bind(parent_id)
        .fetch_one(db)
        .await?;
        Ok(category)
    }

    pub async fn deactivate(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE categories SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn active_product_count(db: &PgPool, id: Uuid) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE category_id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(count)
    }
}
