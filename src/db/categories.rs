//! Category repository. Posts reference categories by id, so a rename is a
//! single-row update and a delete leaves referencing posts uncategorised.

use sqlx::PgPool;
use uuid::Uuid;

use super::models::Category;

pub async fn list(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT c.id, c.name, c.created_at, COUNT(p.id) AS post_count
        FROM categories c
        LEFT JOIN blog_posts p ON p.category_id = c.id
        GROUP BY c.id, c.name, c.created_at
        ORDER BY c.name ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT c.id, c.name, c.created_at,
               (SELECT COUNT(*) FROM blog_posts p WHERE p.category_id = c.id) AS post_count
        FROM categories c
        WHERE c.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn insert(pool: &PgPool, name: &str) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (name)
        VALUES ($1)
        RETURNING id, name, created_at, 0::BIGINT AS post_count
        "#,
    )
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn rename(pool: &PgPool, id: Uuid, name: &str) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        UPDATE categories c
        SET name = $2
        WHERE c.id = $1
        RETURNING c.id, c.name, c.created_at,
                  (SELECT COUNT(*) FROM blog_posts p WHERE p.category_id = c.id) AS post_count
        "#,
    )
    .bind(id)
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
