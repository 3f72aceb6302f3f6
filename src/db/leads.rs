//! Lead repository. Leads are append-only.

use sqlx::PgPool;

use super::models::{Lead, NewLead};

pub async fn insert(pool: &PgPool, lead: &NewLead) -> Result<Lead, sqlx::Error> {
    sqlx::query_as::<_, Lead>(
        r#"
        INSERT INTO leads (name, email, phone, message, created_at)
        VALUES ($1, $2, $3, $4, now())
        RETURNING id, name, email, phone, message, created_at
        "#,
    )
    .bind(&lead.name)
    .bind(&lead.email)
    .bind(&lead.phone)
    .bind(&lead.message)
    .fetch_one(pool)
    .await
}

/// Newest first, with the overall total for pagination.
pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<(Vec<Lead>, i64), sqlx::Error> {
    let leads = sqlx::query_as::<_, Lead>(
        r#"
        SELECT id, name, email, phone, message, created_at
        FROM leads
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads")
        .fetch_one(pool)
        .await?;

    Ok((leads, total))
}
