//! Blog post repository. `blog_posts` is the only post store.

use sqlx::{types::Json, PgPool};
use std::future::Future;
use uuid::Uuid;

use super::models::{PostFields, PostFilter, PostRow};

const POST_COLUMNS: &str = r#"
    p.id, p.title, p.slug, p.description, p.featured_image, p.tags, p.status,
    p.category_id, c.name AS category_name, p.blocks, p.reading_time_minutes,
    p.view_count, p.created_at, p.updated_at
"#;

/// Shared WHERE clause; each filter is skipped when its parameter is NULL.
const FILTER_CLAUSE: &str = r#"
    WHERE ($1::TEXT IS NULL OR p.status = $1)
      AND ($2::UUID IS NULL OR p.category_id = $2)
      AND ($3::TEXT IS NULL OR $3 = ANY(p.tags))
      AND ($4::TEXT IS NULL OR p.title ILIKE '%' || $4 || '%' OR p.description ILIKE '%' || $4 || '%')
"#;

fn select_from(source: &str) -> String {
    format!("SELECT {POST_COLUMNS} FROM {source} p LEFT JOIN categories c ON c.id = p.category_id")
}

pub async fn list(pool: &PgPool, filter: &PostFilter) -> Result<(Vec<PostRow>, i64), sqlx::Error> {
    let status = filter.status.map(|s| s.as_str());

    let sql = format!(
        "{} {FILTER_CLAUSE} ORDER BY p.created_at DESC LIMIT $5 OFFSET $6",
        select_from("blog_posts")
    );
    let posts = sqlx::query_as::<_, PostRow>(&sql)
        .bind(status)
        .bind(filter.category_id)
        .bind(&filter.tag)
        .bind(&filter.search)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM blog_posts p {FILTER_CLAUSE}");
    let (total,): (i64,) = sqlx::query_as(&count_sql)
        .bind(status)
        .bind(filter.category_id)
        .bind(&filter.tag)
        .bind(&filter.search)
        .fetch_one(pool)
        .await?;

    Ok((posts, total))
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<PostRow>, sqlx::Error> {
    let sql = format!("{} WHERE p.id = $1", select_from("blog_posts"));
    sqlx::query_as::<_, PostRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<PostRow>, sqlx::Error> {
    let sql = format!("{} WHERE p.slug = $1", select_from("blog_posts"));
    sqlx::query_as::<_, PostRow>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
}

fn slug_ci_sql() -> String {
    format!(
        "{} WHERE LOWER(p.slug) = LOWER($1) ORDER BY p.created_at ASC LIMIT 1",
        select_from("blog_posts")
    )
}

/// Case-insensitive slug match; the oldest post wins if several match.
pub async fn find_by_slug_ci(pool: &PgPool, slug: &str) -> Result<Option<PostRow>, sqlx::Error> {
    sqlx::query_as::<_, PostRow>(&slug_ci_sql())
        .bind(slug)
        .fetch_optional(pool)
        .await
}

/// One lookup tried while resolving a route key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKey<'a> {
    Id(Uuid),
    Slug(&'a str),
    SlugIgnoreCase(&'a str),
}

/// Lookups for `key`, in the order they are tried: a UUID is looked up by
/// id first; every key is then tried as an exact slug and finally as a
/// case-insensitive slug.
pub fn candidates(key: &str) -> Vec<PostKey<'_>> {
    let mut keys = Vec::with_capacity(3);
    if let Ok(id) = Uuid::parse_str(key) {
        keys.push(PostKey::Id(id));
    }
    keys.push(PostKey::Slug(key));
    keys.push(PostKey::SlugIgnoreCase(key));
    keys
}

/// Walk [`candidates`] with `lookup`, returning the first hit.
pub async fn resolve_with<'a, T, F, Fut>(
    key: &'a str,
    mut lookup: F,
) -> Result<Option<T>, sqlx::Error>
where
    F: FnMut(PostKey<'a>) -> Fut,
    Fut: Future<Output = Result<Option<T>, sqlx::Error>>,
{
    for candidate in candidates(key) {
        if let Some(found) = lookup(candidate).await? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

async fn find(pool: &PgPool, key: PostKey<'_>) -> Result<Option<PostRow>, sqlx::Error> {
    match key {
        PostKey::Id(id) => find_by_id(pool, id).await,
        PostKey::Slug(slug) => find_by_slug(pool, slug).await,
        PostKey::SlugIgnoreCase(slug) => find_by_slug_ci(pool, slug).await,
    }
}

pub async fn resolve(pool: &PgPool, key: &str) -> Result<Option<PostRow>, sqlx::Error> {
    resolve_with(key, |candidate| find(pool, candidate)).await
}

pub async fn insert(pool: &PgPool, fields: &PostFields) -> Result<PostRow, sqlx::Error> {
    let sql = format!(
        r#"
        WITH p AS (
            INSERT INTO blog_posts
                (title, slug, description, featured_image, tags, status, category_id,
                 blocks, reading_time_minutes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now())
            RETURNING *
        )
        {}
        "#,
        select_from("p")
    );
    sqlx::query_as::<_, PostRow>(&sql)
        .bind(&fields.title)
        .bind(&fields.slug)
        .bind(&fields.description)
        .bind(&fields.featured_image)
        .bind(&fields.tags)
        .bind(fields.status.as_str())
        .bind(fields.category_id)
        .bind(Json(&fields.blocks))
        .bind(fields.reading_time_minutes)
        .fetch_one(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    fields: &PostFields,
) -> Result<Option<PostRow>, sqlx::Error> {
    let sql = format!(
        r#"
        WITH p AS (
            UPDATE blog_posts
            SET title = $2, slug = $3, description = $4, featured_image = $5, tags = $6,
                status = $7, category_id = $8, blocks = $9, reading_time_minutes = $10,
                updated_at = now()
            WHERE id = $1
            RETURNING *
        )
        {}
        "#,
        select_from("p")
    );
    sqlx::query_as::<_, PostRow>(&sql)
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.slug)
        .bind(&fields.description)
        .bind(&fields.featured_image)
        .bind(&fields.tags)
        .bind(fields.status.as_str())
        .bind(fields.category_id)
        .bind(Json(&fields.blocks))
        .bind(fields.reading_time_minutes)
        .fetch_optional(pool)
        .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Bump the view counter and return the new value.
pub async fn increment_views(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
    let (views,): (i64,) = sqlx::query_as(
        "UPDATE blog_posts SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(views)
}

/// Up to `count` random published posts, optionally excluding one slug.
pub async fn random_published(
    pool: &PgPool,
    count: i64,
    exclude_slug: Option<&str>,
) -> Result<Vec<PostRow>, sqlx::Error> {
    let sql = format!(
        "{} WHERE p.status = 'published' AND ($1::TEXT IS NULL OR p.slug <> $1) \
         ORDER BY random() LIMIT $2",
        select_from("blog_posts")
    );
    sqlx::query_as::<_, PostRow>(&sql)
        .bind(exclude_slug)
        .bind(count)
        .fetch_all(pool)
        .await
}

/// Latest published posts, newest first.
pub async fn latest_published(pool: &PgPool, limit: i64) -> Result<Vec<PostRow>, sqlx::Error> {
    let sql = format!(
        "{} WHERE p.status = 'published' ORDER BY p.created_at DESC LIMIT $1",
        select_from("blog_posts")
    );
    sqlx::query_as::<_, PostRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await
}
