/**
 * Blog Routes
 * CRUD API endpoints for blog posts
 */
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::future::Future;
use uuid::Uuid;

use crate::content::{self, ContentBlock};
use crate::db::{
    self,
    models::{PostFields, PostFilter, PostRow, PostStatus},
    posts,
};
use crate::error::AppError;
use crate::routes::auth::{is_admin, require_admin};
use crate::routes::{default_page, default_page_size, paginate, SuccessResponse};

const MAX_TITLE_LEN: usize = 200;
const MAX_SLUG_LEN: usize = 200;
const MAX_TAGS: usize = 20;
const DEFAULT_RANDOM_COUNT: i64 = 3;
const MAX_RANDOM_COUNT: i64 = 10;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/blog (list)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    /// Only honoured for admins; the public always sees published posts.
    pub status: Option<String>,
    pub category: Option<Uuid>,
    pub tag: Option<String>,
    pub q: Option<String>,
}

/// Response for GET /api/blog (list)
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListResponse {
    pub items: Vec<BlogPostSummary>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

/// Blog post summary (for list view)
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub featured_image: Option<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub reading_time: i32,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostRow> for BlogPostSummary {
    fn from(p: PostRow) -> Self {
        let status = p.status();
        BlogPostSummary {
            id: p.id,
            title: p.title,
            slug: p.slug,
            description: p.description,
            featured_image: p.featured_image,
            tags: p.tags,
            status,
            category_id: p.category_id,
            category_name: p.category_name,
            reading_time: p.reading_time_minutes,
            view_count: p.view_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Full blog post response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostResponse {
    #[serde(flatten)]
    pub summary: BlogPostSummary,
    pub blocks: Vec<ContentBlock>,
    pub content_html: String,
}

impl From<PostRow> for BlogPostResponse {
    fn from(mut p: PostRow) -> Self {
        let blocks = std::mem::take(&mut p.blocks.0);
        let content_html = content::render(&blocks);
        BlogPostResponse {
            summary: p.into(),
            blocks,
            content_html,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RandomPostsResponse {
    pub posts: Vec<BlogPostSummary>,
}

/// Query parameters for GET /api/blogs/random
#[derive(Debug, Deserialize)]
pub struct RandomQuery {
    pub count: Option<i64>,
    pub exclude: Option<String>,
}

/// Request body for POST /api/blog (create)
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogRequest {
    pub title: String,
    /// Derived from the title when omitted.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub featured_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: PostStatus,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
}

/// Request body for PUT /api/blog/{id} (update). Absent fields are kept;
/// `null` clears the nullable ones.
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub featured_image: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    pub blocks: Option<Vec<ContentBlock>>,
}

/// Distinguishes a missing field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

// ============================================================================
// Validation
// ============================================================================

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Normalise and check a post before it is written.
fn validate(mut fields: PostFields) -> Result<PostFields, AppError> {
    fields.title = fields.title.trim().to_string();
    if fields.title.is_empty() {
        return Err(AppError::validation("Title is required"));
    }
    if fields.title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }

    fields.slug = fields.slug.trim().to_string();
    if fields.slug.is_empty() {
        return Err(AppError::validation("Slug is required"));
    }
    if fields.slug.len() > MAX_SLUG_LEN || !content::is_valid_slug(&fields.slug) {
        return Err(AppError::validation(
            "Slug must contain only lowercase letters, numbers, and hyphens",
        ));
    }

    fields.tags = clean_tags(fields.tags);
    if fields.tags.len() > MAX_TAGS {
        return Err(AppError::validation(format!(
            "At most {MAX_TAGS} tags are allowed"
        )));
    }

    fields.description = non_blank(fields.description);
    fields.featured_image = non_blank(fields.featured_image);
    fields.reading_time_minutes = content::reading_time_minutes(&fields.blocks);
    Ok(fields)
}

fn fields_from_create(req: CreateBlogRequest) -> Result<PostFields, AppError> {
    let slug = non_blank(req.slug).unwrap_or_else(|| content::slugify(&req.title));
    validate(PostFields {
        title: req.title,
        slug,
        description: req.description,
        featured_image: req.featured_image,
        tags: req.tags,
        status: req.status,
        category_id: req.category_id,
        blocks: req.blocks,
        reading_time_minutes: 1,
    })
}

fn merge_update(existing: PostFields, req: UpdateBlogRequest) -> Result<PostFields, AppError> {
    validate(PostFields {
        title: req.title.unwrap_or(existing.title),
        slug: req.slug.unwrap_or(existing.slug),
        description: req.description.unwrap_or(existing.description),
        featured_image: req.featured_image.unwrap_or(existing.featured_image),
        tags: req.tags.unwrap_or(existing.tags),
        status: req.status.unwrap_or(existing.status),
        category_id: req.category_id.unwrap_or(existing.category_id),
        blocks: req.blocks.unwrap_or(existing.blocks),
        reading_time_minutes: existing.reading_time_minutes,
    })
}

/// Translate constraint violations into client errors.
fn write_error(err: sqlx::Error) -> AppError {
    if db::is_unique_violation(&err) {
        AppError::Conflict("Slug already exists".to_string())
    } else if db::is_foreign_key_violation(&err) {
        AppError::validation("Unknown category")
    } else {
        AppError::Database(err)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/blog - List blog posts with pagination
pub async fn list_posts(
    headers: HeaderMap,
    Query(query): Query<BlogListQuery>,
) -> Result<Json<BlogListResponse>, AppError> {
    let status = if is_admin(&headers) {
        query
            .status
            .as_deref()
            .filter(|s| !s.is_empty() && *s != "all")
            .map(str::parse::<PostStatus>)
            .transpose()
            .map_err(AppError::Validation)?
    } else {
        Some(PostStatus::Published)
    };

    let pool = db::require_pool()?;
    let (page, page_size, offset) = paginate(query.page, query.page_size);

    let filter = PostFilter {
        status,
        category_id: query.category,
        tag: non_blank(query.tag),
        search: non_blank(query.q),
        limit: page_size,
        offset,
    };
    let (rows, total) = posts::list(&pool, &filter).await?;

    Ok(Json(BlogListResponse {
        items: rows.into_iter().map(BlogPostSummary::from).collect(),
        page,
        page_size,
        total,
    }))
}

/// GET /api/blog/{id} - Single post by id or slug. Drafts are visible to
/// admins only; public reads count as a view.
pub async fn get_post(
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Json<BlogPostResponse>, AppError> {
    let pool = db::require_pool()?;
    let admin = is_admin(&headers);

    let found = posts::resolve(&pool, key.trim()).await?;
    let post = read_post(found, admin, |id| posts::increment_views(&pool, id)).await?;

    Ok(Json(post.into()))
}

/// Drafts are visible to admins only. Public reads bump the view counter;
/// a failed bump is logged and the read still succeeds.
async fn read_post<F, Fut>(
    found: Option<PostRow>,
    admin: bool,
    count_view: F,
) -> Result<PostRow, AppError>
where
    F: FnOnce(Uuid) -> Fut,
    Fut: Future<Output = Result<i64, sqlx::Error>>,
{
    let mut post = found
        .filter(|p| admin || p.is_published())
        .ok_or_else(AppError::not_found)?;

    if !admin {
        match count_view(post.id).await {
            Ok(views) => post.view_count = views,
            Err(e) => tracing::warn!(post_id = %post.id, error = %e, "failed to count view"),
        }
    }

    Ok(post)
}

/// POST /api/blog - Create new blog post (auth required)
pub async fn create_post(
    headers: HeaderMap,
    Json(payload): Json<CreateBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&headers)?;
    let fields = fields_from_create(payload)?;
    let pool = db::require_pool()?;

    let post = posts::insert(&pool, &fields).await.map_err(write_error)?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "blog post created");

    Ok((StatusCode::CREATED, Json(BlogPostResponse::from(post))))
}

/// PUT /api/blog/{id} - Update blog post (auth required)
pub async fn update_post(
    headers: HeaderMap,
    Path(key): Path<String>,
    Json(payload): Json<UpdateBlogRequest>,
) -> Result<Json<BlogPostResponse>, AppError> {
    require_admin(&headers)?;
    let pool = db::require_pool()?;

    let existing = posts::resolve(&pool, key.trim())
        .await?
        .ok_or_else(AppError::not_found)?;
    let id = existing.id;
    let fields = merge_update(existing.into(), payload)?;

    let post = posts::update(&pool, id, &fields)
        .await
        .map_err(write_error)?
        .ok_or_else(AppError::not_found)?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "blog post updated");

    Ok(Json(post.into()))
}

/// DELETE /api/blog/{id} - Delete blog post (auth required)
pub async fn delete_post(
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    require_admin(&headers)?;
    let pool = db::require_pool()?;

    let post = posts::resolve(&pool, key.trim())
        .await?
        .ok_or_else(AppError::not_found)?;

    if !posts::delete(&pool, post.id).await? {
        return Err(AppError::not_found());
    }
    tracing::info!(post_id = %post.id, slug = %post.slug, "blog post deleted");

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/blogs/random - Random published posts, e.g. "read next"
pub async fn random_posts(
    Query(query): Query<RandomQuery>,
) -> Result<Json<RandomPostsResponse>, AppError> {
    let count = query
        .count
        .unwrap_or(DEFAULT_RANDOM_COUNT)
        .clamp(1, MAX_RANDOM_COUNT);
    let exclude = non_blank(query.exclude);

    let pool = db::require_pool()?;
    let rows = posts::random_published(&pool, count, exclude.as_deref()).await?;

    Ok(Json(RandomPostsResponse {
        posts: rows.into_iter().map(BlogPostSummary::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorResponse;
    use crate::db::test_support::{violation, Violation};
    use crate::routes::auth::create_access_token;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn blog_router() -> Router {
        Router::new()
            .route("/api/blog", get(list_posts).post(create_post))
            .route(
                "/api/blog/{id}",
                get(get_post).put(update_post).delete(delete_post),
            )
            .route("/api/blogs/random", get(random_posts))
    }

    fn admin_token() -> String {
        create_access_token().unwrap().0
    }

    async fn send(req: Request<Body>) -> (StatusCode, axum::body::Bytes) {
        let res = blog_router().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(t) = token {
            builder = builder.header("authorization", format!("Bearer {t}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn base_fields() -> PostFields {
        PostFields {
            title: "Old Title".to_string(),
            slug: "old-title".to_string(),
            description: Some("Intro".to_string()),
            featured_image: None,
            tags: vec!["gst".to_string()],
            status: PostStatus::Draft,
            category_id: Some(Uuid::nil()),
            blocks: vec![],
            reading_time_minutes: 1,
        }
    }

    #[test]
    fn test_create_derives_slug_from_title() {
        let fields = fields_from_create(CreateBlogRequest {
            title: "  New Tax Regime: What Changes? ".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(fields.title, "New Tax Regime: What Changes?");
        assert_eq!(fields.slug, "new-tax-regime-what-changes");
        assert_eq!(fields.status, PostStatus::Draft);
        assert_eq!(fields.reading_time_minutes, 1);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let empty = fields_from_create(CreateBlogRequest::default()).unwrap_err();
        assert_eq!(empty.to_string(), "Title is required");

        let bad_slug = fields_from_create(CreateBlogRequest {
            title: "Fine".to_string(),
            slug: Some("Not A Slug".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(bad_slug.status(), StatusCode::BAD_REQUEST);

        let long = fields_from_create(CreateBlogRequest {
            title: "x".repeat(MAX_TITLE_LEN + 1),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(long.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_tags_are_trimmed_and_deduplicated() {
        let fields = fields_from_create(CreateBlogRequest {
            title: "Tags".to_string(),
            tags: vec![" gst ".into(), "gst".into(), "".into(), "itr".into()],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(fields.tags, vec!["gst", "itr"]);
    }

    #[test]
    fn test_update_keeps_absent_fields_and_clears_nulls() {
        let req: UpdateBlogRequest = serde_json::from_value(serde_json::json!({
            "title": "New Title",
            "categoryId": null,
            "status": "published"
        }))
        .unwrap();
        let merged = merge_update(base_fields(), req).unwrap();
        assert_eq!(merged.title, "New Title");
        assert_eq!(merged.slug, "old-title");
        assert_eq!(merged.description.as_deref(), Some("Intro"));
        assert_eq!(merged.category_id, None);
        assert_eq!(merged.status, PostStatus::Published);
    }

    #[test]
    fn test_update_recomputes_reading_time() {
        let words = vec!["word"; 450].join(" ");
        let req = UpdateBlogRequest {
            blocks: Some(vec![ContentBlock::Text { content: words }]),
            ..Default::default()
        };
        let merged = merge_update(base_fields(), req).unwrap();
        assert_eq!(merged.reading_time_minutes, 3);
    }

    #[test]
    fn test_write_error_maps_plain_errors_to_database() {
        let err = write_error(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_duplicate_slug_is_conflict() {
        let err = write_error(violation(Violation::Unique));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Slug already exists");
    }

    #[test]
    fn test_unknown_category_is_bad_request() {
        let err = write_error(violation(Violation::ForeignKey));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Unknown category");
    }

    fn row(status: PostStatus, views: i64) -> PostRow {
        let now = Utc::now();
        PostRow {
            id: Uuid::new_v4(),
            title: "GST Basics".to_string(),
            slug: "gst-basics".to_string(),
            description: None,
            featured_image: None,
            tags: vec![],
            status: status.as_str().to_string(),
            category_id: None,
            category_name: None,
            blocks: sqlx::types::Json(vec![]),
            reading_time_minutes: 1,
            view_count: views,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_public_read_counts_a_view() {
        let post = row(PostStatus::Published, 4);
        let id = post.id;
        let read = read_post(Some(post), false, |counted| {
            assert_eq!(counted, id);
            std::future::ready(Ok(5))
        })
        .await
        .unwrap();
        assert_eq!(read.view_count, 5);
    }

    #[tokio::test]
    async fn test_admin_read_does_not_count_a_view() {
        let counted = std::cell::Cell::new(false);
        let read = read_post(Some(row(PostStatus::Published, 4)), true, |_| {
            counted.set(true);
            std::future::ready(Ok(5))
        })
        .await
        .unwrap();
        assert!(!counted.get());
        assert_eq!(read.view_count, 4);
    }

    #[tokio::test]
    async fn test_failed_view_count_still_serves_post() {
        let read = read_post(Some(row(PostStatus::Published, 4)), false, |_| {
            std::future::ready(Err(sqlx::Error::PoolTimedOut))
        })
        .await
        .unwrap();
        assert_eq!(read.view_count, 4);
    }

    #[tokio::test]
    async fn test_drafts_are_hidden_from_the_public() {
        let err = read_post(Some(row(PostStatus::Draft, 0)), false, |_| std::future::ready(Ok(1)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let read = read_post(Some(row(PostStatus::Draft, 0)), true, |_| std::future::ready(Ok(1)))
            .await
            .unwrap();
        assert_eq!(read.status(), PostStatus::Draft);
    }

    #[tokio::test]
    async fn test_missing_post_is_not_found() {
        let err = read_post(None, true, |_| std::future::ready(Ok(1))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_without_token_returns_unauthorized() {
        let req = json_request("POST", "/api/blog", None, serde_json::json!({"title": "Hello"}));
        let (status, bytes) = send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Authorization required");
    }

    #[tokio::test]
    async fn test_create_with_invalid_token_returns_unauthorized() {
        let req = json_request(
            "POST",
            "/api/blog",
            Some("not-a-token"),
            serde_json::json!({"title": "Hello"}),
        );
        let (status, _) = send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_validation_runs_before_database() {
        let token = admin_token();
        let req = json_request("POST", "/api/blog", Some(&token), serde_json::json!({"title": "   "}));
        let (status, _) = send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_without_database_returns_unavailable() {
        let token = admin_token();
        let req = json_request("POST", "/api/blog", Some(&token), serde_json::json!({"title": "Hello"}));
        let (status, _) = send(req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_update_and_delete_require_auth() {
        let update = json_request("PUT", "/api/blog/some-post", None, serde_json::json!({}));
        assert_eq!(send(update).await.0, StatusCode::UNAUTHORIZED);

        let delete = Request::delete("/api/blog/some-post").body(Body::empty()).unwrap();
        assert_eq!(send(delete).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_public_reads_without_database_return_unavailable() {
        for uri in ["/api/blog", "/api/blog/some-post", "/api/blogs/random?count=50"] {
            let req = Request::get(uri).body(Body::empty()).unwrap();
            assert_eq!(send(req).await.0, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_admin_list_rejects_unknown_status() {
        let token = admin_token();
        let req = Request::get("/api/blog?status=archived")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(req).await.0, StatusCode::BAD_REQUEST);
    }
}
