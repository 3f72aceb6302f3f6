use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::content::escape_html;
use crate::db::{self, models::PostRow, posts};

const FEED_SIZE: i64 = 50;

struct FeedMeta {
    base_url: String,
    title: String,
    description: String,
}

impl FeedMeta {
    fn from_env() -> Self {
        let var = |key: &str, default: &str| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        FeedMeta {
            base_url: var("SITE_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            title: var("SITE_TITLE", "Tax Insights"),
            description: var(
                "SITE_DESCRIPTION",
                "Income tax, GST and compliance updates for individuals and businesses",
            ),
        }
    }
}

fn rfc822(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

fn render_item(meta: &FeedMeta, post: &PostRow) -> String {
    let post_url = format!("{}/blog/{}", meta.base_url, post.slug);
    let category = post
        .category_name
        .as_deref()
        .map(|c| format!("      <category>{}</category>\n", escape_html(c)))
        .unwrap_or_default();

    format!(
        "    <item>\n\
         \x20     <title>{}</title>\n\
         \x20     <link>{}</link>\n\
         \x20     <description>{}</description>\n\
         {}\
         \x20     <pubDate>{}</pubDate>\n\
         \x20     <guid isPermaLink=\"true\">{}</guid>\n\
         \x20   </item>\n",
        escape_html(&post.title),
        escape_html(&post_url),
        escape_html(post.description.as_deref().unwrap_or("")),
        category,
        rfc822(&post.created_at),
        escape_html(&post_url),
    )
}

fn render_feed(meta: &FeedMeta, posts: &[PostRow]) -> String {
    let items: String = posts.iter().map(|p| render_item(meta, p)).collect();
    let feed_url = format!("{}/rss.xml", meta.base_url);
    let blog_url = format!("{}/blog", meta.base_url);

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>{}</title>
    <link>{}</link>
    <description>{}</description>
    <language>en-in</language>
    <atom:link href="{}" rel="self" type="application/rss+xml"/>
    <lastBuildDate>{}</lastBuildDate>
{}  </channel>
</rss>"#,
        escape_html(&meta.title),
        escape_html(&blog_url),
        escape_html(&meta.description),
        escape_html(&feed_url),
        posts
            .first()
            .map(|p| rfc822(&p.created_at))
            .unwrap_or_default(),
        items,
    )
}

/// GET /rss.xml - latest published posts
pub async fn rss_feed() -> Response {
    let Some(pool) = db::get_pool() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable").into_response();
    };

    let rows = match posts::latest_published(&pool, FEED_SIZE).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "failed to load posts for RSS feed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build feed").into_response();
        }
    };

    let xml = render_feed(&FeedMeta::from_env(), &rows);

    (
        [
            (header::CONTENT_TYPE, "application/rss+xml; charset=utf-8"),
            (
                header::CACHE_CONTROL,
                "public, max-age=3600, stale-while-revalidate=600",
            ),
        ],
        xml,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn meta() -> FeedMeta {
        FeedMeta {
            base_url: "https://taxdesk.example".to_string(),
            title: "Tax & Insights".to_string(),
            description: "Updates".to_string(),
        }
    }

    fn post(slug: &str, category: Option<&str>) -> PostRow {
        let created = Utc.with_ymd_and_hms(2025, 2, 1, 9, 30, 0).unwrap();
        PostRow {
            id: Uuid::new_v4(),
            title: "Budget <2025>".to_string(),
            slug: slug.to_string(),
            description: Some("What changed".to_string()),
            featured_image: None,
            tags: vec![],
            status: "published".to_string(),
            category_id: None,
            category_name: category.map(str::to_string),
            blocks: Json(vec![]),
            reading_time_minutes: 1,
            view_count: 0,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_item_text_is_escaped() {
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("<title>"), "&lt;title&gt;");
        assert_eq!(escape_html("\"quote\""), "&quot;quote&quot;");
        assert_eq!(escape_html("Investor's guide"), "Investor&#39;s guide");
    }

    #[test]
    fn test_rfc822_format() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(rfc822(&dt), "Mon, 15 Jan 2024 12:00:00 +0000");
    }

    #[test]
    fn test_render_feed_items() {
        let xml = render_feed(&meta(), &[post("budget-2025", Some("Income Tax")), post("gst", None)]);
        assert!(xml.contains("<title>Tax &amp; Insights</title>"));
        assert!(xml.contains("<link>https://taxdesk.example/blog/budget-2025</link>"));
        assert!(xml.contains("<title>Budget &lt;2025&gt;</title>"));
        assert!(xml.contains("<category>Income Tax</category>"));
        assert_eq!(xml.matches("<item>").count(), 2);
        assert_eq!(xml.matches("<category>").count(), 1);
        assert!(xml.contains("<lastBuildDate>Sat, 01 Feb 2025 09:30:00 +0000</lastBuildDate>"));
    }

    #[test]
    fn test_render_empty_feed() {
        let xml = render_feed(&meta(), &[]);
        assert!(!xml.contains("<item>"));
        assert!(xml.contains("<lastBuildDate></lastBuildDate>"));
    }

    #[tokio::test]
    async fn test_feed_without_database_is_unavailable() {
        let res = rss_feed().await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
