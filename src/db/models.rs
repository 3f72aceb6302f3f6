//! Database Models - row structs and write payloads for the repository modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::content::ContentBlock;

/// Publication state of a blog post, stored as lowercase text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(format!("unknown post status: {other}")),
        }
    }
}

/// Blog post joined with its category name.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub featured_image: Option<String>,
    pub tags: Vec<String>,
    pub status: String,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub blocks: Json<Vec<ContentBlock>>,
    pub reading_time_minutes: i32,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostRow {
    /// Unknown values can only come from manual edits; treat them as drafts.
    pub fn status(&self) -> PostStatus {
        self.status.parse().unwrap_or_default()
    }

    pub fn is_published(&self) -> bool {
        self.status() == PostStatus::Published
    }
}

/// Fully validated post fields, used for both insert and update.
#[derive(Debug, Clone)]
pub struct PostFields {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub featured_image: Option<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub category_id: Option<Uuid>,
    pub blocks: Vec<ContentBlock>,
    pub reading_time_minutes: i32,
}

impl From<PostRow> for PostFields {
    fn from(row: PostRow) -> Self {
        let status = row.status();
        PostFields {
            title: row.title,
            slug: row.slug,
            description: row.description,
            featured_image: row.featured_image,
            tags: row.tags,
            status,
            category_id: row.category_id,
            blocks: row.blocks.0,
            reading_time_minutes: row.reading_time_minutes,
        }
    }
}

/// Filters for listing posts. `None` means "don't filter".
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub category_id: Option<Uuid>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Category with the number of posts filed under it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Contact-form submission.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

/// Counters for the admin dashboard.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_posts: i64,
    pub published_posts: i64,
    pub draft_posts: i64,
    pub total_views: i64,
    pub total_categories: i64,
    pub total_leads: i64,
    pub recent_leads: i64,
}
