/**
 * Admin Dashboard Routes
 * Contact-form leads and summary counters
 */
use axum::{extract::Query, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use crate::db::{self, leads, models::{DashboardStats, Lead}};
use crate::error::AppError;
use crate::routes::auth::require_admin;
use crate::routes::{default_page, default_page_size, paginate};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadListResponse {
    pub items: Vec<Lead>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

/// GET /api/leads - newest first
pub async fn list_leads(
    headers: HeaderMap,
    Query(query): Query<LeadListQuery>,
) -> Result<Json<LeadListResponse>, AppError> {
    require_admin(&headers)?;
    let pool = db::require_pool()?;

    let (page, page_size, offset) = paginate(query.page, query.page_size);
    let (items, total) = leads::list(&pool, page_size, offset).await?;

    Ok(Json(LeadListResponse {
        items,
        page,
        page_size,
        total,
    }))
}

/// GET /api/admin/stats
pub async fn dashboard_stats(headers: HeaderMap) -> Result<Json<DashboardStats>, AppError> {
    require_admin(&headers)?;
    let pool = db::require_pool()?;
    Ok(Json(db::dashboard_stats(&pool).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::auth::create_access_token;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn admin_router() -> Router {
        Router::new()
            .route("/api/leads", get(list_leads))
            .route("/api/admin/stats", get(dashboard_stats))
    }

    #[tokio::test]
    async fn test_routes_require_auth() {
        for uri in ["/api/leads", "/api/admin/stats"] {
            let req = Request::get(uri).body(Body::empty()).unwrap();
            let res = admin_router().oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_authorized_without_database_returns_unavailable() {
        let (token, _) = create_access_token().unwrap();
        for uri in ["/api/leads?page=2&pageSize=5", "/api/admin/stats"] {
            let req = Request::get(uri)
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap();
            let res = admin_router().oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        }
    }
}
