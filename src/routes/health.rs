/**
 * Health Routes
 * Liveness, readiness and database checks
 */
use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Healthy,
    Unhealthy,
    Ready,
    #[serde(rename = "not ready")]
    NotReady,
}

/// Single service check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Detailed health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub database: ServiceCheck,
    pub mail: ServiceCheck,
}

/// Ready check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub database: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

async fn database_check() -> ServiceCheck {
    match crate::db::health_check().await {
        Ok(duration) => ServiceCheck {
            status: HealthStatus::Healthy,
            response_time: Some(duration.as_millis() as u64),
            error: None,
        },
        Err(e) => ServiceCheck {
            status: HealthStatus::Unhealthy,
            response_time: None,
            error: Some(e.to_string()),
        },
    }
}

/// Only checks that credentials are present; contacting the relay is left
/// to the contact route.
fn mail_check() -> ServiceCheck {
    match crate::mail::MailConfig::from_env() {
        Ok(_) => ServiceCheck {
            status: HealthStatus::Healthy,
            response_time: None,
            error: None,
        },
        Err(e) => ServiceCheck {
            status: HealthStatus::Unhealthy,
            response_time: None,
            error: Some(e.to_string()),
        },
    }
}

/// GET /health - Simple health ping
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: HealthStatus::Ok,
    })
}

/// GET /health/detailed - Detailed health with all checks
pub async fn health_detailed() -> impl IntoResponse {
    // "ok" as long as the process serves requests; calculators need
    // neither the database nor mail.
    let response = DetailedHealthResponse {
        status: HealthStatus::Ok,
        timestamp: Utc::now(),
        uptime: SERVER_START.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: database_check().await,
            mail: mail_check(),
        },
    };

    (StatusCode::OK, Json(response))
}

/// GET /health/database - Database health check
pub async fn health_database() -> impl IntoResponse {
    (StatusCode::OK, Json(database_check().await))
}

/// GET /health/ready - Readiness check. Not ready only when a database is
/// configured but unreachable.
pub async fn health_ready() -> impl IntoResponse {
    let database = database_check().await.status;
    let configured = std::env::var("DATABASE_URL").is_ok_and(|v| !v.is_empty());
    let ready = database == HealthStatus::Healthy || !configured;

    let response = ReadyResponse {
        status: if ready {
            HealthStatus::Ready
        } else {
            HealthStatus::NotReady
        },
        timestamp: Utc::now(),
        uptime: SERVER_START.elapsed().as_secs(),
        database,
        reason: (!ready).then(|| "Database is not healthy".to_string()),
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/health", get(health_ping))
            .route("/health/detailed", get(health_detailed))
            .route("/health/database", get(health_database))
            .route("/health/ready", get(health_ready))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, T) {
        let req = Request::get(uri).body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value: T = serde_json::from_slice(&body).unwrap();
        (status, value)
    }

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(serde_json::to_string(&HealthStatus::Ok).unwrap(), "\"ok\"");
        assert_eq!(
            serde_json::to_string(&HealthStatus::NotReady).unwrap(),
            "\"not ready\""
        );
    }

    #[tokio::test]
    async fn test_health_ping_returns_ok() {
        init_start_time();
        let (status, body) = get_json::<SimpleHealthResponse>(test_router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, HealthStatus::Ok);
    }

    #[tokio::test]
    async fn test_health_database_returns_when_no_pool() {
        let (status, body) = get_json::<ServiceCheck>(test_router(), "/health/database").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, HealthStatus::Unhealthy);
        assert!(body.error.is_some());
    }

    #[tokio::test]
    async fn test_health_detailed_reports_checks() {
        init_start_time();
        let (status, body) =
            get_json::<DetailedHealthResponse>(test_router(), "/health/detailed").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, HealthStatus::Ok);
        assert_eq!(body.checks.database.status, HealthStatus::Unhealthy);
        assert!(!body.version.is_empty());
    }

    #[tokio::test]
    async fn test_health_ready_reports_database() {
        let (status, body) = get_json::<ReadyResponse>(test_router(), "/health/ready").await;
        assert_eq!(body.database, HealthStatus::Unhealthy);
        if body.status == HealthStatus::Ready {
            assert_eq!(status, StatusCode::OK);
        } else {
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        }
    }
}
