/**
 * Authentication Routes
 * Server-verified admin login issuing signed JWTs, and the guard used by
 * every admin-only route
 */
use axum::{
    extract::ConnectInfo,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio::sync::RwLock;

use crate::error::AppError;

// ============================================================================
// Configuration
// ============================================================================

/// Placeholder secret; `run()` refuses to start with it in production.
pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

lazy_static::lazy_static! {
    /// JWT signing secret from environment
    pub static ref JWT_SECRET: String = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());

    /// bcrypt hash of the admin password (see the hash-password binary)
    pub static ref ADMIN_PASSWORD_HASH: String = match std::env::var("ADMIN_PASSWORD_HASH") {
        Ok(hash) if !hash.trim().is_empty() => hash.trim().to_string(),
        _ => {
            tracing::warn!("ADMIN_PASSWORD_HASH not set, falling back to the development password");
            hash("admin123", DEFAULT_COST).unwrap_or_default()
        }
    };

    /// Failed/attempted logins per IP: (window start, attempts)
    static ref LOGIN_ATTEMPTS: Arc<RwLock<HashMap<String, (i64, u32)>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

/// Access token lifetime in hours
const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 12;

/// Login attempts allowed per IP inside one window
const MAX_LOGIN_ATTEMPTS: u32 = 5;

const RATE_LIMIT_WINDOW_SECS: i64 = 60;

const ADMIN_SUBJECT: &str = "admin";
const ADMIN_ROLE: &str = "ADMIN";

// ============================================================================
// Types
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoginResponse {
    fn failure(error: &str) -> Json<Self> {
        Json(Self {
            success: false,
            access_token: None,
            expires_at: None,
            error: Some(error.to_string()),
        })
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Token helpers
// ============================================================================

/// Create a signed admin access token; returns the token and its expiry.
pub(crate) fn create_access_token() -> Result<(String, i64), jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = (now + Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS)).timestamp();

    let claims = Claims {
        sub: ADMIN_SUBJECT.to_string(),
        role: ADMIN_ROLE.to_string(),
        exp,
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )?;
    Ok((token, exp))
}

/// Verify and decode access token
pub fn verify_access_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Guard for admin-only handlers.
pub fn require_admin(headers: &HeaderMap) -> Result<Claims, AppError> {
    let token = extract_bearer_token(headers)
        .ok_or_else(|| AppError::Unauthorized("Authorization required".to_string()))?;

    verify_access_token(token).map_err(|e| {
        tracing::debug!(error = %e, "rejected access token");
        AppError::Unauthorized("Invalid or expired token".to_string())
    })
}

/// Whether the request carries a valid admin token. Used by public routes
/// that show more to admins (e.g. drafts).
pub fn is_admin(headers: &HeaderMap) -> bool {
    require_admin(headers).is_ok()
}

/// Record one attempt from `ip` at `now`; false once the window is full.
/// Expired windows are evicted so the map only holds active IPs.
fn record_attempt(attempts: &mut HashMap<String, (i64, u32)>, ip: &str, now: i64) -> bool {
    attempts.retain(|_, (start, _)| now - *start < RATE_LIMIT_WINDOW_SECS);

    let entry = attempts.entry(ip.to_string()).or_insert((now, 0));
    if entry.1 >= MAX_LOGIN_ATTEMPTS {
        return false;
    }
    entry.1 += 1;
    true
}

async fn check_rate_limit(ip: &str) -> bool {
    #[cfg(test)]
    {
        let _ = ip;
        return true; // Bypass in tests so validation and credentials are exercised
    }

    #[cfg(not(test))]
    {
        let mut attempts = LOGIN_ATTEMPTS.write().await;
        return record_attempt(&mut attempts, ip, Utc::now().timestamp());
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
/// Check the admin password and return a signed access token
pub async fn login(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let ip = addr.ip().to_string();

    if !check_rate_limit(&ip).await {
        tracing::warn!(ip = %ip, "login rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            LoginResponse::failure("Too many login attempts. Please try again later."),
        );
    }

    if payload.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            LoginResponse::failure("Password is required"),
        );
    }

    // bcrypt is CPU-bound.
    let stored_hash = ADMIN_PASSWORD_HASH.clone();
    let password_ok =
        tokio::task::spawn_blocking(move || verify(&payload.password, &stored_hash).unwrap_or(false))
            .await
            .unwrap_or(false);

    if !password_ok {
        tracing::warn!(ip = %ip, "failed admin login");
        return (
            StatusCode::UNAUTHORIZED,
            LoginResponse::failure("Invalid credentials"),
        );
    }

    match create_access_token() {
        Ok((token, expires_at)) => {
            tracing::info!(ip = %ip, "admin logged in");
            (
                StatusCode::OK,
                Json(LoginResponse {
                    success: true,
                    access_token: Some(token),
                    expires_at: Some(expires_at),
                    error: None,
                }),
            )
        }
        Err(e) => {
            tracing::error!("Failed to create access token: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                LoginResponse::failure("Failed to create token"),
            )
        }
    }
}

/// POST /api/auth/verify
/// Report whether the bearer token is still valid
pub async fn verify_token(headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return Json(VerifyResponse {
            success: false,
            is_valid: false,
            role: None,
            expires_at: None,
            error: Some("No authorization token provided".to_string()),
        });
    };

    match verify_access_token(token) {
        Ok(claims) => Json(VerifyResponse {
            success: true,
            is_valid: true,
            role: Some(claims.role),
            expires_at: Some(claims.exp),
            error: None,
        }),
        Err(e) => {
            tracing::debug!("Token verification failed: {}", e);
            Json(VerifyResponse {
                success: false,
                is_valid: false,
                role: None,
                expires_at: None,
                error: Some("Invalid or expired token".to_string()),
            })
        }
    }
}
