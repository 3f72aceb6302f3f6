//! TaxDesk Backend - library for app logic and testing

pub mod calc;
pub mod content;
pub mod db;
pub mod error;
pub mod logging;
pub mod mail;
pub mod routes;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

/// Global request body cap.
const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN, else the local
/// dev frontend.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .map(|s| {
            s.split(',')
                .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty())
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app() -> Router {
    use routes::{auth, blog, calculators, categories, contact, health, leads, rss};

    let cors = configure_cors();
    tracing::info!("CORS configured");

    // `/api/blog` and `/api/blogs` are the same resource; both are served.
    let post_collection = get(blog::list_posts).post(blog::create_post);
    let post_item = get(blog::get_post)
        .put(blog::update_post)
        .delete(blog::delete_post);

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify", post(auth::verify_token))
        .route("/api/blog", post_collection.clone())
        .route("/api/blog/{id}", post_item.clone())
        .route("/api/blogs", post_collection)
        .route("/api/blogs/random", get(blog::random_posts))
        .route("/api/blogs/{slug}", post_item)
        .route(
            "/api/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/categories/{id}",
            put(categories::rename_category).delete(categories::delete_category),
        )
        .route("/api/contact", post(contact::submit_contact))
        .route("/api/calculators/gst", post(calculators::gst_calculator))
        .route("/api/calculators/hra", post(calculators::hra_calculator))
        .route(
            "/api/calculators/income-tax",
            post(calculators::income_tax_calculator),
        )
        .route("/api/calculators/tds", post(calculators::tds_calculator))
        .route("/api/calculators/tds/sections", get(calculators::tds_sections))
        .route("/api/gst-search", post(calculators::gst_search))
        .route("/api/leads", get(leads::list_leads))
        .route("/api/admin/stats", get(leads::dashboard_stats))
        .route("/rss.xml", get(rss::rss_feed))
        .route("/health", get(health::health_ping))
        .route("/health/detailed", get(health::health_detailed))
        .route("/health/database", get(health::health_database))
        .route("/health/ready", get(health::health_ready))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors)
}

/// Refuse to run in production with the placeholder JWT secret.
fn check_production_secrets(environment: &str, jwt_secret: Option<&str>) -> Result<(), String> {
    if environment != "production" {
        return Ok(());
    }
    match jwt_secret.map(str::trim) {
        Some(secret) if !secret.is_empty() && secret != routes::auth::DEFAULT_JWT_SECRET => Ok(()),
        _ => Err("JWT_SECRET must be set to a secure, unique value in production".to_string()),
    }
}

/// Run the server (used by main).
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let log_config = logging::config::LogConfig::from_env();
    let _log_guards = logging::init(&log_config);

    routes::health::init_start_time();

    let jwt_secret = std::env::var("JWT_SECRET").ok();
    check_production_secrets(&log_config.environment, jwt_secret.as_deref())?;

    let admin_hash_missing =
        std::env::var("ADMIN_PASSWORD_HASH").map_or(true, |v| v.trim().is_empty());
    if admin_hash_missing && log_config.is_production() {
        tracing::warn!(
            "SECURITY: ADMIN_PASSWORD_HASH is not set; the development password is active. \
             Generate a hash with the hash-password binary."
        );
    }
    // Build the admin hash now rather than on the first login.
    lazy_static::initialize(&routes::auth::ADMIN_PASSWORD_HASH);

    if std::env::var("DATABASE_URL").is_ok() {
        match db::init_pool(None).await {
            Ok(pool) => {
                if let Err(e) = db::run_migrations(&pool).await {
                    tracing::error!("Failed to run database migrations: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize database pool: {}. Continuing without database.",
                    e
                );
            }
        }
    } else {
        tracing::info!("DATABASE_URL not set. Running without database; calculators only.");
    }

    let app = create_app();

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3001);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
