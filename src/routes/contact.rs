/**
 * Contact Route
 * Validates the contact form, records a lead and emails owner + submitter
 */
use axum::Json;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::db::{self, leads, models::NewLead};
use crate::error::AppError;
use crate::mail::{self, ContactMessage, MailConfig};

const MAX_MESSAGE_LEN: usize = 5000;
const MAX_NAME_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 20;

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

fn validate(req: ContactRequest) -> Result<ContactMessage, AppError> {
    let name = req.name.trim().to_string();
    let email = req.email.trim().to_string();
    let message = req.message.trim().to_string();

    if name.is_empty() || email.is_empty() || message.is_empty() {
        return Err(AppError::validation("Name, email and message are required"));
    }
    if !EMAIL_REGEX.is_match(&email) || !mail::is_deliverable_address(&email) {
        return Err(AppError::validation("Invalid email address"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "Name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::validation(format!(
            "Message must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }

    let phone = req
        .phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    if phone.as_ref().is_some_and(|p| p.chars().count() > MAX_PHONE_LEN) {
        return Err(AppError::validation("Invalid phone number"));
    }

    Ok(ContactMessage {
        name,
        email,
        phone,
        message,
    })
}

/// Store the submission when a database is configured. Losing a lead is
/// not worth failing the request over.
async fn record_lead(msg: &ContactMessage) {
    let Some(pool) = db::get_pool() else {
        tracing::debug!("database unavailable, lead not recorded");
        return;
    };

    let lead = NewLead {
        name: msg.name.clone(),
        email: msg.email.clone(),
        phone: msg.phone.clone(),
        message: msg.message.clone(),
    };
    match leads::insert(&pool, &lead).await {
        Ok(lead) => tracing::info!(lead_id = %lead.id, "lead recorded"),
        Err(e) => tracing::error!(error = %e, "failed to record lead"),
    }
}

/// POST /api/contact
pub async fn submit_contact(
    Json(payload): Json<ContactRequest>,
) -> Result<Json<ContactResponse>, AppError> {
    submit_with(payload, MailConfig::from_env).await
}

async fn submit_with(
    payload: ContactRequest,
    load_config: impl FnOnce() -> Result<MailConfig, mail::MailError>,
) -> Result<Json<ContactResponse>, AppError> {
    let msg = validate(payload)?;

    record_lead(&msg).await;

    let config = load_config()?;
    mail::send_contact_emails(&config, &msg).await?;

    Ok(Json(ContactResponse {
        success: true,
        message: "Thank you! Your message has been sent.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorResponse;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    fn request(name: &str, email: &str, message: &str) -> ContactRequest {
        ContactRequest {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_validate_trims_fields() {
        let msg = validate(ContactRequest {
            phone: Some("  ".to_string()),
            ..request(" Asha ", " asha@example.com ", " Hello ")
        })
        .unwrap();
        assert_eq!(msg.name, "Asha");
        assert_eq!(msg.email, "asha@example.com");
        assert_eq!(msg.message, "Hello");
        assert_eq!(msg.phone, None);
    }

    #[test]
    fn test_validate_requires_fields() {
        for req in [
            request("", "a@b.co", "hi"),
            request("A", "   ", "hi"),
            request("A", "a@b.co", "\n\t"),
        ] {
            let err = validate(req).unwrap_err();
            assert_eq!(err.to_string(), "Name, email and message are required");
        }
    }

    #[test]
    fn test_validate_email_format() {
        for bad in ["plainaddress", "a@b", "a b@c.com", "@c.com"] {
            let err = validate(request("A", bad, "hi")).unwrap_err();
            assert_eq!(err.to_string(), "Invalid email address", "{bad}");
        }
        assert!(validate(request("A", "first.last@firm.co.in", "hi")).is_ok());
    }

    #[test]
    fn test_validate_rejects_undeliverable_addresses() {
        for bad in ["a(b@c.com", "a,b@c.com", "a\"b@c.com", "a:b@c.com"] {
            let err = validate(request("A", bad, "hi")).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{bad}");
            assert_eq!(err.to_string(), "Invalid email address", "{bad}");
        }
    }

    #[test]
    fn test_validate_message_length() {
        assert!(validate(request("A", "a@b.co", &"x".repeat(MAX_MESSAGE_LEN))).is_ok());
        assert!(validate(request("A", "a@b.co", &"x".repeat(MAX_MESSAGE_LEN + 1))).is_err());
    }

    #[tokio::test]
    async fn test_invalid_submission_returns_bad_request() {
        let app = Router::new().route("/api/contact", post(submit_contact));
        let body = serde_json::json!({"name": "Asha", "email": "not-an-email", "message": "Hi"});
        let req = Request::post("/api/contact")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Invalid email address");
    }

    #[tokio::test]
    async fn test_unparseable_address_returns_bad_request() {
        let app = Router::new().route("/api/contact", post(submit_contact));
        let body = serde_json::json!({"name": "Asha", "email": "a(b@c.com", "message": "Hi"});
        let req = Request::post("/api/contact")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Invalid email address");
    }

    #[tokio::test]
    async fn test_missing_mail_config_returns_server_error() {
        let payload = request("Asha", "asha@example.com", "Need help with my return");
        let err = submit_with(payload, || MailConfig::from_vars(|_| None))
            .await
            .unwrap_err();

        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Failed to send message");
        assert_eq!(
            body.message.as_deref(),
            Some("Please try again later or email us directly.")
        );
    }
}
