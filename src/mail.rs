/*!
 * Mail
 * Transactional email for the contact form over an authenticated SMTP relay
 */
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::content::escape_html;

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SENDER_NAME: &str = "TaxDesk Advisory";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email service is not configured: {0} is missing")]
    NotConfigured(&'static str),

    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("SMTP relay rejected the configured credentials")]
    VerificationFailed,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub username: String,
    pub password: String,
    /// Where contact notifications go; defaults to the sending account.
    pub owner_email: String,
    pub sender_name: String,
}

impl MailConfig {
    /// Read `GMAIL_EMAIL`, `GMAIL_APP_PASSWORD`, `SITE_OWNER_EMAIL` and
    /// `SMTP_HOST` from the environment.
    pub fn from_env() -> Result<Self, MailError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, MailError> {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let username = non_empty("GMAIL_EMAIL").ok_or(MailError::NotConfigured("GMAIL_EMAIL"))?;
        let password = non_empty("GMAIL_APP_PASSWORD")
            .ok_or(MailError::NotConfigured("GMAIL_APP_PASSWORD"))?;

        Ok(Self {
            smtp_host: non_empty("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            owner_email: non_empty("SITE_OWNER_EMAIL").unwrap_or_else(|| username.clone()),
            sender_name: DEFAULT_SENDER_NAME.to_string(),
            username,
            password,
        })
    }

    fn sender(&self) -> Result<Mailbox, MailError> {
        let address: Address = self.username.parse()?;
        Ok(Mailbox::new(Some(self.sender_name.clone()), address))
    }
}

/// A validated contact-form submission.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

impl ContactMessage {
    fn mailbox(&self) -> Result<Mailbox, MailError> {
        let address: Address = self.email.parse()?;
        Ok(Mailbox::new(Some(self.name.clone()), address))
    }
}

/// Whether lettre accepts `email` as a recipient address.
pub fn is_deliverable_address(email: &str) -> bool {
    email.parse::<Address>().is_ok()
}

fn paragraphs(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

pub fn owner_notification_html(msg: &ContactMessage) -> String {
    format!(
        "<h2>New contact enquiry</h2>\n\
         <p><strong>Name:</strong> {}</p>\n\
         <p><strong>Email:</strong> {}</p>\n\
         <p><strong>Phone:</strong> {}</p>\n\
         <p><strong>Message:</strong></p>\n<p>{}</p>\n",
        escape_html(&msg.name),
        escape_html(&msg.email),
        escape_html(msg.phone.as_deref().unwrap_or("Not provided")),
        paragraphs(&msg.message),
    )
}

pub fn confirmation_html(msg: &ContactMessage) -> String {
    format!(
        "<p>Dear {},</p>\n\
         <p>Thank you for reaching out. We have received your message and one of our \
         advisors will get back to you within one business day.</p>\n\
         <p>For reference, here is what you sent us:</p>\n\
         <blockquote>{}</blockquote>\n\
         <p>Regards,<br>TaxDesk Advisory</p>\n",
        escape_html(&msg.name),
        paragraphs(&msg.message),
    )
}

/// Notification to the site owner; replies go straight to the submitter.
pub fn owner_notification(config: &MailConfig, msg: &ContactMessage) -> Result<Message, MailError> {
    let owner: Address = config.owner_email.parse()?;
    let message = Message::builder()
        .from(config.sender()?)
        .reply_to(msg.mailbox()?)
        .to(Mailbox::new(None, owner))
        .subject(format!("New contact enquiry from {}", msg.name))
        .header(ContentType::TEXT_HTML)
        .body(owner_notification_html(msg))?;
    Ok(message)
}

pub fn submitter_confirmation(
    config: &MailConfig,
    msg: &ContactMessage,
) -> Result<Message, MailError> {
    let message = Message::builder()
        .from(config.sender()?)
        .to(msg.mailbox()?)
        .subject("We have received your message")
        .header(ContentType::TEXT_HTML)
        .body(confirmation_html(msg))?;
    Ok(message)
}

/// Verify the relay credentials, then send the owner notification and the
/// submitter confirmation. Any failure aborts; nothing is retried.
pub async fn send_contact_emails(config: &MailConfig, msg: &ContactMessage) -> Result<(), MailError> {
    let notification = owner_notification(config, msg)?;
    let confirmation = submitter_confirmation(config, msg)?;

    let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
        .credentials(Credentials::new(
            config.username.clone(),
            config.password.clone(),
        ))
        .build();

    if !transport.test_connection().await? {
        return Err(MailError::VerificationFailed);
    }
    tracing::debug!(host = %config.smtp_host, "SMTP credentials verified");

    transport.send(notification).await?;
    transport.send(confirmation).await?;

    tracing::info!(to = %config.owner_email, "contact emails sent");
    Ok(())
}
