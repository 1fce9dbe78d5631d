//! Email service for sending invitation emails.
//!
//! Supports two providers:
//! - `console`: Logs emails (development)
//! - `sendgrid`: Uses the SendGrid v3 API

use async_trait::async_trait;
use domain::services::{MailError, MailMessage, MailSender};
use shared::validation::is_valid_email;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::EmailConfig;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    async fn send_console(&self, message: MailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            to_name = %message.to_name,
            subject = %message.subject,
            from = %message.from,
            from_name = %self.sender_name(&message),
            "Email (console provider)"
        );
        info!(body_text = %message.body, "Email body (plain text)");
        Ok(())
    }

    async fn send_sendgrid(&self, message: MailMessage) -> Result<(), MailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(MailError::NotConfigured);
        }

        let body = sendgrid_payload(&message, self.sender_name(&message));

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(
                to = %message.to,
                subject = %message.subject,
                "Email sent via SendGrid"
            );
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(MailError::SendFailed(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }

    fn sender_name<'a>(&'a self, message: &'a MailMessage) -> &'a str {
        if message.from_name.trim().is_empty() {
            &self.config.sender_name
        } else {
            &message.from_name
        }
    }
}

#[async_trait]
impl MailSender for EmailService {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        if !is_valid_email(&message.to) {
            return Err(MailError::InvalidAddress(message.to));
        }
        if !is_valid_email(&message.from) {
            return Err(MailError::InvalidAddress(message.from));
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(MailError::NotConfigured)
            }
        }
    }
}

fn sendgrid_payload(message: &MailMessage, from_name: &str) -> serde_json::Value {
    let mut recipient = serde_json::json!({ "email": message.to });
    if !message.to_name.is_empty() {
        recipient["name"] = serde_json::json!(message.to_name);
    }

    serde_json::json!({
        "personalizations": [{ "to": [recipient] }],
        "from": {
            "email": message.from,
            "name": from_name
        },
        "subject": message.subject,
        "content": [{
            "type": "text/plain",
            "value": message.body
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(provider: &str) -> EmailConfig {
        EmailConfig {
            enabled: true,
            provider: provider.to_string(),
            sendgrid_api_key: String::new(),
            sender_name: "Example Cloud".to_string(),
        }
    }

    fn message() -> MailMessage {
        MailMessage {
            to: "bob@example.com".to_string(),
            to_name: "bob".to_string(),
            subject: "You are invited to join Example Cloud".to_string(),
            body: "Hello bob".to_string(),
            from: "no-reply@example.com".to_string(),
            from_name: String::new(),
        }
    }

    #[tokio::test]
    async fn test_send_console_email() {
        let service = EmailService::new(test_config("console"));
        assert!(service.send(message()).await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_service_skips_send() {
        let mut config = test_config("sendgrid");
        config.enabled = false;
        let service = EmailService::new(config);
        assert!(service.send(message()).await.is_ok());
    }

    #[tokio::test]
    async fn test_sendgrid_requires_api_key() {
        let service = EmailService::new(test_config("sendgrid"));
        assert!(matches!(
            service.send(message()).await,
            Err(MailError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let service = EmailService::new(test_config("pigeon"));
        assert!(matches!(
            service.send(message()).await,
            Err(MailError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_invalid_recipient_rejected() {
        let service = EmailService::new(test_config("console"));
        let mut bad = message();
        bad.to = "not-an-address".to_string();
        assert!(matches!(
            service.send(bad).await,
            Err(MailError::InvalidAddress(addr)) if addr == "not-an-address"
        ));
    }

    #[test]
    fn test_sendgrid_payload() {
        let payload = sendgrid_payload(&message(), "The Admin");
        assert_eq!(payload["personalizations"][0]["to"][0]["email"], "bob@example.com");
        assert_eq!(payload["personalizations"][0]["to"][0]["name"], "bob");
        assert_eq!(payload["from"]["email"], "no-reply@example.com");
        assert_eq!(payload["from"]["name"], "The Admin");
        assert_eq!(payload["content"][0]["value"], "Hello bob");
    }

    #[test]
    fn test_sender_name_falls_back_to_config() {
        let service = EmailService::new(test_config("console"));
        let msg = message();
        assert_eq!(service.sender_name(&msg), "Example Cloud");
    }
}
