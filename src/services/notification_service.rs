use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{info, warn};

use crate::services::alert_service::AlertMessage;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("network error: {0}")]
    Network(String),

    #[error("notification endpoint returned status {0}")]
    Status(u16),
}

/// Delivery channel for triggered alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &AlertMessage) -> Result<(), NotificationError>;
}

// ==============================================================================
// ntfy push notifications
// ==============================================================================

/// Posts the alert body as plain text to an ntfy topic URL, with the title and
/// priority carried in headers.
pub struct NtfyNotifier {
    client: Client,
    topic_url: String,
    timeout: Duration,
}

impl NtfyNotifier {
    pub fn new(client: Client, topic_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            topic_url: topic_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn send(&self, message: &AlertMessage) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.topic_url)
            .timeout(self.timeout)
            .header("Title", message.title.as_str())
            .header("Priority", message.priority.to_string())
            .header("Tags", "chart_with_downwards_trend")
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(message.body.clone())
            .send()
            .await
            .map_err(|e| NotificationError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotificationError::Status(response.status().as_u16()));
        }

        info!("🔔 Notification delivered to {}", self.topic_url);
        Ok(())
    }
}

// ==============================================================================
// Log-only fallback
// ==============================================================================

/// Used when no topic is configured: the alert only goes to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &AlertMessage) -> Result<(), NotificationError> {
        warn!(
            "🔔 Alert (no notification endpoint configured) [{}] {}: {}",
            message.priority, message.title, message.body
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::alert_service::AlertPriority;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> AlertMessage {
        AlertMessage {
            title: "Gold price drop: 22K Hyderabad".to_string(),
            body: "22K gold in Hyderabad is now ₹132000.00 per 10g".to_string(),
            priority: AlertPriority::High,
        }
    }

    #[tokio::test]
    async fn test_ntfy_posts_body_with_title_and_priority() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gold-alerts"))
            .and(header("Title", "Gold price drop: 22K Hyderabad"))
            .and(header("Priority", "high"))
            .and(body_string("22K gold in Hyderabad is now ₹132000.00 per 10g"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = NtfyNotifier::new(
            Client::new(),
            format!("{}/gold-alerts", server.uri()),
            Duration::from_secs(10),
        );

        notifier.send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn test_ntfy_rejection_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let notifier = NtfyNotifier::new(Client::new(), server.uri(), Duration::from_secs(10));

        let err = notifier.send(&message()).await.unwrap_err();
        assert!(matches!(err, NotificationError::Status(429)));
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        assert!(LogNotifier.send(&message()).await.is_ok());
    }
}
