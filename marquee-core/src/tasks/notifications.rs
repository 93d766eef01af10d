//! Fire-and-forget email-style notifications with bounded retries.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new_movie(recipient: impl Into<String>, title: &str) -> Self {
        Self {
            recipient: recipient.into(),
            subject: format!("New Movie Added: {title}"),
            body: format!("A new movie \"{title}\" has been added to our database!"),
        }
    }
}

/// Outbound transport for a single notification attempt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Writes notifications to the tracing log instead of delivering them.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl NotificationDispatcher for LogMailer {
    async fn send(&self, notification: &Notification) -> Result<()> {
        info!(
            from = %self.from,
            to = %notification.recipient,
            subject = %notification.subject,
            "notification sent"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Posts notifications as JSON to a mail relay.
#[derive(Debug, Clone)]
pub struct WebhookMailer {
    client: reqwest::Client,
    endpoint: url::Url,
    from: String,
}

impl WebhookMailer {
    pub fn new(endpoint: url::Url, from: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                CatalogError::Notification(format!(
                    "Failed to build HTTP client: {e}"
                ))
            })?;
        Ok(Self {
            client,
            endpoint,
            from: from.into(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookMailer {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let payload = WebhookPayload {
            from: &self.from,
            to: &notification.recipient,
            subject: &notification.subject,
            body: &notification.body,
        };
        self.client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                CatalogError::Notification(format!("Webhook delivery failed: {e}"))
            })?;
        Ok(())
    }
}

/// Backoff schedule between delivery attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the failed attempt numbered `attempt` (0-based).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let multiplier = self.backoff_multiplier.powi(exponent);
        let millis = self.base_delay.as_millis() as f64 * multiplier;
        if !millis.is_finite() || millis >= self.max_delay.as_millis() as f64 {
            return self.max_delay;
        }
        Duration::from_millis(millis as u64).min(self.max_delay)
    }
}

/// Retrying front for a [`NotificationDispatcher`].
#[derive(Clone)]
pub struct Notifier {
    dispatcher: Arc<dyn NotificationDispatcher>,
    policy: RetryPolicy,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field(
                "dispatcher",
                &std::any::type_name_of_val(self.dispatcher.as_ref()),
            )
            .field("policy", &self.policy)
            .finish()
    }
}

impl Notifier {
    pub fn new(
        dispatcher: Arc<dyn NotificationDispatcher>,
        policy: RetryPolicy,
    ) -> Self {
        Self { dispatcher, policy }
    }

    pub fn log_only(from: impl Into<String>) -> Self {
        Self::new(Arc::new(LogMailer::new(from)), RetryPolicy::default())
    }

    /// Attempts delivery until it succeeds or the retry budget is spent.
    pub async fn deliver(&self, notification: &Notification) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.dispatcher.send(notification).await {
                Ok(()) => {
                    debug!(to = %notification.recipient, attempt, "notification delivered");
                    return Ok(());
                }
                Err(err) if attempt >= self.policy.max_retries => {
                    error!(
                        to = %notification.recipient,
                        subject = %notification.subject,
                        attempts = attempt + 1,
                        error = %err,
                        "giving up on notification"
                    );
                    return Err(CatalogError::Notification(format!(
                        "delivery to {} failed after {} attempts: {err}",
                        notification.recipient,
                        attempt + 1
                    )));
                }
                Err(err) => {
                    let delay = self.policy.calculate_delay(attempt);
                    warn!(
                        to = %notification.recipient,
                        attempt,
                        ?delay,
                        error = %err,
                        "notification attempt failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Schedules delivery in the background; the caller never waits on it.
    pub fn dispatch(
        &self,
        notification: Notification,
    ) -> tokio::task::JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            let _ = notifier.deliver(&notification).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn new_movie_message_text() {
        let n = Notification::new_movie("a@example.com", "Dune");
        assert_eq!(n.subject, "New Movie Added: Dune");
        assert_eq!(n.body, "A new movie \"Dune\" has been added to our database!");
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let policy = fast_policy(5);
        assert_eq!(policy.calculate_delay(0), Duration::from_millis(10));
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(20));
        assert_eq!(policy.calculate_delay(10), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_a_bounded_number_of_times() {
        let mut dispatcher = MockNotificationDispatcher::new();
        dispatcher
            .expect_send()
            .times(3)
            .returning(|_| Err(CatalogError::Notification("smtp down".into())));

        let notifier = Notifier::new(Arc::new(dispatcher), fast_policy(2));
        let result = notifier
            .deliver(&Notification::new_movie("a@example.com", "Dune"))
            .await;

        assert!(matches!(result, Err(CatalogError::Notification(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_retrying_after_success() {
        let mut dispatcher = MockNotificationDispatcher::new();
        let mut seq = mockall::Sequence::new();
        dispatcher
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(CatalogError::Notification("timeout".into())));
        dispatcher
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let notifier = Notifier::new(Arc::new(dispatcher), fast_policy(5));
        notifier
            .deliver(&Notification::new_movie("a@example.com", "Dune"))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_swallows_exhaustion() {
        let mut dispatcher = MockNotificationDispatcher::new();
        dispatcher
            .expect_send()
            .times(2)
            .returning(|_| Err(CatalogError::Notification("refused".into())));

        let notifier = Notifier::new(Arc::new(dispatcher), fast_policy(1));
        let handle = notifier.dispatch(Notification::new_movie("a@example.com", "Dune"));
        handle.await.unwrap();
    }
}
