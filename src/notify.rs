//! Notification Center
//!
//! Transient operator notifications. Every error the dashboard catches ends
//! up here as a short message that dismisses itself after a while.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Default time a notification stays visible
pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationLevel::Success => "✅",
            NotificationLevel::Error => "❌",
            NotificationLevel::Warning => "⚠️",
            NotificationLevel::Info => "ℹ️",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationLevel::Success => "success",
            NotificationLevel::Error => "error",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Info => "info",
        }
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: String,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

/// Holds the visible notifications and fans them out to subscribers
pub struct NotificationCenter {
    active: Arc<RwLock<Vec<Notification>>>,
    broadcast_tx: broadcast::Sender<Notification>,
    default_duration: Duration,
}

impl NotificationCenter {
    pub fn new(default_duration: Duration) -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);

        Self {
            active: Arc::new(RwLock::new(Vec::new())),
            broadcast_tx,
            default_duration,
        }
    }

    /// Receive every notification pushed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.broadcast_tx.subscribe()
    }

    /// Push a notification with the default duration
    pub async fn notify(&self, level: NotificationLevel, message: impl Into<String>) -> Notification {
        self.notify_for(level, message, self.default_duration).await
    }

    /// Push a notification that dismisses itself after `duration`
    pub async fn notify_for(
        &self,
        level: NotificationLevel,
        message: impl Into<String>,
        duration: Duration,
    ) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            level,
            message: message.into(),
            created_at: Utc::now(),
            duration,
        };

        match level {
            NotificationLevel::Error => {
                tracing::error!(id = %notification.id, message = %notification.message, "Notification")
            }
            NotificationLevel::Warning => {
                tracing::warn!(id = %notification.id, message = %notification.message, "Notification")
            }
            NotificationLevel::Success | NotificationLevel::Info => {
                tracing::info!(id = %notification.id, level = %level, message = %notification.message, "Notification")
            }
        }

        self.active.write().await.push(notification.clone());

        // No subscribers is fine
        let _ = self.broadcast_tx.send(notification.clone());

        let active = Arc::clone(&self.active);
        let id = notification.id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            active.write().await.retain(|n| n.id != id);
        });

        notification
    }

    pub async fn success(&self, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Success, message).await
    }

    pub async fn error(&self, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Error, message).await
    }

    pub async fn warning(&self, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Warning, message).await
    }

    pub async fn info(&self, message: impl Into<String>) -> Notification {
        self.notify(NotificationLevel::Info, message).await
    }

    /// Remove a notification before it expires; returns whether it was visible
    pub async fn dismiss(&self, id: &str) -> bool {
        let mut active = self.active.write().await;
        let before = active.len();
        active.retain(|n| n.id != id);
        active.len() != before
    }

    /// Currently visible notifications, oldest first
    pub async fn active(&self) -> Vec<Notification> {
        self.active.read().await.clone()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_auto_dismiss_after_default_duration() {
        let center = NotificationCenter::default();
        let n = center.error("Network error occurred").await;

        assert_eq!(n.duration, Duration::from_secs(5));
        assert_eq!(center.active().await.len(), 1);

        tokio::time::sleep(Duration::from_millis(4_999)).await;
        assert_eq!(center.active().await.len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(center.active().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_duration() {
        let center = NotificationCenter::default();
        center
            .notify_for(NotificationLevel::Success, "Saved", Duration::from_secs(3))
            .await;
        center.info("Testing connections...").await;

        tokio::time::sleep(Duration::from_millis(3_001)).await;
        let active = center.active().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "Testing connections...");
    }

    #[tokio::test]
    async fn test_manual_dismiss() {
        let center = NotificationCenter::default();
        let first = center.warning("Auto-execution disabled").await;
        let second = center.info("Running simulation...").await;

        assert!(center.dismiss(&first.id).await);
        assert!(!center.dismiss(&first.id).await);

        let active = center.active().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
    }

    #[tokio::test]
    async fn test_subscribers_receive_notifications() {
        let center = NotificationCenter::default();
        let mut rx = center.subscribe();

        center.success("Recommendation approved successfully").await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.level, NotificationLevel::Success);
        assert_eq!(received.message, "Recommendation approved successfully");
    }

    #[test]
    fn test_serialized_form() {
        let n = Notification {
            id: "n-1".to_string(),
            level: NotificationLevel::Warning,
            message: "careful".to_string(),
            created_at: Utc::now(),
            duration: Duration::from_millis(4000),
        };
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["level"], "warning");
        assert_eq!(value["duration"], 4000);
    }
}
