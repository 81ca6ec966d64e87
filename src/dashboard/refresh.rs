//! Periodic Refresh
//!
//! Initial load of the dashboard and the background metrics poll.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::Dashboard;
use crate::api::Recommendation;

impl Dashboard {
    /// Query service status; a failed check marks every service down
    pub async fn check_connection_status(&self) {
        let status = match self.client.status().await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(error = %e, "Error checking status");
                Default::default()
            }
        };

        self.update(|view| view.set_service_status(status)).await;
    }

    /// Refresh existing metric cards
    pub async fn update_metrics(&self) {
        match self.client.metrics().await {
            Ok(metrics) => {
                let updated = self.update(|view| view.update_metric_cards(&metrics)).await;
                tracing::debug!(updated, "Metrics refreshed");
            }
            Err(e) => tracing::error!(error = %e, "Error updating metrics"),
        }
    }

    /// Load the dashboard snapshot and build the metric cards
    pub async fn load_dashboard_data(&self) {
        match self.client.dashboard().await {
            Ok(snapshot) => {
                let recommendations = snapshot
                    .get("recommendations")
                    .cloned()
                    .and_then(|recs| serde_json::from_value::<Vec<Recommendation>>(recs).ok());

                self.update(|view| {
                    if let Some(recs) = recommendations {
                        view.set_recommendations(recs);
                    }
                    view.snapshot = Some(snapshot);
                })
                .await;
                tracing::debug!("Dashboard data loaded");
            }
            Err(e) => tracing::error!(error = %e, "Error loading dashboard data"),
        }

        match self.client.metrics().await {
            Ok(metrics) => self.update(|view| view.render_metric_cards(&metrics)).await,
            Err(e) => tracing::error!(error = %e, "Error loading metrics"),
        }
    }

    /// Everything the dashboard does once on startup
    pub async fn initialize(&self) {
        tracing::info!(base_url = %self.client.base_url(), "Dazno dashboard initialized");

        self.check_connection_status().await;
        self.load_dashboard_data().await;
        self.load_automation_settings().await;
    }
}

/// Shortest allowed refresh period
pub const MIN_REFRESH_PERIOD: Duration = Duration::from_secs(1);

/// Poll metrics every `every`, starting one period from now
///
/// Periods below [`MIN_REFRESH_PERIOD`] are raised to it.
pub fn spawn_refresh(dashboard: Dashboard, every: Duration) -> JoinHandle<()> {
    let every = if every < MIN_REFRESH_PERIOD {
        tracing::warn!(requested_ms = every.as_millis() as u64, "Refresh period too short, using minimum");
        MIN_REFRESH_PERIOD
    } else {
        every
    };

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            dashboard.update_metrics().await;
        }
    })
}
