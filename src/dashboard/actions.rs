//! Operator Actions
//!
//! Each action calls the backend and reports the outcome as a notification.
//! Errors never propagate past this layer.

use crate::api::{ActionType, SimulationResult};

use super::Dashboard;

/// When a scheduled recommendation should run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleTime {
    /// Ask the backend for the best time
    Optimal,
    /// Operator-supplied time, e.g. `2024-03-01 14:00`
    At(String),
}

impl ScheduleTime {
    /// `optimal` selects [`ScheduleTime::Optimal`], anything else is taken literally
    pub fn parse(input: &str) -> Self {
        if input.trim().eq_ignore_ascii_case("optimal") {
            ScheduleTime::Optimal
        } else {
            ScheduleTime::At(input.trim().to_string())
        }
    }
}

/// Fallback when the optimal execution time is unavailable
pub const UNKNOWN_OPTIMAL_TIME: &str = "Unknown";

impl Dashboard {
    /// Approve a recommendation; returns whether the backend accepted it
    pub async fn approve(&self, id: &str) -> bool {
        self.decide(id, ActionType::Approve).await
    }

    /// Reject a recommendation; returns whether the backend accepted it
    pub async fn reject(&self, id: &str) -> bool {
        self.decide(id, ActionType::Reject).await
    }

    async fn decide(&self, id: &str, action: ActionType) -> bool {
        let verb = match action {
            ActionType::Approve => "approve",
            ActionType::Reject => "reject",
        };

        match self.client.submit_action(id, action).await {
            Ok(response) if response.success => {
                match action {
                    ActionType::Approve => {
                        self.notifications
                            .success("Recommendation approved successfully")
                            .await;
                    }
                    ActionType::Reject => {
                        self.notifications.info("Recommendation rejected").await;
                    }
                }
                self.update(|view| view.remove_recommendation(id)).await;
                tracing::info!(recommendation_id = %id, action = action.as_str(), "Recommendation action accepted");
                true
            }
            Ok(response) => {
                let message = response.message.unwrap_or_default();
                self.notifications
                    .error(format!("Failed to {} recommendation: {}", verb, message))
                    .await;
                false
            }
            Err(e) if e.is_network() => {
                tracing::error!(recommendation_id = %id, error = %e, "Recommendation action failed");
                self.notifications.error("Network error occurred").await;
                false
            }
            Err(e) => {
                self.notifications
                    .error(format!("Failed to {} recommendation: {}", verb, e.message()))
                    .await;
                false
            }
        }
    }

    /// Execute a recommendation right away
    pub async fn auto_execute(&self, id: &str) -> bool {
        self.notifications
            .info("⚡ Auto-executing recommendation...")
            .await;

        match self.client.auto_execute(id, "auto").await {
            Ok(result) if result.success => {
                self.notifications
                    .success(format!(
                        "✅ Auto-execution successful! ROI impact: +{}%",
                        result.roi_impact
                    ))
                    .await;
                self.update(|view| {
                    view.remove_recommendation(id);
                    if let Some(stats) = result.stats {
                        view.automation.stats = Some(stats);
                    }
                })
                .await;
                true
            }
            Ok(result) => {
                self.notifications
                    .error(format!(
                        "❌ Auto-execution failed: {}",
                        result.message.unwrap_or_default()
                    ))
                    .await;
                false
            }
            Err(e) if e.is_network() => {
                tracing::error!(recommendation_id = %id, error = %e, "Auto-execution request failed");
                self.notifications
                    .error("🚨 Network error during auto-execution")
                    .await;
                false
            }
            Err(e) => {
                self.notifications
                    .error(format!("❌ Auto-execution failed: {}", e.message()))
                    .await;
                false
            }
        }
    }

    /// Simulate a recommendation without executing it
    pub async fn simulate(&self, id: &str) -> Option<SimulationResult> {
        self.update(|view| view.simulating = true).await;
        self.notifications.info("🎯 Running simulation...").await;

        let result = self.client.simulate(id).await;
        self.update(|view| view.simulating = false).await;

        match result {
            Ok(simulation) => Some(simulation),
            Err(e) => {
                tracing::error!(recommendation_id = %id, error = %e, "Simulation failed");
                self.notifications.error("🚨 Simulation failed").await;
                None
            }
        }
    }

    /// Best time to execute a recommendation, or `Unknown`
    pub async fn optimal_time(&self, id: &str) -> String {
        match self.client.optimal_time(id).await {
            Ok(response) => response.optimal_time,
            Err(e) => {
                tracing::debug!(recommendation_id = %id, error = %e, "Optimal time unavailable");
                UNKNOWN_OPTIMAL_TIME.to_string()
            }
        }
    }

    /// Schedule a recommendation for later execution
    pub async fn schedule(&self, id: &str, when: ScheduleTime) -> bool {
        let scheduled_time = match when {
            ScheduleTime::Optimal => self.optimal_time(id).await,
            ScheduleTime::At(time) => time,
        };

        match self.client.schedule(id, &scheduled_time).await {
            Ok(result) if result.success => {
                let at = result.scheduled_time.unwrap_or(scheduled_time);
                self.notifications
                    .success(format!("⏰ Recommendation scheduled for {}", at))
                    .await;
                true
            }
            Ok(result) => {
                self.notifications
                    .error(format!(
                        "❌ Scheduling failed: {}",
                        result.message.unwrap_or_default()
                    ))
                    .await;
                false
            }
            Err(e) if e.is_network() => {
                tracing::error!(recommendation_id = %id, error = %e, "Scheduling request failed");
                self.notifications
                    .error("🚨 Network error during scheduling")
                    .await;
                false
            }
            Err(e) => {
                self.notifications
                    .error(format!("❌ Scheduling failed: {}", e.message()))
                    .await;
                false
            }
        }
    }

    /// Switch the automation mode
    pub async fn set_automation_mode(&self, mode: &str) -> bool {
        match self.client.set_automation_mode(mode).await {
            Ok(()) => {
                self.notifications
                    .success(format!("🤖 Automation mode set to {}", mode))
                    .await;
                self.update(|view| view.automation.mode = Some(mode.to_string()))
                    .await;
                true
            }
            Err(e) => {
                tracing::error!(mode = %mode, error = %e, "Failed to update automation mode");
                self.notifications
                    .error("Failed to update automation mode")
                    .await;
                false
            }
        }
    }

    /// Cap the number of automated actions per day
    pub async fn set_max_actions(&self, max_actions: u32) -> bool {
        match self.client.set_max_actions(max_actions).await {
            Ok(()) => {
                self.update(|view| view.automation.max_actions = Some(max_actions))
                    .await;
                true
            }
            Err(e) => {
                tracing::error!(max_actions, error = %e, "Failed to update max actions");
                self.notifications.error("Failed to update max actions").await;
                false
            }
        }
    }

    /// Turn automatic execution of safe recommendations on or off
    pub async fn set_auto_execution(&self, enabled: bool) -> bool {
        match self.client.set_auto_execution(enabled).await {
            Ok(()) => {
                if enabled {
                    self.notifications
                        .success("🤖 Auto-execution enabled - AI will execute safe recommendations automatically")
                        .await;
                } else {
                    self.notifications
                        .warning("⏸️ Auto-execution disabled - Manual approval required")
                        .await;
                }
                self.update(|view| view.automation.auto_execution = Some(enabled))
                    .await;
                true
            }
            Err(e) => {
                tracing::error!(enabled, error = %e, "Failed to toggle auto-execution");
                self.notifications
                    .error("Failed to toggle auto-execution")
                    .await;
                false
            }
        }
    }

    /// Load the automation settings object into the view
    pub async fn load_automation_settings(&self) -> bool {
        match self.client.automation_settings().await {
            Ok(settings) => {
                self.update(|view| view.automation.settings = Some(settings))
                    .await;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load automation settings");
                false
            }
        }
    }

    /// Ask the backend for a deep analysis; returns the number of new recommendations
    pub async fn force_deep_analysis(&self) -> Option<u32> {
        self.notifications
            .info("🧠 Initiating deep AI analysis...")
            .await;

        match self.client.force_deep_analysis().await {
            Ok(result) if result.success => {
                self.notifications
                    .success(format!(
                        "🎯 Analysis complete! Found {} new opportunities",
                        result.recommendations_count
                    ))
                    .await;
                self.load_recommendations().await;
                Some(result.recommendations_count)
            }
            Ok(_) => {
                self.notifications
                    .info("Analysis completed - no new opportunities found")
                    .await;
                Some(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "Deep analysis failed");
                self.notifications.error("Analysis failed").await;
                None
            }
        }
    }

    /// Check backend connectivity on operator request
    pub async fn test_connections(&self) -> bool {
        self.notifications.info("Testing connections...").await;

        match self.client.status().await {
            Ok(status) => {
                self.update(|view| view.set_service_status(status)).await;
                if status.all_connected() {
                    self.notifications.success("All systems connected.").await;
                    true
                } else {
                    self.notifications
                        .error("One or more connections are down.")
                        .await;
                    false
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Connection test failed");
                self.update(|view| view.set_service_status(Default::default()))
                    .await;
                self.notifications.error("Unable to reach services.").await;
                false
            }
        }
    }

    /// Reload the recommendation list from the backend
    pub async fn load_recommendations(&self) -> bool {
        match self.client.recommendations().await {
            Ok(recs) => {
                tracing::debug!(count = recs.len(), "Recommendations loaded");
                self.update(|view| view.set_recommendations(recs)).await;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load recommendations");
                false
            }
        }
    }
}
