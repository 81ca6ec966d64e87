//! Data Transfer Objects
//!
//! Request and response bodies of the Dazno backend endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================
// RECOMMENDATION DTOs
// ============================================

/// Urgency of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(alias = "high")]
    High,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "low")]
    Low,
}

impl Priority {
    /// Lowercase class used by filters
    pub fn as_class(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("unknown priority: {}", s)),
        }
    }
}

/// What the recommendation proposes to do with the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(alias = "open_channel")]
    OpenChannel,
    #[serde(alias = "close_channel")]
    CloseChannel,
    #[serde(alias = "adjust_fees")]
    AdjustFees,
    #[serde(alias = "rebalance_channel")]
    RebalanceChannel,
    #[serde(other)]
    Other,
}

impl ActionKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ActionKind::OpenChannel => "Open Channel",
            ActionKind::CloseChannel => "Close Channel",
            ActionKind::AdjustFees => "Adjust Fees",
            ActionKind::RebalanceChannel => "Rebalance Channel",
            ActionKind::Other => "Other",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    /// Accepts `OpenChannel`, `open_channel` and `Open Channel` spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "openchannel" => Ok(ActionKind::OpenChannel),
            "closechannel" => Ok(ActionKind::CloseChannel),
            "adjustfees" => Ok(ActionKind::AdjustFees),
            "rebalancechannel" => Ok(ActionKind::RebalanceChannel),
            _ => Err(format!("unknown action type: {}", s)),
        }
    }
}

/// Lifecycle of a recommendation on the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecommendationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Executed,
    Failed,
}

/// A recommendation, as listed by the backend or pushed as `new_recommendation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub action_type: ActionKind,
    pub priority: Priority,
    #[serde(default)]
    pub expected_roi_impact: f64,
    #[serde(default)]
    pub description: String,
    /// Model confidence, 0-100
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: RecommendationStatus,
}

// ============================================
// STATUS / METRICS DTOs
// ============================================

/// Response of `GET /api/status`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub mcp_connected: bool,
    #[serde(default)]
    pub lnd_connected: bool,
}

impl ServiceStatus {
    /// Both the MCP service and the LND node are reachable
    pub fn all_connected(&self) -> bool {
        self.mcp_connected && self.lnd_connected
    }
}

/// Response of `GET /api/metrics`: metric label to display value
pub type MetricSnapshot = BTreeMap<String, Value>;

/// Render a metric value for display
///
/// Strings are shown as-is and numbers in their JSON form. Null, empty
/// strings and structured values have nothing to show.
pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Response of `GET /api/analytics/node`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAnalytics {
    pub performance_score: f64,
    pub roi_current: f64,
    pub roi_predicted_30d: f64,
    pub efficiency_score: f64,
    pub risk_score: f64,
    pub centrality_score: f64,
    pub liquidity_score: f64,
    pub reliability_score: f64,
    pub growth_potential: f64,
    pub last_calculated: DateTime<Utc>,
}

// ============================================
// ACTION DTOs
// ============================================

/// Operator decision on a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Approve,
    Reject,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Approve => "Approve",
            ActionType::Reject => "Reject",
        }
    }
}

/// Body of `POST /api/actions`
#[derive(Debug, Clone, Serialize)]
pub struct ActionRequest {
    pub recommendation_id: String,
    pub action: ActionType,
}

/// Response of `POST /api/actions`
///
/// A body without `success` counts as a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl ActionResponse {
    /// Bare 2xx without a body
    pub(crate) fn accepted() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}

/// Body of `POST /api/recommendations/auto-execute`
#[derive(Debug, Clone, Serialize)]
pub struct AutoExecuteRequest {
    pub recommendation_id: String,
    pub execution_mode: String,
}

/// Running totals of automated executions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AutomationStats {
    pub actions_today: u32,
    /// Percentage, 0-100
    pub success_rate: f64,
    /// ROI percentage points gained today
    pub roi_gained: f64,
}

/// Response of `POST /api/recommendations/auto-execute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoExecuteResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub roi_impact: f64,
    #[serde(default)]
    pub execution_id: Option<String>,
    #[serde(default)]
    pub stats: Option<AutomationStats>,
}

/// Body of `POST /api/recommendations/simulate`
#[derive(Debug, Clone, Serialize)]
pub struct SimulationRequest {
    pub recommendation_id: String,
}

/// One step of a simulated execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStep {
    pub time: String,
    pub action: String,
    pub probability: f64,
}

/// Response of `POST /api/recommendations/simulate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub recommendation_id: String,
    pub roi_impact: f64,
    pub success_probability: f64,
    pub risk_level: String,
    pub estimated_cost: u64,
    #[serde(default)]
    pub timeline: Vec<SimulationStep>,
}

/// Body of `POST /api/recommendations/schedule`
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRequest {
    pub recommendation_id: String,
    pub scheduled_time: String,
}

/// Response of `POST /api/recommendations/schedule`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub success: bool,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `GET /api/recommendations/{id}/optimal-time`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalTimeResponse {
    pub optimal_time: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub factors: Vec<String>,
}

// ============================================
// AUTOMATION DTOs
// ============================================

#[derive(Debug, Clone, Serialize)]
pub struct AutomationModeRequest {
    pub mode: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaxActionsRequest {
    pub max_actions: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoExecutionToggleRequest {
    pub enabled: bool,
}

/// Response of `GET /api/automation/settings`
///
/// Only the fields the dashboard shows are typed; the rest is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutomationSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub auto_execution_enabled: bool,
    #[serde(default)]
    pub max_daily_actions: Option<u32>,
    #[serde(default)]
    pub risk_tolerance: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `POST /api/analysis/force-deep`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepAnalysisResponse {
    pub success: bool,
    #[serde(default)]
    pub recommendations_count: u32,
    #[serde(default)]
    pub analysis_time_ms: Option<u64>,
    #[serde(default)]
    pub insights: Vec<String>,
}
