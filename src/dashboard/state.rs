//! Dashboard View State
//!
//! Everything the dashboard shows, as plain data. Mutated by realtime
//! handlers, operator actions and the refresh loop.

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;

use crate::api::{
    display_value, ActionKind, AutomationSettings, AutomationStats, MetricSnapshot, Priority,
    Recommendation, ServiceStatus,
};
use crate::realtime::{CompetitiveMetric, ConnectionState, RoiUpdate, Trend};

/// Number of points kept by the performance chart by default
pub const DEFAULT_CHART_WINDOW: usize = 20;

/// Chart label for a point taken at `at` (`HH:MM`)
pub fn time_label(at: &DateTime<Local>) -> String {
    at.format("%H:%M").to_string()
}

/// A labelled metric card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub label: String,
    pub value: String,
}

/// Current ROI panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiDisplay {
    pub current: f64,
    pub predicted: f64,
    pub trend: Trend,
    pub network_average: f64,
}

impl RoiDisplay {
    /// e.g. `15.75%`
    pub fn value_text(&self) -> String {
        format!("{}%", self.current)
    }

    /// e.g. `→ 18.2%`
    pub fn prediction_text(&self) -> String {
        format!("→ {}%", self.predicted)
    }

    pub fn trend_class(&self) -> &'static str {
        self.trend.as_class()
    }
}

impl From<&RoiUpdate> for RoiDisplay {
    fn from(update: &RoiUpdate) -> Self {
        Self {
            current: update.current,
            predicted: update.predicted,
            trend: update.trend,
            network_average: update.network_average,
        }
    }
}

/// Rolling ROI series against the network average
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceChart {
    window: usize,
    pub labels: VecDeque<String>,
    pub roi: VecDeque<f64>,
    pub network_average: VecDeque<f64>,
}

impl PerformanceChart {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            labels: VecDeque::new(),
            roi: VecDeque::new(),
            network_average: VecDeque::new(),
        }
    }

    /// Append a point, dropping the oldest once the window is full
    pub fn push(&mut self, label: impl Into<String>, roi: f64, network_average: f64) {
        self.labels.push_back(label.into());
        self.roi.push_back(roi);
        self.network_average.push_back(network_average);

        while self.labels.len() > self.window {
            self.labels.pop_front();
            self.roi.pop_front();
            self.network_average.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

/// Recommendation list filter; `None` means "all"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecommendationFilter {
    pub priority: Option<Priority>,
    pub action_type: Option<ActionKind>,
}

impl RecommendationFilter {
    /// Build from the selector values, where `all` leaves a field unconstrained
    pub fn parse(priority: &str, action_type: &str) -> Result<Self, String> {
        let priority = match priority {
            p if p.eq_ignore_ascii_case("all") => None,
            p => Some(p.parse()?),
        };
        let action_type = match action_type {
            t if t.eq_ignore_ascii_case("all") => None,
            t => Some(t.parse()?),
        };

        Ok(Self {
            priority,
            action_type,
        })
    }

    pub fn matches(&self, rec: &Recommendation) -> bool {
        self.priority.map_or(true, |p| p == rec.priority)
            && self.action_type.map_or(true, |t| t == rec.action_type)
    }
}

/// Automation panel
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AutomationPanel {
    pub stats: Option<AutomationStats>,
    pub mode: Option<String>,
    pub max_actions: Option<u32>,
    pub auto_execution: Option<bool>,
    /// Settings object as loaded from the backend
    pub settings: Option<AutomationSettings>,
}

impl AutomationPanel {
    /// Display texts for actions today, success rate and ROI gained
    pub fn stats_texts(&self) -> Option<[String; 3]> {
        self.stats.map(|s| {
            [
                s.actions_today.to_string(),
                format!("{}%", s.success_rate),
                format!("+{}%", s.roi_gained),
            ]
        })
    }
}

/// The whole dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub metric_cards: Vec<MetricCard>,
    pub service_status: ServiceStatus,
    pub realtime: Option<ConnectionState>,
    pub roi: Option<RoiDisplay>,
    pub chart: PerformanceChart,
    pub competitive: Vec<CompetitiveMetric>,
    pub automation: AutomationPanel,
    pub recommendations: Vec<Recommendation>,
    pub filter: RecommendationFilter,
    pub predictions: Option<Value>,
    /// Last `/api/dashboard` snapshot
    pub snapshot: Option<Value>,
    pub simulating: bool,
}

impl DashboardView {
    pub fn new(chart_window: usize) -> Self {
        Self {
            metric_cards: Vec::new(),
            service_status: ServiceStatus::default(),
            realtime: None,
            roi: None,
            chart: PerformanceChart::new(chart_window),
            competitive: Vec::new(),
            automation: AutomationPanel::default(),
            recommendations: Vec::new(),
            filter: RecommendationFilter::default(),
            predictions: None,
            snapshot: None,
            simulating: false,
        }
    }

    // --- Metric cards ---

    /// Create one card per displayable metric, replacing existing cards
    pub fn render_metric_cards(&mut self, snapshot: &MetricSnapshot) {
        self.metric_cards = snapshot
            .iter()
            .filter_map(|(label, value)| {
                display_value(value).map(|value| MetricCard {
                    label: label.clone(),
                    value,
                })
            })
            .collect();
    }

    /// Update cards whose label appears in the snapshot; returns how many changed
    ///
    /// Labels without a card are ignored, as are values with nothing to show.
    pub fn update_metric_cards(&mut self, snapshot: &MetricSnapshot) -> usize {
        let mut updated = 0;
        for card in &mut self.metric_cards {
            if let Some(value) = snapshot.get(&card.label).and_then(display_value) {
                card.value = value;
                updated += 1;
            }
        }
        updated
    }

    // --- Status ---

    pub fn set_service_status(&mut self, status: ServiceStatus) {
        self.service_status = status;
    }

    /// The status indicator shows "connected" only when every service is up
    pub fn status_indicator_connected(&self) -> bool {
        self.service_status.all_connected()
    }

    // --- Realtime panels ---

    /// Update the ROI panel and append a chart point labelled `label`
    pub fn apply_roi_update(&mut self, update: &RoiUpdate, label: impl Into<String>) {
        self.roi = Some(RoiDisplay::from(update));
        self.chart.push(label, update.current, update.network_average);
    }

    pub fn set_competitive(&mut self, metrics: Vec<CompetitiveMetric>) {
        self.competitive = metrics;
    }

    pub fn set_predictions(&mut self, predictions: Value) {
        self.predictions = Some(predictions);
    }

    // --- Recommendations ---

    /// Show a recommendation at the top of the list
    ///
    /// A recommendation already listed under the same id is moved to the top
    /// with the new contents.
    pub fn add_recommendation(&mut self, rec: Recommendation) {
        self.recommendations.retain(|r| r.id != rec.id);
        self.recommendations.insert(0, rec);
    }

    /// Replace the list, e.g. from the initial snapshot
    pub fn set_recommendations(&mut self, recs: Vec<Recommendation>) {
        self.recommendations = recs;
    }

    /// Remove a recommendation card; returns whether it was listed
    pub fn remove_recommendation(&mut self, id: &str) -> bool {
        let before = self.recommendations.len();
        self.recommendations.retain(|r| r.id != id);
        self.recommendations.len() != before
    }

    pub fn set_filter(&mut self, filter: RecommendationFilter) {
        self.filter = filter;
    }

    /// Recommendations passing the current filter, in display order
    pub fn visible_recommendations(&self) -> Vec<&Recommendation> {
        self.recommendations
            .iter()
            .filter(|r| self.filter.matches(r))
            .collect()
    }
}

impl Default for DashboardView {
    fn default() -> Self {
        Self::new(DEFAULT_CHART_WINDOW)
    }
}
