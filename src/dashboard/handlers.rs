//! Realtime Handlers
//!
//! Wire the realtime channel's events into the dashboard view.

use chrono::Local;
use serde_json::Value;
use tokio::sync::mpsc;

use super::state::time_label;
use super::Dashboard;
use crate::api::Recommendation;
use crate::realtime::{
    parse_payload, AutomationResult, CompetitiveMetric, ConnectionState, EventKind,
    RealtimeChannel, RoiUpdate,
};

/// Register a handler for every event kind and follow the connection state
pub async fn attach(channel: &RealtimeChannel, dashboard: &Dashboard) {
    let d = dashboard.clone();
    channel
        .on_event(EventKind::RoiUpdate, move |payload| {
            let d = d.clone();
            async move { on_roi_update(&d, payload).await }
        })
        .await;

    let d = dashboard.clone();
    channel
        .on_event(EventKind::NewRecommendation, move |payload| {
            let d = d.clone();
            async move { on_new_recommendation(&d, payload).await }
        })
        .await;

    let d = dashboard.clone();
    channel
        .on_event(EventKind::AutomationResult, move |payload| {
            let d = d.clone();
            async move { on_automation_result(&d, payload).await }
        })
        .await;

    let d = dashboard.clone();
    channel
        .on_event(EventKind::CompetitiveUpdate, move |payload| {
            let d = d.clone();
            async move { on_competitive_update(&d, payload).await }
        })
        .await;

    let d = dashboard.clone();
    channel
        .on_event(EventKind::PredictionUpdate, move |payload| {
            let d = d.clone();
            async move { on_prediction_update(&d, payload).await }
        })
        .await;

    // The status callback is synchronous; a queue keeps transitions ordered
    let (tx, mut rx) = mpsc::unbounded_channel();
    channel
        .on_status(move |state| {
            let _ = tx.send(state);
        })
        .await;

    let d = dashboard.clone();
    tokio::spawn(async move {
        while let Some(state) = rx.recv().await {
            on_connection_state(&d, state).await;
        }
    });
}

pub(crate) async fn on_roi_update(dashboard: &Dashboard, payload: Value) {
    let update: RoiUpdate = match parse_payload(EventKind::RoiUpdate, payload) {
        Ok(update) => update,
        Err(e) => {
            tracing::debug!(error = %e, "Dropping roi_update");
            return;
        }
    };

    let label = time_label(&Local::now());
    dashboard
        .update(|view| view.apply_roi_update(&update, label))
        .await;
}

pub(crate) async fn on_new_recommendation(dashboard: &Dashboard, payload: Value) {
    let rec: Recommendation = match parse_payload(EventKind::NewRecommendation, payload) {
        Ok(rec) => rec,
        Err(e) => {
            tracing::debug!(error = %e, "Dropping new_recommendation");
            return;
        }
    };

    tracing::info!(recommendation_id = %rec.id, priority = rec.priority.as_class(), "New recommendation");
    dashboard.update(|view| view.add_recommendation(rec)).await;
}

pub(crate) async fn on_automation_result(dashboard: &Dashboard, payload: Value) {
    let result: AutomationResult = match parse_payload(EventKind::AutomationResult, payload) {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!(error = %e, "Dropping automation_result");
            return;
        }
    };

    tracing::info!(
        recommendation_id = %result.recommendation_id,
        success = result.success,
        execution_time_ms = result.execution_time_ms,
        "Automation result"
    );

    if result.success {
        dashboard
            .update(|view| view.remove_recommendation(&result.recommendation_id))
            .await;
        dashboard
            .notifications()
            .success(format!(
                "🤖 Automated execution complete! ROI impact: +{}%",
                result.roi_impact
            ))
            .await;
    } else {
        dashboard
            .notifications()
            .error(format!("❌ Automated execution failed: {}", result.message))
            .await;
    }
}

pub(crate) async fn on_competitive_update(dashboard: &Dashboard, payload: Value) {
    let metrics: Vec<CompetitiveMetric> = match parse_payload(EventKind::CompetitiveUpdate, payload) {
        Ok(metrics) => metrics,
        Err(e) => {
            tracing::debug!(error = %e, "Dropping competitive_update");
            return;
        }
    };

    dashboard.update(|view| view.set_competitive(metrics)).await;
}

pub(crate) async fn on_prediction_update(dashboard: &Dashboard, payload: Value) {
    dashboard.update(|view| view.set_predictions(payload)).await;
}

pub(crate) async fn on_connection_state(dashboard: &Dashboard, state: ConnectionState) {
    let previous = dashboard
        .update(|view| view.realtime.replace(state))
        .await;

    if state == ConnectionState::Open && previous != Some(ConnectionState::Open) {
        dashboard
            .notifications()
            .success("Connected to real-time updates")
            .await;
    }
}
