//! Dashboard
//!
//! View model of the operator dashboard: what the backend and the realtime
//! channel report, and what the operator can do about it.

pub mod actions;
pub mod handlers;
pub mod refresh;
pub mod state;

use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::api::DashboardClient;
use crate::config::DashboardConfig;
use crate::notify::NotificationCenter;

pub use actions::ScheduleTime;
pub use handlers::attach;
pub use refresh::spawn_refresh;
pub use state::{
    AutomationPanel, DashboardView, MetricCard, PerformanceChart, RecommendationFilter, RoiDisplay,
};

/// Shared dashboard handle
///
/// Cheap to clone; every clone sees the same view and notifications.
#[derive(Clone)]
pub struct Dashboard {
    client: DashboardClient,
    view: Arc<RwLock<DashboardView>>,
    notifications: Arc<NotificationCenter>,
}

impl Dashboard {
    pub fn new(
        client: DashboardClient,
        notifications: Arc<NotificationCenter>,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            client,
            view: Arc::new(RwLock::new(DashboardView::new(config.chart_window))),
            notifications,
        }
    }

    pub fn client(&self) -> &DashboardClient {
        &self.client
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    /// Read access to the current view
    pub async fn view(&self) -> RwLockReadGuard<'_, DashboardView> {
        self.view.read().await
    }

    /// Copy of the current view
    pub async fn snapshot(&self) -> DashboardView {
        self.view.read().await.clone()
    }

    /// Apply a change to the view
    pub async fn update<R>(&self, f: impl FnOnce(&mut DashboardView) -> R) -> R {
        let mut view = self.view.write().await;
        f(&mut view)
    }
}
