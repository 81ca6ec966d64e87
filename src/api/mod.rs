//! Dazno REST API Client
//!
//! Typed access to the backend endpoints the dashboard consumes.
//!
//! # Endpoints
//!
//! ## Dashboard
//! - `GET /api/metrics` - Metric label to display value
//! - `GET /api/status` - MCP and LND connectivity
//! - `GET /api/dashboard` - Dashboard snapshot
//! - `GET /api/recommendations` - Pending recommendations
//!
//! ## Recommendations
//! - `POST /api/actions` - Approve or reject
//! - `POST /api/recommendations/auto-execute` - Execute now
//! - `POST /api/recommendations/simulate` - Simulate execution
//! - `POST /api/recommendations/schedule` - Schedule execution
//! - `GET /api/recommendations/:id/optimal-time` - Suggested execution time
//!
//! ## Automation
//! - `POST /api/automation/mode`
//! - `POST /api/automation/max-actions`
//! - `POST /api/automation/auto-execution`
//! - `GET /api/automation/settings`
//! - `POST /api/analysis/force-deep`
//!
//! ## Analytics
//! - `GET /api/analytics/node`
//! - `GET /api/competitive-analysis`
//! - `GET /api/health`
//!
//! # Example
//!
//! ```rust,no_run
//! use dazno_dashboard::api::{ActionType, DashboardClient};
//! use dazno_dashboard::config::ApiConfig;
//!
//! # async fn run() -> Result<(), dazno_dashboard::api::ApiError> {
//! let client = DashboardClient::new(&ApiConfig::default())?;
//! let response = client.submit_action("42", ActionType::Approve).await?;
//! println!("success: {}", response.success);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod dto;
pub mod error;

pub use client::DashboardClient;
pub use dto::*;
pub use error::ApiError;
