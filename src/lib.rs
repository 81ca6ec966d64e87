//! # Dazno Dashboard
//!
//! Client side of the Dazno Lightning node management dashboard: a realtime
//! event channel, a typed client for the backend REST endpoints, and the
//! dashboard state those feed.
//!
//! ## Features
//!
//! - **Realtime updates**: WebSocket channel with automatic reconnection
//! - **Typed endpoints**: Recommendations, automation, analytics and status
//! - **Notifications**: Auto-dismissing toasts for every user-facing outcome
//! - **Background refresh**: Periodic metric polling
//!
//! ## Modules
//!
//! - [`realtime`]: Realtime channel, event decoding and dispatch
//! - [`api`]: REST client and wire types
//! - [`dashboard`]: View state, user actions and realtime handlers
//! - [`notify`]: Notification center
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dazno_dashboard::{Config, Dashboard, DashboardClient, NotificationCenter, RealtimeChannel};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!
//!     let client = DashboardClient::new(&config.api)?;
//!     let notifications = Arc::new(NotificationCenter::default());
//!     let dashboard = Dashboard::new(client, notifications, &config.dashboard);
//!     dashboard.initialize().await;
//!
//!     // Live updates
//!     let channel = RealtimeChannel::new(config.realtime.reconnect_policy());
//!     dazno_dashboard::dashboard::attach(&channel, &dashboard).await;
//!     channel.open(config.realtime_url());
//!
//!     tokio::signal::ctrl_c().await?;
//!     channel.close().await;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod notify;
pub mod realtime;

// Re-export top-level types for convenience
pub use api::{ApiError, DashboardClient, Recommendation};

pub use config::{Config, ConfigError, LoggingConfig};

pub use dashboard::{Dashboard, DashboardView};

pub use notify::{Notification, NotificationCenter, NotificationLevel};

pub use realtime::{
    ChannelError, ConnectionState, EventKind, Inbound, RealtimeChannel, ReconnectPolicy,
};
