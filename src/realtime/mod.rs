//! Realtime Updates
//!
//! Receive-only channel to the backend's `/ws/realtime` endpoint.
//!
//! # Events
//!
//! - `roi_update` - Current and predicted ROI
//! - `new_recommendation` - A recommendation to show at the top of the list
//! - `automation_result` - Outcome of an automated execution
//! - `competitive_update` - Comparison against competing tools
//! - `prediction_update` - Latest prediction set
//!
//! Other tags are ignored and malformed frames are dropped. A connection
//! lost for any reason other than a normal close is reopened according to
//! the [`ReconnectPolicy`].
//!
//! # Example
//!
//! ```rust,no_run
//! use dazno_dashboard::realtime::{EventKind, RealtimeChannel, ReconnectPolicy};
//!
//! # async fn run() {
//! let channel = RealtimeChannel::new(ReconnectPolicy::default());
//! channel
//!     .on_event(EventKind::RoiUpdate, |payload| async move {
//!         println!("ROI: {}", payload);
//!     })
//!     .await;
//! channel.open("ws://localhost:3000/ws/realtime");
//! # }
//! ```

pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod messages;
pub mod policy;
pub mod transport;

pub use channel::{ConnectionState, RealtimeChannel};
pub use dispatcher::{EventDispatcher, Handler};
pub use error::{ChannelError, DecodeError};
pub use messages::{
    decode, parse_payload, AutomationResult, CompetitiveMetric, EventKind, Inbound, InboundEvent,
    RoiUpdate, Trend,
};
pub use policy::{Backoff, ReconnectPolicy};
pub use transport::{Connector, Frame, FrameStream, WsConnector, NORMAL_CLOSURE};
