//! Event Dispatcher
//!
//! Holds one handler per [`EventKind`] and routes decoded events to it.

use futures_util::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::messages::{decode, EventKind, Inbound, InboundEvent};

/// Handler invoked with the untouched event payload
pub type Handler = Arc<dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// One slot per known tag; the match in `slot` keeps every tag covered
#[derive(Default)]
struct HandlerTable {
    roi_update: Option<Handler>,
    new_recommendation: Option<Handler>,
    automation_result: Option<Handler>,
    competitive_update: Option<Handler>,
    prediction_update: Option<Handler>,
}

impl HandlerTable {
    fn slot(&mut self, kind: EventKind) -> &mut Option<Handler> {
        match kind {
            EventKind::RoiUpdate => &mut self.roi_update,
            EventKind::NewRecommendation => &mut self.new_recommendation,
            EventKind::AutomationResult => &mut self.automation_result,
            EventKind::CompetitiveUpdate => &mut self.competitive_update,
            EventKind::PredictionUpdate => &mut self.prediction_update,
        }
    }

    fn get(&self, kind: EventKind) -> Option<Handler> {
        match kind {
            EventKind::RoiUpdate => self.roi_update.clone(),
            EventKind::NewRecommendation => self.new_recommendation.clone(),
            EventKind::AutomationResult => self.automation_result.clone(),
            EventKind::CompetitiveUpdate => self.competitive_update.clone(),
            EventKind::PredictionUpdate => self.prediction_update.clone(),
        }
    }
}

/// Routes inbound events to their registered handler
#[derive(Default)]
pub struct EventDispatcher {
    handlers: RwLock<HandlerTable>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `kind`, replacing any previous one
    pub async fn register<F, Fut>(&self, kind: EventKind, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let boxed: Handler = Arc::new(move |payload: Value| -> BoxFuture<'static, ()> {
            Box::pin(handler(payload))
        });

        let replaced = self.handlers.write().await.slot(kind).replace(boxed).is_some();
        tracing::debug!(kind = %kind, replaced, "Registered realtime handler");
    }

    /// Remove the handler for `kind`; returns whether one was registered
    pub async fn unregister(&self, kind: EventKind) -> bool {
        self.handlers.write().await.slot(kind).take().is_some()
    }

    /// Invoke the handler for this event, if any
    ///
    /// Returns whether a handler ran. The handler is awaited to completion,
    /// so events are handled strictly one after another.
    pub async fn dispatch(&self, event: InboundEvent) -> bool {
        // Release the lock before running the handler so it may re-register
        let handler = self.handlers.read().await.get(event.kind);

        match handler {
            Some(handler) => {
                handler(event.payload).await;
                true
            }
            None => {
                tracing::trace!(kind = %event.kind, "No handler registered");
                false
            }
        }
    }

    /// Decode a text frame and dispatch it
    ///
    /// Malformed frames and unknown tags are dropped without surfacing an error.
    pub async fn handle_text(&self, text: &str) -> bool {
        match decode(text) {
            Ok(Inbound::Event(event)) => self.dispatch(event).await,
            Ok(Inbound::Unrecognized { tag }) => {
                tracing::debug!(tag = %tag, "Ignoring unrecognized realtime message");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "Dropping malformed realtime message");
                false
            }
        }
    }
}
