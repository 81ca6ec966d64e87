//! Realtime Channel
//!
//! Owns the single live connection to the backend's realtime endpoint,
//! dispatches inbound events, and reopens the connection after loss.

use futures_util::StreamExt;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::dispatcher::EventDispatcher;
use super::messages::EventKind;
use super::policy::ReconnectPolicy;
use super::transport::{Connector, Frame, FrameStream, WsConnector, NORMAL_CLOSURE};

/// Lifecycle of the channel's connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

type StatusCallback = Arc<dyn Fn(ConnectionState) + Send + Sync>;

/// Reports state transitions to the status callback, skipping repeats
#[derive(Default)]
struct StatusReporter {
    callback: RwLock<Option<StatusCallback>>,
    last: tokio::sync::Mutex<Option<ConnectionState>>,
}

impl StatusReporter {
    async fn report(&self, state: ConnectionState) {
        {
            let mut last = self.last.lock().await;
            if *last == Some(state) {
                return;
            }
            *last = Some(state);
        }

        tracing::debug!(state = ?state, "Realtime connection state changed");

        let callback = self.callback.read().await.clone();
        if let Some(callback) = callback {
            callback(state);
        }
    }
}

/// Everything a running session needs
struct Session {
    url: String,
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    dispatcher: Arc<EventDispatcher>,
    status: Arc<StatusReporter>,
}

/// Why a connected session stopped reading
enum SessionEnd {
    Normal,
    Lost(String),
}

/// Receive-only realtime channel
///
/// Created by the application root and shared by reference with the views
/// that register handlers on it. At most one session (connection or pending
/// reconnect) is alive at a time.
pub struct RealtimeChannel {
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    dispatcher: Arc<EventDispatcher>,
    status: Arc<StatusReporter>,
    session: Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeChannel {
    /// Create a channel using the WebSocket connector
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self::with_connector(Arc::new(WsConnector), policy)
    }

    /// Create a channel over a custom transport
    pub fn with_connector(connector: Arc<dyn Connector>, policy: ReconnectPolicy) -> Self {
        Self {
            connector,
            policy,
            dispatcher: Arc::new(EventDispatcher::new()),
            status: Arc::new(StatusReporter::default()),
            session: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Register the handler for an event kind, replacing any previous one
    pub async fn on_event<F, Fut>(&self, kind: EventKind, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.dispatcher.register(kind, handler).await;
    }

    /// Set the callback receiving connection state transitions
    pub async fn on_status<F>(&self, callback: F)
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        *self.status.callback.write().await = Some(Arc::new(callback));
    }

    /// Open the connection in the background
    ///
    /// Any existing connection or pending reconnect is cancelled first.
    /// Must be called from within a tokio runtime.
    pub fn open(&self, url: impl Into<String>) {
        let session = Session {
            url: url.into(),
            connector: Arc::clone(&self.connector),
            policy: self.policy.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
            status: Arc::clone(&self.status),
        };

        let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = slot.take();
        if let Some(previous) = &previous {
            tracing::debug!("Cancelling previous realtime session");
            previous.abort();
        }

        tracing::info!(url = %session.url, "Opening realtime channel");
        *slot = Some(tokio::spawn(async move {
            // The old session may be mid-poll on another worker
            if let Some(previous) = previous {
                wait_stopped(previous).await;
            }
            run_session(session).await;
        }));
    }

    /// Stop the connection and any pending reconnect
    pub async fn close(&self) {
        let previous = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = previous {
            handle.abort();
            wait_stopped(handle).await;
            tracing::info!("Realtime channel closed");
        }

        self.status.report(ConnectionState::Closed).await;
    }
}

/// Wait for an aborted session task to finish its current poll
async fn wait_stopped(handle: JoinHandle<()>) {
    match handle.await {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => {}
        Err(e) => tracing::error!(error = %e, "Realtime session panicked"),
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        let slot = self.session.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

async fn run_session(session: Session) {
    let mut failures: u32 = 0;

    loop {
        session.status.report(ConnectionState::Connecting).await;

        match session.connector.connect(&session.url).await {
            Ok(frames) => {
                failures = 0;
                session.status.report(ConnectionState::Open).await;
                tracing::info!(url = %session.url, "Real-time connection established");

                match pump(frames, &session.dispatcher).await {
                    SessionEnd::Normal => {
                        tracing::info!(url = %session.url, "Real-time connection closed by server");
                        session.status.report(ConnectionState::Closed).await;
                        return;
                    }
                    SessionEnd::Lost(reason) => {
                        tracing::warn!(url = %session.url, reason = %reason, "Connection lost, attempting reconnect");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(url = %session.url, error = %e, "Real-time connection failed");
            }
        }

        failures += 1;
        let Some(delay) = session.policy.next_delay(failures) else {
            tracing::error!(failures, "Max reconnect attempts reached");
            session.status.report(ConnectionState::Closed).await;
            return;
        };

        session.status.report(ConnectionState::Connecting).await;
        tracing::debug!(attempt = failures, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
        tokio::time::sleep(delay).await;
    }
}

/// Read frames until the connection ends, dispatching in arrival order
async fn pump(mut frames: FrameStream, dispatcher: &EventDispatcher) -> SessionEnd {
    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Frame::Text(text)) => {
                dispatcher.handle_text(&text).await;
            }
            Ok(Frame::Close(Some(NORMAL_CLOSURE))) => return SessionEnd::Normal,
            Ok(Frame::Close(Some(code))) => {
                return SessionEnd::Lost(format!("closed with code {}", code));
            }
            Ok(Frame::Close(None)) => return SessionEnd::Lost("closed without status".to_string()),
            Err(e) => return SessionEnd::Lost(e.to_string()),
        }
    }

    SessionEnd::Lost("stream ended".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::error::ChannelError;
    use async_trait::async_trait;
    use futures_util::stream;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    enum Step {
        Refuse,
        Frames(Vec<Frame>),
        Hold(mpsc::UnboundedReceiver<Frame>),
    }

    /// Connector that replays a script; stays open forever once it runs out
    struct ScriptedConnector {
        steps: Mutex<VecDeque<Step>>,
        attempts: Mutex<Vec<(String, Instant)>>,
    }

    impl ScriptedConnector {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                attempts: Mutex::new(Vec::new()),
            })
        }

        fn attempts(&self) -> Vec<(String, Instant)> {
            self.attempts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        async fn connect(&self, url: &str) -> Result<FrameStream, ChannelError> {
            self.attempts
                .lock()
                .unwrap()
                .push((url.to_string(), Instant::now()));

            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Refuse) => Err(ChannelError::Connect("connection refused".to_string())),
                Some(Step::Frames(frames)) => Ok(stream::iter(frames.into_iter().map(Ok)).boxed()),
                Some(Step::Hold(rx)) => Ok(stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|frame| (Ok(frame), rx))
                })
                .boxed()),
                None => Ok(stream::pending().boxed()),
            }
        }
    }

    async fn status_channel(channel: &RealtimeChannel) -> mpsc::UnboundedReceiver<ConnectionState> {
        let (tx, rx) = mpsc::unbounded_channel();
        channel
            .on_status(move |state| {
                let _ = tx.send(state);
            })
            .await;
        rx
    }

    fn text(value: Value) -> Frame {
        Frame::Text(value.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_dispatched_in_arrival_order() {
        let connector = ScriptedConnector::new(vec![Step::Frames(vec![
            text(json!({"type": "roi_update", "payload": {"seq": 1}})),
            Frame::Text("garbage".to_string()),
            text(json!({"type": "connection_established", "payload": {}})),
            text(json!({"type": "new_recommendation", "payload": {"seq": 2}})),
            text(json!({"type": "roi_update", "payload": {"seq": 3}})),
            Frame::Close(Some(1000)),
        ])]);
        let channel = RealtimeChannel::with_connector(connector, ReconnectPolicy::default());

        let (tx, mut rx) = mpsc::unbounded_channel();
        for kind in [EventKind::RoiUpdate, EventKind::NewRecommendation] {
            let tx = tx.clone();
            channel
                .on_event(kind, move |payload| {
                    let tx = tx.clone();
                    async move {
                        let _ = tx.send((kind, payload));
                    }
                })
                .await;
        }
        drop(tx);

        channel.open("ws://dazno.test/ws/realtime");

        let mut received = Vec::new();
        for _ in 0..3 {
            received.push(rx.recv().await.unwrap());
        }

        assert_eq!(
            received,
            vec![
                (EventKind::RoiUpdate, json!({"seq": 1})),
                (EventKind::NewRecommendation, json!({"seq": 2})),
                (EventKind::RoiUpdate, json!({"seq": 3})),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_fixed_delay() {
        let connector = ScriptedConnector::new(vec![Step::Frames(vec![])]);
        let channel = RealtimeChannel::with_connector(connector.clone(), ReconnectPolicy::default());
        let mut states = status_channel(&channel).await;

        channel.open("ws://dazno.test/ws/realtime");

        assert_eq!(states.recv().await, Some(ConnectionState::Connecting));
        assert_eq!(states.recv().await, Some(ConnectionState::Open));
        assert_eq!(states.recv().await, Some(ConnectionState::Connecting));

        // Not a moment early
        tokio::time::advance(Duration::from_millis(4_999)).await;
        tokio::task::yield_now().await;
        assert_eq!(connector.attempts().len(), 1);

        assert_eq!(states.recv().await, Some(ConnectionState::Open));

        let attempts = connector.attempts();
        assert_eq!(attempts.len(), 2);
        let gap = attempts[1].1 - attempts[0].1;
        assert!(gap >= Duration::from_secs(5), "reconnected after {:?}", gap);
        assert!(gap < Duration::from_millis(5_100), "reconnected after {:?}", gap);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_connects_keep_retrying_at_constant_interval() {
        let connector = ScriptedConnector::new(vec![Step::Refuse, Step::Refuse, Step::Refuse]);
        let channel = RealtimeChannel::with_connector(connector.clone(), ReconnectPolicy::default());
        let mut states = status_channel(&channel).await;

        channel.open("ws://dazno.test/ws/realtime");

        assert_eq!(states.recv().await, Some(ConnectionState::Connecting));
        assert_eq!(states.recv().await, Some(ConnectionState::Open));

        let attempts = connector.attempts();
        assert_eq!(attempts.len(), 4);
        for pair in attempts.windows(2) {
            let gap = pair[1].1 - pair[0].1;
            assert!(gap >= Duration::from_secs(5) && gap < Duration::from_millis(5_100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_normal_close_is_terminal() {
        let connector = ScriptedConnector::new(vec![Step::Frames(vec![Frame::Close(Some(1000))])]);
        let channel = RealtimeChannel::with_connector(connector.clone(), ReconnectPolicy::default());
        let mut states = status_channel(&channel).await;

        channel.open("ws://dazno.test/ws/realtime");

        assert_eq!(states.recv().await, Some(ConnectionState::Connecting));
        assert_eq!(states.recv().await, Some(ConnectionState::Open));
        assert_eq!(states.recv().await, Some(ConnectionState::Closed));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.attempts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abnormal_close_reconnects() {
        let connector = ScriptedConnector::new(vec![Step::Frames(vec![Frame::Close(Some(1011))])]);
        let channel = RealtimeChannel::with_connector(connector.clone(), ReconnectPolicy::default());
        let mut states = status_channel(&channel).await;

        channel.open("ws://dazno.test/ws/realtime");

        assert_eq!(states.recv().await, Some(ConnectionState::Connecting));
        assert_eq!(states.recv().await, Some(ConnectionState::Open));
        assert_eq!(states.recv().await, Some(ConnectionState::Connecting));
        assert_eq!(states.recv().await, Some(ConnectionState::Open));
        assert_eq!(connector.attempts().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_when_policy_exhausted() {
        let connector = ScriptedConnector::new(vec![Step::Refuse, Step::Refuse, Step::Refuse]);
        let policy = ReconnectPolicy::fixed(Duration::from_secs(1)).with_max_attempts(2);
        let channel = RealtimeChannel::with_connector(connector.clone(), policy);
        let mut states = status_channel(&channel).await;

        channel.open("ws://dazno.test/ws/realtime");

        assert_eq!(states.recv().await, Some(ConnectionState::Connecting));
        assert_eq!(states.recv().await, Some(ConnectionState::Closed));
        assert_eq!(connector.attempts().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_cancels_pending_reconnect() {
        let connector = ScriptedConnector::new(vec![Step::Frames(vec![])]);
        let channel = RealtimeChannel::with_connector(connector.clone(), ReconnectPolicy::default());
        let mut states = status_channel(&channel).await;

        channel.open("ws://first.test/ws/realtime");
        assert_eq!(states.recv().await, Some(ConnectionState::Connecting));
        assert_eq!(states.recv().await, Some(ConnectionState::Open));
        assert_eq!(states.recv().await, Some(ConnectionState::Connecting));

        // A reconnect to the first URL is now pending
        channel.open("ws://second.test/ws/realtime");
        assert_eq!(states.recv().await, Some(ConnectionState::Open));

        tokio::time::sleep(Duration::from_secs(30)).await;

        let urls: Vec<String> = connector.attempts().into_iter().map(|(url, _)| url).collect();
        assert_eq!(
            urls,
            vec![
                "ws://first.test/ws/realtime".to_string(),
                "ws://second.test/ws/realtime".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_stops_delivery() {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let connector = ScriptedConnector::new(vec![Step::Hold(frames_rx)]);
        let channel = RealtimeChannel::with_connector(connector.clone(), ReconnectPolicy::default());
        let mut states = status_channel(&channel).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        channel
            .on_event(EventKind::PredictionUpdate, move |payload| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(payload);
                }
            })
            .await;

        channel.open("ws://dazno.test/ws/realtime");
        assert_eq!(states.recv().await, Some(ConnectionState::Connecting));
        assert_eq!(states.recv().await, Some(ConnectionState::Open));

        frames_tx
            .send(text(json!({"type": "prediction_update", "payload": {"n": 1}})))
            .unwrap();
        assert_eq!(rx.recv().await, Some(json!({"n": 1})));

        channel.close().await;
        assert_eq!(states.recv().await, Some(ConnectionState::Closed));

        let _ = frames_tx.send(text(json!({"type": "prediction_update", "payload": {"n": 2}})));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(connector.attempts().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_close_waits_for_running_handler() {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let connector = ScriptedConnector::new(vec![Step::Hold(frames_rx)]);
        let channel = RealtimeChannel::with_connector(connector, ReconnectPolicy::default());

        let log = Arc::new(Mutex::new(Vec::<String>::new()));

        let status_log = Arc::clone(&log);
        channel
            .on_status(move |state| {
                status_log.lock().unwrap().push(format!("{:?}", state));
            })
            .await;

        let (started_tx, mut started_rx) = mpsc::unbounded_channel();
        let handler_log = Arc::clone(&log);
        channel
            .on_event(EventKind::RoiUpdate, move |_| {
                let started_tx = started_tx.clone();
                let handler_log = Arc::clone(&handler_log);
                async move {
                    let _ = started_tx.send(());
                    // Blocks the worker so the abort cannot land mid-handler
                    std::thread::sleep(Duration::from_millis(200));
                    handler_log.lock().unwrap().push("handled".to_string());
                }
            })
            .await;

        channel.open("ws://dazno.test/ws/realtime");
        frames_tx
            .send(text(json!({"type": "roi_update", "payload": {}})))
            .unwrap();
        started_rx.recv().await.unwrap();

        channel.close().await;

        let log = log.lock().unwrap().clone();
        assert_eq!(
            log[log.len() - 2..].to_vec(),
            vec!["handled".to_string(), "Closed".to_string()]
        );
    }

    #[tokio::test]
    async fn test_websocket_round_trip() {
        use futures_util::SinkExt;
        use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
        use tokio_tungstenite::tungstenite::protocol::CloseFrame;
        use tokio_tungstenite::tungstenite::Message;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(Message::Text(
                r#"{"type":"connection_established","payload":{"message":"Connected"}}"#.to_string(),
            ))
            .await
            .unwrap();
            ws.send(Message::Text(
                r#"{"type":"roi_update","payload":{"current":"15.75","trend":"positive","predicted":"18.2","network_average":12.3}}"#.to_string(),
            ))
            .await
            .unwrap();
            ws.close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "bye".into(),
            }))
            .await
            .unwrap();
        });

        let channel = RealtimeChannel::new(ReconnectPolicy::default());
        let mut states = status_channel(&channel).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        channel
            .on_event(EventKind::RoiUpdate, move |payload| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(payload);
                }
            })
            .await;

        channel.open(format!("ws://{}/ws/realtime", addr));

        assert_eq!(
            rx.recv().await,
            Some(json!({"current":"15.75","trend":"positive","predicted":"18.2","network_average":12.3}))
        );
        assert_eq!(states.recv().await, Some(ConnectionState::Connecting));
        assert_eq!(states.recv().await, Some(ConnectionState::Open));
        assert_eq!(states.recv().await, Some(ConnectionState::Closed));

        server.await.unwrap();
    }
}
