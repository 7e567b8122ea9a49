//! Realtime push channel with auto-reconnect.
//!
//! Maintains the single persistent WebSocket connection to the admin
//! backend and streams inbound push events through a
//! [`tokio::sync::broadcast`] channel. Handles the admin handshake,
//! room join, monitoring re-subscription, and reconnection with
//! exponential backoff + jitter.
//!
//! # Example
//!
//! ```rust,ignore
//! use opsdeck_api::realtime::{socket_url, ReconnectConfig, RealtimeHandle, SequenceSource};
//! use tokio_util::sync::CancellationToken;
//!
//! let ws_url = socket_url(client.base_url())?;
//! let cancel = CancellationToken::new();
//! let handle = RealtimeHandle::connect(
//!     ws_url, token, ReconnectConfig::default(), cancel.clone(), SequenceSource::new(),
//! ).await?;
//!
//! let mut rx = handle.subscribe();
//! while let Ok(event) = rx.recv().await {
//!     println!("{}: {}", event.name, event.payload);
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Channel capacities ───────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;
const SIGNAL_CHANNEL_CAPACITY: usize = 16;

// ── Event names ──────────────────────────────────────────────────────

/// Named events and signals on the realtime channel.
pub mod events {
    // Inbound
    pub const USER_REGISTERED: &str = "user_registered";
    pub const LEAD_CREATED: &str = "lead_created";
    pub const PAYMENT_RECEIVED: &str = "payment_received";
    pub const SYSTEM_ALERT: &str = "system_alert";
    pub const SYSTEM_METRIC_CRITICAL: &str = "system_metric_critical";
    pub const SECURITY_ALERT: &str = "security_alert";
    pub const BACKUP_COMPLETED: &str = "backup_completed";

    // Outbound
    pub const AUTHENTICATE: &str = "authenticate";
    pub const JOIN_ADMIN_ROOM: &str = "join_admin_room";
    pub const SUBSCRIBE_MONITORING: &str = "admin:subscribe_monitoring";
    pub const UNSUBSCRIBE_MONITORING: &str = "admin:unsubscribe_monitoring";
}

// ── PushEvent ────────────────────────────────────────────────────────

/// An inbound event from the realtime channel.
///
/// Every event carries a process-wide monotonic sequence number and its
/// wall-clock arrival time, so consumers can discard updates that are
/// older than what they already hold (a poll response racing a push).
#[derive(Debug, Clone, Serialize)]
pub struct PushEvent {
    /// Event name, e.g. `"security_alert"`. Matched exactly -- no wildcards.
    pub name: String,

    /// Raw JSON payload; consumers deserialize into their domain type.
    pub payload: serde_json::Value,

    /// Monotonic sequence number from the shared [`SequenceSource`].
    pub seq: u64,

    /// Wall-clock arrival time.
    pub received_at: DateTime<Utc>,
}

/// Shared monotonic counter stamping every update (push or poll) so
/// stale writes can be detected downstream. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct SequenceSource(Arc<AtomicU64>);

impl SequenceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence number. Strictly increasing across all clones.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

// ── ChannelState ─────────────────────────────────────────────────────

/// Connection state of the realtime channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── Wire format ──────────────────────────────────────────────────────

/// JSON text frame used in both directions: `{"event": ..., "data": ...}`.
#[derive(Debug, Serialize, Deserialize)]
struct WireFrame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Outbound control signals accepted while connected.
#[derive(Debug, Clone, Copy)]
enum Signal {
    SubscribeMonitoring,
    UnsubscribeMonitoring,
}

// ── RealtimeHandle ───────────────────────────────────────────────────

/// Handle to a running realtime channel.
///
/// At most one live connection exists behind a handle; drop all
/// receivers and call [`shutdown`](Self::shutdown) to tear down the
/// background task.
pub struct RealtimeHandle {
    event_rx: broadcast::Receiver<Arc<PushEvent>>,
    state_rx: watch::Receiver<ChannelState>,
    signal_tx: mpsc::Sender<Signal>,
    cancel: CancellationToken,
}

impl RealtimeHandle {
    /// Connect to the backend's realtime endpoint and spawn the
    /// reconnection loop.
    ///
    /// Returns immediately once the background task is spawned; the
    /// first connection attempt happens asynchronously. Observe
    /// [`state`](Self::state) or subscribe to events to track progress.
    /// The handshake carries the bearer token and `role: "admin"`.
    pub async fn connect(
        ws_url: Url,
        token: SecretString,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        seq: SequenceSource,
    ) -> Result<Self, Error> {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ChannelState::Disconnected);
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            ws_loop(
                ws_url, token, event_tx, state_tx, signal_rx, reconnect, task_cancel, seq,
            )
            .await;
        });

        Ok(Self {
            event_rx,
            state_rx,
            signal_tx,
            cancel,
        })
    }

    /// Get a new broadcast receiver for the event stream.
    ///
    /// Multiple consumers can subscribe concurrently. If a consumer
    /// falls behind, it receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PushEvent>> {
        self.event_rx.resubscribe()
    }

    /// Observe connection state transitions.
    pub fn state(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// The current connection state.
    pub fn current_state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    /// Request monitoring pushes. Re-sent automatically after every
    /// reconnect until unsubscribed.
    pub async fn subscribe_monitoring(&self) -> Result<(), Error> {
        self.send_signal(Signal::SubscribeMonitoring).await
    }

    /// Stop monitoring pushes.
    pub async fn unsubscribe_monitoring(&self) -> Result<(), Error> {
        self.send_signal(Signal::UnsubscribeMonitoring).await
    }

    async fn send_signal(&self, signal: Signal) -> Result<(), Error> {
        self.signal_tx
            .send(signal)
            .await
            .map_err(|_| Error::WebSocketConnect("channel task has shut down".into()))
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Socket URL derivation ────────────────────────────────────────────

/// Derive the realtime endpoint from the REST base URL.
///
/// The socket lives on the same origin as the REST API: strip a trailing
/// `/api` path segment, swap `http(s)` for `ws(s)`, and append `/ws`.
pub fn socket_url(api_base: &Url) -> Result<Url, Error> {
    let mut url = api_base.clone();

    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        "ws" => "ws",
        "wss" => "wss",
        other => {
            return Err(Error::WebSocketConnect(format!(
                "unsupported scheme: {other}"
            )));
        }
    };
    // set_scheme only fails for invalid/cross-class schemes, which the
    // match above rules out.
    url.set_scheme(scheme)
        .map_err(|()| Error::WebSocketConnect("invalid socket scheme".into()))?;

    let path = url.path().trim_end_matches('/');
    let path = path.strip_suffix("/api").unwrap_or(path);
    let ws_path = format!("{path}/ws");
    url.set_path(&ws_path);
    url.set_query(None);

    Ok(url)
}

// ── Background reconnection loop ─────────────────────────────────────

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, tungstenite::Message>;

/// Main loop: connect → handshake → read → on error, backoff → reconnect.
#[allow(clippy::too_many_arguments)]
async fn ws_loop(
    ws_url: Url,
    token: SecretString,
    event_tx: broadcast::Sender<Arc<PushEvent>>,
    state_tx: watch::Sender<ChannelState>,
    mut signal_rx: mpsc::Receiver<Signal>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
    seq: SequenceSource,
) {
    // Sticky across reconnects: once a consumer subscribed to
    // monitoring, every fresh connection re-sends the subscription.
    let mut monitoring = false;
    let mut attempt: u32 = 0;

    loop {
        let _ = state_tx.send(ChannelState::Connecting);

        tokio::select! {
            biased;
            _ = cancelled(&cancel) => break,
            result = run_connection(
                &ws_url, &token, &event_tx, &state_tx, &mut signal_rx, &mut monitoring, &cancel, &seq,
            ) => {
                match result {
                    // Clean disconnect (server close frame or stream ended).
                    // Reset attempt counter and reconnect immediately.
                    Ok(()) => {
                        tracing::info!("realtime channel disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "realtime channel error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "realtime reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = delay.as_millis() as u64,
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            _ = cancelled(&cancel) => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }

    let _ = state_tx.send(ChannelState::Disconnected);
    tracing::debug!("realtime loop exiting");
}

async fn cancelled(cancel: &CancellationToken) {
    cancel.cancelled().await;
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one connection: handshake, join the admin room, replay the
/// monitoring subscription, then pump frames until the stream drops.
#[allow(clippy::too_many_arguments)]
async fn run_connection(
    url: &Url,
    token: &SecretString,
    event_tx: &broadcast::Sender<Arc<PushEvent>>,
    state_tx: &watch::Sender<ChannelState>,
    signal_rx: &mut mpsc::Receiver<Signal>,
    monitoring: &mut bool,
    cancel: &CancellationToken,
    seq: &SequenceSource,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting realtime channel");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;
    let request = ClientRequestBuilder::new(uri);

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    let (mut write, mut read) = ws_stream.split();

    // Handshake before anything else: authenticate as admin, join the
    // admin room, then replay the monitoring subscription if requested.
    send_frame(
        &mut write,
        events::AUTHENTICATE,
        &json!({ "token": token.expose_secret(), "role": "admin" }),
    )
    .await?;
    send_frame(&mut write, events::JOIN_ADMIN_ROOM, &json!({})).await?;
    if *monitoring {
        send_frame(&mut write, events::SUBSCRIBE_MONITORING, &json!({})).await?;
    }

    let _ = state_tx.send(ChannelState::Connected);
    tracing::info!("realtime channel connected");

    let mut signals_open = true;

    loop {
        tokio::select! {
            biased;
            _ = cancelled(cancel) => return Ok(()),
            signal = signal_rx.recv(), if signals_open => {
                match signal {
                    Some(Signal::SubscribeMonitoring) => {
                        *monitoring = true;
                        send_frame(&mut write, events::SUBSCRIBE_MONITORING, &json!({})).await?;
                    }
                    Some(Signal::UnsubscribeMonitoring) => {
                        *monitoring = false;
                        send_frame(&mut write, events::UNSUBSCRIBE_MONITORING, &json!({})).await?;
                    }
                    // All handles dropped; keep pumping inbound frames.
                    None => signals_open = false,
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_broadcast(&text, event_tx, seq);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite replies with pong automatically
                        tracing::trace!("realtime ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "realtime close frame received"
                            );
                        } else {
                            tracing::info!("realtime close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        // Stream ended without a close frame
                        tracing::info!("realtime stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

/// Serialize and send one outbound frame.
async fn send_frame(
    write: &mut WsSink,
    event: &str,
    data: &serde_json::Value,
) -> Result<(), Error> {
    let frame = WireFrame {
        event: event.to_string(),
        data: data.clone(),
    };
    let text =
        serde_json::to_string(&frame).map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    write
        .send(tungstenite::Message::Text(text.into()))
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))
}

// ── Message parsing ──────────────────────────────────────────────────

/// Parse an inbound text frame and broadcast the event, stamped with
/// the next sequence number and arrival time.
fn parse_and_broadcast(
    text: &str,
    event_tx: &broadcast::Sender<Arc<PushEvent>>,
    seq: &SequenceSource,
) {
    let frame: WireFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse realtime frame");
            return;
        }
    };

    let event = PushEvent {
        name: frame.event,
        payload: frame.data,
        seq: seq.next(),
        received_at: Utc::now(),
    };

    // Ignore send errors -- just means no active subscribers right now
    let _ = event_tx.send(Arc::new(event));
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from multiple clients.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    // Not cryptographically random, but good enough for backoff spread.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
