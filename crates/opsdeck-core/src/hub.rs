// ── Admin hub ──
//
// The one shared context object behind every dashboard panel. Owns the
// REST client, the realtime channel, the listener registry, the alert
// feed, and the per-domain snapshot cells. Constructed explicitly and
// connected explicitly; nothing happens at import time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use secrecy::SecretString;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use opsdeck_api::models::{
    AdminUser, AnalyticsSummary, LogEntry, SessionProfile, SystemMetrics, Transaction, UserUpdate,
};
use opsdeck_api::realtime::{
    ChannelState, RealtimeHandle, SequenceSource, events, socket_url,
};
use opsdeck_api::rest::AdminClient;
use opsdeck_api::transport::TransportConfig;

use crate::config::HubConfig;
use crate::error::HubError;
use crate::fallback::{Sourced, with_fallback};
use crate::feed::AlertFeed;
use crate::mock;
use crate::registry::{ListenerRegistry, ListenerToken};
use crate::store::LatestCell;

/// Live realtime connection plus its pump task.
struct Connection {
    handle: RealtimeHandle,
    cancel: CancellationToken,
    pump: JoinHandle<()>,
    state_forward: JoinHandle<()>,
}

struct HubInner {
    config: HubConfig,
    client: AdminClient,
    registry: ListenerRegistry,
    feed: AlertFeed,
    seq: SequenceSource,
    connection: Mutex<Option<Connection>>,
    // Sticky across reconnects and across connect() calls.
    monitoring: AtomicBool,
    state_tx: watch::Sender<ChannelState>,
    profile: std::sync::RwLock<Option<SessionProfile>>,

    // Latest-snapshot cells, one per polled data domain.
    users: LatestCell<Vec<AdminUser>>,
    metrics: LatestCell<SystemMetrics>,
    analytics: LatestCell<AnalyticsSummary>,
    transactions: LatestCell<Vec<Transaction>>,
    logs: LatestCell<Vec<LogEntry>>,
}

/// Shared handle to the admin event and data hub. Cheap to clone.
#[derive(Clone)]
pub struct AdminHub {
    inner: Arc<HubInner>,
}

impl AdminHub {
    /// Build a hub from config. No network traffic happens here; call
    /// [`connect`](Self::connect) once a token is installed.
    pub fn new(config: HubConfig) -> Result<Self, HubError> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            timeout: config.timeout,
        };
        let client = AdminClient::new(config.api_base.clone(), &transport)?;
        let (state_tx, _rx) = watch::channel(ChannelState::Disconnected);
        let feed = AlertFeed::new(config.alerts_enabled, config.sound_enabled);

        Ok(Self {
            inner: Arc::new(HubInner {
                config,
                client,
                registry: ListenerRegistry::new(),
                feed,
                seq: SequenceSource::new(),
                connection: Mutex::new(None),
                monitoring: AtomicBool::new(false),
                state_tx,
                profile: std::sync::RwLock::new(None),
                users: LatestCell::new(),
                metrics: LatestCell::new(),
                analytics: LatestCell::new(),
                transactions: LatestCell::new(),
                logs: LatestCell::new(),
            }),
        })
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Install the session token on the REST client. If the realtime
    /// channel is up it is reconnected so the handshake carries the new
    /// token.
    pub async fn set_token(&self, token: SecretString) -> Result<(), HubError> {
        self.inner.client.set_token(token);
        let was_connected = self.inner.connection.lock().await.is_some();
        if was_connected {
            info!("token replaced while connected; reopening realtime channel");
            self.connect().await?;
        }
        Ok(())
    }

    /// Drop the session entirely: channel down, token gone, listeners
    /// and cached profile cleared. A later `notify` delivers to nobody.
    pub async fn sign_out(&self) {
        self.teardown().await;
        self.inner.client.clear_token();
        self.inner.registry.clear();
        *self
            .inner
            .profile
            .write()
            .unwrap_or_else(|e| e.into_inner()) = None;
        info!("signed out; session state cleared");
    }

    /// Fetch and cache the signed-in admin's profile.
    pub async fn refresh_profile(&self) -> Result<SessionProfile, HubError> {
        let profile = self.inner.client.current_profile().await?;
        *self
            .inner
            .profile
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(profile.clone());
        Ok(profile)
    }

    /// Last cached profile, if any.
    pub fn profile(&self) -> Option<SessionProfile> {
        self.inner
            .profile
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    // ── Realtime channel lifecycle ───────────────────────────────────

    /// Open the realtime channel, tearing down any existing connection
    /// first. At most one live connection exists per hub.
    ///
    /// Requires a token; fails with [`HubError::NotSignedIn`] otherwise.
    pub async fn connect(&self) -> Result<(), HubError> {
        let Some(token) = self.inner.client.token() else {
            return Err(HubError::NotSignedIn);
        };

        let mut slot = self.inner.connection.lock().await;
        if let Some(old) = slot.take() {
            shutdown_connection(old);
        }

        let ws_url = socket_url(self.inner.client.base_url())?;
        let cancel = CancellationToken::new();
        let handle = RealtimeHandle::connect(
            ws_url,
            token,
            self.inner.config.reconnect.clone(),
            cancel.clone(),
            self.inner.seq.clone(),
        )
        .await?;

        if self.inner.monitoring.load(Ordering::Relaxed) {
            handle.subscribe_monitoring().await?;
        }

        let pump = tokio::spawn(pump_events(handle.subscribe(), Arc::clone(&self.inner)));
        let state_forward = tokio::spawn(forward_state(
            handle.state(),
            self.inner.state_tx.clone(),
        ));

        *slot = Some(Connection {
            handle,
            cancel,
            pump,
            state_forward,
        });
        Ok(())
    }

    /// Close the realtime channel and clear every registered listener.
    pub async fn disconnect(&self) {
        self.teardown().await;
        self.inner.registry.clear();
        info!("realtime channel disconnected");
    }

    async fn teardown(&self) {
        let mut slot = self.inner.connection.lock().await;
        if let Some(connection) = slot.take() {
            shutdown_connection(connection);
        }
        let _ = self.inner.state_tx.send(ChannelState::Disconnected);
    }

    /// Current channel state.
    pub fn channel_state(&self) -> ChannelState {
        *self.inner.state_tx.borrow()
    }

    /// Observe channel state transitions.
    pub fn watch_channel_state(&self) -> watch::Receiver<ChannelState> {
        self.inner.state_tx.subscribe()
    }

    /// Request monitoring pushes. Sticky: survives reconnects and is
    /// replayed by the next `connect()` if the channel is down now.
    pub async fn subscribe_monitoring(&self) -> Result<(), HubError> {
        self.inner.monitoring.store(true, Ordering::Relaxed);
        if let Some(connection) = self.inner.connection.lock().await.as_ref() {
            connection.handle.subscribe_monitoring().await?;
        }
        Ok(())
    }

    /// Stop monitoring pushes and clear the sticky flag.
    pub async fn unsubscribe_monitoring(&self) -> Result<(), HubError> {
        self.inner.monitoring.store(false, Ordering::Relaxed);
        if let Some(connection) = self.inner.connection.lock().await.as_ref() {
            connection.handle.unsubscribe_monitoring().await?;
        }
        Ok(())
    }

    // ── Listeners ────────────────────────────────────────────────────

    /// Register a callback for a named push event.
    pub fn on(
        &self,
        event: &str,
        callback: impl Fn(&serde_json::Value) + Send + Sync + 'static,
    ) -> ListenerToken {
        self.inner.registry.add(event, callback)
    }

    /// Remove a previously registered callback.
    pub fn off(&self, token: &ListenerToken) -> bool {
        self.inner.registry.remove(token)
    }

    /// The shared listener registry.
    pub fn registry(&self) -> &ListenerRegistry {
        &self.inner.registry
    }

    /// The shared alert feed.
    pub fn alerts(&self) -> &AlertFeed {
        &self.inner.feed
    }

    /// The underlying REST client, for operations without a hub wrapper.
    pub fn client(&self) -> &AdminClient {
        &self.inner.client
    }

    // ── Data loading with fallback ───────────────────────────────────
    //
    // Each loader takes its sequence stamp *before* the request goes
    // out. A push arriving while the request is in flight gets a higher
    // stamp, so when the slow response lands its `offer` loses.

    pub async fn load_users(&self) -> Sourced<Vec<AdminUser>> {
        let seq = self.inner.seq.next();
        let loaded = with_fallback(
            "users",
            async { Ok(self.inner.client.list_users().await?) },
            mock::sample_users,
        )
        .await;
        self.inner.users.offer(seq, loaded.data.clone());
        loaded
    }

    pub async fn load_metrics(&self) -> Sourced<SystemMetrics> {
        let seq = self.inner.seq.next();
        let loaded = with_fallback(
            "metrics",
            async { Ok(self.inner.client.system_metrics().await?) },
            mock::sample_metrics,
        )
        .await;
        self.inner.metrics.offer(seq, loaded.data.clone());
        loaded
    }

    pub async fn load_analytics(&self) -> Sourced<AnalyticsSummary> {
        let seq = self.inner.seq.next();
        let loaded = with_fallback(
            "analytics",
            async { Ok(self.inner.client.analytics_summary().await?) },
            mock::sample_analytics,
        )
        .await;
        self.inner.analytics.offer(seq, loaded.data.clone());
        loaded
    }

    pub async fn load_transactions(&self, limit: Option<u32>) -> Sourced<Vec<Transaction>> {
        let seq = self.inner.seq.next();
        let loaded = with_fallback(
            "transactions",
            async { Ok(self.inner.client.list_transactions(limit).await?) },
            mock::sample_transactions,
        )
        .await;
        self.inner.transactions.offer(seq, loaded.data.clone());
        loaded
    }

    pub async fn load_logs(&self, limit: Option<u32>) -> Sourced<Vec<LogEntry>> {
        let seq = self.inner.seq.next();
        let loaded = with_fallback(
            "logs",
            async { Ok(self.inner.client.list_logs(limit).await?) },
            mock::sample_logs,
        )
        .await;
        self.inner.logs.offer(seq, loaded.data.clone());
        loaded
    }

    /// Reload the alert feed from the backend.
    pub async fn load_alerts(&self, limit: Option<u32>) -> Sourced<usize> {
        let loaded = with_fallback(
            "alerts",
            async { Ok(self.inner.client.list_security_alerts(limit).await?) },
            mock::sample_alerts,
        )
        .await;
        let count = loaded.data.len();
        self.inner.feed.replace_all(loaded.data);
        Sourced {
            data: count,
            origin: loaded.origin,
        }
    }

    // ── Snapshot access ──────────────────────────────────────────────

    pub fn users(&self) -> &LatestCell<Vec<AdminUser>> {
        &self.inner.users
    }

    pub fn metrics(&self) -> &LatestCell<SystemMetrics> {
        &self.inner.metrics
    }

    pub fn analytics(&self) -> &LatestCell<AnalyticsSummary> {
        &self.inner.analytics
    }

    pub fn transactions(&self) -> &LatestCell<Vec<Transaction>> {
        &self.inner.transactions
    }

    pub fn logs(&self) -> &LatestCell<Vec<LogEntry>> {
        &self.inner.logs
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub async fn update_user(&self, id: Uuid, update: &UserUpdate) -> Result<AdminUser, HubError> {
        Ok(self.inner.client.update_user(&id, update).await?)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), HubError> {
        self.inner.client.delete_user(&id).await?;
        Ok(())
    }

    /// Resolve an alert on the backend and mirror the change locally.
    pub async fn resolve_alert(&self, id: Uuid) -> Result<(), HubError> {
        self.inner.client.resolve_alert(&id).await?;
        self.inner.feed.resolve(id);
        Ok(())
    }
}

fn shutdown_connection(connection: Connection) {
    connection.cancel.cancel();
    connection.handle.shutdown();
    connection.pump.abort();
    connection.state_forward.abort();
}

// ── Background tasks ─────────────────────────────────────────────────

/// Fan every inbound push event out to registered listeners, and route
/// alert-bearing events into the feed.
async fn pump_events(
    mut rx: tokio::sync::broadcast::Receiver<Arc<opsdeck_api::realtime::PushEvent>>,
    inner: Arc<HubInner>,
) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        match rx.recv().await {
            Ok(event) => {
                if matches!(
                    event.name.as_str(),
                    events::SECURITY_ALERT | events::SYSTEM_ALERT | events::SYSTEM_METRIC_CRITICAL
                ) {
                    inner.feed.ingest_event(&event);
                }
                inner.registry.notify(&event.name, &event.payload);
            }
            Err(RecvError::Lagged(missed)) => {
                warn!(missed, "event pump lagged behind the realtime channel");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Mirror the channel task's state into the hub-level watch so state
/// observation survives reconnects of the underlying handle.
async fn forward_state(
    mut channel_rx: watch::Receiver<ChannelState>,
    hub_tx: watch::Sender<ChannelState>,
) {
    let _ = hub_tx.send(*channel_rx.borrow());
    while channel_rx.changed().await.is_ok() {
        let state = *channel_rx.borrow();
        let _ = hub_tx.send(state);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hub() -> AdminHub {
        AdminHub::new(HubConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn connect_without_token_fails() {
        let hub = hub();
        let err = hub.connect().await.unwrap_err();
        assert!(matches!(err, HubError::NotSignedIn));
        assert_eq!(hub.channel_state(), ChannelState::Disconnected);
    }

    #[tokio::test]
    async fn sign_out_clears_listeners_and_profile() {
        let hub = hub();
        hub.inner.client.set_token(SecretString::from("tok"));

        let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let sink = Arc::clone(&hits);
        hub.on(events::USER_REGISTERED, move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hub.registry().listener_count(events::USER_REGISTERED), 1);

        hub.sign_out().await;

        assert!(hub.inner.client.token().is_none());
        assert!(hub.profile().is_none());
        hub.registry()
            .notify(events::USER_REGISTERED, &serde_json::json!({}));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn listener_tokens_register_and_remove() {
        let hub = hub();
        let token = hub.on(events::PAYMENT_RECEIVED, |_| {});
        assert_eq!(hub.registry().listener_count(events::PAYMENT_RECEIVED), 1);
        assert!(hub.off(&token));
        assert!(!hub.off(&token));
        assert_eq!(hub.registry().listener_count(events::PAYMENT_RECEIVED), 0);
    }

    #[tokio::test]
    async fn monitoring_flag_is_sticky_without_connection() {
        let hub = hub();
        hub.subscribe_monitoring().await.unwrap();
        assert!(hub.inner.monitoring.load(Ordering::Relaxed));
        hub.unsubscribe_monitoring().await.unwrap();
        assert!(!hub.inner.monitoring.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn pump_routes_alert_events_into_feed_and_registry() {
        let hub = hub();
        let (tx, rx) = tokio::sync::broadcast::channel(8);
        let pump = tokio::spawn(pump_events(rx, Arc::clone(&hub.inner)));

        let seen = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        hub.on(events::SECURITY_ALERT, move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        let record = serde_json::json!({
            "id": Uuid::new_v4(),
            "severity": "high",
            "type": "brute_force",
            "message": "failed logins",
            "source": "auth",
            "timestamp": chrono::Utc::now(),
        });
        tx.send(Arc::new(opsdeck_api::realtime::PushEvent {
            name: events::SECURITY_ALERT.to_string(),
            payload: record,
            seq: 1,
            received_at: chrono::Utc::now(),
        }))
        .unwrap();

        drop(tx); // closes the channel so the pump exits
        pump.await.unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(hub.alerts().len(), 1);
        assert_eq!(hub.alerts().all()[0].severity, "high");
    }

    #[tokio::test]
    async fn pump_ignores_non_alert_events_for_feed() {
        let hub = hub();
        let (tx, rx) = tokio::sync::broadcast::channel(8);
        let pump = tokio::spawn(pump_events(rx, Arc::clone(&hub.inner)));

        tx.send(Arc::new(opsdeck_api::realtime::PushEvent {
            name: events::USER_REGISTERED.to_string(),
            payload: serde_json::json!({ "email": "x@example.com" }),
            seq: 1,
            received_at: chrono::Utc::now(),
        }))
        .unwrap();

        drop(tx);
        pump.await.unwrap();
        assert!(hub.alerts().is_empty());
    }

    #[test]
    fn hub_is_cheaply_cloneable() {
        let hub = hub();
        let clone = hub.clone();
        clone.on(events::LEAD_CREATED, |_| {});
        assert_eq!(hub.registry().listener_count(events::LEAD_CREATED), 1);
    }
}
