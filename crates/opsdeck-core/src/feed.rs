// ── Security alert feed ──
//
// Newest-first list of security alerts fed by both the REST loader and
// realtime push events. Two runtime toggles gate it: `alerts_enabled`
// drops incoming alerts entirely, `sound_enabled` gates the audible
// cue raised for high and critical severities.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use opsdeck_api::models::AlertRecord;
use opsdeck_api::realtime::PushEvent;

use crate::classify::AlertSeverity;

/// Security alert feed shared by the hub and its panels.
pub struct AlertFeed {
    alerts: RwLock<Vec<AlertRecord>>,
    alerts_enabled: AtomicBool,
    sound_enabled: AtomicBool,
    // Monotonic cue counter; subscribers play a sound on each change.
    sound_tx: watch::Sender<u64>,
}

impl AlertFeed {
    pub fn new(alerts_enabled: bool, sound_enabled: bool) -> Self {
        let (sound_tx, _rx) = watch::channel(0);
        Self {
            alerts: RwLock::new(Vec::new()),
            alerts_enabled: AtomicBool::new(alerts_enabled),
            sound_enabled: AtomicBool::new(sound_enabled),
            sound_tx,
        }
    }

    // ── Toggles ──────────────────────────────────────────────────────

    pub fn set_alerts_enabled(&self, enabled: bool) {
        self.alerts_enabled.store(enabled, Ordering::Relaxed);
        info!(enabled, "alert feed toggled");
    }

    pub fn alerts_enabled(&self) -> bool {
        self.alerts_enabled.load(Ordering::Relaxed)
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.sound_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Relaxed)
    }

    // ── Ingestion ────────────────────────────────────────────────────

    /// Prepend `alert` to the feed.
    ///
    /// A no-op while alerts are disabled. Raises the sound cue when the
    /// severity warrants it and sound is on.
    pub fn push(&self, alert: AlertRecord) {
        if !self.alerts_enabled() {
            debug!(alert_id = %alert.id, "alert dropped; feed disabled");
            return;
        }

        let audible = alert
            .severity
            .parse::<AlertSeverity>()
            .is_ok_and(AlertSeverity::triggers_sound);

        {
            let mut alerts = self.alerts.write().unwrap_or_else(|e| e.into_inner());
            alerts.insert(0, alert);
        }

        if audible && self.sound_enabled() {
            self.sound_tx.send_modify(|n| *n += 1);
        }
    }

    /// Ingest a realtime push event carrying an alert payload.
    ///
    /// Payloads that do not parse as an alert record are logged and
    /// dropped; a malformed event must not take the feed down.
    pub fn ingest_event(&self, event: &PushEvent) {
        match serde_json::from_value::<AlertRecord>(event.payload.clone()) {
            Ok(alert) => self.push(alert),
            Err(err) => {
                debug!(event = %event.name, error = %err, "unparseable alert payload dropped");
            }
        }
    }

    // ── Queries and updates ──────────────────────────────────────────

    /// Mark the alert with `id` resolved. Returns `true` when found.
    pub fn resolve(&self, id: Uuid) -> bool {
        let mut alerts = self.alerts.write().unwrap_or_else(|e| e.into_inner());
        match alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.resolved = true;
                true
            }
            None => false,
        }
    }

    /// Replace the whole feed, e.g. after a REST reload. Honors the
    /// alerts toggle but never raises sound cues -- cues are for pushes.
    pub fn replace_all(&self, alerts: Vec<AlertRecord>) {
        if !self.alerts_enabled() {
            return;
        }
        *self.alerts.write().unwrap_or_else(|e| e.into_inner()) = alerts;
    }

    /// Snapshot of the feed, newest first.
    pub fn all(&self) -> Vec<AlertRecord> {
        self.alerts.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Snapshot of unresolved alerts, newest first.
    pub fn unresolved(&self) -> Vec<AlertRecord> {
        self.alerts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|a| !a.resolved)
            .cloned()
            .collect()
    }

    /// Snapshot of alerts at exactly `severity`, newest first.
    pub fn by_severity(&self, severity: AlertSeverity) -> Vec<AlertRecord> {
        self.alerts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|a| a.severity.parse::<AlertSeverity>() == Ok(severity))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.alerts.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to the sound cue counter.
    pub fn subscribe_sound(&self) -> watch::Receiver<u64> {
        self.sound_tx.subscribe()
    }
}

impl Default for AlertFeed {
    fn default() -> Self {
        Self::new(true, true)
    }
}
