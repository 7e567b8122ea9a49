// System monitoring and maintenance endpoints
//
// Metrics, analytics, transactions, logs, API keys, backup, and cleanup.
// These back the monitoring dashboards; every read here has a matching
// sample-data generator in opsdeck-core for the fallback path.

use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{
    Ack, AnalyticsSummary, ApiKey, BackupStatus, CleanupReport, LogEntry, SystemMetrics,
    Transaction,
};
use crate::rest::AdminClient;

impl AdminClient {
    /// Current system health metrics.
    ///
    /// `GET /admin/system/metrics`
    pub async fn system_metrics(&self) -> Result<SystemMetrics, Error> {
        self.get("admin/system/metrics").await
    }

    /// Aggregated analytics for the overview dashboard.
    ///
    /// `GET /admin/analytics/summary`
    pub async fn analytics_summary(&self) -> Result<AnalyticsSummary, Error> {
        self.get("admin/analytics/summary").await
    }

    /// Recent payment transactions, newest first.
    ///
    /// `GET /admin/transactions?limit={n}`
    pub async fn list_transactions(&self, limit: Option<u32>) -> Result<Vec<Transaction>, Error> {
        match limit {
            Some(n) => {
                self.get_query("admin/transactions", &[("limit", n.to_string())])
                    .await
            }
            None => self.get("admin/transactions").await,
        }
    }

    /// Recent backend log entries.
    ///
    /// `GET /admin/logs?limit={n}`
    pub async fn list_logs(&self, limit: Option<u32>) -> Result<Vec<LogEntry>, Error> {
        match limit {
            Some(n) => self.get_query("admin/logs", &[("limit", n.to_string())]).await,
            None => self.get("admin/logs").await,
        }
    }

    /// List issued API keys.
    ///
    /// `GET /admin/api-keys`
    pub async fn list_api_keys(&self) -> Result<Vec<ApiKey>, Error> {
        self.get("admin/api-keys").await
    }

    /// Revoke an API key.
    ///
    /// `POST /admin/api-keys/{id}/revoke`
    pub async fn revoke_api_key(&self, id: &Uuid) -> Result<Ack, Error> {
        debug!(%id, "revoking API key");
        self.post(&format!("admin/api-keys/{id}/revoke"), &json!({}))
            .await
    }

    /// Status of the most recent backup.
    ///
    /// `GET /admin/backup/status`
    pub async fn backup_status(&self) -> Result<BackupStatus, Error> {
        self.get("admin/backup/status").await
    }

    /// Trigger a backup run. Completion arrives as a `backup_completed`
    /// realtime event.
    ///
    /// `POST /admin/backup/run`
    pub async fn run_backup(&self) -> Result<Ack, Error> {
        debug!("triggering backup");
        self.post("admin/backup/run", &json!({})).await
    }

    /// Run a cleanup job for the given target (e.g. `sessions`, `logs`).
    ///
    /// `POST /admin/cleanup/{target}`
    pub async fn run_cleanup(&self, target: &str) -> Result<CleanupReport, Error> {
        debug!(target, "running cleanup");
        self.post(&format!("admin/cleanup/{target}"), &json!({}))
            .await
    }
}
