// Security alert endpoints under /admin/security/alerts.

use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Ack, AlertRecord};
use crate::rest::AdminClient;

impl AdminClient {
    /// List security alerts, newest first.
    ///
    /// `GET /admin/security/alerts?limit={n}`
    pub async fn list_security_alerts(&self, limit: Option<u32>) -> Result<Vec<AlertRecord>, Error> {
        match limit {
            Some(n) => {
                self.get_query("admin/security/alerts", &[("limit", n.to_string())])
                    .await
            }
            None => self.get("admin/security/alerts").await,
        }
    }

    /// Mark an alert as resolved. Alerts are never deleted -- resolution
    /// is the only mutation the backend accepts.
    ///
    /// `POST /admin/security/alerts/{id}/resolve`
    pub async fn resolve_alert(&self, id: &Uuid) -> Result<Ack, Error> {
        debug!(%id, "resolving alert");
        self.post(&format!("admin/security/alerts/{id}/resolve"), &json!({}))
            .await
    }
}
