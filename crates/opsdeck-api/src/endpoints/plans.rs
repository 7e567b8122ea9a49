// Subscription plan endpoints under /admin/plans.

use tracing::debug;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Ack, Plan, PlanCreate};
use crate::rest::AdminClient;

impl AdminClient {
    /// List all plans.
    ///
    /// `GET /admin/plans`
    pub async fn list_plans(&self) -> Result<Vec<Plan>, Error> {
        self.get("admin/plans").await
    }

    /// Create a new plan.
    ///
    /// `POST /admin/plans`
    pub async fn create_plan(&self, plan: &PlanCreate) -> Result<Plan, Error> {
        debug!(name = %plan.name, "creating plan");
        self.post("admin/plans", plan).await
    }

    /// Replace an existing plan.
    ///
    /// `PUT /admin/plans/{id}`
    pub async fn update_plan(&self, id: &Uuid, plan: &PlanCreate) -> Result<Plan, Error> {
        debug!(%id, "updating plan");
        self.put(&format!("admin/plans/{id}"), plan).await
    }

    /// Delete a plan.
    ///
    /// `DELETE /admin/plans/{id}`
    pub async fn delete_plan(&self, id: &Uuid) -> Result<Ack, Error> {
        debug!(%id, "deleting plan");
        self.delete(&format!("admin/plans/{id}")).await
    }
}
