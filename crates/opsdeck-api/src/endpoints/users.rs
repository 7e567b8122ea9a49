// User management endpoints
//
// Listing, lookup, partial update, and deactivation of admin-visible
// user accounts under /admin/users.

use tracing::debug;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Ack, AdminUser, SessionProfile, UserUpdate};
use crate::rest::AdminClient;

impl AdminClient {
    /// List all users.
    ///
    /// `GET /admin/users`
    pub async fn list_users(&self) -> Result<Vec<AdminUser>, Error> {
        debug!("listing users");
        self.get("admin/users").await
    }

    /// Get a single user by id.
    ///
    /// `GET /admin/users/{id}`
    pub async fn get_user(&self, id: &Uuid) -> Result<AdminUser, Error> {
        self.get(&format!("admin/users/{id}")).await
    }

    /// Apply a partial update to a user.
    ///
    /// `PUT /admin/users/{id}`
    pub async fn update_user(&self, id: &Uuid, update: &UserUpdate) -> Result<AdminUser, Error> {
        debug!(%id, "updating user");
        self.put(&format!("admin/users/{id}"), update).await
    }

    /// Delete a user.
    ///
    /// `DELETE /admin/users/{id}`
    pub async fn delete_user(&self, id: &Uuid) -> Result<Ack, Error> {
        debug!(%id, "deleting user");
        self.delete(&format!("admin/users/{id}")).await
    }

    /// Fetch the profile of the signed-in admin.
    ///
    /// `GET /admin/me` -- cached by the config layer so the dashboard
    /// can restore session state on startup.
    pub async fn current_profile(&self) -> Result<SessionProfile, Error> {
        self.get("admin/me").await
    }
}
