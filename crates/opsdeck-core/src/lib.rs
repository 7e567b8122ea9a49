//! Core runtime for the opsdeck admin dashboards.
//!
//! Everything the panels share lives here: the [`AdminHub`] context
//! object, the listener registry, the per-panel refresh scheduler,
//! alert classification, the alert feed, sequenced snapshot cells, and
//! the sample-data fallback layer. Transport details (REST, WebSocket)
//! live in `opsdeck-api`; disk and environment configuration live in
//! `opsdeck-config`.

pub mod classify;
pub mod config;
pub mod error;
pub mod fallback;
pub mod feed;
pub mod hub;
pub mod mock;
pub mod refresh;
pub mod registry;
pub mod store;

pub use classify::{
    AlertSeverity, HealthStatus, Indicator, IndicatorColor, NEUTRAL, classify_health,
    classify_severity,
};
pub use config::HubConfig;
pub use error::HubError;
pub use fallback::{DataOrigin, Sourced, with_fallback};
pub use feed::AlertFeed;
pub use hub::AdminHub;
pub use refresh::RefreshScheduler;
pub use registry::{ListenerRegistry, ListenerToken};
pub use store::{LatestCell, Stamped};

/// Wire models shared with the transport crate.
pub mod model {
    pub use opsdeck_api::models::*;
}
