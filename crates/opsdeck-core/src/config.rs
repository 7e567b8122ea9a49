// ── Runtime hub configuration ──
//
// Describes *how* to reach the admin backend and how the dashboards
// behave. Carries connection tuning but never touches disk -- the
// config crate constructs a `HubConfig` and hands it in.

use std::time::Duration;

use opsdeck_api::realtime::ReconnectConfig;
use opsdeck_api::transport::TlsMode;
use url::Url;

/// Configuration for one hub instance.
///
/// Built by the config layer (or tests), passed to `AdminHub` -- core
/// never reads config files or environment variables itself.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// REST base URL, typically ending in `/api`
    /// (e.g. `https://admin.example.com/api`).
    pub api_base: Url,
    /// TLS verification strategy.
    pub tls: TlsMode,
    /// Request timeout.
    pub timeout: Duration,
    /// Realtime channel reconnection policy.
    pub reconnect: ReconnectConfig,
    /// Whether inbound alert events are recorded in the feed.
    pub alerts_enabled: bool,
    /// Whether high/critical alerts trigger a sound cue.
    pub sound_enabled: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000/api"
                .parse()
                .expect("static URL is valid"),
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
            reconnect: ReconnectConfig::default(),
            alerts_enabled: true,
            sound_enabled: true,
        }
    }
}
