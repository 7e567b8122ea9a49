use thiserror::Error;

/// A single field-level validation failure from a 400 response.
///
/// The backend returns these as a structured `errors` array alongside
/// an optional top-level `message`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub field: Option<String>,
    pub message: String,
}

/// Top-level error type for the `opsdeck-api` crate.
///
/// Covers every failure mode across both API surfaces: the REST client
/// and the realtime WebSocket channel. `opsdeck-core` maps these into
/// consumer-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Session ─────────────────────────────────────────────────────
    /// 401 from the backend -- the bearer token is missing, expired,
    /// or revoked. Distinct from generic API errors so callers can
    /// trigger session invalidation instead of a data fallback.
    #[error("Session expired or unauthorized -- sign in again")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── REST API ────────────────────────────────────────────────────
    /// 400 with a structured `errors` array -- surfaced to the user
    /// inline on forms, never swallowed into a fallback.
    #[error("Validation failed ({} error(s))", errors.len())]
    Validation { errors: Vec<FieldError> },

    /// Any other non-2xx response. `message` comes from the JSON error
    /// body when present, otherwise `HTTP <status>: <reason>`.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed unexpectedly.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error means the session is no longer
    /// valid and the hub should sign out rather than retry.
    pub fn is_session_invalid(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Returns `true` if this is a transient error. Transient failures
    /// are what the dashboard fallback layer is for; validation and
    /// session errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            Self::WebSocketConnect(_) => true,
            _ => false,
        }
    }
}
