// ── Core error types ──
//
// Consumer-facing errors from opsdeck-core. These are NOT API-specific --
// dashboard code never sees raw HTTP status codes or JSON parse failures.
// The `From<opsdeck_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum HubError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("No session token installed -- sign in first")]
    NotSignedIn,

    #[error("Session expired -- sign in again")]
    SessionExpired,

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Realtime channel is not connected")]
    ChannelUnavailable,

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {summary}")]
    ValidationFailed { summary: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<opsdeck_api::Error> for HubError {
    fn from(err: opsdeck_api::Error) -> Self {
        match err {
            opsdeck_api::Error::SessionExpired => HubError::SessionExpired,
            opsdeck_api::Error::Transport(ref e) => {
                if e.is_timeout() || e.is_connect() {
                    HubError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                } else {
                    HubError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            opsdeck_api::Error::InvalidUrl(e) => HubError::Config {
                message: format!("Invalid URL: {e}"),
            },
            opsdeck_api::Error::Tls(msg) => HubError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            opsdeck_api::Error::Validation { errors } => HubError::ValidationFailed {
                summary: errors
                    .iter()
                    .map(|e| match &e.field {
                        Some(field) => format!("{field}: {}", e.message),
                        None => e.message.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
            },
            opsdeck_api::Error::Api { status, message } => HubError::Api {
                message,
                status: Some(status),
            },
            opsdeck_api::Error::WebSocketConnect(reason) => HubError::ConnectionFailed {
                reason: format!("WebSocket connection failed: {reason}"),
            },
            opsdeck_api::Error::WebSocketClosed { code, reason } => HubError::ConnectionFailed {
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            opsdeck_api::Error::Deserialization { message, body: _ } => {
                HubError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
