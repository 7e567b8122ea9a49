// Admin REST client
//
// Wraps `reqwest::Client` with base-URL path construction, bearer-token
// injection, and error-body parsing. Endpoint modules (users, plans,
// alerts, system) are implemented as inherent methods via separate files
// to keep this module focused on transport mechanics.

use arc_swap::ArcSwapOption;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{Error, FieldError};
use crate::transport::TransportConfig;

/// HTTP client for the admin REST backend.
///
/// Holds the session token behind an [`ArcSwapOption`] so it can be
/// replaced lock-free when the user signs in or out; every outbound
/// request attaches `Authorization: Bearer <token>` when one is set.
/// The client never substitutes data on failure -- it always returns
/// the error and leaves fallback decisions to the caller.
pub struct AdminClient {
    http: reqwest::Client,
    base_url: Url,
    token: ArcSwapOption<SecretString>,
}

/// Error body shape the backend uses for non-2xx responses.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<FieldError>,
}

impl AdminClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the REST root, typically ending in `/api`
    /// (e.g. `https://admin.example.com/api`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            token: ArcSwapOption::empty(),
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Install a new bearer token. Subsequent requests use it immediately.
    pub fn set_token(&self, token: SecretString) {
        self.token.store(Some(std::sync::Arc::new(token)));
    }

    /// Drop the bearer token (sign-out).
    pub fn clear_token(&self) {
        self.token.store(None);
    }

    /// The current bearer token, if any. Used for the realtime handshake.
    pub fn token(&self) -> Option<SecretString> {
        self.token.load_full().map(|t| (*t).clone())
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build a full URL for an API path relative to the base URL.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&full).map_err(Error::InvalidUrl)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and parse the response.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("GET {url}");

        let resp = self.authed(self.http.get(url)).send().await?;
        parse_response(resp).await
    }

    /// Send a GET request with query parameters.
    pub(crate) async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("GET {url}");

        let resp = self.authed(self.http.get(url)).query(query).send().await?;
        parse_response(resp).await
    }

    /// Send a POST request with a JSON body.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("POST {url}");

        let resp = self.authed(self.http.post(url)).json(body).send().await?;
        parse_response(resp).await
    }

    /// Send a PUT request with a JSON body.
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("PUT {url}");

        let resp = self.authed(self.http.put(url)).json(body).send().await?;
        parse_response(resp).await
    }

    /// Send a DELETE request.
    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("DELETE {url}");

        let resp = self.authed(self.http.delete(url)).send().await?;
        parse_response(resp).await
    }

    /// Attach the bearer token, if one is installed.
    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.load_full() {
            Some(token) => req.bearer_auth(token.expose_secret()),
            None => req,
        }
    }
}

/// Turn a response into a typed payload or a typed failure.
///
/// 401 becomes [`Error::SessionExpired`] so callers can distinguish
/// session invalidation from data errors. 400 with a structured `errors`
/// array becomes [`Error::Validation`]. Every other non-2xx status is an
/// [`Error::Api`] whose message comes from the JSON body's `message`
/// field, falling back to `HTTP <status>: <reason>`.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();

    if status.is_success() {
        let body = resp.text().await.map_err(Error::Transport)?;
        return serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        });
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::SessionExpired);
    }

    let reason = status.canonical_reason().unwrap_or("Unknown Error");
    let body = resp.text().await.unwrap_or_default();

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
        if status == reqwest::StatusCode::BAD_REQUEST && !parsed.errors.is_empty() {
            return Err(Error::Validation {
                errors: parsed.errors,
            });
        }
        if let Some(message) = parsed.message {
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
    }

    Err(Error::Api {
        status: status.as_u16(),
        message: format!("HTTP {}: {reason}", status.as_u16()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> AdminClient {
        AdminClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://admin.example.com/api").unwrap(),
        )
    }

    #[test]
    fn api_url_joins_without_double_slash() {
        let c = client();
        assert_eq!(
            c.api_url("/admin/users").unwrap().as_str(),
            "https://admin.example.com/api/admin/users"
        );
        assert_eq!(
            c.api_url("admin/users").unwrap().as_str(),
            "https://admin.example.com/api/admin/users"
        );
    }

    #[test]
    fn token_roundtrip() {
        let c = client();
        assert!(c.token().is_none());

        c.set_token(SecretString::from("tok-123".to_string()));
        assert_eq!(c.token().unwrap().expose_secret(), "tok-123");

        c.clear_token();
        assert!(c.token().is_none());
    }
}
