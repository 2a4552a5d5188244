// crates/stream/src/config.rs

use std::time::Duration;

use http::header::HeaderValue;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;

use crate::StreamResult;

/// Connection settings for the Plex notification feed.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub host: String,
    pub port: u16,
    pub ssl: bool,
    /// `X-Plex-Token` sent with the handshake when set.
    pub token: Option<String>,
    /// Consecutive connect failures tolerated before the cycle is
    /// declared terminal.
    pub max_attempts: u32,
    /// Fixed delay between connect attempts.
    pub retry_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 32400,
            ssl: false,
            token: None,
            max_attempts: 5,
            retry_interval: Duration::from_secs(5),
        }
    }
}

impl StreamConfig {
    /// Build a config from `PLEX_HOST`, `PLEX_PORT`, `PLEX_SSL`, and
    /// `PLEX_TOKEN`, falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("PLEX_HOST").unwrap_or(defaults.host),
            port: std::env::var("PLEX_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            ssl: std::env::var("PLEX_SSL")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.ssl),
            token: std::env::var("PLEX_TOKEN").ok().filter(|t| !t.is_empty()),
            ..defaults
        }
    }

    /// `ws(s)://<host>:<port>/:/websockets/notifications`
    pub fn ws_uri(&self) -> String {
        let scheme = if self.ssl { "wss" } else { "ws" };
        format!(
            "{}://{}:{}/:/websockets/notifications",
            scheme, self.host, self.port
        )
    }

    /// Handshake request for [`ws_uri`](Self::ws_uri), with the
    /// `X-Plex-Token` header attached when a token is configured.
    pub fn client_request(&self) -> StreamResult<Request> {
        let mut request = self.ws_uri().into_client_request()?;
        if let Some(token) = &self.token {
            request
                .headers_mut()
                .insert("X-Plex-Token", HeaderValue::from_str(token)?);
        }
        Ok(request)
    }
}
