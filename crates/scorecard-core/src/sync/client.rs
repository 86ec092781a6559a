//! HTTP client for the remote round service
//!
//! ## Endpoints
//!
//! - `PUT {base}/rounds/client/{clientId}` with a `RemoteRound` body
//! - `PUT {base}/settings` with a `RemoteSettings` body
//!
//! Both upserts answer with the stored record: `201` when it was created,
//! `200` otherwise. A stored `updatedAt` newer than the one sent means the
//! remote kept its own copy.
//! - `GET {base}/health` returning `{ "status": "online", "lastSynced": ... }`
//!
//! Every request is bounded by the configured timeout.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::message::{RemoteRound, RemoteSettings, RemoteStatus, UpsertReply, UpsertResponse};
use super::remote::{RemoteError, RemoteStore};
use crate::config::Config;

/// Longest error body kept in a `RequestFailed` message
const MAX_ERROR_BODY: usize = 200;

/// Remote reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: Url,
    client: Client,
    timeout: Duration,
}

impl HttpRemote {
    /// Create a client for `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let invalid = |reason: String| RemoteError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };

        let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("scorecard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        Ok(Self {
            base_url: parsed,
            client,
            timeout,
        })
    }

    /// Client for the configured sync URL, if sync is enabled
    pub fn from_config(config: &Config) -> Option<Result<Self, RemoteError>> {
        config
            .active_sync_url()
            .map(|url| Self::new(url, config.request_timeout()))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn map_transport(&self, error: reqwest::Error) -> RemoteError {
        if error.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else if error.is_decode() {
            RemoteError::InvalidResponse(error.to_string())
        } else {
            RemoteError::Unavailable(error.to_string())
        }
    }

    /// Send a request; non-2xx answers become `RequestFailed`
    async fn send_raw(&self, request: RequestBuilder) -> Result<(StatusCode, String), RemoteError> {
        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();

        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            return Err(RemoteError::RequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(|e| self.map_transport(e))?;
        Ok((status, body))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let (_, body) = self.send_raw(request).await?;
        serde_json::from_str(&body).map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }

    /// PUT an upsert and read back the stored record
    async fn upsert(
        &self,
        request: RequestBuilder,
        sent_updated_at: DateTime<Utc>,
    ) -> Result<UpsertResponse, RemoteError> {
        let (status, body) = self.send_raw(request).await?;

        let reply = if body.trim().is_empty() {
            UpsertReply::default()
        } else {
            serde_json::from_str::<UpsertReply>(&body)
                .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?
        };

        Ok(reply.into_response(status == StatusCode::CREATED, sent_updated_at))
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn upsert_round(&self, round: RemoteRound) -> Result<UpsertResponse, RemoteError> {
        let url = self.endpoint(&["rounds", "client", &round.client_id]);
        debug!("PUT {}", url);
        let sent = round.updated_at;
        self.upsert(self.client.put(url).json(&round), sent).await
    }

    async fn upsert_settings(
        &self,
        settings: RemoteSettings,
    ) -> Result<UpsertResponse, RemoteError> {
        let url = self.endpoint(&["settings"]);
        debug!("PUT {}", url);
        let sent = settings.updated_at;
        self.upsert(self.client.put(url).json(&settings), sent).await
    }

    async fn status(&self) -> Result<RemoteStatus, RemoteError> {
        let url = self.endpoint(&["health"]);
        debug!("GET {}", url);
        self.send(self.client.get(url)).await
    }
}
