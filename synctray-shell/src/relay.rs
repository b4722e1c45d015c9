use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

/// One-shot request/response bridge between the popup UI and the
/// backend's config endpoint. Both operations are stateless.
#[derive(Debug, Clone)]
pub struct ConfigRelayChannel {
    http: reqwest::Client,
    base_url: Url,
}

impl ConfigRelayChannel {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Forward `GET /api/config` and stream the raw response back to the
    /// caller chunk by chunk. Chunk boundaries are not preserved in any
    /// guaranteed way; the caller reassembles and parses one JSON
    /// document once the channel closes.
    ///
    /// On any failure nothing is sent — the caller owns the request
    /// timeout.
    pub async fn fetch_config(&self, reply: mpsc::UnboundedSender<Bytes>) {
        let endpoint = match self.base_url.join("api/config") {
            Ok(url) => url,
            Err(err) => {
                warn!("cannot build config endpoint from base url: {err}");
                return;
            }
        };

        let response = match self.http.get(endpoint).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "config fetch refused");
                return;
            }
            Err(err) => {
                warn!("config fetch failed: {err}");
                return;
            }
        };

        let mut body = response.bytes_stream();
        while let Some(next) = body.next().await {
            let chunk = match next {
                Ok(chunk) => chunk,
                Err(err) => {
                    warn!("config fetch aborted mid-body: {err}");
                    return;
                }
            };
            if reply.send(chunk).is_err() {
                debug!("config reply receiver dropped");
                return;
            }
        }
    }

    /// Fire-and-forget forward of a UI config mutation. The payload is
    /// opaque to the shell; no acknowledgment is awaited.
    pub async fn push_config_change(&self, payload: Bytes) {
        let endpoint = match self.base_url.join("api/config") {
            Ok(url) => url,
            Err(err) => {
                warn!("cannot build config endpoint from base url: {err}");
                return;
            }
        };

        match self
            .http
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
        {
            Ok(response) => debug!(status = %response.status(), "config change forwarded"),
            Err(err) => warn!("config change forward failed: {err}"),
        }
    }
}
