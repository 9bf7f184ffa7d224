use crate::config::{ClientConfig, TimeoutTier};
use planor_core::{PlanorError, PlanorResult};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// A successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    /// The response declared a JSON content type.
    Json(serde_json::Value),
    /// Anything else, returned verbatim.
    Text(String),
}

/// HTTP client for the backend API.
///
/// Owns the connection pool and the timeout tier configuration. All
/// non-streaming calls go through [`request`]; the streaming generation
/// call is initiated here too ([`open_stream`]) and then driven by
/// [`StreamTransport`](crate::transport::StreamTransport).
///
/// [`request`]: RequestClient::request
/// [`open_stream`]: RequestClient::open_stream
pub struct RequestClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl RequestClient {
    /// Creates a client for the backend at `config.base_url`.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Sends `method path` with an optional JSON body under the given
    /// timeout tier.
    ///
    /// Non-2xx responses are normalized into
    /// [`PlanorError::Api`]: the JSON body's `detail`, `message` or
    /// `error` field (in that order) becomes the message, with the raw
    /// text as fallback. A tier timeout surfaces as
    /// [`PlanorError::Timeout`], distinguishable from other network
    /// failures. Success bodies come back parsed when the response
    /// declares JSON, verbatim otherwise.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        tier: TimeoutTier,
    ) -> PlanorResult<ApiBody> {
        let timeout = self.config.timeout(tier);
        let mut req = self
            .http
            .request(method.clone(), self.url(path))
            .timeout(timeout);
        if let Some(body) = body {
            req = req.json(body);
        }

        debug!(%method, %path, ?tier, "Sending request");
        let resp = req.send().await.map_err(|e| classify(e, timeout))?;
        let status = resp.status();
        let declared_json = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);
        let text = resp.text().await.map_err(|e| classify(e, timeout))?;

        if !status.is_success() {
            debug!(%method, %path, status = status.as_u16(), "Request failed");
            return Err(normalize_error(status.as_u16(), &text));
        }

        if declared_json {
            Ok(ApiBody::Json(serde_json::from_str(&text)?))
        } else {
            Ok(ApiBody::Text(text))
        }
    }

    /// GET returning a deserialized JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        tier: TimeoutTier,
    ) -> PlanorResult<T> {
        let body = self.request(Method::GET, path, None, tier).await?;
        deserialize_body(body)
    }

    /// POST with a JSON body, returning a deserialized JSON body.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
        tier: TimeoutTier,
    ) -> PlanorResult<T> {
        let body = serde_json::to_value(body)?;
        let resp = self.request(Method::POST, path, Some(&body), tier).await?;
        deserialize_body(resp)
    }

    /// PUT with a JSON body, returning a deserialized JSON body.
    pub async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
        tier: TimeoutTier,
    ) -> PlanorResult<T> {
        let body = serde_json::to_value(body)?;
        let resp = self.request(Method::PUT, path, Some(&body), tier).await?;
        deserialize_body(resp)
    }

    /// DELETE, discarding the acknowledgement body.
    pub async fn delete(&self, path: &str, tier: TimeoutTier) -> PlanorResult<()> {
        self.request(Method::DELETE, path, None, tier).await?;
        Ok(())
    }

    /// Opens a streaming POST with `Accept: text/event-stream`.
    ///
    /// Returns the raw response for the transport layer to drive. A
    /// non-success status is already a terminal error here, before any
    /// streaming begins. No whole-body timeout is applied — the
    /// transport arms its own streaming deadline.
    pub async fn open_stream(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> PlanorResult<reqwest::Response> {
        let resp = self
            .http
            .post(self.url(path))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(body)
            .send()
            .await
            .map_err(|e| classify(e, self.config.timeout(TimeoutTier::Streaming)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(normalize_error(status.as_u16(), &text));
        }
        Ok(resp)
    }
}

fn deserialize_body<T: DeserializeOwned>(body: ApiBody) -> PlanorResult<T> {
    match body {
        ApiBody::Json(value) => Ok(serde_json::from_value(value)?),
        ApiBody::Text(text) => Ok(serde_json::from_str(&text)?),
    }
}

/// Maps a reqwest failure to the client taxonomy: tier timeouts are
/// their own class, everything else is a plain transport failure.
fn classify(e: reqwest::Error, timeout: Duration) -> PlanorError {
    if e.is_timeout() {
        PlanorError::Timeout(timeout)
    } else {
        PlanorError::Http(e.to_string())
    }
}

/// Normalizes a non-2xx response body.
fn normalize_error(status: u16, body: &str) -> PlanorError {
    let details: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = details
        .as_ref()
        .and_then(|v| {
            ["detail", "message", "error"]
                .iter()
                .find_map(|key| v.get(key).and_then(serde_json::Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());
    PlanorError::Api {
        status,
        message,
        details,
    }
}
