//! HTTP client for probing and downloading remote sources

use reqwest::header::{
    ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, ETAG, HeaderMap, IF_RANGE, LAST_MODIFIED, RANGE,
};
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::RequestFailed(e.to_string())
        }
    }
}

impl HttpError {
    pub fn from_status(status: StatusCode) -> Self {
        HttpError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HttpError>;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    /// Idle time allowed between two reads of a response body
    pub read_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            user_agent: concat!("filefetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// What a capability probe learned about a remote source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMeta {
    pub content_length: u64,
    pub validator: Option<String>,
}

/// Parse a source identifier as an `http(s)` URL
pub fn remote_url(source: &str) -> Option<Url> {
    let url = Url::parse(source).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Parsed `Content-Range: bytes start-end/total` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: u64,
    pub end: u64,
    pub total: Option<u64>,
}

impl ContentRange {
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.trim().strip_prefix("bytes")?.trim_start();
        let (range, total) = rest.split_once('/')?;
        let (start, end) = range.split_once('-')?;
        let start = start.trim().parse().ok()?;
        let end = end.trim().parse().ok()?;
        let total = match total.trim() {
            "*" => None,
            t => Some(t.parse().ok()?),
        };
        (start <= end).then_some(Self { start, end, total })
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
    }
}

/// Thin reqwest wrapper shared by the remote processors
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Check whether `url` reports a length and honours byte ranges
    ///
    /// A HEAD request is tried first. Servers that do not advertise
    /// `Accept-Ranges` get a one-byte ranged GET instead.
    pub async fn probe(&self, url: &Url) -> Option<RemoteMeta> {
        match self.probe_head(url).await {
            Ok(Some(meta)) => return Some(meta),
            Ok(None) => debug!(%url, "HEAD probe found no range support"),
            Err(e) => debug!(%url, error = %e, "HEAD probe failed"),
        }

        match self.probe_range(url).await {
            Ok(meta) => meta,
            Err(e) => {
                debug!(%url, error = %e, "Range probe failed");
                None
            }
        }
    }

    async fn probe_head(&self, url: &Url) -> Result<Option<RemoteMeta>> {
        let response = self.client.head(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(HttpError::from_status(response.status()));
        }

        let headers = response.headers();
        let accepts_bytes = headers
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.split(',').any(|unit| unit.trim().eq_ignore_ascii_case("bytes")));
        // Response::content_length reflects the (empty) HEAD body, not the header
        let length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|len| *len > 0);

        Ok(match (accepts_bytes, length) {
            (true, Some(content_length)) => Some(RemoteMeta {
                content_length,
                validator: validator(headers),
            }),
            _ => None,
        })
    }

    async fn probe_range(&self, url: &Url) -> Result<Option<RemoteMeta>> {
        let response = self
            .client
            .get(url.clone())
            .header(RANGE, "bytes=0-0")
            .send()
            .await?;

        if response.status() != StatusCode::PARTIAL_CONTENT {
            debug!(%url, status = response.status().as_u16(), "Range probe not honoured");
            return Ok(None);
        }

        let meta = ContentRange::from_headers(response.headers())
            .and_then(|range| range.total)
            .filter(|total| *total > 0)
            .map(|content_length| RemoteMeta {
                content_length,
                validator: validator(response.headers()),
            });
        Ok(meta)
    }

    /// GET `url` from byte `offset` onward
    ///
    /// With a validator the request carries `If-Range`, so a changed entity
    /// comes back as a full `200` instead of a mismatched slice.
    pub async fn get_range(
        &self,
        url: &Url,
        offset: u64,
        validator: Option<&str>,
    ) -> Result<Response> {
        debug!(%url, offset, "Requesting byte range");

        let mut request = self
            .client
            .get(url.clone())
            .header(RANGE, format!("bytes={}-", offset));
        if let Some(validator) = validator {
            request = request.header(IF_RANGE, validator);
        }

        Ok(request.send().await?)
    }

    /// Plain GET, failing on non-success status
    pub async fn get(&self, url: &Url) -> Result<Response> {
        debug!(%url, "Requesting full body");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::from_status(status));
        }
        Ok(response)
    }
}

/// Strong ETag, or Last-Modified when no usable ETag exists
fn validator(headers: &HeaderMap) -> Option<String> {
    let etag = headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.starts_with("W/"));
    etag.or_else(|| headers.get(LAST_MODIFIED).and_then(|v| v.to_str().ok()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert!(config.user_agent.starts_with("filefetch/"));
    }

    #[test]
    fn test_remote_url_accepts_http_only() {
        assert!(remote_url("http://example.com/a.csv").is_some());
        assert!(remote_url("https://example.com/a.csv").is_some());
        assert!(remote_url("ftp://example.com/a.csv").is_none());
        assert!(remote_url("/var/data/a.csv").is_none());
        assert!(remote_url("file:///var/data/a.csv").is_none());
    }

    #[test]
    fn test_content_range_parsing() {
        assert_eq!(
            ContentRange::parse("bytes 0-0/2853"),
            Some(ContentRange { start: 0, end: 0, total: Some(2853) })
        );
        assert_eq!(
            ContentRange::parse("bytes 100-199/*"),
            Some(ContentRange { start: 100, end: 199, total: None })
        );
        assert_eq!(ContentRange::parse("bytes */2853"), None);
        assert_eq!(ContentRange::parse("items 0-1/2"), None);
        assert_eq!(ContentRange::parse("bytes 9-1/20"), None);
    }

    #[test]
    fn test_validator_prefers_strong_etag() {
        let mut headers = HeaderMap::new();
        headers.insert(LAST_MODIFIED, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(
            validator(&headers).as_deref(),
            Some("Wed, 21 Oct 2015 07:28:00 GMT")
        );

        headers.insert(ETAG, HeaderValue::from_static("W/\"weak\""));
        assert_eq!(
            validator(&headers).as_deref(),
            Some("Wed, 21 Oct 2015 07:28:00 GMT")
        );

        headers.insert(ETAG, HeaderValue::from_static("\"strong\""));
        assert_eq!(validator(&headers).as_deref(), Some("\"strong\""));
    }
}
