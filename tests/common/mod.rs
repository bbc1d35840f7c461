//! In-process HTTP server for integration tests
//!
//! Routes:
//! - `/files/{name}`: the ranged payload with byte-range support (HEAD
//!   advertises `Accept-Ranges`, a length and an ETag)
//! - `/cut/{name}`: like `/files`, but the first open-ended range request
//!   drops the connection after [`CUT_AT`] bytes
//! - `/stuck/{name}`: advertises ranges but always answers from byte 0
//! - `/flaky/{name}`: only the first HEAD advertises ranges
//! - `/plain/{name}`: a fixed 2853-byte body, `Range` ignored
//! - `/plain-later/{name}`: 503 for the first full GET, then the plain body
//! - `/plain-cut/{name}`: the plain body, cut off after [`CUT_AT`] bytes
//!
//! Anything else is a 404.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use futures_util::{StreamExt, stream};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;

pub const PLAIN_LEN: usize = 2853;
pub const CUT_AT: usize = 1000;

const ETAG_V1: &str = "\"payload-v1\"";
const ETAG_V2: &str = "\"payload-v2\"";

#[derive(Clone, Default)]
struct Flags {
    etag_changed: Arc<AtomicBool>,
    range_cut: Arc<AtomicBool>,
    flaky_heads: Arc<AtomicUsize>,
    plain_gets: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct Payloads {
    ranged: Bytes,
    plain: Bytes,
    flags: Flags,
}

impl Payloads {
    fn etag(&self) -> &'static str {
        if self.flags.etag_changed.load(Ordering::SeqCst) {
            ETAG_V2
        } else {
            ETAG_V1
        }
    }
}

pub struct MockServer {
    pub base_url: String,
    pub ranged: Bytes,
    pub plain: Bytes,
    flags: Flags,
}

impl MockServer {
    /// Start the server with a range-capable payload of `ranged_len` bytes
    pub async fn start(ranged_len: usize) -> Self {
        let payloads = Payloads {
            ranged: pattern(ranged_len),
            plain: pattern(PLAIN_LEN),
            flags: Flags::default(),
        };

        let app = Router::new()
            .route("/files/{name}", get(ranged_get).head(ranged_head))
            .route("/cut/{name}", get(cut_get).head(ranged_head))
            .route("/stuck/{name}", get(stuck_get).head(ranged_head))
            .route("/flaky/{name}", get(plain_get).head(flaky_head))
            .route("/plain/{name}", get(plain_get))
            .route("/plain-later/{name}", get(plain_later_get))
            .route("/plain-cut/{name}", get(plain_cut_get))
            .with_state(payloads.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            ranged: payloads.ranged,
            plain: payloads.plain,
            flags: payloads.flags,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn port(&self) -> u16 {
        self.base_url
            .rsplit(':')
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap()
    }

    /// Serve the ranged payload under a new ETag from now on
    pub fn change_etag(&self) {
        self.flags.etag_changed.store(true, Ordering::SeqCst);
    }
}

/// Deterministic, non-repeating-per-chunk test bytes
pub fn pattern(len: usize) -> Bytes {
    (0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>().into()
}

/// `part`, a pause so it reaches the client, then a broken connection
fn cut_body(part: Bytes) -> Body {
    let head = stream::once(async move { Ok::<Bytes, io::Error>(part) });
    let tail = stream::once(async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection dropped"))
    });
    Body::from_stream(head.chain(tail))
}

async fn ranged_head(State(payloads): State<Payloads>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCEPT_RANGES, "bytes".to_string()),
            (header::CONTENT_LENGTH, payloads.ranged.len().to_string()),
            (header::ETAG, payloads.etag().to_string()),
        ],
    )
}

async fn ranged_get(State(payloads): State<Payloads>, headers: HeaderMap) -> Response {
    serve_range(&payloads, &headers)
}

async fn cut_get(State(payloads): State<Payloads>, headers: HeaderMap) -> Response {
    let total = payloads.ranged.len();
    match requested_range(&headers, total) {
        Some(range) if range.open_ended && !payloads.flags.range_cut.swap(true, Ordering::SeqCst) => {
            let end = (range.start + CUT_AT).min(total);
            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::ETAG, payloads.etag())
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", range.start, range.end, total),
                )
                .header(header::CONTENT_LENGTH, range.end - range.start + 1)
                .body(cut_body(payloads.ranged.slice(range.start..end)))
                .unwrap()
        }
        _ => serve_range(&payloads, &headers),
    }
}

async fn stuck_get(State(payloads): State<Payloads>, headers: HeaderMap) -> Response {
    let total = payloads.ranged.len();
    if requested_range(&headers, total).is_none() {
        return serve_range(&payloads, &headers);
    }
    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::ETAG, payloads.etag())
        .header(header::CONTENT_RANGE, format!("bytes 0-{}/{}", total - 1, total))
        .header(header::CONTENT_LENGTH, total)
        .body(Body::from(payloads.ranged))
        .unwrap()
}

async fn flaky_head(State(payloads): State<Payloads>) -> Response {
    let first = payloads.flags.flaky_heads.fetch_add(1, Ordering::SeqCst) == 0;
    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_LENGTH, payloads.plain.len());
    if first {
        response = response.header(header::ACCEPT_RANGES, "bytes");
    }
    response.body(Body::empty()).unwrap()
}

async fn plain_get(State(payloads): State<Payloads>) -> impl IntoResponse {
    (StatusCode::OK, payloads.plain)
}

async fn plain_later_get(
    State(payloads): State<Payloads>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    // HEAD is routed here too; only plain GETs count
    let full_request = method == Method::GET && !headers.contains_key(header::RANGE);
    if full_request && payloads.flags.plain_gets.fetch_add(1, Ordering::SeqCst) == 0 {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    (StatusCode::OK, payloads.plain).into_response()
}

async fn plain_cut_get(State(payloads): State<Payloads>) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_LENGTH, payloads.plain.len())
        .body(cut_body(payloads.plain.slice(..CUT_AT)))
        .unwrap()
}

fn serve_range(payloads: &Payloads, headers: &HeaderMap) -> Response {
    let body = payloads.ranged.clone();
    let total = body.len();
    let etag = payloads.etag();

    let validator_matches = headers
        .get(header::IF_RANGE)
        .is_none_or(|v| v.as_bytes() == etag.as_bytes());

    match requested_range(headers, total) {
        Some(range) if validator_matches => Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::ACCEPT_RANGES, "bytes")
            .header(header::ETAG, etag)
            .header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", range.start, range.end, total),
            )
            .header(header::CONTENT_LENGTH, range.end - range.start + 1)
            .body(Body::from(body.slice(range.start..=range.end)))
            .unwrap(),
        _ => Response::builder()
            .status(StatusCode::OK)
            .header(header::ETAG, etag)
            .body(Body::from(body))
            .unwrap(),
    }
}

struct RequestedRange {
    start: usize,
    end: usize,
    open_ended: bool,
}

/// `Range: bytes=start-[end]`, clamped to the payload
fn requested_range(headers: &HeaderMap, total: usize) -> Option<RequestedRange> {
    let value = headers.get(header::RANGE)?.to_str().ok()?;
    let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
    let start: usize = start.trim().parse().ok()?;
    let last = total.checked_sub(1)?;
    let (end, open_ended) = match end.trim() {
        "" => (last, true),
        end => (end.parse::<usize>().ok()?.min(last), false),
    };
    (start <= end).then_some(RequestedRange {
        start,
        end,
        open_ended,
    })
}
