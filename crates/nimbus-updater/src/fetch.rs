//! Abortable HTTP fetch seam.
//!
//! The checker and the download task consume this trait rather than a
//! concrete HTTP client so tests can stream canned bytes without a network.
//! Cancellation is cooperative: a caller that stops polling (or drops) the
//! body stream at a chunk boundary aborts the transfer.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::header::{HeaderValue, USER_AGENT};

/// User agent string for update requests.
const USER_AGENT_VALUE: &str = concat!(
    "nimbus-launcher/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/nimbus-launcher/launcher)"
);

/// Byte-chunk stream of a response body.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// A streaming HTTP response.
pub struct FetchResponse {
    /// The HTTP status code.
    pub status: u16,

    /// Declared body length, if the server sent one.
    pub content_length: Option<u64>,

    /// The response body as a stream of chunks.
    pub body: ByteStream,
}

impl FetchResponse {
    /// Whether the status code indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Collects the whole body into memory.
    ///
    /// Only intended for small responses such as the version endpoint;
    /// artifact downloads stream chunk-by-chunk instead.
    pub async fn bytes(mut self) -> io::Result<Vec<u8>> {
        let mut buf = match self.content_length {
            Some(len) => Vec::with_capacity(len as usize),
            None => Vec::new(),
        };
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

/// HTTP fetch capability consumed by the update subsystem.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Issues a GET request and returns the streaming response.
    async fn fetch(&self, url: &str) -> io::Result<FetchResponse>;
}

/// Production fetcher backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a fresh HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> io::Result<FetchResponse> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE))
            .send()
            .await
            .map_err(io::Error::other)?;

        let status = response.status().as_u16();
        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other))
            .boxed();

        Ok(FetchResponse {
            status,
            content_length,
            body,
        })
    }
}
