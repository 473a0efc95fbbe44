//! HTTP response wrapper.

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::{ClientError, Result};

/// A completed API response with its body fully buffered.
///
/// The body is read once off the wire and kept in memory, so logging it,
/// mapping it into an error, and decoding it never compete for a stream.
#[derive(Debug, Clone)]
pub struct Response {
    method: Method,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    url: url::Url,
}

impl Response {
    /// Buffer a reqwest response to a request for `url`.
    ///
    /// `url` is the URL that was sent, not where redirects ended up.
    pub(crate) async fn from_reqwest(
        method: Method,
        url: url::Url,
        response: reqwest::Response,
    ) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Self {
            method,
            status,
            headers,
            body,
            url,
        })
    }

    /// Build a response from parts.
    pub fn from_parts(
        method: Method,
        url: url::Url,
        status: StatusCode,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            method,
            status,
            headers,
            body: body.into(),
            url,
        }
    }

    /// Method of the request that produced this response.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Check if the response was successful (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if the server rejected the request's credentials (401 or 403).
    pub fn is_authentication_failure(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED || self.status == StatusCode::FORBIDDEN
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// URL of the request that produced this response.
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Get the response body as bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Consume the response and return the body as bytes.
    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| ClientError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(ClientError::Decode)
    }

    /// Get the content type if available.
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE)
    }

    /// Whether the body is gzip-encoded.
    pub fn is_gzipped(&self) -> bool {
        self.header(http::header::CONTENT_ENCODING)
            .is_some_and(|encoding| encoding.contains("gzip"))
    }

    /// Swap in a decoded body, dropping the headers that described the old one.
    pub(crate) fn replace_decoded_body(&mut self, body: Bytes) {
        self.headers.remove(http::header::CONTENT_ENCODING);
        self.headers.remove(http::header::CONTENT_LENGTH);
        self.body = body;
    }
}
