//! Request construction.

use http::header::{ACCEPT, ACCEPT_ENCODING, CONTENT_TYPE, USER_AGENT};
use http::{HeaderValue, Method};
use reqwest::{Body, Request};
use serde::Serialize;

use crate::{Client, ClientError, Result};

const MEDIA_TYPE_JSON: &str = "application/json";
const COMPRESSED_ENCODINGS: &str = "gzip";

impl Client {
    /// Build a request without a body for `path`, relative to the base URL.
    ///
    /// `path` should not start with `/`, or it replaces the base URL's path.
    pub fn new_request(&self, method: Method, path: &str) -> Result<Request> {
        self.build_request(method, path, None)
    }

    /// Build a request whose body is `body` encoded as JSON.
    ///
    /// `<`, `>` and `&` in string fields are sent verbatim.
    pub fn new_json_request<B>(&self, method: Method, path: &str, body: &B) -> Result<Request>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body).map_err(ClientError::Encode)?;
        self.build_request(method, path, Some(body))
    }

    fn build_request(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<Request> {
        // Checked per request since the base URL can be swapped after construction.
        let base_url = &self.config().base_url;
        if !base_url.path().ends_with('/') {
            return Err(ClientError::Config(format!(
                "base URL must have a trailing slash, but {base_url} does not"
            )));
        }
        let url = base_url.join(path)?;

        let mut request = Request::new(method, url);
        let has_body = body.is_some();
        if let Some(body) = body {
            *request.body_mut() = Some(Body::from(body));
        }

        let headers = request.headers_mut();
        if has_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE_JSON));
        }
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE_JSON));
        let user_agent = &self.config().user_agent;
        if !user_agent.is_empty() {
            let value = HeaderValue::from_str(user_agent)
                .map_err(|e| ClientError::Config(format!("invalid user agent: {e}")))?;
            headers.insert(USER_AGENT, value);
        }
        if self.config().response_compression {
            headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(COMPRESSED_ENCODINGS));
        }

        Ok(request)
    }
}
