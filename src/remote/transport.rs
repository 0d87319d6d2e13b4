use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue};

use crate::error::{Error, Result};

/// What a `Transport` hands back for a completed request.
#[derive(Clone, Debug, Default)]
pub struct Response {
    pub status: u16,

    /// Header names are stored lowercase.
    pub headers: HashMap<String, String>,

    pub body: Vec<u8>,
}

impl Response {
    /// Look up a header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A blocking GET. Implementations report failures to obtain any response
/// at all as `Error::Transport`; non-success statuses are returned as
/// ordinary responses.
pub trait Transport {
    fn get(&self, url: &str, timeout: Duration) -> Result<Response>;
}

/// `Transport` backed by a `reqwest` blocking client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a client, optionally authenticating every request with a
    /// GitLab-style `PRIVATE-TOKEN` header.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let mut value =
                HeaderValue::from_str(token).map_err(|e| Error::HttpClient(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert("private-token", value);
        }

        let client = Client::builder()
            .user_agent(concat!("treemirror/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, timeout: Duration) -> Result<Response> {
        let transport_err = |e: reqwest::Error| Error::Transport {
            url: url.to_string(),
            source: Box::new(e),
        };

        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(transport_err)?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let body = resp.bytes().map_err(transport_err)?.to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
