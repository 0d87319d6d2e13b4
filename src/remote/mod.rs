//! Client for the paginated repository tree API.
//!
//! Two endpoints are used, both relative to the API base URL:
//!
//! * `GET {base}/tree?path=..&ref=..&page=..&per_page=100` returns a JSON
//!   array of entries. The `X-Next-Page` header carries the next page
//!   number, or is empty on the last page.
//! * `GET {base}/blobs/{id}/raw` returns the raw blob bytes.

use std::collections::VecDeque;
use std::time::Duration;

use log::debug;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::object::Id;

mod retry;
pub use retry::RetryPolicy;

mod transport;
pub use transport::{HttpTransport, Response, Transport};

/// Number of entries requested per listing page. Part of the protocol,
/// not a tuning knob.
pub const PER_PAGE: u32 = 100;

/// Header carrying the pagination cursor.
pub const NEXT_PAGE_HEADER: &str = "X-Next-Page";

/// One entry of a tree listing, as the remote reports it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RemoteEntry {
    /// Object ID in hex.
    pub id: String,

    pub name: String,

    /// `blob`, `tree` or `commit` (submodule).
    #[serde(rename = "type")]
    pub kind: String,

    /// Full path from the repository root.
    pub path: String,

    /// File mode as octal text, e.g. `100644`.
    pub mode: String,
}

impl RemoteEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

/// One page of a tree listing.
#[derive(Debug)]
pub struct Page {
    pub entries: VecDeque<RemoteEntry>,

    /// Cursor for the following page; `None` once the listing is exhausted.
    pub next_page: Option<String>,
}

/// Timeouts and retry behaviour for the remote API.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RemoteOptions {
    pub list_timeout: Duration,
    pub blob_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        RemoteOptions {
            list_timeout: Duration::from_secs(15),
            blob_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

/// Typed access to the tree and blob endpoints of one remote repository.
pub struct RemoteTree<T: Transport> {
    transport: T,
    base: String,
    options: RemoteOptions,
}

impl<T: Transport> RemoteTree<T> {
    /// `api_base` is the repository API root, e.g.
    /// `https://gitlab.com/api/v4/projects/278964/repository`.
    pub fn new(transport: T, api_base: &str, options: RemoteOptions) -> Result<Self> {
        let base = api_base.trim_end_matches('/').to_string();
        Url::parse(&base)?;

        Ok(RemoteTree {
            transport,
            base,
            options,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn options(&self) -> &RemoteOptions {
        &self.options
    }

    /// URL of one page of the listing for `path` at `reference`.
    pub fn tree_url(&self, path: &str, reference: &str, page: &str) -> Result<String> {
        let per_page = PER_PAGE.to_string();
        let url = Url::parse_with_params(
            &format!("{}/tree", self.base),
            &[
                ("path", path),
                ("ref", reference),
                ("page", page),
                ("per_page", per_page.as_str()),
            ],
        )?;

        Ok(url.to_string())
    }

    /// URL of the raw content of the blob `id`.
    pub fn blob_url(&self, id: &Id) -> String {
        format!("{}/blobs/{}/raw", self.base, id)
    }

    /// Fetch one page of the listing for `path` at `reference`.
    pub fn list_page(&self, path: &str, reference: &str, page: &str) -> Result<Page> {
        let url = self.tree_url(path, reference, page)?;
        debug!("listing {} page {}", path, page);

        let resp = self.options.retry.run(&format!("listing {}", path), || {
            self.get_ok(&url, self.options.list_timeout)
        })?;

        let entries: VecDeque<RemoteEntry> =
            serde_json::from_slice(&resp.body).map_err(|source| Error::Json {
                url: url.clone(),
                source,
            })?;

        let cursor = resp
            .header(NEXT_PAGE_HEADER)
            .ok_or_else(|| Error::MissingPageCursor { url: url.clone() })?
            .trim();

        let next_page = if cursor.is_empty() {
            None
        } else {
            Some(cursor.to_string())
        };

        Ok(Page { entries, next_page })
    }

    /// Download the raw content of blob `id`.
    pub fn blob(&self, id: &Id) -> Result<Vec<u8>> {
        let url = self.blob_url(id);
        debug!("downloading blob {}", id);

        let resp = self.options.retry.run(&format!("blob {}", id), || {
            self.get_ok(&url, self.options.blob_timeout)
        })?;

        Ok(resp.body)
    }

    fn get_ok(&self, url: &str, timeout: Duration) -> Result<Response> {
        let resp = self.transport.get(url, timeout)?;
        if resp.is_success() {
            Ok(resp)
        } else {
            Err(Error::HttpStatus {
                url: url.to_string(),
                status: resp.status,
            })
        }
    }
}
