// Shared fixtures for the integration tests: an in-memory remote that speaks
// the tree/blob API, plus helpers to inspect a local object store.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use flate2::read::ZlibDecoder;
use sha1::{Digest, Sha1};
use url::Url;

use treemirror::remote::{RemoteOptions, RemoteTree, Response, RetryPolicy, Transport};
use treemirror::Result;

pub const BASE: &str = "https://gitlab.example.com/api/v4/projects/42/repository";

/// A file or directory in the fake remote's tree.
#[derive(Clone, Debug)]
pub enum Node {
    File { mode: &'static str, content: Vec<u8> },
    Dir(BTreeMap<String, Node>),
}

pub fn file(content: &[u8]) -> Node {
    Node::File {
        mode: "100644",
        content: content.to_vec(),
    }
}

pub fn executable(content: &[u8]) -> Node {
    Node::File {
        mode: "100755",
        content: content.to_vec(),
    }
}

pub fn dir(children: Vec<(&str, Node)>) -> Node {
    Node::Dir(
        children
            .into_iter()
            .map(|(name, node)| (name.to_string(), node))
            .collect(),
    )
}

/// SHA-1 of `"{kind} {len}\0" + content`, hex-encoded, computed without
/// going through the crate under test.
pub fn git_hash(kind: &str, content: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("{} {}\0", kind, content.len()).as_bytes());
    hasher.update(content);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

pub fn hex_to_bytes(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

#[derive(Clone, Debug)]
struct Listed {
    id: String,
    name: String,
    kind: &'static str,
    path: String,
    mode: &'static str,
}

/// An in-memory implementation of the remote API.
pub struct FakeRemote {
    per_page: usize,
    root_id: String,
    listings: HashMap<String, Vec<Listed>>,
    blobs: HashMap<String, Vec<u8>>,
    failures: RefCell<HashMap<String, (u16, usize)>>,
    requests: RefCell<Vec<String>>,
}

impl FakeRemote {
    /// Serve `root` (which must be a `Node::Dir`), `per_page` entries per page.
    /// Listings are returned in reverse name order so the client can't rely
    /// on the server sorting for it.
    pub fn new(root: &Node, per_page: usize) -> FakeRemote {
        let mut remote = FakeRemote {
            per_page,
            root_id: String::new(),
            listings: HashMap::new(),
            blobs: HashMap::new(),
            failures: RefCell::new(HashMap::new()),
            requests: RefCell::new(Vec::new()),
        };

        remote.root_id = remote.add_dir(root, "/");
        remote
    }

    fn add_dir(&mut self, node: &Node, path: &str) -> String {
        let children = match node {
            Node::Dir(children) => children,
            Node::File { .. } => panic!("{} is not a directory", path),
        };

        let mut listed = Vec::new();
        for (name, child) in children {
            let child_path = if path == "/" {
                name.clone()
            } else {
                format!("{}/{}", path, name)
            };

            let entry = match child {
                Node::File { mode, content } => {
                    let id = git_hash("blob", content);
                    self.blobs.insert(id.clone(), content.clone());
                    Listed {
                        id,
                        name: name.clone(),
                        kind: "blob",
                        path: child_path,
                        mode: *mode,
                    }
                }
                Node::Dir(_) => Listed {
                    id: self.add_dir(child, &child_path),
                    name: name.clone(),
                    kind: "tree",
                    path: child_path,
                    mode: "040000",
                },
            };
            listed.push(entry);
        }

        let id = git_hash("tree", &encode_tree(&listed));
        listed.reverse();
        self.listings.insert(path.to_string(), listed);
        id
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Serve `content` instead of the real bytes for the blob at `path`.
    pub fn corrupt_blob(&mut self, path: &str, content: &[u8]) {
        let id = self
            .listings
            .values()
            .flatten()
            .find(|e| e.path == path)
            .map(|e| e.id.clone())
            .unwrap();
        self.blobs.insert(id, content.to_vec());
    }

    /// Answer the next `count` listing requests for `path` with `status`.
    pub fn fail_listing(&self, path: &str, status: u16, count: usize) {
        self.failures
            .borrow_mut()
            .insert(path.to_string(), (status, count));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn blob_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|u| u.contains("/blobs/"))
            .count()
    }

    fn list(&self, url: &Url) -> Response {
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let path = &query["path"];
        assert_eq!(query["per_page"], "100");
        assert_eq!(query["ref"], "main");

        if let Some((status, count)) = self.failures.borrow_mut().get_mut(path) {
            if *count > 0 {
                *count -= 1;
                return status_only(*status);
            }
        }

        let listed = match self.listings.get(path) {
            Some(listed) => listed,
            None => return status_only(404),
        };

        let page: usize = query["page"].parse().unwrap();
        let start = (page - 1) * self.per_page;
        let end = (start + self.per_page).min(listed.len());

        let entries: Vec<String> = listed[start.min(end)..end]
            .iter()
            .map(|e| {
                format!(
                    r#"{{"id":"{}","name":"{}","type":"{}","path":"{}","mode":"{}"}}"#,
                    e.id, e.name, e.kind, e.path, e.mode
                )
            })
            .collect();

        let next = if end < listed.len() {
            (page + 1).to_string()
        } else {
            String::new()
        };

        let mut headers = HashMap::new();
        headers.insert("x-next-page".to_string(), next);

        Response {
            status: 200,
            headers,
            body: format!("[{}]", entries.join(",")).into_bytes(),
        }
    }
}

impl Transport for FakeRemote {
    fn get(&self, url: &str, _timeout: Duration) -> Result<Response> {
        self.requests.borrow_mut().push(url.to_string());

        let rest = url.strip_prefix(BASE).unwrap();
        if rest.starts_with("/tree?") {
            return Ok(self.list(&Url::parse(url).unwrap()));
        }

        let id = rest
            .strip_prefix("/blobs/")
            .and_then(|r| r.strip_suffix("/raw"))
            .unwrap();

        Ok(match self.blobs.get(id) {
            Some(content) => Response {
                status: 200,
                headers: HashMap::new(),
                body: content.clone(),
            },
            None => status_only(404),
        })
    }
}

fn status_only(status: u16) -> Response {
    Response {
        status,
        ..Response::default()
    }
}

fn encode_tree(listed: &[Listed]) -> Vec<u8> {
    let mut sorted: Vec<&Listed> = listed.iter().collect();
    sorted.sort_by_key(|e| {
        if e.kind == "tree" {
            format!("{}/", e.name)
        } else {
            e.name.clone()
        }
    });

    let mut out = Vec::new();
    for e in sorted {
        out.extend_from_slice(e.mode.trim_start_matches('0').as_bytes());
        out.push(b' ');
        out.extend_from_slice(e.name.as_bytes());
        out.push(0);
        out.extend_from_slice(&hex_to_bytes(&e.id));
    }
    out
}

pub fn remote_tree(fake: FakeRemote) -> RemoteTree<FakeRemote> {
    let options = RemoteOptions {
        retry: RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_millis(0),
        },
        ..RemoteOptions::default()
    };

    RemoteTree::new(fake, BASE, options).unwrap()
}

/// Inflate the loose object `id` from the repository at `work_dir`.
pub fn read_object(work_dir: &Path, id: &str) -> Vec<u8> {
    let path = work_dir
        .join(".git/objects")
        .join(&id[..2])
        .join(&id[2..]);
    let mut framed = Vec::new();
    ZlibDecoder::new(fs::File::open(path).unwrap())
        .read_to_end(&mut framed)
        .unwrap();
    framed
}

/// Split the framed tree object `id` into `(mode, name, id)` records.
pub fn read_tree(work_dir: &Path, id: &str) -> Vec<(String, String, String)> {
    let framed = read_object(work_dir, id);
    let nul = framed.iter().position(|b| *b == 0).unwrap();
    assert!(framed.starts_with(b"tree "));

    let mut rest = &framed[nul + 1..];
    let mut records = Vec::new();
    while !rest.is_empty() {
        let space = rest.iter().position(|b| *b == b' ').unwrap();
        let nul = rest.iter().position(|b| *b == 0).unwrap();
        let mode = String::from_utf8(rest[..space].to_vec()).unwrap();
        let name = String::from_utf8(rest[space + 1..nul].to_vec()).unwrap();
        let id: String = rest[nul + 1..nul + 21]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        records.push((mode, name, id));
        rest = &rest[nul + 21..];
    }
    records
}

/// Number of loose objects in the repository at `work_dir`.
pub fn object_count(work_dir: &Path) -> usize {
    fs::read_dir(work_dir.join(".git/objects"))
        .unwrap()
        .map(|d| d.unwrap().path())
        .filter(|p| p.file_name().unwrap().len() == 2)
        .map(|p| fs::read_dir(p).unwrap().count())
        .sum()
}
