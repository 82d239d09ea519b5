//! On-disk format of a single cache entry
//!
//! Each entry is two files named after a hash of its request key:
//! `<id>.json` (metadata) and `<id>.body` (raw body). The metadata records a
//! digest of the body so a body/metadata pair from two different puts is
//! detected instead of served.

use crate::http::{Method, Request, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata stored next to each body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMeta {
    /// Normalized request key (`METHOD URL`)
    pub key: String,
    pub method: Method,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body_len: u64,
    /// SHA256 of the body, hex
    pub body_sha256: String,
    pub stored_at: DateTime<Utc>,
}

impl EntryMeta {
    /// Capture metadata for a request/response pair
    pub fn new(request: &Request, response: &Response) -> Self {
        Self {
            key: request.cache_key(),
            method: request.method,
            url: request.url.to_string(),
            status: response.status,
            headers: response.headers.clone(),
            body_len: response.body.len() as u64,
            body_sha256: body_digest(&response.body),
            stored_at: Utc::now(),
        }
    }

    /// Whether `body` is the body this metadata was written with
    pub fn matches_body(&self, body: &[u8]) -> bool {
        self.body_len == body.len() as u64 && self.body_sha256 == body_digest(body)
    }

    /// Rebuild the response from metadata and body
    pub fn into_response(self, body: Vec<u8>) -> Response {
        Response::new(self.status, self.headers, body)
    }
}

/// File stem for a request key: first 16 bytes of its SHA256, hex
pub fn entry_id(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..16])
}

/// Full SHA256 of a body, hex
pub fn body_digest(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_id_deterministic() {
        let a = entry_id("GET https://site.test/");
        let b = entry_id("GET https://site.test/");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_ne!(a, entry_id("GET https://site.test/index.html"));
    }

    #[test]
    fn meta_detects_foreign_body() {
        let request = Request::get("https://site.test/a.css").unwrap();
        let response = Response::new(200, vec![], "body { color: red }");
        let meta = EntryMeta::new(&request, &response);

        assert_eq!(meta.key, "GET https://site.test/a.css");
        assert!(meta.matches_body(b"body { color: red }"));
        assert!(!meta.matches_body(b"body { color: blue }"));
    }
}
