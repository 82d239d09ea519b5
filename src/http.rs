//! Request and response values passed through the engine
//!
//! Responses are plain owned values: "cloning" a response before storing it
//! is an ordinary `Clone`, and a stored response never aliases the one handed
//! back to the caller.

use crate::error::{SwError, SwResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Status of the synthesized response returned when neither network nor cache
/// can answer.
pub const NETWORK_ERROR_STATUS: u16 = 408;

/// Body of the synthesized network error response
pub const NETWORK_ERROR_BODY: &str = "Network error happened";

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            other => Err(format!("unsupported method '{other}'")),
        }
    }
}

/// Declared resource type of a request (what the caller intends to use it for)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// No declared destination (plain `fetch()` calls)
    #[default]
    Empty,
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    Worker,
    Audio,
    Video,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "",
            Self::Document => "document",
            Self::Script => "script",
            Self::Style => "style",
            Self::Image => "image",
            Self::Font => "font",
            Self::Manifest => "manifest",
            Self::Worker => "worker",
            Self::Audio => "audio",
            Self::Video => "video",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Destination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "empty" => Ok(Self::Empty),
            "document" => Ok(Self::Document),
            "script" => Ok(Self::Script),
            "style" => Ok(Self::Style),
            "image" => Ok(Self::Image),
            "font" => Ok(Self::Font),
            "manifest" => Ok(Self::Manifest),
            "worker" => Ok(Self::Worker),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            other => Err(format!("unknown destination '{other}'")),
        }
    }
}

/// Parse an absolute URL and drop its fragment, which never reaches the network
pub fn normalize_url(raw: &str) -> SwResult<Url> {
    let mut url = Url::parse(raw).map_err(|e| SwError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    url.set_fragment(None);
    Ok(url)
}

/// Resolve a possibly-relative URL against `base` and normalize it
pub fn resolve_url(base: &Url, raw: &str) -> SwResult<Url> {
    let mut url = base.join(raw).map_err(|e| SwError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    url.set_fragment(None);
    Ok(url)
}

/// An outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Build a request for an already-parsed URL
    pub fn new(method: Method, url: Url) -> Self {
        let mut url = url;
        url.set_fragment(None);
        Self {
            method,
            url,
            destination: Destination::Empty,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Build a GET request from an absolute URL string
    pub fn get(url: &str) -> SwResult<Self> {
        Ok(Self::new(Method::Get, normalize_url(url)?))
    }

    /// Set the declared destination
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Set the request body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Normalized cache key: method and fragment-less URL
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// A captured response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// The response every strategy falls back to when it has nothing to serve.
    ///
    /// Callers must treat it as a failure sentinel, not as content.
    pub fn network_error() -> Self {
        Self::new(
            NETWORK_ERROR_STATUS,
            vec![("Content-Type".to_string(), "text/plain".to_string())],
            NETWORK_ERROR_BODY,
        )
    }

    /// Success predicate shared by every strategy and by bulk-add: 2xx
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// First header value with the given name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as UTF-8 text, lossily
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
