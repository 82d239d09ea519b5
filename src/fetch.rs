//! Network access for the engine
//!
//! The engine never talks to the network directly; it goes through a
//! [`Fetcher`]. [`HttpFetcher`] is the real implementation (ureq on the
//! blocking pool). A non-2xx status is still `Ok`: only transport failures
//! are errors, and each strategy applies the success predicate itself.

use crate::config::schema::NetworkConfig;
use crate::error::{SwError, SwResult};
use crate::http::{Method, Request, Response};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Abstract network interface
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request against the network
    async fn fetch(&self, request: &Request) -> SwResult<Response>;
}

/// HTTP fetcher backed by a shared ureq agent
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl HttpFetcher {
    /// Create a fetcher from network settings
    pub fn new(settings: &NetworkConfig) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(settings.timeout_secs.map(Duration::from_secs))
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            max_body_bytes: settings.max_body_bytes,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> SwResult<Response> {
        let agent = self.agent.clone();
        let request = request.clone();
        let limit = self.max_body_bytes;

        tokio::task::spawn_blocking(move || blocking_fetch(&agent, &request, limit))
            .await
            .map_err(|e| SwError::Internal(format!("fetch task failed: {}", e)))?
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn blocking_fetch(agent: &ureq::Agent, request: &Request, limit: u64) -> SwResult<Response> {
    let url = request.url.as_str();
    let headers = &request.headers;
    let body = request.body.as_slice();

    debug!("{} {}", request.method, url);

    let result = match request.method {
        Method::Get => with_headers(agent.get(url), headers).call(),
        Method::Head => with_headers(agent.head(url), headers).call(),
        Method::Delete => with_headers(agent.delete(url), headers).call(),
        Method::Options => with_headers(agent.options(url), headers).call(),
        Method::Post => with_headers(agent.post(url), headers).send(body),
        Method::Put => with_headers(agent.put(url), headers).send(body),
        Method::Patch => with_headers(agent.patch(url), headers).send(body),
    };

    let mut response = result.map_err(|e| SwError::network(url, e.to_string()))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .with_config()
        .limit(limit)
        .read_to_vec()
        .map_err(|e| SwError::network(url, format!("reading body: {}", e)))?;

    debug!("{} {} -> {} ({} bytes)", request.method, url, status, body.len());
    Ok(Response::new(status, headers, body))
}
