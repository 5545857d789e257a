use anyhow::Context;
use async_trait::async_trait;
use futures::TryStreamExt;
use lambda_runtime::tracing::{debug, info};
use reqwest::Client;
use std::io;

use super::ServingCollaborator;
use crate::models::error::AdapterError;
use crate::models::request::CanonicalRequest;
use crate::models::response::CanonicalResponse;

/// Default address of the application the proxy forwards to.
pub const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:8080";

/// Serving collaborator that forwards canonical requests to an HTTP server,
/// usually the application listening on loopback inside the same sandbox.
pub struct ProxyCollaborator {
    client: Client,
    base_url: String,
}

impl ProxyCollaborator {
    /// Creates a proxy for `base_url`.
    ///
    /// Transparent decompression is switched off so `content-encoding` reaches
    /// the response shaper untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, AdapterError> {
        let client = Client::builder()
            .no_gzip()
            .no_brotli()
            .no_zstd()
            .no_deflate()
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Reads the upstream address from `LAMBDA_ADAPTER_UPSTREAM_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, AdapterError> {
        let base_url = std::env::var("LAMBDA_ADAPTER_UPSTREAM_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string());
        info!(upstream = %base_url, "Forwarding requests to upstream");
        Self::new(base_url)
    }

    fn build(&self, request: CanonicalRequest) -> anyhow::Result<reqwest::RequestBuilder> {
        let method = request.method.as_deref().unwrap_or("GET");
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .with_context(|| format!("Invalid HTTP method '{method}'"))?;

        let url = format!("{}{}", self.base_url, request.url);
        let query: Vec<(&str, &str)> = request
            .query
            .iter()
            .flat_map(|(key, value)| value.values().into_iter().map(move |v| (key.as_str(), v)))
            .collect();

        let mut builder = self.client.request(method, &url).query(&query);
        for (name, value) in &request.headers {
            // Length is recomputed from the body actually sent.
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            for v in value.values() {
                builder = builder.header(name.as_str(), v);
            }
        }
        if let Some(address) = request.remote_address.as_deref()
            && request.header("x-forwarded-for").is_none()
        {
            builder = builder.header("x-forwarded-for", address);
        }
        if let Some(payload) = request.payload {
            builder = builder.body(payload);
        }
        Ok(builder)
    }
}

#[async_trait]
impl ServingCollaborator for ProxyCollaborator {
    async fn serve(&self, request: CanonicalRequest) -> anyhow::Result<CanonicalResponse> {
        let stream_body = request.payload_as_stream;
        debug!(method = ?request.method, url = %request.url, "Forwarding request upstream");

        let response = self
            .build(request)?
            .send()
            .await
            .context("Failed to send request to upstream")?;

        let mut canonical = CanonicalResponse::new(response.status().as_u16());
        for (name, value) in response.headers() {
            canonical.append_header(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }

        if stream_body {
            let stream = response.bytes_stream().map_err(io::Error::other);
            return Ok(canonical.with_stream(Box::pin(stream)));
        }

        let body = response
            .bytes()
            .await
            .context("Failed to read upstream response body")?;
        Ok(canonical.with_body(body))
    }
}
