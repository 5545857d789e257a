use async_trait::async_trait;
use std::future::Future;

use crate::models::request::CanonicalRequest;
use crate::models::response::CanonicalResponse;

pub mod client;

pub use client::ProxyCollaborator;

/// The HTTP-serving component the adapter submits requests to.
///
/// This trait abstracts the application behind the adapter so it can be an
/// in-process router, a loopback server, or a mock in tests.
#[async_trait]
pub trait ServingCollaborator: Send + Sync {
    /// Serve one canonical request.
    ///
    /// # Errors
    ///
    /// Returns an error when the request could not be served at all. The
    /// adapter answers such failures with a 500 reply.
    async fn serve(&self, request: CanonicalRequest) -> anyhow::Result<CanonicalResponse>;
}

/// Serving collaborator backed by an async closure.
pub struct ServiceFn<F> {
    f: F,
}

/// Wraps an async closure as a [`ServingCollaborator`].
pub const fn service_fn<F, Fut>(f: F) -> ServiceFn<F>
where
    F: Fn(CanonicalRequest) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<CanonicalResponse>> + Send,
{
    ServiceFn { f }
}

#[async_trait]
impl<F, Fut> ServingCollaborator for ServiceFn<F>
where
    F: Fn(CanonicalRequest) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<CanonicalResponse>> + Send,
{
    async fn serve(&self, request: CanonicalRequest) -> anyhow::Result<CanonicalResponse> {
        (self.f)(request).await
    }
}
