use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http::{Request, Response};
use realtime::{Config, HttpRequest};
use transit_aggregator::CLIENT_ID;

/// Host capabilities backed by a shared `reqwest` client and the process
/// environment.
#[derive(Debug, Clone)]
pub struct HostProvider {
    client: reqwest::Client,
}

impl HostProvider {
    /// Build the provider.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be initialised (for
    /// example, when no TLS backend is available).
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(CLIENT_ID)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

impl HttpRequest for HostProvider {
    async fn fetch(&self, request: Request<Vec<u8>>) -> Result<Response<Bytes>> {
        let uri = request.uri().to_string();
        let request = reqwest::Request::try_from(request).context("converting request")?;

        let response = self
            .client
            .execute(request)
            .await
            .with_context(|| format!("requesting {uri}"))?;

        let mut builder = Response::builder().status(response.status());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(response.headers().clone());
        }
        let body = response.bytes().await.with_context(|| format!("reading body from {uri}"))?;

        builder.body(body).context("building response")
    }
}

impl Config for HostProvider {
    async fn get(&self, key: &str) -> Result<String> {
        std::env::var(key).map_err(|e| anyhow!("{key} is not available: {e}"))
    }
}
