use std::time::Duration;

use reqwest::Client;
use tracing::debug;

/// Downloads remote sources over HTTP(S).
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: Client,
}

impl RemoteFetcher {
    /// Fails when the TLS backend cannot be initialised.
    pub fn new(connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self { client })
    }

    /// Fetch the full response body. Non-2xx statuses are errors.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        debug!(url, bytes = body.len(), "downloaded remote image");
        Ok(body.to_vec())
    }
}
