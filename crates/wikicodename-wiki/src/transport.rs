use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

/// Per-request timeout; a timed-out request is a hard failure.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the body of a wiki API URL.
#[async_trait]
pub trait WikiTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, TransportError>;
}

/// reqwest-backed transport sharing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wikicodename/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WikiTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        Ok(resp.text().await?)
    }
}
