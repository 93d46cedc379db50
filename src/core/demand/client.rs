use crate::core::adapters::envelope::Envelope;
use crate::core::adapters::normalizer::ResponseData;
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, redirect, retry};
use std::time::Duration;
use tracing::debug;

/// Executes one envelope and hands back the raw status and body.
/// Completed exchanges are `Ok` whatever their status, only failures
/// to complete the exchange are errors
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, envelope: &Envelope) -> Result<ResponseData, anyhow::Error>;
}

/// Http transport shared by every adapter. Never retries or follows
/// redirects, the caller bounds the overall auction time
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    fn init_client(timeout: Duration) -> Result<Client, anyhow::Error> {
        reqwest::ClientBuilder::new()
            .user_agent("ad-client")
            .connect_timeout(Duration::from_secs(1))
            .pool_max_idle_per_host(128)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .tcp_keepalive(Some(Duration::from_secs(20)))
            .retry(retry::never())
            .referer(false)
            .redirect(redirect::Policy::none())
            .timeout(timeout)
            .tcp_nodelay(true)
            .deflate(true)
            .gzip(true)
            .hickory_dns(true)
            .http2_adaptive_window(true)
            .build()
            .map_err(anyhow::Error::from)
    }

    /// Eagerly builds the underlying client so misconfiguration
    /// surfaces at startup rather than on the first auction
    pub fn new(timeout: Duration) -> Result<Self, anyhow::Error> {
        Ok(HttpTransport {
            client: Self::init_client(timeout)?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, envelope: &Envelope) -> Result<ResponseData, anyhow::Error> {
        let req = self
            .client
            .request(envelope.method.clone(), &envelope.uri)
            .headers(envelope.headers.clone())
            .body(envelope.body.clone())
            .build()
            .map_err(|e| anyhow!("Failed to build http request for {}: {}", envelope.uri, e))?;

        let res = self
            .client
            .execute(req)
            .await
            .map_err(|e| anyhow!("Failed to execute http request for {}: {}", envelope.uri, e))?;

        let status = res.status();

        if status == StatusCode::NO_CONTENT {
            debug!("Http 204 from {}, skipping body", envelope.uri);
            return Ok(ResponseData::new(status.as_u16(), bytes::Bytes::new()));
        }

        let body = res
            .bytes()
            .await
            .map_err(|e| anyhow!("Failed to read http response for {}: {}", envelope.uri, e))?;

        Ok(ResponseData::new(status.as_u16(), body))
    }
}
