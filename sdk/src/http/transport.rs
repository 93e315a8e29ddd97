//! HTTP transport implementation

use async_trait::async_trait;
use http::StatusCode;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, error};

use lastmile_api_types::ErrorBody;

use crate::config::ClientConfig;
use crate::errors::SdkError;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Request transport used by [`crate::client::DeployClient`].
///
/// Implemented by [`HttpTransport`] in production; tests substitute stubs.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value, SdkError>;
    async fn post(&self, path: &str, body: &Value) -> Result<Value, SdkError>;
    async fn delete(&self, path: &str) -> Result<Value, SdkError>;
}

/// reqwest-backed transport for the Lastmile API
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: SecretString,
    debug: bool,
}

impl HttpTransport {
    /// Build a transport from the client configuration.
    ///
    /// The configured timeout is enforced on every request.
    pub fn new(config: &ClientConfig) -> Result<Self, SdkError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: SecretString::from(config.api_key.clone()),
            debug: config.debug,
        })
    }

    async fn handle(&self, response: reqwest::Response) -> Result<Value, SdkError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        error!("HTTP request failed: {} - {}", status, message);

        Err(match status {
            StatusCode::BAD_REQUEST => SdkError::Validation(message),
            StatusCode::UNAUTHORIZED => SdkError::Auth(message),
            StatusCode::NOT_FOUND => SdkError::NotFound(message),
            _ => SdkError::Transport {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Value, SdkError> {
        let url = format!("{}{}", self.base_url, path);
        if self.debug {
            debug!("GET {}", url);
        }

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await?;

        self.handle(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, SdkError> {
        let url = format!("{}{}", self.base_url, path);
        if self.debug {
            debug!("POST {}", url);
        }

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(body)
            .send()
            .await?;

        self.handle(response).await
    }

    async fn delete(&self, path: &str) -> Result<Value, SdkError> {
        let url = format!("{}{}", self.base_url, path);
        if self.debug {
            debug!("DELETE {}", url);
        }

        let response = self
            .client
            .delete(&url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await?;

        self.handle(response).await
    }
}
