//! Deployment client

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error};

use lastmile_api_types::{
    DeleteResponse, DeployRequest, DeployResponse, DeploymentDetail, DeploymentList, LogsResponse,
    ValidateResponse,
};

use crate::config::ClientConfig;
use crate::errors::SdkError;
use crate::events::{CallbackId, Event, EventBus, EventKind};
use crate::http::{HttpTransport, Transport};

/// Status polling options
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Delay between status fetches
    pub interval: Duration,

    /// Maximum fetch attempts before giving up
    pub max_attempts: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 150,
        }
    }
}

/// Deployment listing options
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Client for the Lastmile deployment API.
///
/// Lifecycle transitions observed by the client are re-broadcast as local
/// [`Event`]s to callbacks registered with [`DeployClient::on`].
pub struct DeployClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    events: EventBus,
    last_status: Mutex<Option<DeployResponse>>,
}

impl DeployClient {
    /// Create a client backed by the reqwest transport
    pub fn new(config: ClientConfig) -> Result<Self, SdkError> {
        url::Url::parse(&config.base_url)
            .map_err(|e| SdkError::Config(format!("Invalid base URL: {}", e)))?;

        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, SdkError> {
        if config.api_key.trim().is_empty() {
            return Err(SdkError::Config("API key is required".to_string()));
        }

        Ok(Self {
            config,
            transport,
            events: EventBus::new(),
            last_status: Mutex::new(None),
        })
    }

    /// Submit a deployment.
    ///
    /// Validates the request locally before any transport call, then emits
    /// `DeployStart`, and `DeploySuccess` or `DeployError` with the outcome.
    pub async fn submit(&self, request: DeployRequest) -> Result<DeployResponse, SdkError> {
        if request.code.trim().is_empty() {
            return Err(SdkError::Validation("code is required".to_string()));
        }
        if request.project_name.trim().is_empty() {
            return Err(SdkError::Validation("projectName is required".to_string()));
        }

        self.events.emit(&Event::DeployStart {
            project_name: request.project_name.clone(),
        });
        if self.config.debug {
            debug!("Submitting deployment for {}", request.project_name);
        }

        let body = serde_json::to_value(&request)?;
        match self.transport.post("/v1/deploy", &body).await {
            Ok(value) => {
                let response: DeployResponse = serde_json::from_value(value)?;
                *self
                    .last_status
                    .lock()
                    .unwrap_or_else(|e| e.into_inner()) = Some(response.clone());
                self.events.emit(&Event::DeploySuccess(response.clone()));
                Ok(response)
            }
            Err(e) => {
                error!("Deployment submission failed: {}", e);
                self.events.emit(&Event::DeployError {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Fetch the current status of a deployment; emits `StatusUpdate`
    pub async fn fetch_status(&self, deployment_id: &str) -> Result<DeploymentDetail, SdkError> {
        if deployment_id.trim().is_empty() {
            return Err(SdkError::Validation("deployment id is required".to_string()));
        }

        let value = self
            .transport
            .get(&format!("/v1/deployments/{}", deployment_id))
            .await?;
        let detail: DeploymentDetail = serde_json::from_value(value)?;

        if self.config.debug {
            debug!("Deployment {} is {}", detail.deployment_id, detail.status);
        }
        self.events.emit(&Event::StatusUpdate(detail.clone()));
        Ok(detail)
    }

    /// Fetch status repeatedly until the deployment reaches a terminal state.
    ///
    /// A transport error aborts the poll immediately; exhausting
    /// `max_attempts` fails with [`SdkError::PollTimeout`].
    pub async fn poll_status(
        &self,
        deployment_id: &str,
        options: PollOptions,
    ) -> Result<DeploymentDetail, SdkError> {
        for attempt in 1..=options.max_attempts {
            let detail = self.fetch_status(deployment_id).await?;
            if detail.status.is_terminal() {
                return Ok(detail);
            }

            if self.config.debug {
                debug!(
                    "Deployment {} still {}, attempt {}/{}",
                    deployment_id, detail.status, attempt, options.max_attempts
                );
            }
            if attempt < options.max_attempts {
                tokio::time::sleep(options.interval).await;
            }
        }

        Err(SdkError::PollTimeout {
            attempts: options.max_attempts,
        })
    }

    /// List deployments, newest first
    pub async fn list_deployments(&self, options: ListOptions) -> Result<DeploymentList, SdkError> {
        let mut query = Vec::new();
        if let Some(limit) = options.limit {
            query.push(format!("limit={}", limit));
        }
        if let Some(offset) = options.offset {
            query.push(format!("offset={}", offset));
        }

        let path = if query.is_empty() {
            "/v1/deployments".to_string()
        } else {
            format!("/v1/deployments?{}", query.join("&"))
        };

        let value = self.transport.get(&path).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Delete a deployment; emits `DeploymentDeleted` on success
    pub async fn delete_deployment(&self, deployment_id: &str) -> Result<DeleteResponse, SdkError> {
        let value = self
            .transport
            .delete(&format!("/v1/deployments/{}", deployment_id))
            .await?;
        let response: DeleteResponse = serde_json::from_value(value)?;

        self.events.emit(&Event::DeploymentDeleted {
            deployment_id: response.deployment_id.clone(),
        });
        Ok(response)
    }

    /// Fetch the log lines recorded for a deployment
    pub async fn fetch_logs(&self, deployment_id: &str) -> Result<LogsResponse, SdkError> {
        let value = self
            .transport
            .get(&format!("/v1/deployments/{}/logs", deployment_id))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Check the configured API key against the validation endpoint
    pub async fn validate_key(&self) -> Result<ValidateResponse, SdkError> {
        let value = self.transport.post("/v1/validate", &Value::Null).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Result of the last successful submission, if any
    pub fn last_deployment_status(&self) -> Option<DeployResponse> {
        self.last_status
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Register a lifecycle callback; duplicates are allowed
    pub fn on<F>(&self, kind: EventKind, callback: F) -> CallbackId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.on(kind, callback)
    }

    /// Remove one callback, or every callback for the kind when `None`
    pub fn off(&self, kind: EventKind, callback: Option<CallbackId>) {
        self.events.off(kind, callback)
    }
}
