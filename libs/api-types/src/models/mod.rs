//! API models

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deployment lifecycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    /// Accepted, waiting for the pipeline to start
    Queued,

    /// Build stage
    Building,

    /// Test stage
    Testing,

    /// Rollout stage
    Deploying,

    /// Terminal: deployed and reachable at its URL
    Completed,

    /// Terminal: pipeline aborted with an error
    Failed,
}

impl DeploymentStatus {
    /// Stage order a deployment walks through after `Queued`.
    pub const PIPELINE: [DeploymentStatus; 4] = [
        DeploymentStatus::Building,
        DeploymentStatus::Testing,
        DeploymentStatus::Deploying,
        DeploymentStatus::Completed,
    ];

    /// Whether the stage ends the lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Completed | DeploymentStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Queued => "queued",
            DeploymentStatus::Building => "building",
            DeploymentStatus::Testing => "testing",
            DeploymentStatus::Deploying => "deploying",
            DeploymentStatus::Completed => "completed",
            DeploymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment submission request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    /// Source to deploy. Required, validated server-side as well.
    #[serde(default)]
    pub code: String,

    /// Project name. Required, becomes the deployment's subdomain.
    #[serde(default)]
    pub project_name: String,

    /// Framework hint, defaults to auto-detection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,

    /// Environment variables for the deployment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<HashMap<String, String>>,

    /// Extra opaque configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

/// Deployment submission response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub deployment_id: String,
    pub project_name: String,
    pub status: DeploymentStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
    /// Always null at submission time; populated once completed
    pub url: Option<String>,
}

/// Full deployment status detail
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDetail {
    pub deployment_id: String,
    pub project_name: String,
    pub framework: String,
    pub status: DeploymentStatus,
    pub url: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Paginated deployment listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentList {
    pub deployments: Vec<DeploymentDetail>,
    /// Total record count, independent of the pagination window
    pub total: usize,
    pub limit: i64,
    pub offset: i64,
}

/// Deployment deletion response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub message: String,
    pub deployment_id: String,
}

/// A single deployment log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentLogEntry {
    /// Log level: 'info', 'warn', 'error', 'debug'
    pub level: String,

    /// Log message
    pub message: String,
}

/// Deployment log listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    pub deployment_id: String,
    pub logs: Vec<DeploymentLogEntry>,
}

/// API key validation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub account: String,
    pub tier: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
