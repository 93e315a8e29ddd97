//! Deployment registry and simulated pipeline

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use lastmile_api_types::{DeployRequest, DeploymentDetail, DeploymentLogEntry, DeploymentStatus};

use crate::errors::ServerError;

/// Framework sentinel used when the caller does not name one
pub const AUTO_DETECT: &str = "auto-detect";

/// Listing defaults, also applied to negative or unparseable inputs
pub const DEFAULT_LIMIT: i64 = 20;
pub const DEFAULT_OFFSET: i64 = 0;

/// Registry tunables
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Delay before each stage transition
    pub stage_delay: Duration,

    /// Domain completed deployments are published under
    pub platform_domain: String,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            stage_delay: Duration::from_secs(2),
            platform_domain: "lastmile.app".to_string(),
        }
    }
}

/// A stored deployment record
#[derive(Debug, Clone)]
pub struct DeploymentRecord {
    pub id: String,
    pub project_name: String,
    pub framework: String,
    pub environment: HashMap<String, String>,
    pub extra_config: Option<serde_json::Value>,
    pub status: DeploymentStatus,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub error: Option<String>,
    pub logs: Vec<DeploymentLogEntry>,
}

impl DeploymentRecord {
    /// Wire representation of the record
    pub fn detail(&self) -> DeploymentDetail {
        DeploymentDetail {
            deployment_id: self.id.clone(),
            project_name: self.project_name.clone(),
            framework: self.framework.clone(),
            status: self.status,
            url: self.url.clone(),
            error: self.error.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

enum StageOutcome {
    Advanced,
    Gone,
    Failed,
}

/// In-memory deployment store driving the simulated pipeline.
///
/// Cloning yields another handle to the same store. Each created record gets
/// its own detached advancement task; mutation is strictly sequential within
/// that task, and the task checks for record presence before every mutation
/// so deletion is the cancellation path.
#[derive(Clone)]
pub struct DeploymentRegistry {
    records: Arc<RwLock<HashMap<String, DeploymentRecord>>>,
    settings: Arc<RegistrySettings>,
}

impl DeploymentRegistry {
    pub fn new(settings: RegistrySettings) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            settings: Arc::new(settings),
        }
    }

    /// Validate and store a new deployment, then start its pipeline task.
    ///
    /// Returns the queued record immediately; advancement happens in the
    /// background.
    pub fn create(&self, request: DeployRequest) -> Result<DeploymentRecord, ServerError> {
        if request.code.trim().is_empty() {
            return Err(ServerError::Validation("code is required".to_string()));
        }
        if request.project_name.trim().is_empty() {
            return Err(ServerError::Validation("projectName is required".to_string()));
        }

        let now = Utc::now();
        let record = DeploymentRecord {
            id: Uuid::new_v4().to_string(),
            project_name: request.project_name.trim().to_string(),
            framework: request
                .framework
                .filter(|framework| !framework.trim().is_empty())
                .unwrap_or_else(|| AUTO_DETECT.to_string()),
            environment: request.environment.unwrap_or_default(),
            extra_config: request.config,
            status: DeploymentStatus::Queued,
            url: None,
            created_at: now,
            updated_at: now,
            error: None,
            logs: Vec::new(),
        };

        {
            let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
            records.insert(record.id.clone(), record.clone());
        }

        info!("Deployment {} queued for {}", record.id, record.project_name);

        let registry = self.clone();
        let id = record.id.clone();
        tokio::spawn(async move {
            registry.run_pipeline(&id).await;
        });

        Ok(record)
    }

    /// Walk a record through the fixed stage order
    async fn run_pipeline(&self, id: &str) {
        for stage in DeploymentStatus::PIPELINE {
            tokio::time::sleep(self.settings.stage_delay).await;

            match self.apply_stage(id, stage) {
                StageOutcome::Advanced => {}
                StageOutcome::Gone => {
                    debug!("Deployment {} removed mid-pipeline, stopping", id);
                    return;
                }
                StageOutcome::Failed => return,
            }
        }
    }

    /// Apply one stage transition; the record may have been deleted.
    ///
    /// Entering `Completed` derives the public URL first; a project name that
    /// cannot form one fails the deployment instead.
    fn apply_stage(&self, id: &str, stage: DeploymentStatus) -> StageOutcome {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let Some(record) = records.get_mut(id) else {
            return StageOutcome::Gone;
        };

        if stage == DeploymentStatus::Completed {
            match publish_url(&record.project_name, &self.settings.platform_domain) {
                Ok(url) => record.url = Some(url),
                Err(message) => {
                    warn!("Deployment {} failed: {}", id, message);
                    record.status = DeploymentStatus::Failed;
                    record.error = Some(message);
                    record.updated_at = Utc::now();
                    return StageOutcome::Failed;
                }
            }
        }

        record.status = stage;
        record.updated_at = Utc::now();
        debug!("Deployment {} -> {}", id, stage);
        StageOutcome::Advanced
    }

    /// Snapshot of a record
    pub fn get(&self, id: &str) -> Result<DeploymentRecord, ServerError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records
            .get(id)
            .cloned()
            .ok_or_else(|| ServerError::NotFound(format!("Deployment {} not found", id)))
    }

    /// Records ordered newest first, with the total count.
    ///
    /// Negative inputs fall back to the defaults.
    pub fn list(&self, limit: i64, offset: i64) -> (Vec<DeploymentRecord>, usize) {
        let limit = if limit < 0 { DEFAULT_LIMIT } else { limit } as usize;
        let offset = if offset < 0 { DEFAULT_OFFSET } else { offset } as usize;

        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let total = records.len();

        let mut all: Vec<DeploymentRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let page = all.into_iter().skip(offset).take(limit).collect();
        (page, total)
    }

    /// Remove a record; its pipeline task stops at the next presence check
    pub fn delete(&self, id: &str) -> Result<String, ServerError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        match records.remove(id) {
            Some(record) => {
                info!("Deployment {} deleted", record.id);
                Ok(record.id)
            }
            None => Err(ServerError::NotFound(format!("Deployment {} not found", id))),
        }
    }

    /// Log lines recorded for a deployment
    pub fn logs(&self, id: &str) -> Result<Vec<DeploymentLogEntry>, ServerError> {
        Ok(self.get(id)?.logs)
    }
}

/// Derive the public URL for a completed deployment.
///
/// The lowercased project name must form a DNS label.
fn publish_url(project_name: &str, domain: &str) -> Result<String, String> {
    let label = project_name.to_lowercase();
    let valid = !label.is_empty()
        && label.len() <= 63
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !label.starts_with('-')
        && !label.ends_with('-');

    if !valid {
        return Err(format!(
            "project name {:?} does not form a valid subdomain",
            project_name
        ));
    }

    Ok(format!("https://{}.{}", label, domain))
}
