//! Server state

use std::sync::Arc;

use crate::auth::ApiKeyStore;
use crate::registry::DeploymentRegistry;

/// Server state shared across handlers
pub struct ServerState {
    pub registry: DeploymentRegistry,
    pub keys: Arc<ApiKeyStore>,
}

impl ServerState {
    pub fn new(registry: DeploymentRegistry, keys: Arc<ApiKeyStore>) -> Self {
        Self { registry, keys }
    }
}
