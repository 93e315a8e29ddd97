//! API key authentication

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::errors::ServerError;
use crate::state::ServerState;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Account metadata attached to a recognized key
#[derive(Debug, Clone)]
pub struct ApiKeyRecord {
    pub account: String,
    pub tier: String,
}

/// Static key lookup, injected into the server state
#[derive(Debug, Clone, Default)]
pub struct ApiKeyStore {
    keys: HashMap<String, ApiKeyRecord>,
}

impl ApiKeyStore {
    pub fn new(keys: HashMap<String, ApiKeyRecord>) -> Self {
        Self { keys }
    }

    /// Keys the mock server ships with
    pub fn demo() -> Self {
        let mut keys = HashMap::new();
        keys.insert(
            "lm_live_demo123".to_string(),
            ApiKeyRecord {
                account: "demo".to_string(),
                tier: "pro".to_string(),
            },
        );
        keys.insert(
            "lm_test_abc456".to_string(),
            ApiKeyRecord {
                account: "test".to_string(),
                tier: "free".to_string(),
            },
        );
        Self { keys }
    }

    pub fn lookup(&self, key: &str) -> Option<&ApiKeyRecord> {
        self.keys.get(key)
    }
}

/// Reject requests without a recognized `X-API-Key` header.
///
/// On success the matching [`ApiKeyRecord`] is attached to the request
/// extensions for downstream handlers.
pub async fn require_api_key(
    State(state): State<Arc<ServerState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if key.is_empty() {
        return Err(ServerError::Auth("API key is required".to_string()));
    }

    let Some(record) = state.keys.lookup(key) else {
        debug!("Rejected unknown API key");
        return Err(ServerError::Auth("Invalid API key".to_string()));
    };

    request.extensions_mut().insert(record.clone());
    Ok(next.run(request).await)
}
