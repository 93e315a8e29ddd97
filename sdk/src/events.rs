//! Client-side lifecycle events

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::error;

use lastmile_api_types::{DeployResponse, DeploymentDetail};

/// Lifecycle notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DeployStart,
    DeploySuccess,
    DeployError,
    StatusUpdate,
    DeploymentDeleted,
}

/// Lifecycle notification payloads
#[derive(Debug, Clone)]
pub enum Event {
    /// Submission passed local validation, about to hit the API
    DeployStart { project_name: String },

    /// Submission accepted by the API
    DeploySuccess(DeployResponse),

    /// Submission rejected by the API or the transport failed
    DeployError { message: String },

    /// Fresh status payload fetched
    StatusUpdate(DeploymentDetail),

    /// Deployment removed
    DeploymentDeleted { deployment_id: String },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::DeployStart { .. } => EventKind::DeployStart,
            Event::DeploySuccess(_) => EventKind::DeploySuccess,
            Event::DeployError { .. } => EventKind::DeployError,
            Event::StatusUpdate(_) => EventKind::StatusUpdate,
            Event::DeploymentDeleted { .. } => EventKind::DeploymentDeleted,
        }
    }
}

/// Subscription handle returned by [`EventBus::on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackId(u64);

type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Ordered per-kind callback registry.
///
/// Callbacks run in registration order. A panicking callback is caught and
/// logged; later callbacks still run.
pub struct EventBus {
    next_id: AtomicU64,
    subscribers: RwLock<HashMap<EventKind, Vec<(CallbackId, Callback)>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Append a callback for the kind; duplicates are allowed
    pub fn on<F>(&self, kind: EventKind, callback: F) -> CallbackId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subscribers = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subscribers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove one callback, or every callback for the kind when `None`
    pub fn off(&self, kind: EventKind, callback: Option<CallbackId>) {
        let mut subscribers = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        match callback {
            Some(id) => {
                if let Some(list) = subscribers.get_mut(&kind) {
                    list.retain(|(callback_id, _)| *callback_id != id);
                }
            }
            None => {
                subscribers.remove(&kind);
            }
        }
    }

    /// Invoke the kind's callbacks in registration order
    pub fn emit(&self, event: &Event) {
        let callbacks: Vec<Callback> = {
            let subscribers = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
            subscribers
                .get(&event.kind())
                .map(|list| list.iter().map(|(_, callback)| callback.clone()).collect())
                .unwrap_or_default()
        };

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                error!("Event callback panicked for {:?}", event.kind());
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
