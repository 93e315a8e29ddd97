//! Lastmile Client SDK
//!
//! Submit deployments, poll their status, and subscribe to lifecycle events.

pub mod client;
pub mod config;
pub mod errors;
pub mod events;
pub mod http;

pub use client::{DeployClient, ListOptions, PollOptions};
pub use config::ClientConfig;
pub use errors::SdkError;
pub use events::{CallbackId, Event, EventKind};

pub use lastmile_api_types as types;
