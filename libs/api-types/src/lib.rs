//! Shared API models for the Lastmile platform.
//!
//! Wire types used by both the client SDK and the mock API server.

pub mod models;

pub use models::*;
