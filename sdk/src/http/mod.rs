//! HTTP transport

pub mod transport;

pub use transport::{HttpTransport, Transport, API_KEY_HEADER};
