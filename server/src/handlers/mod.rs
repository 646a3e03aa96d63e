//! HTTP request handlers.

pub mod images;
pub mod uploads;

pub use images::*;
pub use uploads::*;

use serde::Serialize;

/// Acknowledgement body for batch endpoints. Batches always succeed at the
/// HTTP level; per-file outcomes are logged.
#[derive(Debug, Serialize)]
pub struct Acknowledgement {
    pub status: u16,
    pub error: Option<String>,
    pub response: String,
}

impl Acknowledgement {
    pub fn ok(response: impl Into<String>) -> Self {
        Self {
            status: 200,
            error: None,
            response: response.into(),
        }
    }
}
