//! Application state shared across handlers.

use crate::admission::AdmissionLimiter;
use crate::config::AppConfig;
use crate::pipeline::Library;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub library: Arc<Library>,
    pub admission: AdmissionLimiter,
}

impl AppState {
    pub fn new(config: AppConfig, library: Library) -> Self {
        let admission = AdmissionLimiter::new(config.server.max_concurrent_requests);
        Self {
            config: Arc::new(config),
            library: Arc::new(library),
            admission,
        }
    }

    /// Open the library described by `config` and build the state around it.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let library = Library::open(&config)?;
        Ok(Self::new(config, library))
    }
}
