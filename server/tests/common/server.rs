//! Server test utilities.

use geo_index::GeoIndex;
use geophoto_server::{create_router, AppConfig, AppState, ImageStore};
use tempfile::TempDir;

/// A router over a throwaway upload directory.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a test server with custom config modifications.
    pub fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let mut config = AppConfig::default();
        config.storage.upload_dir = temp_dir.path().join("uploads");
        modifier(&mut config);

        let state = AppState::from_config(config).expect("Failed to open image library");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    pub fn store(&self) -> &ImageStore {
        self.state.library.store()
    }

    pub fn index(&self) -> &GeoIndex {
        self.state.library.index()
    }
}
