//! HTTP service for a geotagged photo collection.
//!
//! This crate provides:
//! - Batch upload with GPS extraction, geo-indexing and thumbnails
//! - Bounding-box queries over indexed images
//! - Listing, lookup and batch deletion of stored images

pub mod admission;
pub mod config;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use error::ApiError;
pub use pipeline::Library;
pub use routes::create_router;
pub use state::AppState;
pub use store::ImageStore;
