//! Route configuration.

use crate::admission::admission_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/image-upload", post(handlers::upload_images))
        .route("/api/get-images", get(handlers::list_images))
        .route(
            "/api/get-images-by-coordinates",
            get(handlers::images_by_coordinates),
        )
        .route(
            "/api/get-images-by-coordinates/",
            get(handlers::images_by_coordinates),
        )
        .route("/api/get-image/{image_name}", get(handlers::get_image))
        .route("/api/image-deletion", post(handlers::delete_images))
        .route("/api/image-deletion/", post(handlers::delete_images))
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes));

    // Originals and thumbnails, straight from the upload directory
    let file_routes =
        Router::new().nest_service("/uploads", ServeDir::new(state.library.store().root()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Order of execution: TraceLayer -> CORS -> admission -> handler
    Router::new()
        .merge(api_routes)
        .merge(file_routes)
        .layer(middleware::from_fn_with_state(
            state.admission.clone(),
            admission_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
