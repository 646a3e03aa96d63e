//! Read-only image endpoints.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use geo_index::{BoundingBox, ImageId};
use geotag::Dms;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// GET /api/get-images
pub async fn list_images(State(state): State<AppState>) -> ApiResult<Json<Vec<ImageId>>> {
    let library = Arc::clone(&state.library);
    let ids = tokio::task::spawn_blocking(move || library.store().list()).await??;
    Ok(Json(ids))
}

/// Bounding-box query: each bound is `hemisphere_degrees_minutes_seconds`.
#[derive(Debug, Deserialize)]
pub struct CoordinateQuery {
    pub la1: String,
    pub la2: String,
    pub lo1: String,
    pub lo2: String,
}

impl CoordinateQuery {
    pub fn bounding_box(&self) -> ApiResult<BoundingBox> {
        let parse = |param: &str, raw: &str| {
            raw.parse::<Dms>()
                .map_err(|e| ApiError::BadRequest(format!("{}: {:#}", param, e)))
        };
        Ok(BoundingBox::from_dms(
            &parse("la1", &self.la1)?,
            &parse("la2", &self.la2)?,
            &parse("lo1", &self.lo1)?,
            &parse("lo2", &self.lo2)?,
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct CoordinateResponse {
    pub body: Vec<ImageId>,
}

/// GET /api/get-images-by-coordinates
pub async fn images_by_coordinates(
    State(state): State<AppState>,
    query: Result<Query<CoordinateQuery>, QueryRejection>,
) -> ApiResult<Json<CoordinateResponse>> {
    let Query(query) = query?;
    let bbox = query.bounding_box()?;
    let body = state.library.images_in(&bbox);
    tracing::debug!(?bbox, matches = body.len(), "Bounding-box query");
    Ok(Json(CoordinateResponse { body }))
}

/// Filesystem locations of an original and its thumbnail.
#[derive(Debug, Serialize)]
pub struct ImageDescriptor {
    pub fullimg: String,
    pub thmbimg: String,
}

/// GET /api/get-image/{image_name}
pub async fn get_image(
    State(state): State<AppState>,
    Path(image_name): Path<String>,
) -> ApiResult<Json<ImageDescriptor>> {
    let library = Arc::clone(&state.library);
    let descriptor = tokio::task::spawn_blocking(move || {
        let store = library.store();
        store
            .resolve(&image_name)
            .filter(|id| store.contains(id))
            .map(|id| ImageDescriptor {
                fullimg: store.original_path(&id).display().to_string(),
                thmbimg: store.thumbnail_path(&id).display().to_string(),
            })
            .ok_or_else(|| ApiError::NotFound(format!("File does not exist: {}", image_name)))
    })
    .await??;

    Ok(Json(descriptor))
}
