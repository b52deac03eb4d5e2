//! Handlers for recorded speed detections.

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use speedtrap_store::models::detection::Detection;
use speedtrap_store::repositories::DetectionRepo;

use crate::error::AppResult;
use crate::query::LimitParams;
use crate::response::Success;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DetectionList {
    pub count: usize,
    pub detections: Vec<Detection>,
}

/// GET /api/detections?limit=N
///
/// Newest first. Without a positive `limit` every stored detection is
/// returned.
pub async fn list_detections(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<Success<DetectionList>>> {
    let detections = DetectionRepo::list(&state.store, params.limit()).await?;
    Ok(Json(Success::new(DetectionList {
        count: detections.len(),
        detections,
    })))
}
