use axum::routing::get;
use axum::Router;

use crate::handlers::detections;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/detections", get(detections::list_detections))
}
