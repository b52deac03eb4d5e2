use axum::routing::post;
use axum::Router;

use crate::handlers::speed;
use crate::state::AppState;

/// Mounted at `/speed`.
pub fn router() -> Router<AppState> {
    Router::new().route("/derive", post(speed::derive_speed))
}
