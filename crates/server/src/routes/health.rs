use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
pub async fn health_check(Extension(state): Extension<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "engine_ready": state.engine.is_ready(),
        "lichess_token_configured": state.lichess.has_token(),
    }))
}
