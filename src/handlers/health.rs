use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let scheduling = &state.config.scheduling;
    Json(serde_json::json!({
        "status": "ok",
        "window": {
            "startHour": scheduling.slot_start_hour,
            "endHour": scheduling.slot_end_hour,
            "stepMinutes": scheduling.search_step_minutes,
            "horizonDays": scheduling.search_horizon_days,
        },
    }))
}
