use axum::{Json, extract::State, response::IntoResponse};
use posada_types::api::UpdateSettingsRequest;

use crate::auth::AppState;
use crate::convert::settings_from_row;
use crate::error::ApiError;

/// First read creates the record with the 14:00/12:00 defaults.
pub async fn get_settings(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || db.db.get_settings())
        .await
        .map_err(ApiError::internal)??;

    Ok(Json(settings_from_row(row)))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let check_in = req.check_in_time.format("%H:%M").to_string();
    let check_out = req.check_out_time.format("%H:%M").to_string();

    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        db.db.update_settings(&check_in, &check_out)?;
        db.db.get_settings()
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(Json(settings_from_row(row)))
}
