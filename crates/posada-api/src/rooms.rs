use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use posada_types::api::{AvailabilityQuery, RoomPayload};
use posada_types::models::Room;
use uuid::Uuid;

use crate::auth::AppState;
use crate::convert::room_from_row;
use crate::error::ApiError;

pub async fn list_rooms(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_rooms())
        .await
        .map_err(ApiError::internal)??;

    let rooms: Vec<Room> = rows.into_iter().map(room_from_row).collect();
    Ok(Json(rooms))
}

pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rid = id.to_string();
    let row = tokio::task::spawn_blocking(move || db.db.get_room(&rid))
        .await
        .map_err(ApiError::internal)??
        .ok_or_else(|| ApiError::not_found(format!("room {} not found", id)))?;

    Ok(Json(room_from_row(row)))
}

/// Rooms open for booking. Filtering by dates needs both ends of the window;
/// a single date is treated as no filter.
pub async fn available_rooms(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = booking_window(&query);

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_available_rooms(window))
        .await
        .map_err(ApiError::internal)??;

    let rooms: Vec<Room> = rows.into_iter().map(room_from_row).collect();
    Ok(Json(rooms))
}

pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<RoomPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let room_id = Uuid::new_v4();

    let db = state.clone();
    let rid = room_id.to_string();
    tokio::task::spawn_blocking(move || {
        db.db.create_room(
            &rid,
            req.category.as_str(),
            req.number,
            req.price,
            req.available,
            req.image.as_deref(),
            req.description.as_deref(),
        )
    })
    .await
    .map_err(ApiError::internal)??;

    let db = state.clone();
    let rid = room_id.to_string();
    let row = tokio::task::spawn_blocking(move || db.db.get_room(&rid))
        .await
        .map_err(ApiError::internal)??
        .ok_or_else(|| ApiError::internal("room vanished after insert"))?;

    Ok((StatusCode::CREATED, Json(room_from_row(row))))
}

pub async fn update_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RoomPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rid = id.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db.update_room(
            &rid,
            req.category.as_str(),
            req.number,
            req.price,
            req.available,
            req.image.as_deref(),
            req.description.as_deref(),
        )?;
        db.db.get_room(&rid)
    })
    .await
    .map_err(ApiError::internal)??
    .ok_or_else(|| ApiError::not_found(format!("room {} not found", id)))?;

    Ok(Json(room_from_row(row)))
}

pub async fn delete_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rid = id.to_string();
    tokio::task::spawn_blocking(move || db.db.delete_room(&rid))
        .await
        .map_err(ApiError::internal)??;

    Ok(StatusCode::NO_CONTENT)
}

fn booking_window(query: &AvailabilityQuery) -> Option<(NaiveDate, NaiveDate)> {
    match (query.start, query.end) {
        (Some(start), Some(end)) => Some((start, end)),
        _ => None,
    }
}
