use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use posada_db::models::ReservationRow;
use posada_types::api::{CreateReservationRequest, ReservationResponse, UpdateReservationRequest};
use posada_types::models::{ReservationStatus, Room};
use tracing::warn;
use uuid::Uuid;

use crate::auth::AppState;
use crate::convert::{reservation_response, room_from_row};
use crate::error::ApiError;
use crate::middleware::Claims;

pub async fn list_reservations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    // Admins see the whole book, guests only their own stays
    let owner = (!claims.admin).then(|| claims.sub.to_string());

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_reservations(owner.as_deref()))
        .await
        .map_err(ApiError::internal)??;

    let responses = attach_rooms(&state, rows).await?;
    Ok(Json(responses))
}

pub async fn create_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reservation_id = Uuid::new_v4();
    let status = req.status.unwrap_or(ReservationStatus::Pending);
    let today = chrono::Utc::now().date_naive();

    // The conflict scan and the insert run as one transaction in the store
    let db = state.clone();
    let rid = reservation_id.to_string();
    let room_id = req.room_id.to_string();
    let user_id = claims.sub.to_string();
    tokio::task::spawn_blocking(move || {
        db.db.create_reservation(
            &rid,
            &room_id,
            &user_id,
            req.start_date,
            req.end_date,
            status,
            today,
        )
    })
    .await
    .map_err(ApiError::internal)??;

    let response = fetch_one(&state, reservation_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = fetch_row(&state, id).await?;
    check_owner(&claims, &row)?;

    let response = with_room(&state, row).await?;
    Ok(Json(response))
}

pub async fn update_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateReservationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = fetch_row(&state, id).await?;
    check_owner(&claims, &row)?;

    let today = chrono::Utc::now().date_naive();
    let db = state.clone();
    let rid = id.to_string();
    tokio::task::spawn_blocking(move || {
        db.db
            .update_reservation(&rid, req.start_date, req.end_date, req.status, today)
    })
    .await
    .map_err(ApiError::internal)??;

    let response = fetch_one(&state, id).await?;
    Ok(Json(response))
}

pub async fn delete_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = fetch_row(&state, id).await?;
    check_owner(&claims, &row)?;

    let db = state.clone();
    let rid = id.to_string();
    tokio::task::spawn_blocking(move || db.db.delete_reservation(&rid))
        .await
        .map_err(ApiError::internal)??;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn checkin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rid = id.to_string();
    let row = tokio::task::spawn_blocking(move || db.db.checkin_reservation(&rid))
        .await
        .map_err(ApiError::internal)??;

    let response = with_room(&state, row).await?;
    Ok(Json(response))
}

pub async fn checkout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rid = id.to_string();
    let row = tokio::task::spawn_blocking(move || db.db.checkout_reservation(&rid))
        .await
        .map_err(ApiError::internal)??;

    let response = with_room(&state, row).await?;
    Ok(Json(response))
}

fn check_owner(claims: &Claims, row: &ReservationRow) -> Result<(), ApiError> {
    if !claims.admin && row.user_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden(
            "reservation belongs to another user".into(),
        ));
    }
    Ok(())
}

async fn fetch_row(state: &AppState, id: Uuid) -> Result<ReservationRow, ApiError> {
    let db = state.clone();
    let rid = id.to_string();
    tokio::task::spawn_blocking(move || db.db.get_reservation(&rid))
        .await
        .map_err(ApiError::internal)??
        .ok_or_else(|| ApiError::not_found(format!("reservation {} not found", id)))
}

async fn fetch_one(state: &AppState, id: Uuid) -> Result<ReservationResponse, ApiError> {
    let row = fetch_row(state, id).await?;
    with_room(state, row).await
}

async fn with_room(state: &AppState, row: ReservationRow) -> Result<ReservationResponse, ApiError> {
    let db = state.clone();
    let room_id = row.room_id.clone();
    let room = tokio::task::spawn_blocking(move || db.db.get_room(&room_id))
        .await
        .map_err(ApiError::internal)??
        .ok_or_else(|| ApiError::not_found(format!("room {} not found", row.room_id)))?;

    Ok(reservation_response(row, room_from_row(room)))
}

/// Batch-fetch the rooms for a listing in one query instead of per row.
async fn attach_rooms(
    state: &AppState,
    rows: Vec<ReservationRow>,
) -> Result<Vec<ReservationResponse>, ApiError> {
    let room_ids: Vec<String> = rows.iter().map(|r| r.room_id.clone()).collect();

    let db = state.clone();
    let room_rows = tokio::task::spawn_blocking(move || db.db.get_rooms_by_ids(&room_ids))
        .await
        .map_err(ApiError::internal)??;

    let rooms: HashMap<String, Room> = room_rows
        .into_iter()
        .map(|r| (r.id.clone(), room_from_row(r)))
        .collect();

    let responses = rows
        .into_iter()
        .filter_map(|row| match rooms.get(&row.room_id) {
            Some(room) => Some(reservation_response(row, room.clone())),
            None => {
                warn!("Reservation '{}' references missing room '{}'", row.id, row.room_id);
                None
            }
        })
        .collect();

    Ok(responses)
}
