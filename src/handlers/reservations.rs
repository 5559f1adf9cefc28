// src/handlers/reservations.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::{AppError, BookingConflict},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::reservations::{Reservation, ReservationRequest},
};

// POST /api/reservations
#[utoipa::path(
    post,
    path = "/api/reservations",
    tag = "Reservations",
    request_body = ReservationRequest,
    responses(
        (status = 201, description = "Reserva, pedido e linha de serviço criados", body = Reservation),
        (status = 404, description = "Serviço não encontrado"),
        (status = 409, description = "Horário recusado (todas as regras violadas)", body = BookingConflict)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_reservation(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<ReservationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let reservation = app_state
        .reservation_service
        .create_reservation(&user.0, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

// PUT /api/reservations/{reservation_id}
#[utoipa::path(
    put,
    path = "/api/reservations/{reservation_id}",
    tag = "Reservations",
    params(("reservation_id" = Uuid, Path, description = "ID da reserva")),
    request_body = ReservationRequest,
    responses(
        (status = 200, description = "Reserva remarcada", body = Reservation),
        (status = 404, description = "Reserva não encontrada"),
        (status = 409, description = "Novo horário recusado", body = BookingConflict)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_reservation(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(reservation_id): Path<Uuid>,
    Json(payload): Json<ReservationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let reservation = app_state
        .reservation_service
        .update_reservation(&user.0, reservation_id, payload)
        .await?;
    Ok(Json(reservation))
}

// DELETE /api/reservations/{reservation_id}
#[utoipa::path(
    delete,
    path = "/api/reservations/{reservation_id}",
    tag = "Reservations",
    params(("reservation_id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 204, description = "Reserva removida"),
        (status = 404, description = "Reserva não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_reservation(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(reservation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .reservation_service
        .delete_reservation(&user.0, reservation_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
