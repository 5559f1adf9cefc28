// src/handlers/schedules.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::schedules::{CreateSchedulePayload, Schedule},
};

// POST /api/schedules
#[utoipa::path(
    post,
    path = "/api/schedules",
    tag = "Schedules",
    request_body = CreateSchedulePayload,
    responses(
        (status = 201, description = "Turno cadastrado", body = Schedule),
        (status = 400, description = "Fim antes do início"),
        (status = 409, description = "Sobrepõe outro turno do funcionário")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_schedule(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateSchedulePayload>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = app_state.schedule_service.add_schedule(&user.0, payload).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}
