// src/handlers/taxes.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::catalog::{CreateTaxPayload, Tax},
};

// POST /api/taxes
#[utoipa::path(
    post,
    path = "/api/taxes",
    tag = "Taxes",
    request_body = CreateTaxPayload,
    responses(
        (status = 201, description = "Regra de imposto criada", body = Tax),
        (status = 409, description = "Já existe regra para a categoria")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tax(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTaxPayload>,
) -> Result<impl IntoResponse, AppError> {
    let tax = app_state.tax_service.create_tax(&user.0, payload).await?;
    Ok((StatusCode::CREATED, Json(tax)))
}
