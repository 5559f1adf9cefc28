// src/handlers/payments.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::orders::{PaymentReceipt, RecordPaymentPayload, RecordRefundPayload},
};

// POST /api/orders/{order_id}/payments
#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/payments",
    tag = "Payments",
    params(("order_id" = Uuid, Path, description = "ID do pedido")),
    request_body = RecordPaymentPayload,
    responses(
        (status = 201, description = "Pagamento lançado", body = PaymentReceipt),
        (status = 400, description = "Valor não positivo ou pedido fechado/estornado"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_payment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<RecordPaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = app_state
        .payment_service
        .record_payment(&user.0, order_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

// POST /api/payments/{payment_id}/refunds
#[utoipa::path(
    post,
    path = "/api/payments/{payment_id}/refunds",
    tag = "Payments",
    params(("payment_id" = Uuid, Path, description = "ID do pagamento original")),
    request_body = RecordRefundPayload,
    responses(
        (status = 201, description = "Estorno lançado; pedido marcado como REFUNDED", body = PaymentReceipt),
        (status = 400, description = "Valor inválido"),
        (status = 404, description = "Pagamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_refund(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(payment_id): Path<Uuid>,
    Json(payload): Json<RecordRefundPayload>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = app_state
        .payment_service
        .record_refund(&user.0, payment_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
