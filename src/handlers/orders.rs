// src/handlers/orders.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::orders::{AddItemVariationPayload, AddOrderItemPayload, Order, OrderDetail},
};

// GET /api/orders/{order_id}
#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    tag = "Orders",
    params(("order_id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido com itens, serviços e pagamentos", body = OrderDetail),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.order_service.get_order(&user.0, order_id).await?;
    Ok(Json(detail))
}

// POST /api/orders/{order_id}/items
#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/items",
    tag = "Orders",
    params(("order_id" = Uuid, Path, description = "ID do pedido")),
    request_body = AddOrderItemPayload,
    responses(
        (status = 200, description = "Item incluído; totais recalculados", body = Order),
        (status = 400, description = "Quantidade inválida ou pedido já quitado"),
        (status = 404, description = "Pedido ou item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_order_item(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<AddOrderItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .order_service
        .add_order_item(&user.0, order_id, payload)
        .await?;
    Ok(Json(order))
}

// POST /api/orders/{order_id}/items/{order_item_id}/variations
#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/items/{order_item_id}/variations",
    tag = "Orders",
    params(
        ("order_id" = Uuid, Path, description = "ID do pedido"),
        ("order_item_id" = Uuid, Path, description = "ID da linha do pedido")
    ),
    request_body = AddItemVariationPayload,
    responses(
        (status = 200, description = "Variação aplicada; totais recalculados", body = Order),
        (status = 400, description = "Variação de outro item ou pedido já quitado"),
        (status = 404, description = "Pedido, linha ou variação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_item_variation(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path((order_id, order_item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AddItemVariationPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .order_service
        .add_item_variation(&user.0, order_id, order_item_id, payload)
        .await?;
    Ok(Json(order))
}

// POST /api/orders/{order_id}/recalculate
#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/recalculate",
    tag = "Orders",
    params(("order_id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Totais atuais (inalterados se o pedido já foi quitado)", body = Order),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn recalculate_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .order_service
        .recalculate_order_charge(&user.0, order_id)
        .await?;
    Ok(Json(order))
}

// POST /api/orders/{order_id}/close
#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/close",
    tag = "Orders",
    params(("order_id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido fechado", body = Order),
        (status = 400, description = "Status não permite fechar")
    ),
    security(("api_jwt" = []))
)]
pub async fn close_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.order_service.close_order(&user.0, order_id).await?;
    Ok(Json(order))
}
