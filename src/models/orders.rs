// src/models/orders.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums ---

/// Open -> {Closed, Paid, PartiallyPaid, Refunded}.
/// PartiallyPaid pode voltar a receber pagamentos e virar Paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    Closed,
    Paid,
    PartiallyPaid,
    Refunded,
}

impl OrderStatus {
    /// Pedido "quitado": os totais não podem mais ser recalculados.
    pub fn is_settled(self) -> bool {
        matches!(self, OrderStatus::Closed | OrderStatus::Paid | OrderStatus::Refunded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Other,
}

// --- Agregado ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub business_id: Uuid,
    pub owner_user_id: Uuid,
    pub status: OrderStatus,
    #[schema(example = "100.00")]
    pub charge_amount: Decimal,
    #[schema(example = "10.00")]
    pub tax_amount: Decimal,
    #[schema(example = "0.00")]
    pub discount_amount: Decimal,
    #[schema(example = "0.00")]
    pub tip_amount: Decimal,
    pub discount_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Pedido novo, aberto e zerado.
    pub fn open(business_id: Uuid, owner_user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            business_id,
            owner_user_id,
            status: OrderStatus::Open,
            charge_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            tip_amount: Decimal::ZERO,
            discount_id: None,
            created_at: now,
            closed_at: None,
            updated_at: now,
        }
    }

    pub fn total_due(&self) -> Decimal {
        self.charge_amount + self.tax_amount
    }
}

// --- Linhas ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Uuid,
    #[schema(example = 2)]
    pub quantity: i32,
    // Preço do catálogo congelado no momento da inclusão
    #[schema(example = "25.00")]
    pub unit_price: Decimal,
    pub tax_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemVariation {
    pub id: Uuid,
    pub order_item_id: Uuid,
    pub item_variation_id: Uuid,
    #[schema(example = 1)]
    pub quantity: i32,
    #[schema(example = "3.50")]
    pub additional_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderService {
    pub id: Uuid,
    pub order_id: Uuid,
    pub service_id: Uuid,
    #[schema(example = 30)]
    pub duration_in_minutes: i32,
    #[schema(example = "80.00")]
    pub charge: Decimal,
    #[schema(example = "8.00")]
    pub tax: Decimal,
    #[schema(example = "88.00")]
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Linha de item com a categoria do item do catálogo (JOIN), usada para resolver o imposto.
#[derive(Debug, Clone, FromRow)]
pub struct OrderItemLine {
    #[sqlx(flatten)]
    pub item: OrderItem,
    pub category: String,
}

// --- Pagamentos ---

/// Lançamento no livro-caixa do pedido. Valor negativo = estorno.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    #[schema(example = "110.00")]
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[schema(example = "stone")]
    pub gateway: Option<String>,
    pub external_transaction_id: Option<String>,
    /// Preenchido só em estornos: o lançamento positivo que está sendo devolvido.
    pub refunded_payment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Resposta do livro-caixa: o lançamento e o pedido com o status já derivado.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub order: Order,
}

// --- Visão completa do agregado ---

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub category: String,
    pub variations: Vec<OrderItemVariation>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub header: Order,
    pub items: Vec<OrderItemDetail>,
    pub services: Vec<OrderService>,
    pub payments: Vec<Payment>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddOrderItemPayload {
    pub item_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    #[schema(example = 2)]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddItemVariationPayload {
    pub item_variation_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    #[schema(example = 1)]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentPayload {
    #[schema(example = "110.00")]
    pub amount: Decimal,

    pub method: PaymentMethod,

    #[validate(length(max = 64))]
    pub gateway: Option<String>,

    #[validate(length(max = 128))]
    pub external_transaction_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordRefundPayload {
    #[schema(example = "50.00")]
    pub amount: Decimal,
}
