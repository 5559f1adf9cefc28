// src/models/catalog.rs

// Catálogo é somente leitura para o núcleo financeiro (exceto o cadastro de impostos).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub business_id: Uuid,
    #[schema(example = "Pomada Modeladora")]
    pub name: String,
    #[schema(example = "COSMETICS")]
    pub category: String,
    #[schema(example = "25.00")]
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemVariation {
    pub id: Uuid,
    pub item_id: Uuid,
    #[schema(example = "Tamanho Grande")]
    pub name: String,
    #[schema(example = "3.50")]
    pub additional_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub business_id: Uuid,
    pub employee_id: Uuid,
    #[schema(example = "Corte Masculino")]
    pub name: String,
    #[schema(example = "80.00")]
    pub base_price: Decimal,
    #[schema(example = 30)]
    pub duration_in_minutes: i32,
    #[schema(example = "HAIRCUT")]
    pub category: String,
}

/// Regra de imposto por (empresa, categoria). No máximo uma por par.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tax {
    pub id: Uuid,
    pub business_id: Uuid,
    #[schema(example = "HAIRCUT")]
    pub category: String,
    pub is_percentage: bool,
    // Percentual (10 = 10%) ou valor fixo por linha
    #[schema(example = "10.0")]
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaxPayload {
    #[validate(length(min = 1, max = 64, message = "required"))]
    #[schema(example = "HAIRCUT")]
    pub category: String,

    #[schema(example = true)]
    pub is_percentage: bool,

    #[schema(example = "10.0")]
    pub amount: Decimal,
}
