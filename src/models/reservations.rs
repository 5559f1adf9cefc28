// src/models/reservations.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::time_range::TimeRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reservation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Booked,
    Rescheduled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: Uuid,
    pub service_id: Uuid,
    pub employee_id: Uuid,
    pub customer_id: Option<Uuid>,
    // 1:1 com o pedido criado no agendamento e com a linha de serviço dele
    pub order_id: Uuid,
    pub order_service_id: Uuid,
    pub reservation_time: DateTime<Utc>,
    pub reservation_end_time: DateTime<Utc>,
    pub booked_at: DateTime<Utc>,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.reservation_time, self.reservation_end_time)
    }
}

/// Cliente deduplicado pelo telefone (comparação exata, sensível a maiúsculas).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(example = "João da Silva")]
    pub full_name: String,
    #[schema(example = "+5511999998888")]
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub service_id: Uuid,

    #[validate(length(min = 1, max = 120, message = "required"))]
    #[schema(example = "João da Silva")]
    pub customer_name: String,

    #[validate(length(min = 1, max = 32, message = "required"))]
    #[schema(example = "+5511999998888")]
    pub customer_phone: String,

    // Sempre UTC
    #[schema(example = "2030-05-14T10:00:00Z")]
    pub reservation_time: DateTime<Utc>,
}
