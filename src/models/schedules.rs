// src/models/schedules.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::time_range::TimeRange;

/// Turno de trabalho de um funcionário.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchedulePayload {
    pub user_id: Uuid,
    #[schema(example = "2030-05-14T09:00:00Z")]
    pub start_time: DateTime<Utc>,
    #[schema(example = "2030-05-14T17:00:00Z")]
    pub end_time: DateTime<Utc>,
}
