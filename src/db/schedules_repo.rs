// src/db/schedules_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, time_range::TimeRange},
    models::schedules::Schedule,
};

#[derive(Clone, Copy, Default)]
pub struct SchedulesRepository;

impl SchedulesRepository {
    pub fn new() -> Self {
        Self
    }

    /// Turnos do funcionário que encostam no intervalo (bordas incluídas).
    /// Quem chama decide se quer inclusão ou exclusão.
    pub async fn list_for_user_around<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Schedule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let schedules = sqlx::query_as::<_, Schedule>(
            r#"
            SELECT * FROM schedules
            WHERE user_id = $1
              AND start_time <= $3
              AND end_time >= $2
            ORDER BY start_time
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(executor)
        .await?;

        Ok(schedules)
    }

    pub async fn insert_schedule<'e, E>(
        &self,
        executor: E,
        schedule: &Schedule,
    ) -> Result<Schedule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedules (id, user_id, start_time, end_time, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(schedule.id)
        .bind(schedule.user_id)
        .bind(schedule.start_time)
        .bind(schedule.end_time)
        .bind(schedule.created_at)
        .fetch_one(executor)
        .await?;

        Ok(schedule)
    }
}
