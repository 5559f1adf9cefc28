// src/services/schedule_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{error::AppError, time_range::TimeRange},
    db::unit_of_work::{finish, Store},
    models::{
        auth::Actor,
        schedules::{CreateSchedulePayload, Schedule},
    },
    services::authorization::{authorize, AuthorizationGate, PermSchedulesWrite},
};

/// Teste de EXCLUSÃO entre turnos do mesmo funcionário.
///
/// Encostar na borda (um termina às 12:00, o outro começa às 12:00) não é colisão.
/// Não confundir com a disponibilidade do agendamento, que é um teste de inclusão
/// (`TimeRange::contains`).
pub fn shifts_collide(existing: &TimeRange, new: &TimeRange) -> bool {
    let starts_inside = existing.start <= new.start && existing.end > new.start;
    let ends_inside = existing.start < new.end && existing.end >= new.end;
    let swallows = new.start <= existing.start && new.end >= existing.end;

    starts_inside || ends_inside || swallows
}

#[derive(Clone)]
pub struct ScheduleService {
    store: Arc<dyn Store>,
    gate: Arc<dyn AuthorizationGate>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn Store>, gate: Arc<dyn AuthorizationGate>) -> Self {
        Self { store, gate }
    }

    pub async fn add_schedule(
        &self,
        actor: &Actor,
        payload: CreateSchedulePayload,
    ) -> Result<Schedule, AppError> {
        let range = TimeRange::new(payload.start_time, payload.end_time);
        if range.is_empty() {
            return Err(AppError::Validation(
                "O fim do turno deve ser depois do início.".into(),
            ));
        }
        authorize::<PermSchedulesWrite>(self.gate.as_ref(), actor, actor.business_id).await?;

        let mut uow = self.store.begin().await?;
        let result = async {
            let existing = uow.list_employee_schedules(payload.user_id, range).await?;
            if let Some(clash) = existing
                .iter()
                .find(|s| shifts_collide(&s.time_range(), &range))
            {
                return Err(AppError::ShiftOverlap(clash.id));
            }

            uow.insert_schedule(&Schedule {
                id: Uuid::new_v4(),
                user_id: payload.user_id,
                start_time: payload.start_time,
                end_time: payload.end_time,
                created_at: Utc::now(),
            })
            .await
        }
        .await;

        let schedule = finish(uow, result).await?;
        tracing::info!(
            schedule_id = %schedule.id,
            user_id = %schedule.user_id,
            "Turno cadastrado"
        );
        Ok(schedule)
    }
}
