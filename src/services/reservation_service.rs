// src/services/reservation_service.rs

//! Agendamento de serviços.
//!
//! Um agendamento cria, numa única transação: o cliente (se o telefone é novo),
//! um pedido aberto, a linha de serviço desse pedido e a reserva. Antes de
//! qualquer escrita as três regras de conflito são avaliadas juntas; se alguma
//! falhar nada é gravado.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{AppError, BookingConflict},
        time_range::TimeRange,
    },
    db::unit_of_work::{finish, Store, UnitOfWork},
    models::{
        auth::Actor,
        catalog::Service,
        orders::{Order, OrderService as ServiceLine, OrderStatus},
        reservations::{Customer, Reservation, ReservationRequest, ReservationStatus},
    },
    services::{
        authorization::{authorize, AuthorizationGate, PermReservationsWrite},
        payment_service::{captured_total, settle},
        tax_service::{line_tax, resolve_tax},
    },
};

#[derive(Clone)]
pub struct ReservationService {
    store: Arc<dyn Store>,
    gate: Arc<dyn AuthorizationGate>,
}

impl ReservationService {
    pub fn new(store: Arc<dyn Store>, gate: Arc<dyn AuthorizationGate>) -> Self {
        Self { store, gate }
    }

    pub async fn create_reservation(
        &self,
        actor: &Actor,
        request: ReservationRequest,
    ) -> Result<Reservation, AppError> {
        validate_request(&request)?;
        authorize::<PermReservationsWrite>(self.gate.as_ref(), actor, actor.business_id).await?;

        // "Passado" é relativo ao início da transação
        let now = Utc::now();

        let mut uow = self.store.begin().await?;
        let result = self.book(uow.as_mut(), actor, &request, now).await;
        let reservation = finish(uow, result).await?;

        tracing::info!(
            reservation_id = %reservation.id,
            order_id = %reservation.order_id,
            service_id = %reservation.service_id,
            "Reserva criada"
        );
        Ok(reservation)
    }

    /// Remarca (e/ou troca o cliente). Não recria pedido nem linha de serviço.
    pub async fn update_reservation(
        &self,
        actor: &Actor,
        reservation_id: Uuid,
        request: ReservationRequest,
    ) -> Result<Reservation, AppError> {
        validate_request(&request)?;
        authorize::<PermReservationsWrite>(self.gate.as_ref(), actor, actor.business_id).await?;

        let now = Utc::now();

        let mut uow = self.store.begin().await?;
        let result = self
            .reschedule(uow.as_mut(), actor, reservation_id, &request, now)
            .await;
        let reservation = finish(uow, result).await?;

        tracing::info!(
            reservation_id = %reservation.id,
            start = %reservation.reservation_time,
            "Reserva remarcada"
        );
        Ok(reservation)
    }

    /// Remove a reserva e a linha de serviço que ela criou, abatendo os valores
    /// do pedido. Pedido quitado não é tocado.
    pub async fn delete_reservation(&self, actor: &Actor, reservation_id: Uuid) -> Result<(), AppError> {
        authorize::<PermReservationsWrite>(self.gate.as_ref(), actor, actor.business_id).await?;

        let mut uow = self.store.begin().await?;
        let result = self.cancel(uow.as_mut(), actor, reservation_id).await;
        finish(uow, result).await?;

        tracing::info!(%reservation_id, "Reserva removida");
        Ok(())
    }

    // =========================================================================
    //  PASSOS (dentro da transação)
    // =========================================================================

    async fn book(
        &self,
        uow: &mut dyn UnitOfWork,
        actor: &Actor,
        request: &ReservationRequest,
        now: DateTime<Utc>,
    ) -> Result<Reservation, AppError> {
        let service = find_business_service(uow, actor, request.service_id).await?;
        let slot = TimeRange::starting_at(request.reservation_time, service.duration_in_minutes);

        let conflict = check_slot(uow, &service, slot, None, now).await?;
        reject_conflict(conflict, &service, slot)?;

        let customer = resolve_customer(uow, &request.customer_name, &request.customer_phone).await?;

        let mut order = uow
            .insert_order(&Order::open(actor.business_id, actor.user_id, now))
            .await?;

        let service_tax = resolve_tax(uow, service.business_id, &service.category)
            .await?
            .map(|rule| line_tax(service.base_price, &rule))
            .unwrap_or(Decimal::ZERO);

        let line = uow
            .insert_order_service(&ServiceLine {
                id: Uuid::new_v4(),
                order_id: order.id,
                service_id: service.id,
                duration_in_minutes: service.duration_in_minutes,
                charge: service.base_price,
                tax: service_tax,
                total: service.base_price + service_tax,
                created_at: now,
            })
            .await?;

        let reservation = uow
            .insert_reservation(&Reservation {
                id: Uuid::new_v4(),
                service_id: service.id,
                employee_id: service.employee_id,
                customer_id: Some(customer.id),
                order_id: order.id,
                order_service_id: line.id,
                reservation_time: slot.start,
                reservation_end_time: slot.end,
                booked_at: now,
                status: ReservationStatus::Booked,
            })
            .await?;

        order.charge_amount += line.charge;
        order.tax_amount += line.tax;
        uow.update_order(&order).await?;

        Ok(reservation)
    }

    async fn reschedule(
        &self,
        uow: &mut dyn UnitOfWork,
        actor: &Actor,
        reservation_id: Uuid,
        request: &ReservationRequest,
        now: DateTime<Utc>,
    ) -> Result<Reservation, AppError> {
        let mut reservation = uow
            .find_reservation(reservation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Reserva", reservation_id))?;

        if request.service_id != reservation.service_id {
            return Err(AppError::Validation(
                "Não é possível trocar o serviço de uma reserva; cancele e agende de novo.".into(),
            ));
        }

        let service = find_business_service(uow, actor, reservation.service_id).await?;
        let slot = TimeRange::starting_at(request.reservation_time, service.duration_in_minutes);

        let conflict = check_slot(uow, &service, slot, Some(reservation.id), now).await?;
        reject_conflict(conflict, &service, slot)?;

        let customer = resolve_customer(uow, &request.customer_name, &request.customer_phone).await?;

        reservation.reservation_time = slot.start;
        reservation.reservation_end_time = slot.end;
        reservation.customer_id = Some(customer.id);
        reservation.status = ReservationStatus::Rescheduled;

        uow.update_reservation(&reservation).await
    }

    async fn cancel(
        &self,
        uow: &mut dyn UnitOfWork,
        actor: &Actor,
        reservation_id: Uuid,
    ) -> Result<(), AppError> {
        let reservation = uow
            .find_reservation(reservation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Reserva", reservation_id))?;
        find_business_service(uow, actor, reservation.service_id).await?;

        let mut order = uow
            .find_order(reservation.order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Pedido", reservation.order_id))?;

        // A reserva aponta para a linha: sai primeiro
        uow.delete_reservation(reservation.id).await?;

        if order.status.is_settled() {
            tracing::debug!(order_id = %order.id, "Pedido quitado, valores mantidos");
            return Ok(());
        }

        if let Some(line) = uow.find_order_service(reservation.order_service_id).await? {
            order.charge_amount = (order.charge_amount - line.charge).max(Decimal::ZERO);
            order.tax_amount = (order.tax_amount - line.tax).max(Decimal::ZERO);
            uow.delete_order_service(line.id).await?;

            // O que já foi pago pode ter passado a cobrir o novo total
            if order.status == OrderStatus::PartiallyPaid {
                let paid = captured_total(uow, order.id).await?;
                let settlement = settle(order.total_due(), paid);
                order.status = settlement.status;
                order.tip_amount = settlement.tip;
            }
            uow.update_order(&order).await?;
        }

        Ok(())
    }
}

// =========================================================================
//  REGRAS
// =========================================================================

fn validate_request(request: &ReservationRequest) -> Result<(), AppError> {
    request.validate()?;
    if request.customer_name.trim().is_empty() || request.customer_phone.trim().is_empty() {
        return Err(AppError::Validation(
            "Nome e telefone do cliente são obrigatórios.".into(),
        ));
    }
    Ok(())
}

/// Serviço de outra empresa é tratado como inexistente.
async fn find_business_service(
    uow: &mut dyn UnitOfWork,
    actor: &Actor,
    service_id: Uuid,
) -> Result<Service, AppError> {
    uow.find_service(service_id)
        .await?
        .filter(|s| s.business_id == actor.business_id)
        .ok_or_else(|| AppError::not_found("Serviço", service_id))
}

/// Avalia as três regras sem parar na primeira.
async fn check_slot(
    uow: &mut dyn UnitOfWork,
    service: &Service,
    slot: TimeRange,
    ignoring: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<BookingConflict, AppError> {
    // Disponibilidade é inclusão: o horário inteiro tem que caber num turno
    let shifts = uow.list_employee_schedules(service.employee_id, slot).await?;
    let employee_unavailable = !shifts.iter().any(|s| s.time_range().contains(&slot));

    // Sobreposição vale para o serviço e para a agenda do funcionário
    let mut taken = uow.list_service_reservations(service.id, slot).await?;
    taken.extend(uow.list_employee_reservations(service.employee_id, slot).await?);
    let time_overlap = taken
        .iter()
        .filter(|r| Some(r.id) != ignoring)
        .any(|r| r.time_range().overlaps(&slot));

    Ok(BookingConflict {
        employee_unavailable,
        time_overlap,
        time_in_past: slot.start < now,
    })
}

fn reject_conflict(conflict: BookingConflict, service: &Service, slot: TimeRange) -> Result<(), AppError> {
    if conflict.is_empty() {
        return Ok(());
    }
    tracing::warn!(
        service_id = %service.id,
        employee_id = %service.employee_id,
        start = %slot.start,
        employee_unavailable = conflict.employee_unavailable,
        time_overlap = conflict.time_overlap,
        time_in_past = conflict.time_in_past,
        "Agendamento recusado"
    );
    Err(AppError::Conflict(conflict))
}

/// Telefone é a chave (comparação exata). Cliente existente mantém o nome cadastrado.
async fn resolve_customer(
    uow: &mut dyn UnitOfWork,
    full_name: &str,
    phone: &str,
) -> Result<Customer, AppError> {
    if let Some(customer) = uow.find_customer_by_phone(phone).await? {
        return Ok(customer);
    }

    uow.insert_customer(&Customer {
        id: Uuid::new_v4(),
        full_name: full_name.trim().to_string(),
        phone: phone.to_string(),
        created_at: Utc::now(),
    })
    .await
}
