// src/db/reservations_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, time_range::TimeRange},
    models::reservations::{Customer, Reservation},
};

#[derive(Clone, Copy, Default)]
pub struct ReservationsRepository;

impl ReservationsRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  RESERVAS
    // =========================================================================

    pub async fn find_reservation_for_update<'e, E>(
        &self,
        executor: E,
        reservation_id: Uuid,
    ) -> Result<Option<Reservation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reservation =
            sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1 FOR UPDATE")
                .bind(reservation_id)
                .fetch_optional(executor)
                .await?;

        Ok(reservation)
    }

    /// Reservas do serviço cujo `[início, fim)` cruza o intervalo pedido.
    pub async fn list_overlapping_for_service<'e, E>(
        &self,
        executor: E,
        service_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Reservation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT * FROM reservations
            WHERE service_id = $1
              AND reservation_time < $3
              AND reservation_end_time > $2
            ORDER BY reservation_time
            "#,
        )
        .bind(service_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(executor)
        .await?;

        Ok(reservations)
    }

    /// Mesma busca, pela agenda do funcionário (qualquer serviço).
    pub async fn list_overlapping_for_employee<'e, E>(
        &self,
        executor: E,
        employee_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Reservation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT * FROM reservations
            WHERE employee_id = $1
              AND reservation_time < $3
              AND reservation_end_time > $2
            ORDER BY reservation_time
            "#,
        )
        .bind(employee_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(executor)
        .await?;

        Ok(reservations)
    }

    pub async fn insert_reservation<'e, E>(
        &self,
        executor: E,
        reservation: &Reservation,
    ) -> Result<Reservation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (
                id, service_id, employee_id, customer_id, order_id, order_service_id,
                reservation_time, reservation_end_time, booked_at, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.service_id)
        .bind(reservation.employee_id)
        .bind(reservation.customer_id)
        .bind(reservation.order_id)
        .bind(reservation.order_service_id)
        .bind(reservation.reservation_time)
        .bind(reservation.reservation_end_time)
        .bind(reservation.booked_at)
        .bind(reservation.status)
        .fetch_one(executor)
        .await?;

        Ok(reservation)
    }

    pub async fn update_reservation<'e, E>(
        &self,
        executor: E,
        reservation: &Reservation,
    ) -> Result<Reservation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET customer_id = $2,
                reservation_time = $3,
                reservation_end_time = $4,
                status = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.customer_id)
        .bind(reservation.reservation_time)
        .bind(reservation.reservation_end_time)
        .bind(reservation.status)
        .fetch_optional(executor)
        .await?;

        updated.ok_or_else(|| AppError::not_found("Reserva", reservation.id))
    }

    pub async fn delete_reservation<'e, E>(
        &self,
        executor: E,
        reservation_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(reservation_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn find_customer_by_phone<'e, E>(
        &self,
        executor: E,
        phone: &str,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Comparação exata: "+55 11" e "+5511" são clientes diferentes
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE phone = $1")
            .bind(phone)
            .fetch_optional(executor)
            .await?;

        Ok(customer)
    }

    pub async fn insert_customer<'e, E>(
        &self,
        executor: E,
        customer: &Customer,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (id, full_name, phone, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(customer.id)
        .bind(&customer.full_name)
        .bind(&customer.phone)
        .bind(customer.created_at)
        .fetch_one(executor)
        .await?;

        Ok(customer)
    }
}
