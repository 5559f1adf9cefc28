// src/db/payments_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::orders::Payment};

// Livro-caixa é append-only: não existe UPDATE nem DELETE aqui.
#[derive(Clone, Copy, Default)]
pub struct PaymentsRepository;

impl PaymentsRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_payment<'e, E>(
        &self,
        executor: E,
        payment_id: Uuid,
    ) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(payment_id)
            .fetch_optional(executor)
            .await?;

        Ok(payment)
    }

    pub async fn list_payments<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE order_id = $1 ORDER BY created_at, id",
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;

        Ok(payments)
    }

    pub async fn insert_payment<'e, E>(
        &self,
        executor: E,
        payment: &Payment,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                id, order_id, amount, method, gateway, external_transaction_id,
                refunded_payment_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(payment.id)
        .bind(payment.order_id)
        .bind(payment.amount)
        .bind(payment.method)
        .bind(payment.gateway.as_deref())
        .bind(payment.external_transaction_id.as_deref())
        .bind(payment.refunded_payment_id)
        .bind(payment.created_at)
        .fetch_one(executor)
        .await?;

        Ok(payment)
    }
}
