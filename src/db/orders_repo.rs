// src/db/orders_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::orders::{Order, OrderItem, OrderItemLine, OrderItemVariation, OrderService},
};

// Sem pool próprio: toda chamada recebe o executor da transação aberta pelo UnitOfWork.
#[derive(Clone, Copy, Default)]
pub struct OrdersRepository;

impl OrdersRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  PEDIDOS
    // =========================================================================

    // FOR UPDATE: quem recalcula ou registra pagamento segura a linha até o commit
    pub async fn find_order_for_update<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(executor)
            .await?;

        Ok(order)
    }

    pub async fn insert_order<'e, E>(&self, executor: E, order: &Order) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                id, business_id, owner_user_id, status,
                charge_amount, tax_amount, discount_amount, tip_amount,
                discount_id, created_at, closed_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(order.id)
        .bind(order.business_id)
        .bind(order.owner_user_id)
        .bind(order.status)
        .bind(order.charge_amount)
        .bind(order.tax_amount)
        .bind(order.discount_amount)
        .bind(order.tip_amount)
        .bind(order.discount_id)
        .bind(order.created_at)
        .bind(order.closed_at)
        .bind(order.updated_at)
        .fetch_one(executor)
        .await?;

        Ok(order)
    }

    pub async fn update_order<'e, E>(&self, executor: E, order: &Order) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $2,
                charge_amount = $3,
                tax_amount = $4,
                discount_amount = $5,
                tip_amount = $6,
                discount_id = $7,
                closed_at = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(order.id)
        .bind(order.status)
        .bind(order.charge_amount)
        .bind(order.tax_amount)
        .bind(order.discount_amount)
        .bind(order.tip_amount)
        .bind(order.discount_id)
        .bind(order.closed_at)
        .fetch_optional(executor)
        .await?;

        updated.ok_or_else(|| AppError::not_found("Pedido", order.id))
    }

    // =========================================================================
    //  ITENS & VARIAÇÕES
    // =========================================================================

    pub async fn list_order_items<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<OrderItemLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // A categoria vem do catálogo: é ela que decide qual imposto se aplica
        let lines = sqlx::query_as::<_, OrderItemLine>(
            r#"
            SELECT oi.*, i.category
            FROM order_items oi
            JOIN items i ON i.id = oi.item_id
            WHERE oi.order_id = $1
            ORDER BY oi.created_at, oi.id
            "#,
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;

        Ok(lines)
    }

    pub async fn find_order_item<'e, E>(
        &self,
        executor: E,
        order_item_id: Uuid,
    ) -> Result<Option<OrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE id = $1")
            .bind(order_item_id)
            .fetch_optional(executor)
            .await?;

        Ok(item)
    }

    pub async fn insert_order_item<'e, E>(
        &self,
        executor: E,
        item: &OrderItem,
    ) -> Result<OrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (id, order_id, item_id, quantity, unit_price, tax_amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(item.id)
        .bind(item.order_id)
        .bind(item.item_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.tax_amount)
        .bind(item.created_at)
        .fetch_one(executor)
        .await?;

        Ok(item)
    }

    pub async fn list_order_item_variations<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<OrderItemVariation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let variations = sqlx::query_as::<_, OrderItemVariation>(
            r#"
            SELECT v.*
            FROM order_item_variations v
            JOIN order_items oi ON oi.id = v.order_item_id
            WHERE oi.order_id = $1
            ORDER BY v.created_at, v.id
            "#,
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;

        Ok(variations)
    }

    pub async fn insert_order_item_variation<'e, E>(
        &self,
        executor: E,
        variation: &OrderItemVariation,
    ) -> Result<OrderItemVariation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let variation = sqlx::query_as::<_, OrderItemVariation>(
            r#"
            INSERT INTO order_item_variations (
                id, order_item_id, item_variation_id, quantity, additional_price, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(variation.id)
        .bind(variation.order_item_id)
        .bind(variation.item_variation_id)
        .bind(variation.quantity)
        .bind(variation.additional_price)
        .bind(variation.created_at)
        .fetch_one(executor)
        .await?;

        Ok(variation)
    }

    // =========================================================================
    //  SERVIÇOS
    // =========================================================================

    pub async fn list_order_services<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<OrderService>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let services = sqlx::query_as::<_, OrderService>(
            "SELECT * FROM order_services WHERE order_id = $1 ORDER BY created_at, id",
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;

        Ok(services)
    }

    pub async fn find_order_service<'e, E>(
        &self,
        executor: E,
        order_service_id: Uuid,
    ) -> Result<Option<OrderService>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, OrderService>("SELECT * FROM order_services WHERE id = $1")
            .bind(order_service_id)
            .fetch_optional(executor)
            .await?;

        Ok(service)
    }

    pub async fn insert_order_service<'e, E>(
        &self,
        executor: E,
        line: &OrderService,
    ) -> Result<OrderService, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let line = sqlx::query_as::<_, OrderService>(
            r#"
            INSERT INTO order_services (
                id, order_id, service_id, duration_in_minutes, charge, tax, total, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(line.id)
        .bind(line.order_id)
        .bind(line.service_id)
        .bind(line.duration_in_minutes)
        .bind(line.charge)
        .bind(line.tax)
        .bind(line.total)
        .bind(line.created_at)
        .fetch_one(executor)
        .await?;

        Ok(line)
    }

    pub async fn delete_order_service<'e, E>(
        &self,
        executor: E,
        order_service_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM order_services WHERE id = $1")
            .bind(order_service_id)
            .execute(executor)
            .await?;

        Ok(())
    }
}
