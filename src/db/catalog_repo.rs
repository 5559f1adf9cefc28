// src/db/catalog_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{is_unique_violation, AppError},
    models::catalog::{Item, ItemVariation, Service, Tax},
};

#[derive(Clone, Copy, Default)]
pub struct CatalogRepository;

impl CatalogRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<Option<Item>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(executor)
            .await?;

        Ok(item)
    }

    pub async fn find_item_variation<'e, E>(
        &self,
        executor: E,
        item_variation_id: Uuid,
    ) -> Result<Option<ItemVariation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let variation =
            sqlx::query_as::<_, ItemVariation>("SELECT * FROM item_variations WHERE id = $1")
                .bind(item_variation_id)
                .fetch_optional(executor)
                .await?;

        Ok(variation)
    }

    pub async fn find_service<'e, E>(
        &self,
        executor: E,
        service_id: Uuid,
    ) -> Result<Option<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(service_id)
            .fetch_optional(executor)
            .await?;

        Ok(service)
    }

    // =========================================================================
    //  IMPOSTOS
    // =========================================================================

    pub async fn find_tax<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        category: &str,
    ) -> Result<Option<Tax>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tax = sqlx::query_as::<_, Tax>(
            "SELECT * FROM taxes WHERE business_id = $1 AND category = $2",
        )
        .bind(business_id)
        .bind(category)
        .fetch_optional(executor)
        .await?;

        Ok(tax)
    }

    pub async fn insert_tax<'e, E>(&self, executor: E, tax: &Tax) -> Result<Tax, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tax>(
            r#"
            INSERT INTO taxes (id, business_id, category, is_percentage, amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tax.id)
        .bind(tax.business_id)
        .bind(&tax.category)
        .bind(tax.is_percentage)
        .bind(tax.amount)
        .bind(tax.created_at)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // UNIQUE (business_id, category): a regra vale também na escrita
            if is_unique_violation(&e) {
                return AppError::DuplicateTax {
                    category: tax.category.clone(),
                };
            }
            e.into()
        })
    }
}
