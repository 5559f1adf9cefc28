// src/services/tax_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, money::{percent_of, round_money}},
    db::unit_of_work::{finish, Store, UnitOfWork},
    models::{
        auth::Actor,
        catalog::{CreateTaxPayload, Tax},
    },
    services::authorization::{authorize, AuthorizationGate, PermTaxesWrite},
};

/// Regra de imposto aplicável a (empresa, categoria), se houver.
pub async fn resolve_tax(
    uow: &mut dyn UnitOfWork,
    business_id: Uuid,
    category: &str,
) -> Result<Option<Tax>, AppError> {
    uow.find_tax(business_id, category).await
}

/// Imposto de UMA linha: percentual sobre a base, ou o valor fixo uma vez por linha.
pub fn line_tax(base: Decimal, tax: &Tax) -> Decimal {
    if tax.is_percentage {
        percent_of(base, tax.amount)
    } else {
        round_money(tax.amount)
    }
}

#[derive(Clone)]
pub struct TaxService {
    store: Arc<dyn Store>,
    gate: Arc<dyn AuthorizationGate>,
}

impl TaxService {
    pub fn new(store: Arc<dyn Store>, gate: Arc<dyn AuthorizationGate>) -> Self {
        Self { store, gate }
    }

    /// Cadastra a regra garantindo no máximo uma por (empresa, categoria).
    pub async fn create_tax(&self, actor: &Actor, payload: CreateTaxPayload) -> Result<Tax, AppError> {
        payload.validate()?;
        if payload.amount < Decimal::ZERO {
            return Err(AppError::Validation("O valor do imposto não pode ser negativo.".into()));
        }
        if payload.is_percentage && payload.amount > Decimal::ONE_HUNDRED {
            return Err(AppError::Validation("O percentual não pode passar de 100.".into()));
        }

        authorize::<PermTaxesWrite>(self.gate.as_ref(), actor, actor.business_id).await?;

        let mut uow = self.store.begin().await?;
        let result = Self::insert_unique(uow.as_mut(), actor.business_id, payload).await;
        finish(uow, result).await
    }

    async fn insert_unique(
        uow: &mut dyn UnitOfWork,
        business_id: Uuid,
        payload: CreateTaxPayload,
    ) -> Result<Tax, AppError> {
        // A checagem prévia dá a mensagem certa; a UNIQUE do banco cobre a corrida
        if resolve_tax(uow, business_id, &payload.category).await?.is_some() {
            return Err(AppError::DuplicateTax {
                category: payload.category,
            });
        }

        let tax = Tax {
            id: Uuid::new_v4(),
            business_id,
            category: payload.category,
            is_percentage: payload.is_percentage,
            amount: payload.amount,
            created_at: Utc::now(),
        };
        uow.insert_tax(&tax).await
    }
}
