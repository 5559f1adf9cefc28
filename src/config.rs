// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{PgStore, RbacRepository, Store},
    services::{
        auth::AuthService,
        authorization::AuthorizationGate,
        order_service::{MissingTaxPolicy, OrderService},
        payment_service::PaymentService,
        reservation_service::ReservationService,
        schedule_service::ScheduleService,
        tax_service::TaxService,
    },
};

/// Tudo que vem do ambiente (.env incluído).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub missing_tax_policy: MissingTaxPolicy,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse().context("DB_MAX_CONNECTIONS deve ser um número")?,
            None => 5,
        };
        let acquire_secs: u64 = match lookup("DB_ACQUIRE_TIMEOUT_SECS") {
            Some(v) => v.parse().context("DB_ACQUIRE_TIMEOUT_SECS deve ser um número")?,
            None => 3,
        };
        let missing_tax_policy = match lookup("MISSING_TAX_POLICY") {
            Some(v) => v.parse().map_err(anyhow::Error::msg)?,
            None => MissingTaxPolicy::default(),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
            missing_tax_policy,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub order_service: OrderService,
    pub payment_service: PaymentService,
    pub reservation_service: ReservationService,
    pub schedule_service: ScheduleService,
    pub tax_service: TaxService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(settings.db_acquire_timeout)
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let store: Arc<dyn Store> = Arc::new(PgStore::new(db_pool.clone()));
        let gate: Arc<dyn AuthorizationGate> = Arc::new(RbacRepository::new(db_pool.clone()));

        Ok(Self {
            auth_service: AuthService::new(settings.jwt_secret.clone()),
            order_service: OrderService::new(
                store.clone(),
                gate.clone(),
                settings.missing_tax_policy,
            ),
            payment_service: PaymentService::new(store.clone(), gate.clone()),
            reservation_service: ReservationService::new(store.clone(), gate.clone()),
            schedule_service: ScheduleService::new(store.clone(), gate.clone()),
            tax_service: TaxService::new(store, gate),
            db_pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let s = settings(&[("DATABASE_URL", "postgres://localhost/pos"), ("JWT_SECRET", "x")]).unwrap();
        assert_eq!(s.bind_addr, "0.0.0.0:3000");
        assert_eq!(s.db_max_connections, 5);
        assert_eq!(s.db_acquire_timeout, Duration::from_secs(3));
        assert_eq!(s.missing_tax_policy, MissingTaxPolicy::LineZero);
    }

    #[test]
    fn required_vars_and_bad_values_fail() {
        assert!(settings(&[("JWT_SECRET", "x")]).is_err());
        assert!(settings(&[
            ("DATABASE_URL", "postgres://localhost/pos"),
            ("JWT_SECRET", "x"),
            ("MISSING_TAX_POLICY", "ignore"),
        ])
        .is_err());

        let s = settings(&[
            ("DATABASE_URL", "postgres://localhost/pos"),
            ("JWT_SECRET", "x"),
            ("MISSING_TAX_POLICY", "reset-order"),
            ("DB_MAX_CONNECTIONS", "20"),
        ])
        .unwrap();
        assert_eq!(s.missing_tax_policy, MissingTaxPolicy::ResetOrder);
        assert_eq!(s.db_max_connections, 20);
    }
}
