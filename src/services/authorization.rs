// src/services/authorization.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::Actor};

/// O que é uma permissão: um slug "recurso:ação".
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// Portão de autorização externo: sim ou não para (ator, permissão, empresa).
#[async_trait]
pub trait AuthorizationGate: Send + Sync {
    async fn is_allowed(
        &self,
        actor: &Actor,
        permission: &str,
        business_id: Uuid,
    ) -> Result<bool, AppError>;
}

/// Chamado antes de toda mutação. Negado = rejeição imediata.
pub async fn authorize<P: PermissionDef>(
    gate: &dyn AuthorizationGate,
    actor: &Actor,
    business_id: Uuid,
) -> Result<(), AppError> {
    let required_perm = P::slug();

    if !gate.is_allowed(actor, required_perm, business_id).await? {
        tracing::warn!(
            user_id = %actor.user_id,
            %business_id,
            permission = required_perm,
            "Acesso negado"
        );
        return Err(AppError::Unauthorized(format!(
            "Você precisa da permissão '{}' para realizar esta ação.",
            required_perm
        )));
    }

    Ok(())
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermOrdersWrite;
impl PermissionDef for PermOrdersWrite {
    fn slug() -> &'static str { "orders:write" }
}

pub struct PermOrdersRead;
impl PermissionDef for PermOrdersRead {
    fn slug() -> &'static str { "orders:read" }
}

pub struct PermPaymentsWrite;
impl PermissionDef for PermPaymentsWrite {
    fn slug() -> &'static str { "payments:write" }
}

pub struct PermReservationsWrite;
impl PermissionDef for PermReservationsWrite {
    fn slug() -> &'static str { "reservations:write" }
}

pub struct PermSchedulesWrite;
impl PermissionDef for PermSchedulesWrite {
    fn slug() -> &'static str { "schedules:write" }
}

pub struct PermTaxesWrite;
impl PermissionDef for PermTaxesWrite {
    fn slug() -> &'static str { "taxes:write" }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Libera tudo, exceto os slugs listados.
    pub struct StaticGate {
        pub denied: Vec<&'static str>,
    }

    impl StaticGate {
        pub fn allow_all() -> Self {
            Self { denied: vec![] }
        }

        pub fn denying(slug: &'static str) -> Self {
            Self { denied: vec![slug] }
        }
    }

    #[async_trait]
    impl AuthorizationGate for StaticGate {
        async fn is_allowed(
            &self,
            _actor: &Actor,
            permission: &str,
            _business_id: Uuid,
        ) -> Result<bool, AppError> {
            Ok(!self.denied.contains(&permission))
        }
    }

    #[tokio::test]
    async fn denied_permission_becomes_unauthorized() {
        let actor = Actor {
            user_id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
        };
        let gate = StaticGate::denying("payments:write");

        let err = authorize::<PermPaymentsWrite>(&gate, &actor, actor.business_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref msg) if msg.contains("payments:write")));

        assert!(authorize::<PermOrdersWrite>(&gate, &actor, actor.business_id).await.is_ok());
    }
}
