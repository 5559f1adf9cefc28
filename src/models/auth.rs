// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quem está executando a operação. Passado explicitamente para cada serviço,
/// nunca lido de um estado global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub business_id: Uuid,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: Uuid,         // Subject (ID do usuário)
    pub business_id: Uuid, // Empresa em que o usuário está operando
    pub exp: usize,        // Expiration time (quando o token expira)
    pub iat: usize,        // Issued At (quando o token foi criado)
}

impl From<&Claims> for Actor {
    fn from(claims: &Claims) -> Self {
        Actor {
            user_id: claims.sub,
            business_id: claims.business_id,
        }
    }
}
