// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

// Códigos SQLSTATE do Postgres que indicam disputa entre transações concorrentes
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const EXCLUSION_VIOLATION: &str = "23P01";

/// As três regras do agendamento. Todas são avaliadas antes de recusar,
/// para o cliente ver de uma vez tudo o que falhou.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingConflict {
    pub employee_unavailable: bool,
    pub time_overlap: bool,
    pub time_in_past: bool,
}

impl BookingConflict {
    pub fn is_empty(&self) -> bool {
        !(self.employee_unavailable || self.time_overlap || self.time_in_past)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Recurso não encontrado: {0}")]
    NotFound(String),

    #[error("Acesso negado: {0}")]
    Unauthorized(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Dados inválidos: {0}")]
    Validation(String),

    #[error("Erro de validação")]
    InvalidPayload(#[from] validator::ValidationErrors),

    #[error("Conflito de agendamento")]
    Conflict(BookingConflict),

    #[error("O funcionário já tem um turno que se sobrepõe a este ({0})")]
    ShiftOverlap(uuid::Uuid),

    #[error("Já existe um imposto para a categoria '{category}' nesta empresa")]
    DuplicateTax { category: String },

    // Nunca tentamos de novo aqui: a política de retry é do chamador
    #[error("Conflito de concorrência: {0}")]
    Concurrency(String),

    #[error("Erro de banco de dados")]
    Database(sqlx::Error),

    #[error("Erro interno do servidor")]
    Internal(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{} {}", what, id))
    }
}

// Sem `#[from]` aqui: precisamos olhar o SQLSTATE antes de decidir a variante.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            match db_err.code().as_deref() {
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                    return AppError::Concurrency(
                        "A transação foi abortada por outra operação simultânea.".into(),
                    );
                }
                Some(EXCLUSION_VIOLATION) => {
                    return AppError::Concurrency(
                        "Outro agendamento ocupou este horário ao mesmo tempo.".into(),
                    );
                }
                _ => {}
            }
        }
        AppError::Database(e)
    }
}

/// Útil nos repositórios que precisam tratar a violação de unicidade à parte.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidPayload(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::Conflict(conflict) => {
                let body = Json(json!({
                    "error": "O horário solicitado não pode ser reservado.",
                    "details": conflict,
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }
            AppError::NotFound(ref what) => (StatusCode::NOT_FOUND, what.clone()),
            AppError::Unauthorized(ref why) => (StatusCode::FORBIDDEN, why.clone()),
            AppError::InvalidToken | AppError::Jwt(_) => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::Validation(ref why) => (StatusCode::BAD_REQUEST, why.clone()),
            ref e @ (AppError::DuplicateTax { .. } | AppError::ShiftOverlap(_)) => {
                (StatusCode::CONFLICT, e.to_string())
            }
            AppError::Concurrency(ref why) => (StatusCode::CONFLICT, why.clone()),

            // Database e Internal viram 500. O detalhe só vai para o log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_conflict_has_no_flags() {
        assert!(BookingConflict::default().is_empty());
        let conflict = BookingConflict {
            time_in_past: true,
            ..Default::default()
        };
        assert!(!conflict.is_empty());
    }

    #[test]
    fn conflict_maps_to_409() {
        let response = AppError::Conflict(BookingConflict {
            employee_unavailable: true,
            time_overlap: true,
            time_in_past: false,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn taxonomy_maps_to_distinct_statuses() {
        assert_eq!(
            AppError::not_found("Pedido", 1).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("orders:write".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Validation("valor deve ser positivo".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Concurrency("retry".into()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound)
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn row_not_found_is_a_database_error() {
        assert!(matches!(
            AppError::from(sqlx::Error::RowNotFound),
            AppError::Database(_)
        ));
    }
}
