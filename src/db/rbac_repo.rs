// src/db/rbac_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::Actor,
    services::authorization::AuthorizationGate,
};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn user_has_permission(
        &self,
        user_id: Uuid,
        business_id: Uuid,
        permission_slug: &str,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM business_members bm
                JOIN roles r ON bm.role_id = r.id
                JOIN role_permissions rp ON r.id = rp.role_id
                JOIN permissions p ON rp.permission_id = p.id
                WHERE bm.user_id = $1
                  AND bm.business_id = $2
                  AND bm.is_active = true
                  AND p.slug = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(business_id)
        .bind(permission_slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[async_trait]
impl AuthorizationGate for RbacRepository {
    async fn is_allowed(
        &self,
        actor: &Actor,
        permission: &str,
        business_id: Uuid,
    ) -> Result<bool, AppError> {
        self.user_has_permission(actor.user_id, business_id, permission).await
    }
}
