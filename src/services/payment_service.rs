// src/services/payment_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        money::{round_money, MONEY_SCALE},
    },
    db::unit_of_work::{finish, Store, UnitOfWork},
    models::{
        auth::Actor,
        orders::{OrderStatus, Payment, PaymentReceipt, RecordPaymentPayload, RecordRefundPayload},
    },
    services::authorization::{authorize, AuthorizationGate, PermPaymentsWrite},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub status: OrderStatus,
    pub tip: Decimal,
}

/// Compara o que foi pago com o devido. O excedente vira gorjeta.
pub fn settle(total_due: Decimal, paid: Decimal) -> Settlement {
    if paid < total_due {
        Settlement {
            status: OrderStatus::PartiallyPaid,
            tip: Decimal::ZERO,
        }
    } else {
        Settlement {
            status: OrderStatus::Paid,
            tip: paid - total_due,
        }
    }
}

/// Soma das capturas do pedido. Estornos (negativos) ficam fora.
pub async fn captured_total(uow: &mut dyn UnitOfWork, order_id: Uuid) -> Result<Decimal, AppError> {
    Ok(uow
        .list_payments(order_id)
        .await?
        .iter()
        .map(|p| p.amount)
        .filter(|amount| *amount > Decimal::ZERO)
        .sum())
}

/// Valor de lançamento: positivo e sem fração de centavo (NUMERIC(12,2) arredondaria).
fn ensure_money_amount(amount: Decimal) -> Result<(), AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation("O valor deve ser maior que zero.".into()));
    }
    if round_money(amount) != amount {
        return Err(AppError::Validation(format!(
            "O valor ({}) não pode ter mais de {} casas decimais.",
            amount, MONEY_SCALE
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn Store>,
    gate: Arc<dyn AuthorizationGate>,
}

impl PaymentService {
    pub fn new(store: Arc<dyn Store>, gate: Arc<dyn AuthorizationGate>) -> Self {
        Self { store, gate }
    }

    pub async fn record_payment(
        &self,
        actor: &Actor,
        order_id: Uuid,
        payload: RecordPaymentPayload,
    ) -> Result<PaymentReceipt, AppError> {
        payload.validate()?;
        ensure_money_amount(payload.amount)?;

        let mut uow = self.store.begin().await?;
        let result = self.capture(uow.as_mut(), actor, order_id, payload).await;
        let receipt = finish(uow, result).await?;

        tracing::info!(
            order_id = %order_id,
            payment_id = %receipt.payment.id,
            status = ?receipt.order.status,
            "Pagamento registrado"
        );
        Ok(receipt)
    }

    pub async fn record_refund(
        &self,
        actor: &Actor,
        payment_id: Uuid,
        payload: RecordRefundPayload,
    ) -> Result<PaymentReceipt, AppError> {
        payload.validate()?;
        // Validado ANTES de virar negativo
        ensure_money_amount(payload.amount)?;

        let mut uow = self.store.begin().await?;
        let result = self.refund(uow.as_mut(), actor, payment_id, payload.amount).await;
        let receipt = finish(uow, result).await?;

        tracing::info!(
            order_id = %receipt.order.id,
            payment_id = %payment_id,
            refund_id = %receipt.payment.id,
            "Estorno registrado"
        );
        Ok(receipt)
    }

    async fn capture(
        &self,
        uow: &mut dyn UnitOfWork,
        actor: &Actor,
        order_id: Uuid,
        payload: RecordPaymentPayload,
    ) -> Result<PaymentReceipt, AppError> {
        let mut order = uow
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Pedido", order_id))?;
        authorize::<PermPaymentsWrite>(self.gate.as_ref(), actor, order.business_id).await?;

        if matches!(order.status, OrderStatus::Closed | OrderStatus::Refunded) {
            return Err(AppError::Validation(format!(
                "O pedido está {:?} e não aceita pagamentos.",
                order.status
            )));
        }

        let payment = uow
            .insert_payment(&Payment {
                id: Uuid::new_v4(),
                order_id,
                amount: payload.amount,
                method: payload.method,
                gateway: payload.gateway,
                external_transaction_id: payload.external_transaction_id,
                refunded_payment_id: None,
                created_at: Utc::now(),
            })
            .await?;

        let paid = captured_total(uow, order_id).await?;
        let settlement = settle(order.total_due(), paid);
        order.status = settlement.status;
        order.tip_amount = settlement.tip;

        let order = uow.update_order(&order).await?;
        Ok(PaymentReceipt { payment, order })
    }

    async fn refund(
        &self,
        uow: &mut dyn UnitOfWork,
        actor: &Actor,
        payment_id: Uuid,
        amount: Decimal,
    ) -> Result<PaymentReceipt, AppError> {
        let original = uow
            .find_payment(payment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Pagamento", payment_id))?;

        let mut order = uow
            .find_order(original.order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Pedido", original.order_id))?;
        authorize::<PermPaymentsWrite>(self.gate.as_ref(), actor, order.business_id).await?;

        if original.amount < Decimal::ZERO {
            return Err(AppError::Validation("Um estorno não pode ser estornado.".into()));
        }

        // Estornos anteriores do mesmo lançamento contam para o teto
        let already_refunded: Decimal = uow
            .list_payments(order.id)
            .await?
            .iter()
            .filter(|p| p.refunded_payment_id == Some(payment_id))
            .map(|p| -p.amount)
            .sum();
        if already_refunded + amount > original.amount {
            return Err(AppError::Validation(format!(
                "O estorno ({}) não pode passar do saldo do pagamento ({} de {}).",
                amount,
                original.amount - already_refunded,
                original.amount
            )));
        }

        let payment = uow
            .insert_payment(&Payment {
                id: Uuid::new_v4(),
                order_id: order.id,
                amount: -amount,
                method: original.method,
                gateway: original.gateway.clone(),
                external_transaction_id: None,
                refunded_payment_id: Some(payment_id),
                created_at: Utc::now(),
            })
            .await?;

        order.status = OrderStatus::Refunded;
        order.closed_at.get_or_insert_with(Utc::now);

        let order = uow.update_order(&order).await?;
        Ok(PaymentReceipt { payment, order })
    }
}
