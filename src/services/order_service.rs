// src/services/order_service.rs

use std::{
    collections::{BTreeSet, HashMap},
    str::FromStr,
    sync::Arc,
};

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::unit_of_work::{finish, Store, UnitOfWork},
    models::{
        auth::Actor,
        catalog::Tax,
        orders::{
            AddItemVariationPayload, AddOrderItemPayload, Order, OrderDetail, OrderItem,
            OrderItemDetail, OrderItemLine, OrderItemVariation, OrderService as ServiceLine,
            OrderStatus,
        },
    },
    services::{
        authorization::{
            authorize, AuthorizationGate, PermOrdersRead, PermOrdersWrite, PermissionDef,
        },
        tax_service::{line_tax, resolve_tax},
    },
};

/// O que fazer quando uma linha não tem regra de imposto para a sua categoria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingTaxPolicy {
    /// A linha contribui com zero; as demais mantêm o imposto.
    #[default]
    LineZero,
    /// Zera o imposto acumulado dos itens até ali (comportamento legado).
    ResetOrder,
}

impl FromStr for MissingTaxPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line-zero" | "line_zero" => Ok(MissingTaxPolicy::LineZero),
            "reset-order" | "reset_order" => Ok(MissingTaxPolicy::ResetOrder),
            other => Err(format!(
                "Política de imposto desconhecida: '{}' (use line-zero ou reset-order)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub charge_amount: Decimal,
    pub tax_amount: Decimal,
}

/// Cálculo puro dos totais do pedido.
///
/// Itens e variações são somados na ordem recebida (a variação herda a categoria
/// do item a que pertence). Serviços entram depois, com o valor e o imposto
/// gravados no agendamento, e nunca são afetados por `ResetOrder`.
pub fn compute_totals(
    lines: &[OrderItemLine],
    variations: &[OrderItemVariation],
    services: &[ServiceLine],
    taxes: &HashMap<String, Tax>,
    policy: MissingTaxPolicy,
) -> OrderTotals {
    let categories: HashMap<Uuid, &str> = lines
        .iter()
        .map(|l| (l.item.id, l.category.as_str()))
        .collect();

    let item_bases = lines.iter().map(|l| {
        (
            l.item.unit_price * Decimal::from(l.item.quantity),
            Some(l.category.as_str()),
        )
    });
    let variation_bases = variations.iter().map(|v| {
        (
            v.additional_price * Decimal::from(v.quantity),
            categories.get(&v.order_item_id).copied(),
        )
    });

    let mut charge = Decimal::ZERO;
    let mut tax = Decimal::ZERO;

    for (base, category) in item_bases.chain(variation_bases) {
        charge += base;
        match category.and_then(|c| taxes.get(c)) {
            Some(rule) => tax += line_tax(base, rule),
            None if policy == MissingTaxPolicy::ResetOrder => tax = Decimal::ZERO,
            None => {}
        }
    }

    for service in services {
        charge += service.charge;
        tax += service.tax;
    }

    OrderTotals {
        charge_amount: charge,
        tax_amount: tax,
    }
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
    gate: Arc<dyn AuthorizationGate>,
    missing_tax: MissingTaxPolicy,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn Store>,
        gate: Arc<dyn AuthorizationGate>,
        missing_tax: MissingTaxPolicy,
    ) -> Self {
        Self {
            store,
            gate,
            missing_tax,
        }
    }

    // =========================================================================
    //  OPERAÇÕES
    // =========================================================================

    /// Recalcula os totais a partir das linhas atuais.
    /// Pedido já quitado (Closed, Paid, Refunded) volta sem alteração.
    pub async fn recalculate_order_charge(
        &self,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<Order, AppError> {
        let mut uow = self.store.begin().await?;
        let result = async {
            let order = self
                .load_authorized::<PermOrdersWrite>(uow.as_mut(), actor, order_id)
                .await?;
            if order.status.is_settled() {
                tracing::debug!(%order_id, status = ?order.status, "Pedido quitado, recálculo ignorado");
                return Ok(order);
            }
            self.recalculate_in(uow.as_mut(), order).await
        }
        .await;
        finish(uow, result).await
    }

    /// Inclui um item do catálogo, congelando preço e imposto da linha.
    pub async fn add_order_item(
        &self,
        actor: &Actor,
        order_id: Uuid,
        payload: AddOrderItemPayload,
    ) -> Result<Order, AppError> {
        payload.validate()?;

        let mut uow = self.store.begin().await?;
        let result = async {
            let order = self.load_mutable(uow.as_mut(), actor, order_id).await?;

            let item = uow
                .find_item(payload.item_id)
                .await?
                .filter(|i| i.business_id == order.business_id)
                .ok_or_else(|| AppError::not_found("Item", payload.item_id))?;

            let base = item.price * Decimal::from(payload.quantity);
            let line_tax_snapshot = resolve_tax(uow.as_mut(), order.business_id, &item.category)
                .await?
                .map(|rule| line_tax(base, &rule));

            let line = OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                item_id: item.id,
                quantity: payload.quantity,
                unit_price: item.price,
                tax_amount: line_tax_snapshot,
                created_at: Utc::now(),
            };
            uow.insert_order_item(&line).await?;

            self.recalculate_in(uow.as_mut(), order).await
        }
        .await;
        finish(uow, result).await
    }

    /// Aplica uma variação a uma linha existente. A variação precisa ser do mesmo item.
    pub async fn add_item_variation(
        &self,
        actor: &Actor,
        order_id: Uuid,
        order_item_id: Uuid,
        payload: AddItemVariationPayload,
    ) -> Result<Order, AppError> {
        payload.validate()?;

        let mut uow = self.store.begin().await?;
        let result = async {
            let order = self.load_mutable(uow.as_mut(), actor, order_id).await?;

            let line = uow
                .find_order_item(order_item_id)
                .await?
                .filter(|l| l.order_id == order.id)
                .ok_or_else(|| AppError::not_found("Item do pedido", order_item_id))?;

            let variation = uow
                .find_item_variation(payload.item_variation_id)
                .await?
                .ok_or_else(|| AppError::not_found("Variação", payload.item_variation_id))?;

            if variation.item_id != line.item_id {
                return Err(AppError::Validation(
                    "A variação não pertence ao item desta linha.".into(),
                ));
            }

            let applied = OrderItemVariation {
                id: Uuid::new_v4(),
                order_item_id: line.id,
                item_variation_id: variation.id,
                quantity: payload.quantity,
                additional_price: variation.additional_price,
                created_at: Utc::now(),
            };
            uow.insert_order_item_variation(&applied).await?;

            self.recalculate_in(uow.as_mut(), order).await
        }
        .await;
        finish(uow, result).await
    }

    /// Open ou PartiallyPaid -> Closed.
    pub async fn close_order(&self, actor: &Actor, order_id: Uuid) -> Result<Order, AppError> {
        let mut uow = self.store.begin().await?;
        let result = async {
            let mut order = self
                .load_authorized::<PermOrdersWrite>(uow.as_mut(), actor, order_id)
                .await?;

            if !matches!(order.status, OrderStatus::Open | OrderStatus::PartiallyPaid) {
                return Err(AppError::Validation(format!(
                    "Não é possível fechar um pedido com status {:?}.",
                    order.status
                )));
            }

            order.status = OrderStatus::Closed;
            order.closed_at = Some(Utc::now());
            uow.update_order(&order).await
        }
        .await;

        let order = finish(uow, result).await?;
        tracing::info!(order_id = %order.id, status = ?order.status, "Pedido fechado");
        Ok(order)
    }

    /// O agregado completo: cabeçalho, itens com variações, serviços e pagamentos.
    pub async fn get_order(&self, actor: &Actor, order_id: Uuid) -> Result<OrderDetail, AppError> {
        let mut uow = self.store.begin().await?;
        let result = async {
            let header = self
                .load_authorized::<PermOrdersRead>(uow.as_mut(), actor, order_id)
                .await?;

            let lines = uow.list_order_items(order_id).await?;
            let mut variations = uow.list_order_item_variations(order_id).await?;
            let services = uow.list_order_services(order_id).await?;
            let payments = uow.list_payments(order_id).await?;

            let items = lines
                .into_iter()
                .map(|line| {
                    let (mine, rest): (Vec<_>, Vec<_>) = variations
                        .drain(..)
                        .partition(|v| v.order_item_id == line.item.id);
                    variations = rest;
                    OrderItemDetail {
                        item: line.item,
                        category: line.category,
                        variations: mine,
                    }
                })
                .collect();

            Ok::<_, AppError>(OrderDetail {
                header,
                items,
                services,
                payments,
            })
        }
        .await;
        finish(uow, result).await
    }

    // =========================================================================
    //  AUXILIARES (sempre dentro de um UnitOfWork aberto)
    // =========================================================================

    async fn load_authorized<P: PermissionDef>(
        &self,
        uow: &mut dyn UnitOfWork,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<Order, AppError> {
        let order = uow
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Pedido", order_id))?;
        authorize::<P>(self.gate.as_ref(), actor, order.business_id).await?;
        Ok(order)
    }

    async fn load_mutable(
        &self,
        uow: &mut dyn UnitOfWork,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<Order, AppError> {
        let order = self
            .load_authorized::<PermOrdersWrite>(uow, actor, order_id)
            .await?;
        if order.status.is_settled() {
            return Err(AppError::Validation(format!(
                "O pedido {} já foi quitado e não aceita novas linhas.",
                order_id
            )));
        }
        Ok(order)
    }

    /// Carrega as linhas, resolve um imposto por categoria e grava os novos totais.
    async fn recalculate_in(
        &self,
        uow: &mut dyn UnitOfWork,
        mut order: Order,
    ) -> Result<Order, AppError> {
        let lines = uow.list_order_items(order.id).await?;
        let variations = uow.list_order_item_variations(order.id).await?;
        let services = uow.list_order_services(order.id).await?;

        let categories: BTreeSet<&str> = lines.iter().map(|l| l.category.as_str()).collect();
        let mut taxes = HashMap::new();
        for category in categories {
            if let Some(rule) = resolve_tax(uow, order.business_id, category).await? {
                taxes.insert(category.to_string(), rule);
            }
        }

        let totals = compute_totals(&lines, &variations, &services, &taxes, self.missing_tax);
        order.charge_amount = totals.charge_amount;
        order.tax_amount = totals.tax_amount;

        let order = uow.update_order(&order).await?;
        tracing::info!(
            order_id = %order.id,
            charge = %order.charge_amount,
            tax = %order.tax_amount,
            "Totais do pedido recalculados"
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory::{MemoryState, MemoryStore},
        models::catalog::{Item, ItemVariation},
        services::authorization::testing::StaticGate,
    };
    use rust_decimal_macros::dec;

    struct Fixture {
        store: MemoryStore,
        actor: Actor,
        order_id: Uuid,
        shampoo: Item,
        pomade: Item,
        large: ItemVariation,
    }

    fn item(business_id: Uuid, name: &str, category: &str, price: Decimal) -> Item {
        Item {
            id: Uuid::new_v4(),
            business_id,
            name: name.into(),
            category: category.into(),
            price,
        }
    }

    fn tax(business_id: Uuid, category: &str, is_percentage: bool, amount: Decimal) -> Tax {
        Tax {
            id: Uuid::new_v4(),
            business_id,
            category: category.into(),
            is_percentage,
            amount,
            created_at: Utc::now(),
        }
    }

    /// Pedido aberto e vazio; shampoo tem imposto de 10%, pomada não tem regra.
    fn fixture() -> Fixture {
        let actor = Actor {
            user_id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
        };
        let shampoo = item(actor.business_id, "Shampoo", "HAIR", dec!(20.00));
        let pomade = item(actor.business_id, "Pomada", "COSMETICS", dec!(30.00));
        let large = ItemVariation {
            id: Uuid::new_v4(),
            item_id: shampoo.id,
            name: "Frasco grande".into(),
            additional_price: dec!(5.00),
        };
        let order = Order::open(actor.business_id, actor.user_id, Utc::now());

        let state = MemoryState {
            orders: vec![order.clone()],
            items: vec![shampoo.clone(), pomade.clone()],
            item_variations: vec![large.clone()],
            taxes: vec![tax(actor.business_id, "HAIR", true, dec!(10))],
            ..Default::default()
        };

        Fixture {
            store: MemoryStore::new(state),
            actor,
            order_id: order.id,
            shampoo,
            pomade,
            large,
        }
    }

    fn service(fx: &Fixture, policy: MissingTaxPolicy) -> OrderService {
        OrderService::new(
            Arc::new(fx.store.clone()),
            Arc::new(StaticGate::allow_all()),
            policy,
        )
    }

    fn add(item: &Item, quantity: i32) -> AddOrderItemPayload {
        AddOrderItemPayload {
            item_id: item.id,
            quantity,
        }
    }

    fn line(order_id: Uuid, category: &str, unit_price: Decimal, quantity: i32) -> OrderItemLine {
        OrderItemLine {
            item: OrderItem {
                id: Uuid::new_v4(),
                order_id,
                item_id: Uuid::new_v4(),
                quantity,
                unit_price,
                tax_amount: None,
                created_at: Utc::now(),
            },
            category: category.into(),
        }
    }

    // --- cálculo puro ---

    #[test]
    fn flat_tax_is_applied_once_per_line() {
        let order_id = Uuid::new_v4();
        let business_id = Uuid::new_v4();
        let lines = vec![
            line(order_id, "DRINKS", dec!(4.00), 3),
            line(order_id, "DRINKS", dec!(6.00), 1),
        ];
        let taxes = HashMap::from([(
            "DRINKS".to_string(),
            tax(business_id, "DRINKS", false, dec!(0.50)),
        )]);

        let totals = compute_totals(&lines, &[], &[], &taxes, MissingTaxPolicy::LineZero);
        assert_eq!(totals.charge_amount, dec!(18.00));
        assert_eq!(totals.tax_amount, dec!(1.00));
    }

    #[test]
    fn missing_rule_policies_differ_only_in_tax() {
        let order_id = Uuid::new_v4();
        let business_id = Uuid::new_v4();
        let lines = vec![
            line(order_id, "HAIR", dec!(50.00), 1),
            line(order_id, "UNTAXED", dec!(10.00), 1),
            line(order_id, "HAIR", dec!(20.00), 1),
        ];
        let taxes = HashMap::from([("HAIR".to_string(), tax(business_id, "HAIR", true, dec!(10)))]);

        let zero = compute_totals(&lines, &[], &[], &taxes, MissingTaxPolicy::LineZero);
        assert_eq!(zero.charge_amount, dec!(80.00));
        assert_eq!(zero.tax_amount, dec!(7.00));

        // Legado: a linha sem regra zera o que veio antes, o resto volta a somar
        let reset = compute_totals(&lines, &[], &[], &taxes, MissingTaxPolicy::ResetOrder);
        assert_eq!(reset.charge_amount, dec!(80.00));
        assert_eq!(reset.tax_amount, dec!(2.00));
    }

    #[test]
    fn service_lines_survive_reset_policy() {
        let order_id = Uuid::new_v4();
        let lines = vec![line(order_id, "UNTAXED", dec!(10.00), 2)];
        let services = vec![ServiceLine {
            id: Uuid::new_v4(),
            order_id,
            service_id: Uuid::new_v4(),
            duration_in_minutes: 30,
            charge: dec!(80.00),
            tax: dec!(8.00),
            total: dec!(88.00),
            created_at: Utc::now(),
        }];

        let totals = compute_totals(
            &lines,
            &[],
            &services,
            &HashMap::new(),
            MissingTaxPolicy::ResetOrder,
        );
        assert_eq!(totals.charge_amount, dec!(100.00));
        assert_eq!(totals.tax_amount, dec!(8.00));
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!("line-zero".parse(), Ok(MissingTaxPolicy::LineZero));
        assert_eq!("RESET_ORDER".parse(), Ok(MissingTaxPolicy::ResetOrder));
        assert!("whatever".parse::<MissingTaxPolicy>().is_err());
    }

    // --- orquestração ---

    #[tokio::test]
    async fn added_lines_drive_totals_and_recalculate_is_idempotent() {
        let fx = fixture();
        let svc = service(&fx, MissingTaxPolicy::LineZero);

        svc.add_order_item(&fx.actor, fx.order_id, add(&fx.shampoo, 2)).await.unwrap();
        let order = svc.add_order_item(&fx.actor, fx.order_id, add(&fx.pomade, 1)).await.unwrap();
        assert_eq!(order.charge_amount, dec!(70.00));
        assert_eq!(order.tax_amount, dec!(4.00));

        let shampoo_line = fx
            .store
            .snapshot()
            .order_items
            .into_iter()
            .find(|l| l.item_id == fx.shampoo.id)
            .unwrap();
        assert_eq!(shampoo_line.unit_price, dec!(20.00));
        assert_eq!(shampoo_line.tax_amount, Some(dec!(4.00)));

        let order = svc
            .add_item_variation(
                &fx.actor,
                fx.order_id,
                shampoo_line.id,
                AddItemVariationPayload {
                    item_variation_id: fx.large.id,
                    quantity: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(order.charge_amount, dec!(80.00));
        assert_eq!(order.tax_amount, dec!(5.00));

        let first = svc.recalculate_order_charge(&fx.actor, fx.order_id).await.unwrap();
        let second = svc.recalculate_order_charge(&fx.actor, fx.order_id).await.unwrap();
        assert_eq!(
            (first.charge_amount, first.tax_amount),
            (second.charge_amount, second.tax_amount)
        );
        assert_eq!(second.charge_amount, dec!(80.00));
    }

    #[tokio::test]
    async fn catalog_price_change_does_not_touch_existing_lines() {
        let fx = fixture();
        let svc = service(&fx, MissingTaxPolicy::LineZero);
        svc.add_order_item(&fx.actor, fx.order_id, add(&fx.pomade, 1)).await.unwrap();

        let pomade_id = fx.pomade.id;
        fx.store.update(|s| {
            if let Some(i) = s.items.iter_mut().find(|i| i.id == pomade_id) {
                i.price = dec!(99.00);
            }
        });

        let order = svc.recalculate_order_charge(&fx.actor, fx.order_id).await.unwrap();
        assert_eq!(order.charge_amount, dec!(30.00));
    }

    #[tokio::test]
    async fn settled_orders_are_left_alone() {
        for status in [OrderStatus::Closed, OrderStatus::Paid, OrderStatus::Refunded] {
            let fx = fixture();
            let svc = service(&fx, MissingTaxPolicy::LineZero);
            svc.add_order_item(&fx.actor, fx.order_id, add(&fx.shampoo, 1)).await.unwrap();

            // Totais "cobrados" diferentes do que as linhas dariam hoje
            let order_id = fx.order_id;
            fx.store.update(|s| {
                if let Some(o) = s.orders.iter_mut().find(|o| o.id == order_id) {
                    o.status = status;
                    o.charge_amount = dec!(15.00);
                    o.tax_amount = dec!(1.50);
                }
            });

            let order = svc.recalculate_order_charge(&fx.actor, fx.order_id).await.unwrap();
            assert_eq!(order.charge_amount, dec!(15.00));
            assert_eq!(order.tax_amount, dec!(1.50));

            let err = svc
                .add_order_item(&fx.actor, fx.order_id, add(&fx.pomade, 1))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn reset_policy_wipes_item_tax_when_a_line_has_no_rule() {
        let fx = fixture();
        let svc = service(&fx, MissingTaxPolicy::ResetOrder);

        svc.add_order_item(&fx.actor, fx.order_id, add(&fx.shampoo, 1)).await.unwrap();
        let order = svc.add_order_item(&fx.actor, fx.order_id, add(&fx.pomade, 1)).await.unwrap();

        assert_eq!(order.charge_amount, dec!(50.00));
        assert_eq!(order.tax_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn variation_of_another_item_is_rejected() {
        let fx = fixture();
        let svc = service(&fx, MissingTaxPolicy::LineZero);
        svc.add_order_item(&fx.actor, fx.order_id, add(&fx.pomade, 1)).await.unwrap();
        let pomade_line = fx.store.snapshot().order_items[0].clone();

        let err = svc
            .add_item_variation(
                &fx.actor,
                fx.order_id,
                pomade_line.id,
                AddItemVariationPayload {
                    item_variation_id: fx.large.id,
                    quantity: 1,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(fx.store.snapshot().order_item_variations.is_empty());
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let fx = fixture();
        let svc = service(&fx, MissingTaxPolicy::LineZero);
        let err = svc
            .recalculate_order_charge(&fx.actor, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn denied_actor_changes_nothing() {
        let fx = fixture();
        let svc = OrderService::new(
            Arc::new(fx.store.clone()),
            Arc::new(StaticGate::denying("orders:write")),
            MissingTaxPolicy::LineZero,
        );

        let err = svc
            .add_order_item(&fx.actor, fx.order_id, add(&fx.shampoo, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(fx.store.snapshot().order_items.is_empty());
    }

    #[tokio::test]
    async fn close_then_read_back_the_aggregate() {
        let fx = fixture();
        let svc = service(&fx, MissingTaxPolicy::LineZero);
        svc.add_order_item(&fx.actor, fx.order_id, add(&fx.shampoo, 1)).await.unwrap();

        let closed = svc.close_order(&fx.actor, fx.order_id).await.unwrap();
        assert_eq!(closed.status, OrderStatus::Closed);
        assert!(closed.closed_at.is_some());

        let again = svc.close_order(&fx.actor, fx.order_id).await.unwrap_err();
        assert!(matches!(again, AppError::Validation(_)));

        let detail = svc.get_order(&fx.actor, fx.order_id).await.unwrap();
        assert_eq!(detail.header.status, OrderStatus::Closed);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].category, "HAIR");
        assert!(detail.services.is_empty());
    }
}
