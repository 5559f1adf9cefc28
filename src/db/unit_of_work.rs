// src/db/unit_of_work.rs

//! Fronteira transacional explícita do núcleo financeiro.
//!
//! Os serviços abrem um [`UnitOfWork`] com [`Store::begin`], fazem todas as
//! leituras e escritas por ele e terminam com [`finish`]: commit no sucesso,
//! rollback em qualquer erro. Nada é publicado antes do commit.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::{error::AppError, time_range::TimeRange},
    db::{
        CatalogRepository, OrdersRepository, PaymentsRepository, ReservationsRepository,
        SchedulesRepository,
    },
    models::{
        catalog::{Item, ItemVariation, Service, Tax},
        orders::{Order, OrderItem, OrderItemLine, OrderItemVariation, OrderService, Payment},
        reservations::{Customer, Reservation},
        schedules::Schedule,
    },
};

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    // --- Pedidos ---
    async fn find_order(&mut self, order_id: Uuid) -> Result<Option<Order>, AppError>;
    async fn insert_order(&mut self, order: &Order) -> Result<Order, AppError>;
    async fn update_order(&mut self, order: &Order) -> Result<Order, AppError>;

    async fn list_order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItemLine>, AppError>;
    async fn find_order_item(&mut self, order_item_id: Uuid) -> Result<Option<OrderItem>, AppError>;
    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<OrderItem, AppError>;
    async fn list_order_item_variations(
        &mut self,
        order_id: Uuid,
    ) -> Result<Vec<OrderItemVariation>, AppError>;
    async fn insert_order_item_variation(
        &mut self,
        variation: &OrderItemVariation,
    ) -> Result<OrderItemVariation, AppError>;

    async fn list_order_services(&mut self, order_id: Uuid) -> Result<Vec<OrderService>, AppError>;
    async fn find_order_service(
        &mut self,
        order_service_id: Uuid,
    ) -> Result<Option<OrderService>, AppError>;
    async fn insert_order_service(&mut self, line: &OrderService) -> Result<OrderService, AppError>;
    async fn delete_order_service(&mut self, order_service_id: Uuid) -> Result<(), AppError>;

    // --- Pagamentos ---
    async fn find_payment(&mut self, payment_id: Uuid) -> Result<Option<Payment>, AppError>;
    async fn list_payments(&mut self, order_id: Uuid) -> Result<Vec<Payment>, AppError>;
    async fn insert_payment(&mut self, payment: &Payment) -> Result<Payment, AppError>;

    // --- Catálogo ---
    async fn find_item(&mut self, item_id: Uuid) -> Result<Option<Item>, AppError>;
    async fn find_item_variation(
        &mut self,
        item_variation_id: Uuid,
    ) -> Result<Option<ItemVariation>, AppError>;
    async fn find_service(&mut self, service_id: Uuid) -> Result<Option<Service>, AppError>;
    async fn find_tax(&mut self, business_id: Uuid, category: &str) -> Result<Option<Tax>, AppError>;
    async fn insert_tax(&mut self, tax: &Tax) -> Result<Tax, AppError>;

    // --- Clientes & reservas ---
    async fn find_customer_by_phone(&mut self, phone: &str) -> Result<Option<Customer>, AppError>;
    async fn insert_customer(&mut self, customer: &Customer) -> Result<Customer, AppError>;
    async fn find_reservation(&mut self, reservation_id: Uuid)
    -> Result<Option<Reservation>, AppError>;
    async fn list_service_reservations(
        &mut self,
        service_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Reservation>, AppError>;
    async fn list_employee_reservations(
        &mut self,
        employee_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Reservation>, AppError>;
    async fn insert_reservation(&mut self, reservation: &Reservation)
    -> Result<Reservation, AppError>;
    async fn update_reservation(&mut self, reservation: &Reservation)
    -> Result<Reservation, AppError>;
    async fn delete_reservation(&mut self, reservation_id: Uuid) -> Result<(), AppError>;

    // --- Escalas ---
    async fn list_employee_schedules(
        &mut self,
        employee_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Schedule>, AppError>;
    async fn insert_schedule(&mut self, schedule: &Schedule) -> Result<Schedule, AppError>;

    // --- Fronteira ---
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

/// Fecha a unidade de trabalho de acordo com o resultado da operação.
///
/// Em caso de erro o rollback é explícito; se até o rollback falhar, o erro
/// original é o que volta para o chamador (a falha do rollback vai para o log).
pub async fn finish<T>(uow: Box<dyn UnitOfWork>, result: Result<T, AppError>) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::warn!("Falha no rollback após erro '{}': {}", e, rollback_err);
            }
            Err(e)
        }
    }
}

// =============================================================================
//  IMPLEMENTAÇÃO POSTGRES
// =============================================================================

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    orders: OrdersRepository,
    payments: PaymentsRepository,
    catalog: CatalogRepository,
    reservations: ReservationsRepository,
    schedules: SchedulesRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            orders: OrdersRepository::new(),
            payments: PaymentsRepository::new(),
            catalog: CatalogRepository::new(),
            reservations: ReservationsRepository::new(),
            schedules: SchedulesRepository::new(),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Tem que ser o primeiro comando da transação.
        // Checagem de conflito + INSERT só são seguros juntos em SERIALIZABLE.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PgUnitOfWork {
            tx,
            store: self.clone(),
        }))
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
    store: PgStore,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_order(&mut self, order_id: Uuid) -> Result<Option<Order>, AppError> {
        self.store.orders.find_order_for_update(&mut *self.tx, order_id).await
    }

    async fn insert_order(&mut self, order: &Order) -> Result<Order, AppError> {
        self.store.orders.insert_order(&mut *self.tx, order).await
    }

    async fn update_order(&mut self, order: &Order) -> Result<Order, AppError> {
        self.store.orders.update_order(&mut *self.tx, order).await
    }

    async fn list_order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItemLine>, AppError> {
        self.store.orders.list_order_items(&mut *self.tx, order_id).await
    }

    async fn find_order_item(&mut self, order_item_id: Uuid) -> Result<Option<OrderItem>, AppError> {
        self.store.orders.find_order_item(&mut *self.tx, order_item_id).await
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<OrderItem, AppError> {
        self.store.orders.insert_order_item(&mut *self.tx, item).await
    }

    async fn list_order_item_variations(
        &mut self,
        order_id: Uuid,
    ) -> Result<Vec<OrderItemVariation>, AppError> {
        self.store.orders.list_order_item_variations(&mut *self.tx, order_id).await
    }

    async fn insert_order_item_variation(
        &mut self,
        variation: &OrderItemVariation,
    ) -> Result<OrderItemVariation, AppError> {
        self.store.orders.insert_order_item_variation(&mut *self.tx, variation).await
    }

    async fn list_order_services(&mut self, order_id: Uuid) -> Result<Vec<OrderService>, AppError> {
        self.store.orders.list_order_services(&mut *self.tx, order_id).await
    }

    async fn find_order_service(
        &mut self,
        order_service_id: Uuid,
    ) -> Result<Option<OrderService>, AppError> {
        self.store.orders.find_order_service(&mut *self.tx, order_service_id).await
    }

    async fn insert_order_service(&mut self, line: &OrderService) -> Result<OrderService, AppError> {
        self.store.orders.insert_order_service(&mut *self.tx, line).await
    }

    async fn delete_order_service(&mut self, order_service_id: Uuid) -> Result<(), AppError> {
        self.store.orders.delete_order_service(&mut *self.tx, order_service_id).await
    }

    async fn find_payment(&mut self, payment_id: Uuid) -> Result<Option<Payment>, AppError> {
        self.store.payments.find_payment(&mut *self.tx, payment_id).await
    }

    async fn list_payments(&mut self, order_id: Uuid) -> Result<Vec<Payment>, AppError> {
        self.store.payments.list_payments(&mut *self.tx, order_id).await
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<Payment, AppError> {
        self.store.payments.insert_payment(&mut *self.tx, payment).await
    }

    async fn find_item(&mut self, item_id: Uuid) -> Result<Option<Item>, AppError> {
        self.store.catalog.find_item(&mut *self.tx, item_id).await
    }

    async fn find_item_variation(
        &mut self,
        item_variation_id: Uuid,
    ) -> Result<Option<ItemVariation>, AppError> {
        self.store.catalog.find_item_variation(&mut *self.tx, item_variation_id).await
    }

    async fn find_service(&mut self, service_id: Uuid) -> Result<Option<Service>, AppError> {
        self.store.catalog.find_service(&mut *self.tx, service_id).await
    }

    async fn find_tax(&mut self, business_id: Uuid, category: &str) -> Result<Option<Tax>, AppError> {
        self.store.catalog.find_tax(&mut *self.tx, business_id, category).await
    }

    async fn insert_tax(&mut self, tax: &Tax) -> Result<Tax, AppError> {
        self.store.catalog.insert_tax(&mut *self.tx, tax).await
    }

    async fn find_customer_by_phone(&mut self, phone: &str) -> Result<Option<Customer>, AppError> {
        self.store.reservations.find_customer_by_phone(&mut *self.tx, phone).await
    }

    async fn insert_customer(&mut self, customer: &Customer) -> Result<Customer, AppError> {
        self.store.reservations.insert_customer(&mut *self.tx, customer).await
    }

    async fn find_reservation(
        &mut self,
        reservation_id: Uuid,
    ) -> Result<Option<Reservation>, AppError> {
        self.store
            .reservations
            .find_reservation_for_update(&mut *self.tx, reservation_id)
            .await
    }

    async fn list_service_reservations(
        &mut self,
        service_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Reservation>, AppError> {
        self.store
            .reservations
            .list_overlapping_for_service(&mut *self.tx, service_id, range)
            .await
    }

    async fn list_employee_reservations(
        &mut self,
        employee_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Reservation>, AppError> {
        self.store
            .reservations
            .list_overlapping_for_employee(&mut *self.tx, employee_id, range)
            .await
    }

    async fn insert_reservation(
        &mut self,
        reservation: &Reservation,
    ) -> Result<Reservation, AppError> {
        self.store.reservations.insert_reservation(&mut *self.tx, reservation).await
    }

    async fn update_reservation(
        &mut self,
        reservation: &Reservation,
    ) -> Result<Reservation, AppError> {
        self.store.reservations.update_reservation(&mut *self.tx, reservation).await
    }

    async fn delete_reservation(&mut self, reservation_id: Uuid) -> Result<(), AppError> {
        self.store.reservations.delete_reservation(&mut *self.tx, reservation_id).await
    }

    async fn list_employee_schedules(
        &mut self,
        employee_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Schedule>, AppError> {
        self.store.schedules.list_for_user_around(&mut *self.tx, employee_id, range).await
    }

    async fn insert_schedule(&mut self, schedule: &Schedule) -> Result<Schedule, AppError> {
        self.store.schedules.insert_schedule(&mut *self.tx, schedule).await
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        // Falha de serialização costuma aparecer aqui; o From<sqlx::Error> vira Concurrency
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
