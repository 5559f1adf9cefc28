// src/db/memory.rs

// Store em memória para os testes dos serviços.
// Cada UnitOfWork trabalha numa cópia do estado; o commit só publica se ninguém
// mais tiver publicado desde o begin (simula o SERIALIZABLE do Postgres).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{error::AppError, time_range::TimeRange},
    db::unit_of_work::{Store, UnitOfWork},
    models::{
        catalog::{Item, ItemVariation, Service, Tax},
        orders::{Order, OrderItem, OrderItemLine, OrderItemVariation, OrderService, Payment},
        reservations::{Customer, Reservation},
        schedules::Schedule,
    },
};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub orders: Vec<Order>,
    pub order_items: Vec<OrderItem>,
    pub order_item_variations: Vec<OrderItemVariation>,
    pub order_services: Vec<OrderService>,
    pub payments: Vec<Payment>,
    pub items: Vec<Item>,
    pub item_variations: Vec<ItemVariation>,
    pub services: Vec<Service>,
    pub taxes: Vec<Tax>,
    pub customers: Vec<Customer>,
    pub reservations: Vec<Reservation>,
    pub schedules: Vec<Schedule>,
    // Nome da tabela cujo próximo INSERT deve falhar (simula erro de persistência)
    pub fail_insert_into: Option<&'static str>,
}

impl MemoryState {
    pub fn order(&self, order_id: Uuid) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    fn check_insert(&self, table: &'static str) -> Result<(), AppError> {
        if self.fail_insert_into == Some(table) {
            return Err(AppError::Database(sqlx::Error::Protocol(format!(
                "falha simulada ao inserir em {}",
                table
            ))));
        }
        Ok(())
    }
}

struct Shared {
    state: MemoryState,
    version: u64,
}

#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryStore {
    pub fn new(state: MemoryState) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared { state, version: 0 })),
        }
    }

    /// Cópia do estado publicado (o que um leitor veria depois dos commits).
    pub fn snapshot(&self) -> MemoryState {
        self.shared.lock().unwrap().state.clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut MemoryState)) {
        let mut shared = self.shared.lock().unwrap();
        f(&mut shared.state);
        shared.version += 1;
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let shared = self.shared.lock().unwrap();
        Ok(Box::new(MemoryUnitOfWork {
            shared: Arc::clone(&self.shared),
            base_version: shared.version,
            working: shared.state.clone(),
        }))
    }
}

pub struct MemoryUnitOfWork {
    shared: Arc<Mutex<Shared>>,
    base_version: u64,
    working: MemoryState,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_order(&mut self, order_id: Uuid) -> Result<Option<Order>, AppError> {
        Ok(self.working.order(order_id).cloned())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<Order, AppError> {
        self.working.check_insert("orders")?;
        self.working.orders.push(order.clone());
        Ok(order.clone())
    }

    async fn update_order(&mut self, order: &Order) -> Result<Order, AppError> {
        let slot = self
            .working
            .orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or_else(|| AppError::not_found("Pedido", order.id))?;
        *slot = Order {
            updated_at: Utc::now(),
            ..order.clone()
        };
        Ok(slot.clone())
    }

    async fn list_order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItemLine>, AppError> {
        let lines = self
            .working
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .map(|i| {
                let category = self
                    .working
                    .items
                    .iter()
                    .find(|c| c.id == i.item_id)
                    .map(|c| c.category.clone())
                    .unwrap_or_default();
                OrderItemLine {
                    item: i.clone(),
                    category,
                }
            })
            .collect();
        Ok(lines)
    }

    async fn find_order_item(&mut self, order_item_id: Uuid) -> Result<Option<OrderItem>, AppError> {
        Ok(self
            .working
            .order_items
            .iter()
            .find(|i| i.id == order_item_id)
            .cloned())
    }

    async fn insert_order_item(&mut self, item: &OrderItem) -> Result<OrderItem, AppError> {
        self.working.check_insert("order_items")?;
        self.working.order_items.push(item.clone());
        Ok(item.clone())
    }

    async fn list_order_item_variations(
        &mut self,
        order_id: Uuid,
    ) -> Result<Vec<OrderItemVariation>, AppError> {
        let item_ids: Vec<Uuid> = self
            .working
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .map(|i| i.id)
            .collect();
        Ok(self
            .working
            .order_item_variations
            .iter()
            .filter(|v| item_ids.contains(&v.order_item_id))
            .cloned()
            .collect())
    }

    async fn insert_order_item_variation(
        &mut self,
        variation: &OrderItemVariation,
    ) -> Result<OrderItemVariation, AppError> {
        self.working.check_insert("order_item_variations")?;
        self.working.order_item_variations.push(variation.clone());
        Ok(variation.clone())
    }

    async fn list_order_services(&mut self, order_id: Uuid) -> Result<Vec<OrderService>, AppError> {
        Ok(self
            .working
            .order_services
            .iter()
            .filter(|s| s.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn find_order_service(
        &mut self,
        order_service_id: Uuid,
    ) -> Result<Option<OrderService>, AppError> {
        Ok(self
            .working
            .order_services
            .iter()
            .find(|s| s.id == order_service_id)
            .cloned())
    }

    async fn insert_order_service(&mut self, line: &OrderService) -> Result<OrderService, AppError> {
        self.working.check_insert("order_services")?;
        self.working.order_services.push(line.clone());
        Ok(line.clone())
    }

    async fn delete_order_service(&mut self, order_service_id: Uuid) -> Result<(), AppError> {
        self.working.order_services.retain(|s| s.id != order_service_id);
        Ok(())
    }

    async fn find_payment(&mut self, payment_id: Uuid) -> Result<Option<Payment>, AppError> {
        Ok(self.working.payments.iter().find(|p| p.id == payment_id).cloned())
    }

    async fn list_payments(&mut self, order_id: Uuid) -> Result<Vec<Payment>, AppError> {
        Ok(self
            .working
            .payments
            .iter()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<Payment, AppError> {
        self.working.check_insert("payments")?;
        self.working.payments.push(payment.clone());
        Ok(payment.clone())
    }

    async fn find_item(&mut self, item_id: Uuid) -> Result<Option<Item>, AppError> {
        Ok(self.working.items.iter().find(|i| i.id == item_id).cloned())
    }

    async fn find_item_variation(
        &mut self,
        item_variation_id: Uuid,
    ) -> Result<Option<ItemVariation>, AppError> {
        Ok(self
            .working
            .item_variations
            .iter()
            .find(|v| v.id == item_variation_id)
            .cloned())
    }

    async fn find_service(&mut self, service_id: Uuid) -> Result<Option<Service>, AppError> {
        Ok(self.working.services.iter().find(|s| s.id == service_id).cloned())
    }

    async fn find_tax(&mut self, business_id: Uuid, category: &str) -> Result<Option<Tax>, AppError> {
        Ok(self
            .working
            .taxes
            .iter()
            .find(|t| t.business_id == business_id && t.category == category)
            .cloned())
    }

    async fn insert_tax(&mut self, tax: &Tax) -> Result<Tax, AppError> {
        self.working.check_insert("taxes")?;
        let duplicate = self
            .working
            .taxes
            .iter()
            .any(|t| t.business_id == tax.business_id && t.category == tax.category);
        if duplicate {
            return Err(AppError::DuplicateTax {
                category: tax.category.clone(),
            });
        }
        self.working.taxes.push(tax.clone());
        Ok(tax.clone())
    }

    async fn find_customer_by_phone(&mut self, phone: &str) -> Result<Option<Customer>, AppError> {
        Ok(self.working.customers.iter().find(|c| c.phone == phone).cloned())
    }

    async fn insert_customer(&mut self, customer: &Customer) -> Result<Customer, AppError> {
        self.working.check_insert("customers")?;
        self.working.customers.push(customer.clone());
        Ok(customer.clone())
    }

    async fn find_reservation(
        &mut self,
        reservation_id: Uuid,
    ) -> Result<Option<Reservation>, AppError> {
        Ok(self
            .working
            .reservations
            .iter()
            .find(|r| r.id == reservation_id)
            .cloned())
    }

    async fn list_service_reservations(
        &mut self,
        service_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Reservation>, AppError> {
        Ok(self
            .working
            .reservations
            .iter()
            .filter(|r| r.service_id == service_id && r.time_range().overlaps(&range))
            .cloned()
            .collect())
    }

    async fn list_employee_reservations(
        &mut self,
        employee_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Reservation>, AppError> {
        Ok(self
            .working
            .reservations
            .iter()
            .filter(|r| r.employee_id == employee_id && r.time_range().overlaps(&range))
            .cloned()
            .collect())
    }

    async fn insert_reservation(
        &mut self,
        reservation: &Reservation,
    ) -> Result<Reservation, AppError> {
        self.working.check_insert("reservations")?;
        self.working.reservations.push(reservation.clone());
        Ok(reservation.clone())
    }

    async fn update_reservation(
        &mut self,
        reservation: &Reservation,
    ) -> Result<Reservation, AppError> {
        let slot = self
            .working
            .reservations
            .iter_mut()
            .find(|r| r.id == reservation.id)
            .ok_or_else(|| AppError::not_found("Reserva", reservation.id))?;
        *slot = reservation.clone();
        Ok(slot.clone())
    }

    async fn delete_reservation(&mut self, reservation_id: Uuid) -> Result<(), AppError> {
        self.working.reservations.retain(|r| r.id != reservation_id);
        Ok(())
    }

    async fn list_employee_schedules(
        &mut self,
        employee_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Schedule>, AppError> {
        // Mesmo critério do SQL: bordas encostando também entram
        Ok(self
            .working
            .schedules
            .iter()
            .filter(|s| {
                s.user_id == employee_id && s.start_time <= range.end && s.end_time >= range.start
            })
            .cloned()
            .collect())
    }

    async fn insert_schedule(&mut self, schedule: &Schedule) -> Result<Schedule, AppError> {
        self.working.check_insert("schedules")?;
        self.working.schedules.push(schedule.clone());
        Ok(schedule.clone())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryUnitOfWork {
            shared,
            base_version,
            working,
        } = *self;
        let mut shared = shared.lock().unwrap();
        if shared.version != base_version {
            return Err(AppError::Concurrency(
                "O estado mudou desde o início da transação.".into(),
            ));
        }
        shared.state = working;
        shared.version += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        Ok(())
    }
}
