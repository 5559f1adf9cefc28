pub mod orders_repo;
pub use orders_repo::OrdersRepository;
pub mod payments_repo;
pub use payments_repo::PaymentsRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod reservations_repo;
pub use reservations_repo::ReservationsRepository;
pub mod schedules_repo;
pub use schedules_repo::SchedulesRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;

pub mod unit_of_work;
pub use unit_of_work::{PgStore, Store, UnitOfWork};

#[cfg(test)]
pub mod memory;
