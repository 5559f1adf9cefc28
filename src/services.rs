pub mod auth;
pub mod authorization;
pub mod order_service;
pub mod payment_service;
pub mod reservation_service;
pub mod schedule_service;
pub mod tax_service;
