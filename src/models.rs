pub mod auth;
pub mod catalog;
pub mod orders;
pub mod reservations;
pub mod schedules;
