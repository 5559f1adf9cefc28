pub mod orders;
pub mod payments;
pub mod reservations;
pub mod schedules;
pub mod taxes;
