pub mod agenda;
pub mod availability;
pub mod calendar;
pub mod clock;
pub mod scheduling;
