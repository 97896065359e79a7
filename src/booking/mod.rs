//! Booking rules shared by orders, test drives, service appointments and
//! event registrations. Everything here is pure; services load the rows and
//! apply the verdicts inside their transactions.

pub mod availability;
pub mod capacity;
pub mod conflicts;
pub mod transitions;

pub use availability::{can_book, unavailable_message, BookingMode, CarFlags};
pub use capacity::{adjust_registered_count, check_registration, seats_used, RegistrationRejection, SeatRequest};
pub use transitions::{plan_transition, releases_car, IllegalTransition, StatusMachine, Transition};

use crate::errors::ApiError;

impl From<RegistrationRejection> for ApiError {
    fn from(e: RegistrationRejection) -> Self {
        ApiError::ValidationError(e.to_string())
    }
}

impl From<IllegalTransition> for ApiError {
    fn from(e: IllegalTransition) -> Self {
        ApiError::ValidationError(e.to_string())
    }
}
