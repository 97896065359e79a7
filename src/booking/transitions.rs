//! Status transition tables and the side effects tied to them.

use std::fmt::Display;
use thiserror::Error;

use crate::models::{
    ContactStatus, EventStatus, OrderStatus, OrderType, RegistrationStatus, ServiceStatus,
    TestDriveStatus,
};

pub trait StatusMachine: Copy + Eq + Display {
    fn is_terminal(self) -> bool;

    /// Whether `self -> next` is a legal move. Staying put is handled by
    /// [`plan_transition`] and never reaches this.
    fn allows(self, next: Self) -> bool;
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Cannot change status from {from} to {to}")]
pub struct IllegalTransition {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    /// Requested status equals the current one; nothing to write.
    Unchanged,
    Changed { from: S, to: S },
}

pub fn plan_transition<S: StatusMachine>(current: S, next: S) -> Result<Transition<S>, IllegalTransition> {
    if current == next {
        return Ok(Transition::Unchanged);
    }
    if current.is_terminal() || !current.allows(next) {
        return Err(IllegalTransition {
            from: current.to_string(),
            to: next.to_string(),
        });
    }
    Ok(Transition::Changed { from: current, to: next })
}

impl StatusMachine for OrderStatus {
    fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    fn allows(self, next: Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Completed) | (Pending | Confirmed, Cancelled)
        )
    }
}

impl StatusMachine for TestDriveStatus {
    fn is_terminal(self) -> bool {
        matches!(self, TestDriveStatus::Completed | TestDriveStatus::Cancelled)
    }

    fn allows(self, next: Self) -> bool {
        use TestDriveStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Completed) | (Pending | Confirmed, Cancelled)
        )
    }
}

impl StatusMachine for ServiceStatus {
    fn is_terminal(self) -> bool {
        matches!(self, ServiceStatus::Completed | ServiceStatus::Cancelled)
    }

    fn allows(self, next: Self) -> bool {
        use ServiceStatus::*;
        matches!(
            (self, next),
            (Scheduled, InProgress) | (InProgress, Completed) | (Scheduled | InProgress, Cancelled)
        )
    }
}

impl StatusMachine for RegistrationStatus {
    fn is_terminal(self) -> bool {
        matches!(self, RegistrationStatus::Attended | RegistrationStatus::Cancelled)
    }

    fn allows(self, next: Self) -> bool {
        use RegistrationStatus::*;
        matches!((self, next), (Registered, Attended) | (Registered, Cancelled))
    }
}

impl StatusMachine for EventStatus {
    fn is_terminal(self) -> bool {
        matches!(self, EventStatus::Completed | EventStatus::Cancelled)
    }

    fn allows(self, next: Self) -> bool {
        use EventStatus::*;
        matches!(
            (self, next),
            (Upcoming, InProgress) | (InProgress, Completed) | (Upcoming | InProgress, Cancelled)
        )
    }
}

impl StatusMachine for ContactStatus {
    fn is_terminal(self) -> bool {
        self == ContactStatus::Closed
    }

    fn allows(self, next: Self) -> bool {
        use ContactStatus::*;
        matches!(
            (self, next),
            (New, InProgress) | (New | InProgress, Responded) | (_, Closed)
        )
    }
}

/// Whether an applied order transition hands the car back to the showroom.
pub fn releases_car(order_type: OrderType, transition: Transition<OrderStatus>) -> bool {
    match transition {
        Transition::Unchanged => false,
        Transition::Changed { to, .. } => match order_type {
            OrderType::Purchase => to == OrderStatus::Cancelled,
            OrderType::Rental | OrderType::Reservation => to == OrderStatus::Completed,
        },
    }
}
