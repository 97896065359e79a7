//! Seat accounting for event registrations.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::{Event, EventRegistration, EventStatus, RegistrationStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationRejection {
    #[error("Guest count must not be negative")]
    NegativeGuests,
    #[error("Registration deadline has passed")]
    DeadlinePassed,
    #[error("Event is {0} and no longer accepts registrations")]
    EventClosed(EventStatus),
    #[error("No seats available: {available} left, {requested} requested")]
    NoSeats { available: i64, requested: i64 },
    #[error("This event is for VIP members only")]
    VipOnly,
    #[error("You are already registered for this event")]
    AlreadyRegistered,
}

/// Registrations that occupy seats.
pub fn holds_seats(status: RegistrationStatus) -> bool {
    matches!(status, RegistrationStatus::Registered | RegistrationStatus::Attended)
}

/// Seats in use, derived from the registrations themselves rather than the
/// stored running tally.
pub fn seats_used(registrations: &[EventRegistration]) -> i64 {
    registrations
        .iter()
        .filter(|r| holds_seats(r.status))
        .map(|r| i64::from(r.seats()))
        .sum()
}

pub struct SeatRequest<'a> {
    pub event: &'a Event,
    pub user_id: i32,
    pub user_is_vip: bool,
    pub guest_count: i32,
    pub now: NaiveDateTime,
}

/// Runs the registration preconditions in order; the first failure wins.
pub fn check_registration(
    req: &SeatRequest<'_>,
    registrations: &[EventRegistration],
) -> Result<(), RegistrationRejection> {
    if req.guest_count < 0 {
        return Err(RegistrationRejection::NegativeGuests);
    }

    if let Some(deadline) = req.event.registration_deadline {
        if req.now > deadline {
            return Err(RegistrationRejection::DeadlinePassed);
        }
    }

    if matches!(req.event.status, EventStatus::Completed | EventStatus::Cancelled) {
        return Err(RegistrationRejection::EventClosed(req.event.status));
    }

    let requested = i64::from(req.guest_count) + 1;
    let available = i64::from(req.event.capacity) - seats_used(registrations);
    if requested > available {
        return Err(RegistrationRejection::NoSeats {
            available: available.max(0),
            requested,
        });
    }

    if req.event.vip_only && !req.user_is_vip {
        return Err(RegistrationRejection::VipOnly);
    }

    let duplicate = registrations
        .iter()
        .any(|r| r.user_id == req.user_id && holds_seats(r.status));
    if duplicate {
        return Err(RegistrationRejection::AlreadyRegistered);
    }

    Ok(())
}

/// Applies a delta to the stored tally, never going below zero.
pub fn adjust_registered_count(current: i32, delta: i32) -> i32 {
    current.saturating_add(delta).max(0)
}
