//! Temporal overlap checks against bookings already on file.
//!
//! Callers load candidate rows for the resource (narrowed by car or time in
//! SQL); the functions here decide which of them actually conflict.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::{
    Order, OrderStatus, OrderType, ServiceAppointment, ServiceStatus, TestDrive, TestDriveStatus,
};

pub const ACTIVE_ORDER_STATUSES: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Confirmed];
pub const ACTIVE_TEST_DRIVE_STATUSES: [TestDriveStatus; 2] =
    [TestDriveStatus::Pending, TestDriveStatus::Confirmed];
pub const ACTIVE_SERVICE_STATUSES: [ServiceStatus; 2] =
    [ServiceStatus::Scheduled, ServiceStatus::InProgress];

fn within(date: Option<NaiveDate>, start: NaiveDate, end: NaiveDate) -> bool {
    date.is_some_and(|d| d >= start && d <= end)
}

/// Active rentals of the car whose start or end date falls inside
/// `[start, end]`. A candidate strictly nested inside an existing rental is
/// not reported.
pub fn rental_conflicts(existing: &[Order], car_id: i32, start: NaiveDate, end: NaiveDate) -> Vec<&Order> {
    existing
        .iter()
        .filter(|o| o.car_id == car_id && o.order_type == OrderType::Rental)
        .filter(|o| ACTIVE_ORDER_STATUSES.contains(&o.status))
        .filter(|o| within(o.rental_start_date, start, end) || within(o.rental_end_date, start, end))
        .collect()
}

pub fn reservation_conflicts(existing: &[Order], car_id: i32, date: NaiveDate) -> Vec<&Order> {
    existing
        .iter()
        .filter(|o| o.car_id == car_id && o.order_type == OrderType::Reservation)
        .filter(|o| ACTIVE_ORDER_STATUSES.contains(&o.status))
        .filter(|o| o.reservation_date == Some(date))
        .collect()
}

/// Inclusive time window, e.g. a padded test-drive slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        t >= self.start && t <= self.end
    }
}

pub const OUT_OF_RANGE: &str = "Scheduled date out of range";

/// `[scheduled - buffer, scheduled + duration + buffer]`, or `None` when the
/// padded window falls outside the representable calendar.
pub fn test_drive_window(scheduled: NaiveDateTime, duration_minutes: i32, buffer_minutes: i64) -> Option<TimeWindow> {
    let buffer = Duration::try_minutes(buffer_minutes)?;
    let length = Duration::try_minutes(i64::from(duration_minutes))?;
    Some(TimeWindow {
        start: scheduled.checked_sub_signed(buffer)?,
        end: scheduled.checked_add_signed(length)?.checked_add_signed(buffer)?,
    })
}

pub fn test_drive_conflicts(existing: &[TestDrive], car_id: i32, window: TimeWindow) -> Vec<&TestDrive> {
    existing
        .iter()
        .filter(|td| td.car_id == car_id)
        .filter(|td| ACTIVE_TEST_DRIVE_STATUSES.contains(&td.status))
        .filter(|td| window.contains(td.scheduled_date))
        .collect()
}

/// `[scheduled, scheduled + slot_hours]`, or `None` past the end of the calendar.
pub fn service_slot(scheduled: NaiveDateTime, slot_hours: i64) -> Option<TimeWindow> {
    Some(TimeWindow {
        start: scheduled,
        end: scheduled.checked_add_signed(Duration::try_hours(slot_hours)?)?,
    })
}

/// Number of active appointments (any car) whose own slot overlaps `slot`.
/// Slots are treated as half-open so back-to-back appointments share a bay.
pub fn overlapping_service_count(existing: &[ServiceAppointment], slot: TimeWindow, slot_hours: i64) -> usize {
    existing
        .iter()
        .filter(|a| ACTIVE_SERVICE_STATUSES.contains(&a.status))
        .filter(|a| {
            let other_end = service_slot(a.scheduled_date, slot_hours).map_or(NaiveDateTime::MAX, |o| o.end);
            a.scheduled_date < slot.end && slot.start < other_end
        })
        .count()
}

pub fn service_bays_full(existing: &[ServiceAppointment], slot: TimeWindow, slot_hours: i64, bays: i64) -> bool {
    overlapping_service_count(existing, slot, slot_hours) as i64 >= bays
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn at(h: u32, min: u32) -> NaiveDateTime {
        day(3, 3).and_hms_opt(h, min, 0).unwrap()
    }

    fn order(id: i32, kind: OrderType, status: OrderStatus) -> Order {
        let now = at(0, 0);
        Order {
            id,
            user_id: 1,
            car_id: 7,
            order_type: kind,
            status,
            total_amount: dec!(1000),
            payment_method: None,
            rental_start_date: None,
            rental_end_date: None,
            reservation_date: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn rental(id: i32, start: NaiveDate, end: NaiveDate, status: OrderStatus) -> Order {
        Order {
            rental_start_date: Some(start),
            rental_end_date: Some(end),
            ..order(id, OrderType::Rental, status)
        }
    }

    fn test_drive(id: i32, scheduled: NaiveDateTime, status: TestDriveStatus) -> TestDrive {
        TestDrive {
            id,
            user_id: 1,
            car_id: 7,
            scheduled_date: scheduled,
            duration: 60,
            status,
            assigned_manager_id: None,
            notes: None,
            feedback: None,
            created_at: scheduled,
            updated_at: scheduled,
        }
    }

    fn appointment(id: i32, car_id: Option<i32>, scheduled: NaiveDateTime, status: ServiceStatus) -> ServiceAppointment {
        ServiceAppointment {
            id,
            user_id: 1,
            car_id,
            customer_car_info: None,
            scheduled_date: scheduled,
            service_type: "inspection".to_string(),
            description: None,
            status,
            estimated_cost: None,
            final_cost: None,
            parts_replaced: vec![],
            mechanic_notes: None,
            assigned_manager_id: None,
            created_at: scheduled,
            updated_at: scheduled,
        }
    }

    #[test]
    fn rental_overlap_scenario() {
        let existing = vec![rental(1, day(6, 1), day(6, 10), OrderStatus::Confirmed)];

        assert_eq!(rental_conflicts(&existing, 7, day(6, 5), day(6, 15)).len(), 1);
        assert!(rental_conflicts(&existing, 7, day(6, 11), day(6, 20)).is_empty());
    }

    #[test]
    fn rental_boundaries_are_inclusive() {
        let existing = vec![rental(1, day(6, 1), day(6, 10), OrderStatus::Pending)];
        assert_eq!(rental_conflicts(&existing, 7, day(6, 10), day(6, 12)).len(), 1);
    }

    #[test]
    fn nested_rental_candidate_is_not_detected() {
        let existing = vec![rental(1, day(6, 1), day(6, 30), OrderStatus::Confirmed)];
        assert!(rental_conflicts(&existing, 7, day(6, 10), day(6, 12)).is_empty());
    }

    #[test]
    fn finished_rentals_and_other_cars_are_ignored() {
        let mut other_car = rental(2, day(6, 1), day(6, 10), OrderStatus::Confirmed);
        other_car.car_id = 8;
        let existing = vec![
            rental(1, day(6, 1), day(6, 10), OrderStatus::Cancelled),
            rental(3, day(6, 1), day(6, 10), OrderStatus::Completed),
            other_car,
        ];
        assert!(rental_conflicts(&existing, 7, day(6, 5), day(6, 6)).is_empty());
    }

    #[test]
    fn reservation_conflict_requires_same_date() {
        let mut booked = order(1, OrderType::Reservation, OrderStatus::Pending);
        booked.reservation_date = Some(day(7, 4));
        let existing = vec![booked];

        assert_eq!(reservation_conflicts(&existing, 7, day(7, 4)).len(), 1);
        assert!(reservation_conflicts(&existing, 7, day(7, 5)).is_empty());
    }

    #[test]
    fn test_drive_window_is_padded() {
        let window = test_drive_window(at(10, 0), 60, 60).unwrap();
        assert_eq!(window.start, at(9, 0));
        assert_eq!(window.end, at(12, 0));
    }

    #[test]
    fn test_drive_conflicts_inside_padding() {
        let existing = vec![
            test_drive(1, at(11, 30), TestDriveStatus::Confirmed),
            test_drive(2, at(12, 30), TestDriveStatus::Pending),
            test_drive(3, at(10, 0), TestDriveStatus::Cancelled),
        ];
        let window = test_drive_window(at(10, 0), 60, 60).unwrap();
        let hits: Vec<i32> = test_drive_conflicts(&existing, 7, window).iter().map(|t| t.id).collect();
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn service_bay_capacity_scenario() {
        let existing = vec![
            appointment(1, Some(1), at(9, 0), ServiceStatus::Scheduled),
            appointment(2, Some(2), at(9, 0), ServiceStatus::InProgress),
            appointment(3, None, at(9, 0), ServiceStatus::Scheduled),
        ];

        assert!(service_bays_full(&existing, service_slot(at(10, 0), 3).unwrap(), 3, 3));
        assert!(!service_bays_full(&existing, service_slot(at(13, 0), 3).unwrap(), 3, 3));
    }

    #[test]
    fn back_to_back_service_slots_do_not_collide() {
        let existing = vec![
            appointment(1, Some(1), at(9, 0), ServiceStatus::Scheduled),
            appointment(2, Some(2), at(9, 0), ServiceStatus::Scheduled),
            appointment(3, Some(3), at(9, 0), ServiceStatus::Scheduled),
        ];
        assert!(!service_bays_full(&existing, service_slot(at(12, 0), 3).unwrap(), 3, 3));
    }

    #[test]
    fn cancelled_appointments_free_a_bay() {
        let existing = vec![
            appointment(1, Some(1), at(9, 0), ServiceStatus::Scheduled),
            appointment(2, Some(2), at(9, 0), ServiceStatus::Cancelled),
            appointment(3, Some(3), at(9, 0), ServiceStatus::Completed),
        ];
        assert_eq!(overlapping_service_count(&existing, service_slot(at(10, 0), 3).unwrap(), 3), 1);
    }

    #[test]
    fn far_future_dates_have_no_window() {
        let far: NaiveDateTime = serde_json::from_str("\"+262142-12-31T23:00:00\"").unwrap();
        assert!(test_drive_window(far, 60, 60).is_none());
        assert!(service_slot(far, 3).is_none());
        assert!(test_drive_window(NaiveDateTime::MIN, 60, 60).is_none());
    }

    #[test]
    fn appointment_at_calendar_end_still_occupies_a_bay() {
        let last = NaiveDateTime::MAX - Duration::hours(1);
        let existing = vec![appointment(1, None, last, ServiceStatus::Scheduled)];
        let slot = TimeWindow { start: last - Duration::minutes(30), end: last + Duration::minutes(30) };
        assert_eq!(overlapping_service_count(&existing, slot, 3), 1);
    }
}
