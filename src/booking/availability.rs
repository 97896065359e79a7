use serde::Deserialize;

use crate::models::Car;

/// How a customer wants to use a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingMode {
    Purchase,
    Rental,
    Reservation,
    TestDrive,
    Service,
}

/// The static flags on a car that gate booking.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarFlags {
    pub available: bool,
    pub rental_available: bool,
    pub test_drive_available: bool,
}

impl From<&Car> for CarFlags {
    fn from(car: &Car) -> Self {
        CarFlags {
            available: car.available,
            rental_available: car.rental_available,
            test_drive_available: car.test_drive_available,
        }
    }
}

pub fn can_book(flags: CarFlags, mode: BookingMode) -> bool {
    match mode {
        BookingMode::Purchase | BookingMode::Reservation => flags.available,
        BookingMode::Rental => flags.rental_available && flags.available,
        BookingMode::TestDrive => flags.test_drive_available,
        BookingMode::Service => true,
    }
}

pub fn unavailable_message(mode: BookingMode) -> &'static str {
    match mode {
        BookingMode::Purchase => "Car is unavailable for purchase",
        BookingMode::Rental => "Car is unavailable for rental",
        BookingMode::Reservation => "Car is unavailable for reservation",
        BookingMode::TestDrive => "Car is unavailable for test drives",
        BookingMode::Service => "Car is unavailable for service",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_needs_available() {
        let flags = CarFlags { available: true, ..Default::default() };
        assert!(can_book(flags, BookingMode::Purchase));
        assert!(!can_book(CarFlags::default(), BookingMode::Purchase));
    }

    #[test]
    fn rental_needs_both_flags() {
        let rental_only = CarFlags { rental_available: true, ..Default::default() };
        assert!(!can_book(rental_only, BookingMode::Rental));

        let both = CarFlags { available: true, rental_available: true, ..Default::default() };
        assert!(can_book(both, BookingMode::Rental));
    }

    #[test]
    fn test_drive_ignores_sale_state() {
        let sold = CarFlags { available: false, test_drive_available: true, ..Default::default() };
        assert!(can_book(sold, BookingMode::TestDrive));
        assert!(!can_book(CarFlags::default(), BookingMode::TestDrive));
    }
}
