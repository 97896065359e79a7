use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{OrderStatus, OrderType};
use crate::schema::orders;

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone)]
#[diesel(table_name = orders)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i32,
    pub user_id: i32,
    pub car_id: i32,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub payment_method: Option<String>,
    pub rental_start_date: Option<NaiveDate>,
    pub rental_end_date: Option<NaiveDate>,
    pub reservation_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub user_id: i32,
    pub car_id: i32,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub payment_method: Option<String>,
    pub rental_start_date: Option<NaiveDate>,
    pub rental_end_date: Option<NaiveDate>,
    pub reservation_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

// DTOs
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub car_id: i32,
    pub order_type: OrderType,
    pub total_amount: Option<Decimal>,
    pub payment_method: Option<String>,
    pub rental_start_date: Option<NaiveDate>,
    pub rental_end_date: Option<NaiveDate>,
    pub reservation_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// The booking window an order asks for, validated per order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderWindow {
    None,
    Rental { start: NaiveDate, end: NaiveDate },
    Reservation(NaiveDate),
}

impl CreateOrderRequest {
    pub fn window(&self) -> Result<OrderWindow, String> {
        match self.order_type {
            OrderType::Purchase => Ok(OrderWindow::None),
            OrderType::Rental => match (self.rental_start_date, self.rental_end_date) {
                (Some(start), Some(end)) if start <= end => Ok(OrderWindow::Rental { start, end }),
                (Some(_), Some(_)) => Err("Rental start date must not be after end date".to_string()),
                _ => Err("Rental orders require a start and end date".to_string()),
            },
            OrderType::Reservation => self
                .reservation_date
                .map(OrderWindow::Reservation)
                .ok_or_else(|| "Reservation orders require a reservation date".to_string()),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    pub notes: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub car_id: Option<i32>,
    pub user_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn rental(start: Option<NaiveDate>, end: Option<NaiveDate>) -> CreateOrderRequest {
        CreateOrderRequest {
            car_id: 1,
            order_type: OrderType::Rental,
            total_amount: None,
            payment_method: None,
            rental_start_date: start,
            rental_end_date: end,
            reservation_date: None,
            notes: None,
        }
    }

    #[test]
    fn zero_length_rental_is_accepted() {
        let req = rental(Some(date(6, 1)), Some(date(6, 1)));
        assert_eq!(
            req.window(),
            Ok(OrderWindow::Rental { start: date(6, 1), end: date(6, 1) })
        );
    }

    #[test]
    fn inverted_rental_is_rejected() {
        assert!(rental(Some(date(6, 10)), Some(date(6, 1))).window().is_err());
        assert!(rental(Some(date(6, 10)), None).window().is_err());
    }

    #[test]
    fn reservation_requires_date() {
        let mut req = rental(None, None);
        req.order_type = OrderType::Reservation;
        assert!(req.window().is_err());
        req.reservation_date = Some(date(7, 4));
        assert_eq!(req.window(), Ok(OrderWindow::Reservation(date(7, 4))));
    }
}
