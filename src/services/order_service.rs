use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::{debug, info};
use rust_decimal::Decimal;

use crate::booking::conflicts::{rental_conflicts, reservation_conflicts, ACTIVE_ORDER_STATUSES};
use crate::booking::{can_book, plan_transition, releases_car, unavailable_message, BookingMode, CarFlags, Transition};
use crate::config::DbPool;
use crate::db;
use crate::errors::ApiError;
use crate::models::*;
use crate::services::{CarService, UserService};

fn booking_mode(order_type: OrderType) -> BookingMode {
    match order_type {
        OrderType::Purchase => BookingMode::Purchase,
        OrderType::Rental => BookingMode::Rental,
        OrderType::Reservation => BookingMode::Reservation,
    }
}

/// Default price when the client does not send one: the sticker price for a
/// purchase, days × daily rate for a rental (at least one day), nothing for a
/// reservation.
pub fn default_total(car: &Car, window: OrderWindow) -> Decimal {
    match window {
        OrderWindow::None => car.price,
        OrderWindow::Rental { start, end } => {
            let days = (end - start).num_days().max(1);
            car.rental_price_per_day.unwrap_or(Decimal::ZERO) * Decimal::from(days)
        }
        OrderWindow::Reservation(_) => Decimal::ZERO,
    }
}

pub struct OrderService;

impl OrderService {
    fn load(conn: &mut PgConnection, order_id: i32) -> Result<Order, ApiError> {
        use crate::schema::orders::dsl::*;
        orders
            .find(order_id)
            .select(Order::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::not_found("Order"))
    }

    fn active_orders_for_car(conn: &mut PgConnection, car: i32, kind: OrderType) -> Result<Vec<Order>, ApiError> {
        use crate::schema::orders::dsl::*;
        orders
            .filter(car_id.eq(car))
            .filter(order_type.eq(kind))
            .filter(status.eq_any(ACTIVE_ORDER_STATUSES))
            .select(Order::as_select())
            .load(conn)
            .map_err(ApiError::from)
    }

    pub async fn create_order(user: i32, req: CreateOrderRequest, pool: &DbPool) -> Result<Order, ApiError> {
        let window = req.window().map_err(ApiError::ValidationError)?;
        if matches!(req.total_amount, Some(t) if t < Decimal::ZERO) {
            return Err(ApiError::validation("Total amount must not be negative"));
        }

        let order = db::run_serializable(pool, move |conn| {
            UserService::load_active(conn, user)?;
            let car = CarService::load(conn, req.car_id)?;

            let mode = booking_mode(req.order_type);
            if !can_book(CarFlags::from(&car), mode) {
                debug!("Order rejected: car {} not bookable for {:?}", car.id, mode);
                return Err(ApiError::validation(unavailable_message(mode)));
            }

            match window {
                OrderWindow::Rental { start, end } => {
                    let existing = Self::active_orders_for_car(conn, car.id, OrderType::Rental)?;
                    if !rental_conflicts(&existing, car.id, start, end).is_empty() {
                        return Err(ApiError::validation("Car is already rented for the selected dates"));
                    }
                }
                OrderWindow::Reservation(date) => {
                    let existing = Self::active_orders_for_car(conn, car.id, OrderType::Reservation)?;
                    if !reservation_conflicts(&existing, car.id, date).is_empty() {
                        return Err(ApiError::validation("Car is already reserved for this date"));
                    }
                }
                OrderWindow::None => {}
            }

            let new_order = NewOrder {
                user_id: user,
                car_id: car.id,
                order_type: req.order_type,
                status: OrderStatus::Pending,
                total_amount: req.total_amount.unwrap_or_else(|| default_total(&car, window)),
                payment_method: req.payment_method,
                rental_start_date: req.rental_start_date.filter(|_| req.order_type == OrderType::Rental),
                rental_end_date: req.rental_end_date.filter(|_| req.order_type == OrderType::Rental),
                reservation_date: req.reservation_date.filter(|_| req.order_type == OrderType::Reservation),
                notes: req.notes,
            };

            let order = {
                use crate::schema::orders::dsl::*;
                diesel::insert_into(orders)
                    .values(&new_order)
                    .returning(Order::as_returning())
                    .get_result(conn)?
            };

            if order.order_type == OrderType::Purchase {
                CarService::set_available(conn, order.car_id, false)?;
            }

            Ok(order)
        })
        .await?;

        info!(
            "Order {} created: {} of car {} by user {}",
            order.id, order.order_type, order.car_id, order.user_id
        );
        Ok(order)
    }

    /// Writes the status and, when the transition releases the car, flips it
    /// back to available. Re-sending the current status changes nothing.
    fn apply_status(
        conn: &mut PgConnection,
        order: Order,
        next: OrderStatus,
        extra_notes: Option<String>,
    ) -> Result<Order, ApiError> {
        let transition = plan_transition(order.status, next)?;
        if transition == Transition::Unchanged {
            debug!("Order {} already {}", order.id, next);
            return Ok(order);
        }

        let updated = {
            use crate::schema::orders::dsl::*;
            diesel::update(orders.find(order.id))
                .set((
                    status.eq(next),
                    notes.eq(extra_notes.or(order.notes.clone())),
                    updated_at.eq(Utc::now().naive_utc()),
                ))
                .returning(Order::as_returning())
                .get_result(conn)?
        };

        if releases_car(order.order_type, transition) {
            CarService::set_available(conn, order.car_id, true)?;
            info!("Car {} released by order {}", order.car_id, order.id);
        }

        Ok(updated)
    }

    pub async fn update_status(order_id: i32, req: UpdateOrderStatusRequest, pool: &DbPool) -> Result<Order, ApiError> {
        let order = db::run_serializable(pool, move |conn| {
            let order = Self::load(conn, order_id)?;
            Self::apply_status(conn, order, req.status, req.notes)
        })
        .await?;

        info!("Order {} is now {}", order.id, order.status);
        Ok(order)
    }

    /// Customer-side cancel: only the owner, only while pending.
    pub async fn cancel_own(order_id: i32, user: i32, pool: &DbPool) -> Result<Order, ApiError> {
        db::run_serializable(pool, move |conn| {
            let order = Self::load(conn, order_id)?;
            if order.user_id != user {
                return Err(ApiError::ForbiddenError("You can only cancel your own orders".to_string()));
            }
            if !matches!(order.status, OrderStatus::Pending | OrderStatus::Cancelled) {
                return Err(ApiError::validation("Only pending orders can be cancelled"));
            }
            Self::apply_status(conn, order, OrderStatus::Cancelled, None)
        })
        .await
    }

    pub async fn get_order(order_id: i32, pool: &DbPool) -> Result<Order, ApiError> {
        db::run(pool, move |conn| Self::load(conn, order_id)).await
    }

    pub async fn list_orders(filter: OrderFilter, pool: &DbPool) -> Result<Vec<Order>, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::orders::dsl::*;
            let mut query = orders.select(Order::as_select()).into_boxed();
            if let Some(s) = filter.status {
                query = query.filter(status.eq(s));
            }
            if let Some(t) = filter.order_type {
                query = query.filter(order_type.eq(t));
            }
            if let Some(c) = filter.car_id {
                query = query.filter(car_id.eq(c));
            }
            if let Some(u) = filter.user_id {
                query = query.filter(user_id.eq(u));
            }
            query.order(created_at.desc()).load(conn).map_err(ApiError::from)
        })
        .await
    }

    pub async fn list_for_user(user: i32, pool: &DbPool) -> Result<Vec<Order>, ApiError> {
        Self::list_orders(OrderFilter { user_id: Some(user), ..Default::default() }, pool).await
    }

    pub async fn delete_order(order_id: i32, pool: &DbPool) -> Result<(), ApiError> {
        let deleted = db::run(pool, move |conn| {
            use crate::schema::orders::dsl::*;
            diesel::delete(orders.find(order_id)).execute(conn).map_err(ApiError::from)
        })
        .await?;

        if deleted == 0 {
            return Err(ApiError::not_found("Order"));
        }
        info!("Deleted order {}", order_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn car() -> Car {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        Car {
            id: 1,
            brand: "Audi".to_string(),
            model: "A4".to_string(),
            year: 2022,
            vin: "WAUZZZ8K9BA000001".to_string(),
            price: dec!(250000),
            mileage: 12000,
            color: None,
            fuel_type: None,
            transmission: None,
            body_type: None,
            category: None,
            description: None,
            available: true,
            rental_available: true,
            rental_price_per_day: Some(dec!(150)),
            test_drive_available: true,
            images: vec![],
            main_image: None,
            features: vec![],
            created_at: ts,
            updated_at: ts,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn purchase_defaults_to_sticker_price() {
        assert_eq!(default_total(&car(), OrderWindow::None), dec!(250000));
    }

    #[test]
    fn rental_total_is_days_times_rate() {
        let window = OrderWindow::Rental { start: day(1), end: day(10) };
        assert_eq!(default_total(&car(), window), dec!(1350));
    }

    #[test]
    fn zero_length_rental_bills_one_day() {
        let window = OrderWindow::Rental { start: day(1), end: day(1) };
        assert_eq!(default_total(&car(), window), dec!(150));
    }
}
