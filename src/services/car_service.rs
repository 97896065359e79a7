use chrono::Utc;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::info;

use crate::booking::{can_book, BookingMode, CarFlags};
use crate::config::DbPool;
use crate::db;
use crate::errors::ApiError;
use crate::models::*;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

fn map_vin_conflict(e: DieselError) -> ApiError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            ApiError::validation("A car with this VIN already exists")
        }
        other => ApiError::from(other),
    }
}

/// Rows to skip for a 1-based page, pinned at `i64::MAX` for absurd pages.
fn page_offset(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(limit)
}

pub struct CarService;

impl CarService {
    pub(crate) fn load(conn: &mut PgConnection, car_id: i32) -> Result<Car, ApiError> {
        use crate::schema::cars::dsl::*;
        cars.find(car_id)
            .select(Car::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::not_found("Car"))
    }

    pub(crate) fn set_available(conn: &mut PgConnection, car_id: i32, value: bool) -> Result<(), ApiError> {
        use crate::schema::cars::dsl::*;
        diesel::update(cars.find(car_id))
            .set((available.eq(value), updated_at.eq(Utc::now().naive_utc())))
            .execute(conn)?;
        Ok(())
    }

    pub async fn get_car(car_id: i32, pool: &DbPool) -> Result<Car, ApiError> {
        db::run(pool, move |conn| Self::load(conn, car_id)).await
    }

    pub async fn list_cars(filter: CarFilter, pool: &DbPool) -> Result<CarPage, ApiError> {
        let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = filter.page.unwrap_or(1).max(1);

        db::run(pool, move |conn| {
            use crate::schema::cars::dsl::*;

            // Built twice: once for the count, once for the page.
            let build = || -> crate::schema::cars::BoxedQuery<'static, Pg> {
                let mut query = cars.into_boxed();
                if let Some(b) = &filter.brand {
                    query = query.filter(brand.ilike(b.clone()));
                }
                if let Some(c) = &filter.category {
                    query = query.filter(category.eq(c.clone()));
                }
                if let Some(f) = &filter.fuel_type {
                    query = query.filter(fuel_type.eq(f.clone()));
                }
                if let Some(t) = &filter.transmission {
                    query = query.filter(transmission.eq(t.clone()));
                }
                if let Some(p) = filter.min_price {
                    query = query.filter(price.ge(p));
                }
                if let Some(p) = filter.max_price {
                    query = query.filter(price.le(p));
                }
                if let Some(y) = filter.min_year {
                    query = query.filter(year.ge(y));
                }
                if let Some(y) = filter.max_year {
                    query = query.filter(year.le(y));
                }
                if let Some(a) = filter.available {
                    query = query.filter(available.eq(a));
                }
                if let Some(r) = filter.rental_available {
                    query = query.filter(rental_available.eq(r));
                }
                if let Some(t) = filter.test_drive_available {
                    query = query.filter(test_drive_available.eq(t));
                }
                if let Some(s) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                    let pattern = format!("%{}%", s);
                    query = query.filter(brand.ilike(pattern.clone()).or(model.ilike(pattern)));
                }
                query
            };

            let total: i64 = build().count().get_result(conn)?;
            let items = build()
                .select(Car::as_select())
                .order(created_at.desc())
                .limit(limit)
                .offset(page_offset(page, limit))
                .load(conn)?;

            Ok(CarPage { cars: items, total, page, limit })
        })
        .await
    }

    /// Cars whose flags allow the given mode.
    pub async fn list_bookable(mode: BookingMode, pool: &DbPool) -> Result<Vec<Car>, ApiError> {
        let all = db::run(pool, move |conn| {
            use crate::schema::cars::dsl::*;
            cars.select(Car::as_select())
                .order(created_at.desc())
                .load(conn)
                .map_err(ApiError::from)
        })
        .await?;

        Ok(all.into_iter().filter(|c| can_book(CarFlags::from(c), mode)).collect())
    }

    pub async fn create_car(req: CreateCarRequest, pool: &DbPool) -> Result<Car, ApiError> {
        req.validate().map_err(ApiError::ValidationError)?;
        let new_car = req.into_new_car();

        let car = db::run(pool, move |conn| {
            use crate::schema::cars::dsl::*;
            diesel::insert_into(cars)
                .values(&new_car)
                .returning(Car::as_returning())
                .get_result(conn)
                .map_err(map_vin_conflict)
        })
        .await?;

        info!("Created car {} ({} {} {})", car.id, car.year, car.brand, car.model);
        Ok(car)
    }

    pub async fn update_car(car_id: i32, req: UpdateCarRequest, pool: &DbPool) -> Result<Car, ApiError> {
        db::run(pool, move |conn| {
            db::transaction(conn, |conn| {
                use crate::schema::cars::dsl::*;
                let current = Self::load(conn, car_id)?;
                let changes = req
                    .into_changeset(&current, Utc::now().naive_utc())
                    .map_err(ApiError::ValidationError)?;
                diesel::update(cars.find(car_id))
                    .set(&changes)
                    .returning(Car::as_returning())
                    .get_result(conn)
                    .map_err(map_vin_conflict)
            })
        })
        .await
    }

    pub async fn set_main_image(car_id: i32, index: usize, pool: &DbPool) -> Result<Car, ApiError> {
        Self::update_car(
            car_id,
            UpdateCarRequest { main_image_index: Some(index), ..Default::default() },
            pool,
        )
        .await
    }

    pub async fn delete_car(car_id: i32, pool: &DbPool) -> Result<(), ApiError> {
        let deleted = db::run(pool, move |conn| {
            use crate::schema::cars::dsl::*;
            diesel::delete(cars.find(car_id)).execute(conn).map_err(ApiError::from)
        })
        .await?;

        if deleted == 0 {
            return Err(ApiError::not_found("Car"));
        }
        info!("Deleted car {}", car_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offset_saturates() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
        assert_eq!(page_offset(i64::MAX, 100), i64::MAX);
    }
}
