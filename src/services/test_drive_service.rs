use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::{debug, info};

use crate::booking::conflicts::{test_drive_conflicts, test_drive_window, ACTIVE_TEST_DRIVE_STATUSES, OUT_OF_RANGE};
use crate::booking::{can_book, plan_transition, unavailable_message, BookingMode, CarFlags, Transition};
use crate::config::{AppConfig, DbPool};
use crate::db;
use crate::errors::ApiError;
use crate::models::*;
use crate::services::{CarService, UserService};

pub struct TestDriveService;

impl TestDriveService {
    fn load(conn: &mut PgConnection, drive_id: i32) -> Result<TestDrive, ApiError> {
        use crate::schema::test_drives::dsl::*;
        test_drives
            .find(drive_id)
            .select(TestDrive::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::not_found("Test drive"))
    }

    pub async fn create_test_drive(
        user: i32,
        req: CreateTestDriveRequest,
        config: &AppConfig,
        pool: &DbPool,
    ) -> Result<TestDrive, ApiError> {
        let minutes = req.duration_minutes().map_err(ApiError::ValidationError)?;
        if req.scheduled_date <= Utc::now().naive_utc() {
            return Err(ApiError::validation("Test drive must be scheduled in the future"));
        }
        let buffer = config.test_drive_buffer_minutes;
        let window = test_drive_window(req.scheduled_date, minutes, buffer)
            .ok_or_else(|| ApiError::validation(OUT_OF_RANGE))?;

        let drive = db::run_serializable(pool, move |conn| {
            use crate::schema::test_drives::dsl::*;

            UserService::load_active(conn, user)?;
            let car = CarService::load(conn, req.car_id)?;
            if !can_book(CarFlags::from(&car), BookingMode::TestDrive) {
                return Err(ApiError::validation(unavailable_message(BookingMode::TestDrive)));
            }

            let nearby = test_drives
                .filter(car_id.eq(car.id))
                .filter(status.eq_any(ACTIVE_TEST_DRIVE_STATUSES))
                .filter(scheduled_date.between(window.start, window.end))
                .select(TestDrive::as_select())
                .load(conn)?;
            if !test_drive_conflicts(&nearby, car.id, window).is_empty() {
                debug!("Test drive rejected: car {} busy around {}", car.id, req.scheduled_date);
                return Err(ApiError::validation("Car already has a test drive booked around this time"));
            }

            let new_drive = NewTestDrive {
                user_id: user,
                car_id: car.id,
                scheduled_date: req.scheduled_date,
                duration: minutes,
                status: TestDriveStatus::Pending,
                notes: req.notes,
            };

            diesel::insert_into(test_drives)
                .values(&new_drive)
                .returning(TestDrive::as_returning())
                .get_result(conn)
                .map_err(ApiError::from)
        })
        .await?;

        info!(
            "Test drive {} booked: car {} at {} by user {}",
            drive.id, drive.car_id, drive.scheduled_date, drive.user_id
        );
        Ok(drive)
    }

    pub async fn update_status(
        drive_id: i32,
        req: UpdateTestDriveStatusRequest,
        manager: i32,
        pool: &DbPool,
    ) -> Result<TestDrive, ApiError> {
        let drive = db::run_serializable(pool, move |conn| {
            let current = Self::load(conn, drive_id)?;
            let transition = plan_transition(current.status, req.status)?;
            let assignee = if req.assign_to_me { Some(manager) } else { current.assigned_manager_id };

            if transition == Transition::Unchanged
                && req.feedback.is_none()
                && req.notes.is_none()
                && assignee == current.assigned_manager_id
            {
                return Ok(current);
            }

            use crate::schema::test_drives::dsl::*;
            diesel::update(test_drives.find(drive_id))
                .set((
                    status.eq(req.status),
                    assigned_manager_id.eq(assignee),
                    feedback.eq(req.feedback.or(current.feedback)),
                    notes.eq(req.notes.or(current.notes)),
                    updated_at.eq(Utc::now().naive_utc()),
                ))
                .returning(TestDrive::as_returning())
                .get_result(conn)
                .map_err(ApiError::from)
        })
        .await?;

        info!("Test drive {} is now {}", drive.id, drive.status);
        Ok(drive)
    }

    pub async fn cancel_own(drive_id: i32, user: i32, pool: &DbPool) -> Result<TestDrive, ApiError> {
        db::run_serializable(pool, move |conn| {
            let current = Self::load(conn, drive_id)?;
            if current.user_id != user {
                return Err(ApiError::ForbiddenError("You can only cancel your own test drives".to_string()));
            }
            if plan_transition(current.status, TestDriveStatus::Cancelled)? == Transition::Unchanged {
                return Ok(current);
            }

            use crate::schema::test_drives::dsl::*;
            diesel::update(test_drives.find(drive_id))
                .set((status.eq(TestDriveStatus::Cancelled), updated_at.eq(Utc::now().naive_utc())))
                .returning(TestDrive::as_returning())
                .get_result(conn)
                .map_err(ApiError::from)
        })
        .await
    }

    pub async fn get_test_drive(drive_id: i32, pool: &DbPool) -> Result<TestDrive, ApiError> {
        db::run(pool, move |conn| Self::load(conn, drive_id)).await
    }

    pub async fn list_for_user(user: i32, pool: &DbPool) -> Result<Vec<TestDrive>, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::test_drives::dsl::*;
            test_drives
                .filter(user_id.eq(user))
                .select(TestDrive::as_select())
                .order(scheduled_date.desc())
                .load(conn)
                .map_err(ApiError::from)
        })
        .await
    }

    pub async fn list_test_drives(filter: TestDriveFilter, pool: &DbPool) -> Result<Vec<TestDrive>, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::test_drives::dsl::*;
            let mut query = test_drives.select(TestDrive::as_select()).into_boxed();
            if let Some(s) = filter.status {
                query = query.filter(status.eq(s));
            }
            if let Some(c) = filter.car_id {
                query = query.filter(car_id.eq(c));
            }
            if let Some(from) = filter.from {
                query = query.filter(scheduled_date.ge(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(scheduled_date.le(to));
            }
            query.order(scheduled_date.asc()).load(conn).map_err(ApiError::from)
        })
        .await
    }

    pub async fn delete_test_drive(drive_id: i32, pool: &DbPool) -> Result<(), ApiError> {
        let deleted = db::run(pool, move |conn| {
            use crate::schema::test_drives::dsl::*;
            diesel::delete(test_drives.find(drive_id)).execute(conn).map_err(ApiError::from)
        })
        .await?;

        if deleted == 0 {
            return Err(ApiError::not_found("Test drive"));
        }
        info!("Deleted test drive {}", drive_id);
        Ok(())
    }
}
