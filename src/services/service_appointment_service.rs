use chrono::{Duration, NaiveDateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::{debug, info};
use rust_decimal::Decimal;

use crate::booking::conflicts::{service_bays_full, service_slot, ACTIVE_SERVICE_STATUSES, OUT_OF_RANGE};
use crate::booking::{plan_transition, Transition};
use crate::config::{AppConfig, DbPool};
use crate::db;
use crate::errors::ApiError;
use crate::models::*;
use crate::services::{CarService, UserService};

pub struct ServiceAppointmentService;

impl ServiceAppointmentService {
    fn load(conn: &mut PgConnection, appointment_id: i32) -> Result<ServiceAppointment, ApiError> {
        use crate::schema::service_appointments::dsl::*;
        service_appointments
            .find(appointment_id)
            .select(ServiceAppointment::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::not_found("Service appointment"))
    }

    pub async fn create_appointment(
        user: i32,
        req: CreateServiceAppointmentRequest,
        config: &AppConfig,
        pool: &DbPool,
    ) -> Result<ServiceAppointment, ApiError> {
        req.validate().map_err(ApiError::ValidationError)?;
        if matches!(req.estimated_cost, Some(c) if c < Decimal::ZERO) {
            return Err(ApiError::validation("Estimated cost must not be negative"));
        }
        let slot_hours = config.service_slot_hours;
        let bays = config.service_bays;
        let slot = service_slot(req.scheduled_date, slot_hours).ok_or_else(|| ApiError::validation(OUT_OF_RANGE))?;

        let appointment = db::run_serializable(pool, move |conn| {
            use crate::schema::service_appointments::dsl::*;

            UserService::load_active(conn, user)?;
            if let Some(id_of_car) = req.car_id {
                CarService::load(conn, id_of_car)?;
            }

            // Any appointment starting less than one slot before or after ours
            // may share a bay with it.
            let earliest = slot
                .start
                .checked_sub_signed(Duration::hours(slot_hours))
                .unwrap_or(NaiveDateTime::MIN);
            let nearby = service_appointments
                .filter(status.eq_any(ACTIVE_SERVICE_STATUSES))
                .filter(scheduled_date.gt(earliest))
                .filter(scheduled_date.lt(slot.end))
                .select(ServiceAppointment::as_select())
                .load(conn)?;

            if service_bays_full(&nearby, slot, slot_hours, bays) {
                debug!("Service booking rejected: all {} bays taken at {}", bays, req.scheduled_date);
                return Err(ApiError::validation("All service bays are booked for this time slot"));
            }

            let new_appointment = NewServiceAppointment {
                user_id: user,
                car_id: req.car_id,
                customer_car_info: req.customer_car_info,
                scheduled_date: req.scheduled_date,
                service_type: req.service_type.trim().to_string(),
                description: req.description,
                status: ServiceStatus::Scheduled,
                estimated_cost: req.estimated_cost,
            };

            diesel::insert_into(service_appointments)
                .values(&new_appointment)
                .returning(ServiceAppointment::as_returning())
                .get_result(conn)
                .map_err(ApiError::from)
        })
        .await?;

        info!(
            "Service appointment {} booked at {} by user {}",
            appointment.id, appointment.scheduled_date, appointment.user_id
        );
        Ok(appointment)
    }

    pub async fn update_status(
        appointment_id: i32,
        req: UpdateServiceStatusRequest,
        manager: i32,
        pool: &DbPool,
    ) -> Result<ServiceAppointment, ApiError> {
        if matches!(req.final_cost, Some(c) if c < Decimal::ZERO) {
            return Err(ApiError::validation("Final cost must not be negative"));
        }

        let appointment = db::run_serializable(pool, move |conn| {
            let current = Self::load(conn, appointment_id)?;
            let transition = plan_transition(current.status, req.status)?;
            let assignee = if req.assign_to_me { Some(manager) } else { current.assigned_manager_id };

            if transition == Transition::Unchanged
                && req.final_cost.is_none()
                && req.parts_replaced.is_none()
                && req.mechanic_notes.is_none()
                && assignee == current.assigned_manager_id
            {
                return Ok(current);
            }

            use crate::schema::service_appointments::dsl::*;
            diesel::update(service_appointments.find(appointment_id))
                .set((
                    status.eq(req.status),
                    final_cost.eq(req.final_cost.or(current.final_cost)),
                    parts_replaced.eq(req.parts_replaced.unwrap_or(current.parts_replaced)),
                    mechanic_notes.eq(req.mechanic_notes.or(current.mechanic_notes)),
                    assigned_manager_id.eq(assignee),
                    updated_at.eq(Utc::now().naive_utc()),
                ))
                .returning(ServiceAppointment::as_returning())
                .get_result(conn)
                .map_err(ApiError::from)
        })
        .await?;

        info!("Service appointment {} is now {}", appointment.id, appointment.status);
        Ok(appointment)
    }

    pub async fn cancel_own(appointment_id: i32, user: i32, pool: &DbPool) -> Result<ServiceAppointment, ApiError> {
        db::run_serializable(pool, move |conn| {
            let current = Self::load(conn, appointment_id)?;
            if current.user_id != user {
                return Err(ApiError::ForbiddenError(
                    "You can only cancel your own service appointments".to_string(),
                ));
            }
            if plan_transition(current.status, ServiceStatus::Cancelled)? == Transition::Unchanged {
                return Ok(current);
            }

            use crate::schema::service_appointments::dsl::*;
            diesel::update(service_appointments.find(appointment_id))
                .set((status.eq(ServiceStatus::Cancelled), updated_at.eq(Utc::now().naive_utc())))
                .returning(ServiceAppointment::as_returning())
                .get_result(conn)
                .map_err(ApiError::from)
        })
        .await
    }

    pub async fn get_appointment(appointment_id: i32, pool: &DbPool) -> Result<ServiceAppointment, ApiError> {
        db::run(pool, move |conn| Self::load(conn, appointment_id)).await
    }

    pub async fn list_for_user(user: i32, pool: &DbPool) -> Result<Vec<ServiceAppointment>, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::service_appointments::dsl::*;
            service_appointments
                .filter(user_id.eq(user))
                .select(ServiceAppointment::as_select())
                .order(scheduled_date.desc())
                .load(conn)
                .map_err(ApiError::from)
        })
        .await
    }

    pub async fn list_appointments(
        filter: ServiceAppointmentFilter,
        pool: &DbPool,
    ) -> Result<Vec<ServiceAppointment>, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::service_appointments::dsl::*;
            let mut query = service_appointments
                .select(ServiceAppointment::as_select())
                .into_boxed();
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

    pub async fn delete_appointment(appointment_id: i32, pool: &DbPool) -> Result<(), ApiError> {
        let deleted = db::run(pool, move |conn| {
            use crate::schema::service_appointments::dsl::*;
            diesel::delete(service_appointments.find(appointment_id))
                .execute(conn)
                .map_err(ApiError::from)
        })
        .await?;

        if deleted == 0 {
            return Err(ApiError::not_found("Service appointment"));
        }
        info!("Deleted service appointment {}", appointment_id);
        Ok(())
    }
}
