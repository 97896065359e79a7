use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::{debug, info, warn};

use crate::booking::{
    adjust_registered_count, check_registration, plan_transition, seats_used, RegistrationRejection, SeatRequest,
    Transition,
};
use crate::config::DbPool;
use crate::db;
use crate::errors::ApiError;
use crate::models::*;
use crate::services::UserService;

pub struct EventService;

impl EventService {
    fn load(conn: &mut PgConnection, event_id: i32) -> Result<Event, ApiError> {
        use crate::schema::events::dsl::*;
        events
            .find(event_id)
            .select(Event::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::not_found("Event"))
    }

    fn load_registration(conn: &mut PgConnection, registration_id: i32) -> Result<EventRegistration, ApiError> {
        use crate::schema::event_registrations::dsl::*;
        event_registrations
            .find(registration_id)
            .select(EventRegistration::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::not_found("Registration"))
    }

    fn registrations_of(conn: &mut PgConnection, target: i32) -> Result<Vec<EventRegistration>, ApiError> {
        use crate::schema::event_registrations::dsl::*;
        event_registrations
            .filter(event_id.eq(target))
            .select(EventRegistration::as_select())
            .order(created_at.asc())
            .load(conn)
            .map_err(ApiError::from)
    }

    fn bump_registered_count(conn: &mut PgConnection, event: &Event, delta: i32) -> Result<(), ApiError> {
        use crate::schema::events::dsl::*;
        diesel::update(events.find(event.id))
            .set((
                registered_count.eq(adjust_registered_count(event.registered_count, delta)),
                updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;
        Ok(())
    }

    pub async fn get_event(event_id: i32, pool: &DbPool) -> Result<Event, ApiError> {
        db::run(pool, move |conn| Self::load(conn, event_id)).await
    }

    pub async fn list_events(filter: EventFilter, pool: &DbPool) -> Result<Vec<Event>, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::events::dsl::*;
            let mut query = events.select(Event::as_select()).into_boxed();
            if let Some(s) = filter.status {
                query = query.filter(status.eq(s));
            }
            if let Some(v) = filter.vip_only {
                query = query.filter(vip_only.eq(v));
            }
            if filter.upcoming {
                query = query.filter(event_date.ge(Utc::now().naive_utc()));
            }
            query.order(event_date.asc()).load(conn).map_err(ApiError::from)
        })
        .await
    }

    pub async fn create_event(req: CreateEventRequest, pool: &DbPool) -> Result<Event, ApiError> {
        req.validate().map_err(ApiError::ValidationError)?;
        let new_event = req.into_new_event();

        let event = db::run(pool, move |conn| {
            use crate::schema::events::dsl::*;
            diesel::insert_into(events)
                .values(&new_event)
                .returning(Event::as_returning())
                .get_result(conn)
                .map_err(ApiError::from)
        })
        .await?;

        info!("Created event {} '{}' with {} seats", event.id, event.title, event.capacity);
        Ok(event)
    }

    pub async fn update_event(event_id: i32, req: UpdateEventRequest, pool: &DbPool) -> Result<Event, ApiError> {
        let changes = req
            .into_changeset(Utc::now().naive_utc())
            .map_err(ApiError::ValidationError)?;

        db::run(pool, move |conn| {
            use crate::schema::events::dsl::*;
            diesel::update(events.find(event_id))
                .set(&changes)
                .returning(Event::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("Event"))
        })
        .await
    }

    pub async fn update_status(event_id: i32, next: EventStatus, pool: &DbPool) -> Result<Event, ApiError> {
        let event = db::run_serializable(pool, move |conn| {
            let current = Self::load(conn, event_id)?;
            if plan_transition(current.status, next)? == Transition::Unchanged {
                return Ok(current);
            }

            use crate::schema::events::dsl::*;
            diesel::update(events.find(event_id))
                .set((status.eq(next), updated_at.eq(Utc::now().naive_utc())))
                .returning(Event::as_returning())
                .get_result(conn)
                .map_err(ApiError::from)
        })
        .await?;

        info!("Event {} is now {}", event.id, event.status);
        Ok(event)
    }

    pub async fn delete_event(event_id: i32, pool: &DbPool) -> Result<(), ApiError> {
        let deleted = db::run(pool, move |conn| {
            use crate::schema::events::dsl::*;
            diesel::delete(events.find(event_id)).execute(conn).map_err(ApiError::from)
        })
        .await?;

        if deleted == 0 {
            return Err(ApiError::not_found("Event"));
        }
        info!("Deleted event {}", event_id);
        Ok(())
    }

    /// Seats the user plus guests. The seat check, the insert and the counter
    /// bump share one serializable transaction.
    pub async fn register(
        event_id: i32,
        user: i32,
        req: RegisterForEventRequest,
        pool: &DbPool,
    ) -> Result<EventRegistration, ApiError> {
        let registration = db::run_serializable(pool, move |conn| {
            let event = Self::load(conn, event_id)?;
            let is_vip = UserService::load_active(conn, user)?.vip_status;
            let existing = Self::registrations_of(conn, event.id)?;

            let request = SeatRequest {
                event: &event,
                user_id: user,
                user_is_vip: is_vip,
                guest_count: req.guest_count,
                now: Utc::now().naive_utc(),
            };
            if let Err(rejection) = check_registration(&request, &existing) {
                debug!("Registration for event {} by user {} rejected: {}", event.id, user, rejection);
                return Err(rejection.into());
            }

            let new_registration = NewEventRegistration {
                user_id: user,
                event_id: event.id,
                guest_count: req.guest_count,
                status: RegistrationStatus::Registered,
                notes: req.notes,
            };

            let registration = {
                use crate::schema::event_registrations::dsl::*;
                diesel::insert_into(event_registrations)
                    .values(&new_registration)
                    .returning(EventRegistration::as_returning())
                    .get_result(conn)
                    .map_err(|e| match e {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            ApiError::from(RegistrationRejection::AlreadyRegistered)
                        }
                        other => ApiError::from(other),
                    })?
            };

            Self::bump_registered_count(conn, &event, registration.seats())?;
            Ok(registration)
        })
        .await?;

        info!(
            "User {} registered for event {} with {} guest(s)",
            registration.user_id, registration.event_id, registration.guest_count
        );
        Ok(registration)
    }

    /// Releases the seats of a live registration. Cancelling twice is a no-op
    /// and never decrements the counter again.
    pub async fn cancel_registration(
        registration_id: i32,
        user: i32,
        pool: &DbPool,
    ) -> Result<EventRegistration, ApiError> {
        db::run_serializable(pool, move |conn| {
            let current = Self::load_registration(conn, registration_id)?;
            if current.user_id != user {
                return Err(ApiError::ForbiddenError(
                    "You can only cancel your own registrations".to_string(),
                ));
            }
            if plan_transition(current.status, RegistrationStatus::Cancelled)? == Transition::Unchanged {
                return Ok(current);
            }

            let updated = {
                use crate::schema::event_registrations::dsl::*;
                diesel::update(event_registrations.find(registration_id))
                    .set((status.eq(RegistrationStatus::Cancelled), updated_at.eq(Utc::now().naive_utc())))
                    .returning(EventRegistration::as_returning())
                    .get_result(conn)?
            };

            let event = Self::load(conn, current.event_id)?;
            Self::bump_registered_count(conn, &event, -current.seats())?;
            info!("Registration {} cancelled, {} seat(s) released", updated.id, current.seats());
            Ok(updated)
        })
        .await
    }

    pub async fn mark_attended(registration_id: i32, pool: &DbPool) -> Result<EventRegistration, ApiError> {
        db::run_serializable(pool, move |conn| {
            let current = Self::load_registration(conn, registration_id)?;
            if plan_transition(current.status, RegistrationStatus::Attended)? == Transition::Unchanged {
                return Ok(current);
            }

            use crate::schema::event_registrations::dsl::*;
            diesel::update(event_registrations.find(registration_id))
                .set((status.eq(RegistrationStatus::Attended), updated_at.eq(Utc::now().naive_utc())))
                .returning(EventRegistration::as_returning())
                .get_result(conn)
                .map_err(ApiError::from)
        })
        .await
    }

    pub async fn list_for_user(user: i32, pool: &DbPool) -> Result<Vec<EventRegistration>, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::event_registrations::dsl::*;
            event_registrations
                .filter(user_id.eq(user))
                .select(EventRegistration::as_select())
                .order(created_at.desc())
                .load(conn)
                .map_err(ApiError::from)
        })
        .await
    }

    pub async fn list_registrations(event_id: i32, pool: &DbPool) -> Result<Vec<EventRegistration>, ApiError> {
        db::run(pool, move |conn| {
            Self::load(conn, event_id)?;
            Self::registrations_of(conn, event_id)
        })
        .await
    }

    /// Rewrites the stored seat tally from the live registrations.
    pub async fn reconcile(event_id: i32, pool: &DbPool) -> Result<ReconcileReport, ApiError> {
        let report = db::run_serializable(pool, move |conn| {
            let event = Self::load(conn, event_id)?;
            let live = seats_used(&Self::registrations_of(conn, event.id)?);
            let live = i32::try_from(live)
                .map_err(|_| ApiError::InternalError("Seat count out of range".to_string()))?;

            if live != event.registered_count {
                use crate::schema::events::dsl::*;
                diesel::update(events.find(event.id))
                    .set((registered_count.eq(live), updated_at.eq(Utc::now().naive_utc())))
                    .execute(conn)?;
            }

            Ok(ReconcileReport {
                event_id: event.id,
                stored_count: event.registered_count,
                live_count: live,
            })
        })
        .await?;

        if report.stored_count != report.live_count {
            warn!(
                "Event {} seat count drifted: stored {}, live {}",
                report.event_id, report.stored_count, report.live_count
            );
        }
        Ok(report)
    }
}
