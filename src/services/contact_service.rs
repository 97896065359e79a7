use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::info;

use crate::booking::{plan_transition, Transition};
use crate::config::DbPool;
use crate::db;
use crate::errors::ApiError;
use crate::models::*;

pub struct ContactService;

impl ContactService {
    fn load(conn: &mut PgConnection, contact_id: i32) -> Result<Contact, ApiError> {
        use crate::schema::contacts::dsl::*;
        contacts
            .find(contact_id)
            .select(Contact::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::not_found("Contact"))
    }

    /// Public contact form. `sender` is set when the visitor is logged in.
    pub async fn submit(req: CreateContactRequest, sender: Option<i32>, pool: &DbPool) -> Result<Contact, ApiError> {
        req.validate().map_err(ApiError::ValidationError)?;
        let new_contact = NewContact {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            phone: req.phone,
            subject: req.subject.trim().to_string(),
            message: req.message,
            user_id: sender,
            status: ContactStatus::New,
        };

        let contact = db::run(pool, move |conn| {
            use crate::schema::contacts::dsl::*;
            diesel::insert_into(contacts)
                .values(&new_contact)
                .returning(Contact::as_returning())
                .get_result(conn)
                .map_err(ApiError::from)
        })
        .await?;

        info!("Contact request {} received from {}", contact.id, contact.email);
        Ok(contact)
    }

    pub async fn get_contact(contact_id: i32, pool: &DbPool) -> Result<Contact, ApiError> {
        db::run(pool, move |conn| Self::load(conn, contact_id)).await
    }

    pub async fn list_contacts(filter: ContactFilter, pool: &DbPool) -> Result<Vec<Contact>, ApiError> {
        db::run(pool, move |conn| {
            use crate::schema::contacts::dsl::*;
            let mut query = contacts.select(Contact::as_select()).into_boxed();
            if let Some(s) = filter.status {
                query = query.filter(status.eq(s));
            }
            query.order(created_at.desc()).load(conn).map_err(ApiError::from)
        })
        .await
    }

    /// Hands the request to a staff member; a fresh request moves to in-progress.
    pub async fn assign(contact_id: i32, assignee: i32, pool: &DbPool) -> Result<Contact, ApiError> {
        let contact = db::run_serializable(pool, move |conn| {
            let staff_role = {
                use crate::schema::users::dsl::*;
                users
                    .find(assignee)
                    .select(role)
                    .first::<Role>(conn)
                    .optional()?
                    .ok_or_else(|| ApiError::not_found("User"))?
            };
            if !staff_role.at_least(Role::Manager) {
                return Err(ApiError::validation("Contacts can only be assigned to managers or admins"));
            }

            let current = Self::load(conn, contact_id)?;
            if current.status == ContactStatus::Closed {
                return Err(ApiError::validation("Closed contacts cannot be reassigned"));
            }
            let next = if current.status == ContactStatus::New {
                ContactStatus::InProgress
            } else {
                current.status
            };

            use crate::schema::contacts::dsl::*;
            diesel::update(contacts.find(contact_id))
                .set((
                    assigned_to.eq(Some(assignee)),
                    status.eq(next),
                    updated_at.eq(Utc::now().naive_utc()),
                ))
                .returning(Contact::as_returning())
                .get_result(conn)
                .map_err(ApiError::from)
        })
        .await?;

        info!("Contact {} assigned to user {}", contact.id, assignee);
        Ok(contact)
    }

    pub async fn respond(contact_id: i32, text: String, pool: &DbPool) -> Result<Contact, ApiError> {
        if text.trim().is_empty() {
            return Err(ApiError::validation("Response must not be empty"));
        }

        let contact = db::run_serializable(pool, move |conn| {
            let current = Self::load(conn, contact_id)?;
            plan_transition(current.status, ContactStatus::Responded)?;

            let now = Utc::now().naive_utc();
            use crate::schema::contacts::dsl::*;
            diesel::update(contacts.find(contact_id))
                .set((
                    response.eq(Some(text)),
                    response_date.eq(Some(now)),
                    status.eq(ContactStatus::Responded),
                    updated_at.eq(now),
                ))
                .returning(Contact::as_returning())
                .get_result(conn)
                .map_err(ApiError::from)
        })
        .await?;

        info!("Contact {} answered", contact.id);
        Ok(contact)
    }

    pub async fn update_status(contact_id: i32, next: ContactStatus, pool: &DbPool) -> Result<Contact, ApiError> {
        db::run_serializable(pool, move |conn| {
            let current = Self::load(conn, contact_id)?;
            if plan_transition(current.status, next)? == Transition::Unchanged {
                return Ok(current);
            }

            use crate::schema::contacts::dsl::*;
            diesel::update(contacts.find(contact_id))
                .set((status.eq(next), updated_at.eq(Utc::now().naive_utc())))
                .returning(Contact::as_returning())
                .get_result(conn)
                .map_err(ApiError::from)
        })
        .await
    }

    pub async fn delete_contact(contact_id: i32, pool: &DbPool) -> Result<(), ApiError> {
        let deleted = db::run(pool, move |conn| {
            use crate::schema::contacts::dsl::*;
            diesel::delete(contacts.find(contact_id)).execute(conn).map_err(ApiError::from)
        })
        .await?;

        if deleted == 0 {
            return Err(ApiError::not_found("Contact"));
        }
        info!("Deleted contact {}", contact_id);
        Ok(())
    }
}
