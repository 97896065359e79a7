use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::{EventStatus, RegistrationStatus};
use crate::schema::{event_registrations, events};

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone)]
#[diesel(table_name = events)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub event_type: String,
    pub location: Option<String>,
    pub event_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub registration_deadline: Option<NaiveDateTime>,
    pub capacity: i32,
    pub registered_count: i32,
    pub vip_only: bool,
    pub image: Option<String>,
    pub status: EventStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = events)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_type: String,
    pub location: Option<String>,
    pub event_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub registration_deadline: Option<NaiveDateTime>,
    pub capacity: i32,
    pub vip_only: bool,
    pub image: Option<String>,
    pub status: EventStatus,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = events)]
pub struct EventChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub registration_deadline: Option<NaiveDateTime>,
    pub capacity: Option<i32>,
    pub vip_only: Option<bool>,
    pub image: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone)]
#[diesel(table_name = event_registrations)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistration {
    pub id: i32,
    pub user_id: i32,
    pub event_id: i32,
    pub guest_count: i32,
    pub status: RegistrationStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl EventRegistration {
    /// Seats this registration occupies: the registrant plus guests.
    pub fn seats(&self) -> i32 {
        self.guest_count + 1
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = event_registrations)]
pub struct NewEventRegistration {
    pub user_id: i32,
    pub event_id: i32,
    pub guest_count: i32,
    pub status: RegistrationStatus,
    pub notes: Option<String>,
}

// DTOs
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub event_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub registration_deadline: Option<NaiveDateTime>,
    pub capacity: i32,
    #[serde(default)]
    pub vip_only: bool,
    pub image: Option<String>,
}

impl CreateEventRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        if self.capacity < 0 {
            return Err("Capacity must not be negative".to_string());
        }
        if matches!(self.end_date, Some(end) if end < self.event_date) {
            return Err("End date must not be before the event date".to_string());
        }
        Ok(())
    }

    pub fn into_new_event(self) -> NewEvent {
        NewEvent {
            title: self.title,
            description: self.description,
            event_type: self.event_type.unwrap_or_else(|| "other".to_string()),
            location: self.location,
            event_date: self.event_date,
            end_date: self.end_date,
            registration_deadline: self.registration_deadline,
            capacity: self.capacity,
            vip_only: self.vip_only,
            image: self.image,
            status: EventStatus::Upcoming,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub registration_deadline: Option<NaiveDateTime>,
    pub capacity: Option<i32>,
    pub vip_only: Option<bool>,
    pub image: Option<String>,
}

impl UpdateEventRequest {
    pub fn into_changeset(self, now: NaiveDateTime) -> Result<EventChangeset, String> {
        if matches!(self.capacity, Some(c) if c < 0) {
            return Err("Capacity must not be negative".to_string());
        }
        Ok(EventChangeset {
            title: self.title,
            description: self.description,
            event_type: self.event_type,
            location: self.location,
            event_date: self.event_date,
            end_date: self.end_date,
            registration_deadline: self.registration_deadline,
            capacity: self.capacity,
            vip_only: self.vip_only,
            image: self.image,
            updated_at: Some(now),
        })
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventStatusRequest {
    pub status: EventStatus,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForEventRequest {
    #[serde(default)]
    pub guest_count: i32,
    pub notes: Option<String>,
}

impl RegisterForEventRequest {
    /// The body is optional; an empty one means no guests and no notes.
    pub fn from_body(body: &[u8]) -> Result<Self, String> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| format!("Invalid registration request: {}", e))
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub vip_only: Option<bool>,
    #[serde(default)]
    pub upcoming: bool,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub event_id: i32,
    pub stored_count: i32,
    pub live_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registration_body_defaults() {
        let req = RegisterForEventRequest::from_body(b"").unwrap();
        assert_eq!(req.guest_count, 0);
        assert_eq!(RegisterForEventRequest::from_body(b"{}").unwrap().guest_count, 0);
        assert_eq!(RegisterForEventRequest::from_body(br#"{"guestCount": 2}"#).unwrap().guest_count, 2);
    }

    #[test]
    fn malformed_guest_count_is_an_error() {
        for body in [&br#"{"guestCount": "4"}"#[..], br#"{"guestCount": 4.5}"#, br#"{"guestCount": 4"#] {
            assert!(RegisterForEventRequest::from_body(body).is_err());
        }
    }
}
