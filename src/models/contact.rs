use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::ContactStatus;
use crate::schema::contacts;

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone)]
#[diesel(table_name = contacts)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub user_id: Option<i32>,
    pub status: ContactStatus,
    pub assigned_to: Option<i32>,
    pub response: Option<String>,
    pub response_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = contacts)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub user_id: Option<i32>,
    pub status: ContactStatus,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreateContactRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

impl CreateContactRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.subject.trim().is_empty() || self.message.trim().is_empty() {
            return Err("Name, subject and message are required".to_string());
        }
        if !self.email.contains('@') {
            return Err("A valid email address is required".to_string());
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AssignContactRequest {
    pub assigned_to: i32,
}

#[derive(Deserialize, Debug)]
pub struct RespondContactRequest {
    pub response: String,
}

#[derive(Deserialize, Debug)]
pub struct UpdateContactStatusRequest {
    pub status: ContactStatus,
}

#[derive(Deserialize, Debug, Default)]
pub struct ContactFilter {
    pub status: Option<ContactStatus>,
}
