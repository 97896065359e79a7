use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::TestDriveStatus;
use crate::schema::test_drives;

pub const DEFAULT_DURATION_MINUTES: i32 = 60;

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone)]
#[diesel(table_name = test_drives)]
#[serde(rename_all = "camelCase")]
pub struct TestDrive {
    pub id: i32,
    pub user_id: i32,
    pub car_id: i32,
    pub scheduled_date: NaiveDateTime,
    pub duration: i32,
    pub status: TestDriveStatus,
    pub assigned_manager_id: Option<i32>,
    pub notes: Option<String>,
    pub feedback: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = test_drives)]
pub struct NewTestDrive {
    pub user_id: i32,
    pub car_id: i32,
    pub scheduled_date: NaiveDateTime,
    pub duration: i32,
    pub status: TestDriveStatus,
    pub notes: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestDriveRequest {
    pub car_id: i32,
    pub scheduled_date: NaiveDateTime,
    pub duration: Option<i32>,
    pub notes: Option<String>,
}

impl CreateTestDriveRequest {
    pub fn duration_minutes(&self) -> Result<i32, String> {
        match self.duration {
            None => Ok(DEFAULT_DURATION_MINUTES),
            Some(d) if d > 0 => Ok(d),
            Some(_) => Err("Duration must be a positive number of minutes".to_string()),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTestDriveStatusRequest {
    pub status: TestDriveStatus,
    #[serde(default)]
    pub assign_to_me: bool,
    pub feedback: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TestDriveFilter {
    pub status: Option<TestDriveStatus>,
    pub car_id: Option<i32>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}
