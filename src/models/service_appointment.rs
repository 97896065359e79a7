use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::ServiceStatus;
use crate::schema::service_appointments;

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone)]
#[diesel(table_name = service_appointments)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAppointment {
    pub id: i32,
    pub user_id: i32,
    pub car_id: Option<i32>,
    pub customer_car_info: Option<String>,
    pub scheduled_date: NaiveDateTime,
    pub service_type: String,
    pub description: Option<String>,
    pub status: ServiceStatus,
    pub estimated_cost: Option<Decimal>,
    pub final_cost: Option<Decimal>,
    pub parts_replaced: Vec<String>,
    pub mechanic_notes: Option<String>,
    pub assigned_manager_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = service_appointments)]
pub struct NewServiceAppointment {
    pub user_id: i32,
    pub car_id: Option<i32>,
    pub customer_car_info: Option<String>,
    pub scheduled_date: NaiveDateTime,
    pub service_type: String,
    pub description: Option<String>,
    pub status: ServiceStatus,
    pub estimated_cost: Option<Decimal>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceAppointmentRequest {
    pub car_id: Option<i32>,
    pub customer_car_info: Option<String>,
    pub scheduled_date: NaiveDateTime,
    pub service_type: String,
    pub description: Option<String>,
    pub estimated_cost: Option<Decimal>,
}

impl CreateServiceAppointmentRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.service_type.trim().is_empty() {
            return Err("Service type is required".to_string());
        }
        let has_info = self
            .customer_car_info
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if self.car_id.is_none() && !has_info {
            return Err("Either a car or customer car information is required".to_string());
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceStatusRequest {
    pub status: ServiceStatus,
    pub final_cost: Option<Decimal>,
    pub parts_replaced: Option<Vec<String>>,
    pub mechanic_notes: Option<String>,
    #[serde(default)]
    pub assign_to_me: bool,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAppointmentFilter {
    pub status: Option<ServiceStatus>,
    pub car_id: Option<i32>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(car_id: Option<i32>, info: Option<&str>) -> CreateServiceAppointmentRequest {
        CreateServiceAppointmentRequest {
            car_id,
            customer_car_info: info.map(str::to_string),
            scheduled_date: chrono::NaiveDate::from_ymd_opt(2025, 3, 3)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            service_type: "oil_change".to_string(),
            description: None,
            estimated_cost: None,
        }
    }

    #[test]
    fn non_fleet_vehicle_needs_description() {
        assert!(request(None, None).validate().is_err());
        assert!(request(None, Some("  ")).validate().is_err());
        assert!(request(None, Some("2012 Honda Civic")).validate().is_ok());
        assert!(request(Some(4), None).validate().is_ok());
    }
}
