use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::schema::cars;

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone)]
#[diesel(table_name = cars)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: i32,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub price: Decimal,
    pub mileage: i32,
    pub color: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub body_type: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub available: bool,
    pub rental_available: bool,
    pub rental_price_per_day: Option<Decimal>,
    pub test_drive_available: bool,
    pub images: Vec<String>,
    pub main_image: Option<String>,
    pub features: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = cars)]
pub struct NewCar {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub price: Decimal,
    pub mileage: i32,
    pub color: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub body_type: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub available: bool,
    pub rental_available: bool,
    pub rental_price_per_day: Option<Decimal>,
    pub test_drive_available: bool,
    pub images: Vec<String>,
    pub main_image: Option<String>,
    pub features: Vec<String>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = cars)]
pub struct CarChangeset {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub vin: Option<String>,
    pub price: Option<Decimal>,
    pub mileage: Option<i32>,
    pub color: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub body_type: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub available: Option<bool>,
    pub rental_available: Option<bool>,
    pub rental_price_per_day: Option<Decimal>,
    pub test_drive_available: Option<bool>,
    pub images: Option<Vec<String>>,
    pub main_image: Option<Option<String>>,
    pub features: Option<Vec<String>>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Picks the main image for a gallery. An absent or out-of-range index falls
/// back to the first image; an empty gallery has no main image.
pub fn resolve_main_image(images: &[String], index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| images.get(i))
        .or_else(|| images.first())
        .cloned()
}

// DTOs
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarRequest {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub price: Decimal,
    #[serde(default)]
    pub mileage: i32,
    pub color: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub body_type: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub rental_available: bool,
    pub rental_price_per_day: Option<Decimal>,
    #[serde(default = "default_true")]
    pub test_drive_available: bool,
    #[serde(default)]
    pub images: Vec<String>,
    pub main_image_index: Option<usize>,
    #[serde(default)]
    pub features: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl CreateCarRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.brand.trim().is_empty() || self.model.trim().is_empty() {
            return Err("Brand and model are required".to_string());
        }
        if self.vin.trim().is_empty() {
            return Err("VIN is required".to_string());
        }
        if self.price < Decimal::ZERO {
            return Err("Price must not be negative".to_string());
        }
        if self.mileage < 0 {
            return Err("Mileage must not be negative".to_string());
        }
        if self.rental_available && self.rental_price_per_day.is_none() {
            return Err("Rental price per day is required for rental cars".to_string());
        }
        Ok(())
    }

    pub fn into_new_car(self) -> NewCar {
        let main_image = resolve_main_image(&self.images, self.main_image_index);
        NewCar {
            brand: self.brand,
            model: self.model,
            year: self.year,
            vin: self.vin,
            price: self.price,
            mileage: self.mileage,
            color: self.color,
            fuel_type: self.fuel_type,
            transmission: self.transmission,
            body_type: self.body_type,
            category: self.category,
            description: self.description,
            available: self.available,
            rental_available: self.rental_available,
            rental_price_per_day: self.rental_price_per_day,
            test_drive_available: self.test_drive_available,
            images: self.images,
            main_image,
            features: self.features,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarRequest {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub vin: Option<String>,
    pub price: Option<Decimal>,
    pub mileage: Option<i32>,
    pub color: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub body_type: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub available: Option<bool>,
    pub rental_available: Option<bool>,
    pub rental_price_per_day: Option<Decimal>,
    pub test_drive_available: Option<bool>,
    pub images: Option<Vec<String>>,
    pub main_image_index: Option<usize>,
    pub features: Option<Vec<String>>,
}

impl UpdateCarRequest {
    /// Builds the changeset against the car as currently stored. When the
    /// gallery changes without an explicit index, the current main image is
    /// kept if it survives, otherwise the first image is used.
    pub fn into_changeset(self, current: &Car, now: NaiveDateTime) -> Result<CarChangeset, String> {
        if matches!(self.price, Some(p) if p < Decimal::ZERO) {
            return Err("Price must not be negative".to_string());
        }
        if matches!(self.mileage, Some(m) if m < 0) {
            return Err("Mileage must not be negative".to_string());
        }

        let main_image = match (&self.images, self.main_image_index) {
            (Some(images), Some(index)) => Some(resolve_main_image(images, Some(index))),
            (Some(images), None) => {
                let keep = current
                    .main_image
                    .as_ref()
                    .filter(|m| images.contains(m))
                    .cloned();
                Some(keep.or_else(|| resolve_main_image(images, None)))
            }
            (None, Some(index)) => Some(resolve_main_image(&current.images, Some(index))),
            (None, None) => None,
        };

        Ok(CarChangeset {
            brand: self.brand,
            model: self.model,
            year: self.year,
            vin: self.vin,
            price: self.price,
            mileage: self.mileage,
            color: self.color,
            fuel_type: self.fuel_type,
            transmission: self.transmission,
            body_type: self.body_type,
            category: self.category,
            description: self.description,
            available: self.available,
            rental_available: self.rental_available,
            rental_price_per_day: self.rental_price_per_day,
            test_drive_available: self.test_drive_available,
            images: self.images,
            main_image,
            features: self.features,
            updated_at: Some(now),
        })
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MainImageRequest {
    pub main_image_index: usize,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CarFilter {
    pub brand: Option<String>,
    pub category: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub available: Option<bool>,
    pub rental_available: Option<bool>,
    pub test_drive_available: Option<bool>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize, Debug)]
pub struct CarPage {
    pub cars: Vec<Car>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gallery() -> Vec<String> {
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    }

    fn request(images: Vec<String>, index: Option<usize>) -> CreateCarRequest {
        CreateCarRequest {
            brand: "Volvo".into(),
            model: "XC60".into(),
            year: 2023,
            vin: "YV1DZ8256C2271234".into(),
            price: dec!(45000),
            mileage: 0,
            color: None,
            fuel_type: None,
            transmission: None,
            body_type: None,
            category: None,
            description: None,
            available: true,
            rental_available: false,
            rental_price_per_day: None,
            test_drive_available: true,
            images,
            main_image_index: index,
            features: vec![],
        }
    }

    #[test]
    fn main_image_defaults_to_first() {
        let car = request(gallery(), None).into_new_car();
        assert_eq!(car.main_image.as_deref(), Some("a"));
    }

    #[test]
    fn main_image_follows_explicit_index() {
        let car = request(gallery(), Some(2)).into_new_car();
        assert_eq!(car.main_image.as_deref(), Some("c"));
    }

    #[test]
    fn out_of_range_index_falls_back_to_first() {
        let car = request(gallery(), Some(7)).into_new_car();
        assert_eq!(car.main_image.as_deref(), Some("a"));
    }

    #[test]
    fn empty_gallery_has_no_main_image() {
        assert_eq!(resolve_main_image(&[], Some(0)), None);
    }

    #[test]
    fn rental_car_requires_daily_price() {
        let mut req = request(gallery(), None);
        req.rental_available = true;
        assert!(req.validate().is_err());
        req.rental_price_per_day = Some(dec!(120));
        assert!(req.validate().is_ok());
    }
}
