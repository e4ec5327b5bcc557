//! Meal model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A logged meal with its macronutrients in grams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    /// Breakfast, Lunch, Dinner, Snack or any other label
    pub meal_type: String,
    pub name: String,
    pub calories: u32,
    #[serde(serialize_with = "super::finite_f64")]
    pub proteins_g: f64,
    #[serde(serialize_with = "super::finite_f64")]
    pub carbs_g: f64,
    #[serde(serialize_with = "super::finite_f64")]
    pub fats_g: f64,
    pub date: NaiveDate,
}

impl Meal {
    /// Create a meal entry
    pub fn new(
        meal_type: impl Into<String>,
        name: impl Into<String>,
        calories: u32,
        proteins_g: f64,
        carbs_g: f64,
        fats_g: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            meal_type: meal_type.into(),
            name: name.into(),
            calories,
            proteins_g,
            carbs_g,
            fats_g,
            date,
        }
    }
}
