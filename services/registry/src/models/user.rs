//! User model and related functionality

use common::SnapshotRecord;
use serde::{Deserialize, Serialize};

use super::{Goal, Meal, UserSummary, Workout};

/// User entity
///
/// The username is the registry key and never changes once registered.
/// `credential` holds either a SHA-256 hex digest or, for profiles written
/// by older releases, the plaintext secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub credential: String,
    pub display_name: String,
    pub age: u32,
    pub gender: String,
    #[serde(serialize_with = "super::finite_f64")]
    pub height_cm: f64,
    #[serde(serialize_with = "super::finite_f64")]
    pub weight_kg: f64,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub workouts: Vec<Workout>,
    #[serde(default)]
    pub meals: Vec<Meal>,
}

impl User {
    /// Create a user with an empty history
    pub fn new(
        username: impl Into<String>,
        credential: impl Into<String>,
        display_name: impl Into<String>,
        age: u32,
        gender: impl Into<String>,
        height_cm: f64,
        weight_kg: f64,
    ) -> Self {
        Self {
            username: username.into(),
            credential: credential.into(),
            display_name: display_name.into(),
            age,
            gender: gender.into(),
            height_cm,
            weight_kg,
            goals: Vec::new(),
            workouts: Vec::new(),
            meals: Vec::new(),
        }
    }

    /// Aggregate totals over the user's history
    pub fn summary(&self) -> UserSummary {
        let mut summary = UserSummary {
            workout_count: self.workouts.len(),
            meal_count: self.meals.len(),
            goal_count: self.goals.len(),
            ..UserSummary::default()
        };

        for workout in &self.workouts {
            summary.total_minutes += u64::from(workout.duration_minutes);
            summary.calories_burned += u64::from(workout.calories_burned);
        }

        for meal in &self.meals {
            summary.calories_consumed += u64::from(meal.calories);
            summary.proteins_g += meal.proteins_g;
            summary.carbs_g += meal.carbs_g;
            summary.fats_g += meal.fats_g;
        }

        summary.goals_completed = self.goals.iter().filter(|goal| goal.completed).count();
        summary
    }
}

impl SnapshotRecord for User {
    fn record_key(&self) -> &str {
        &self.username
    }
}
