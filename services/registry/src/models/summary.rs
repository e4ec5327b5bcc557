//! Derived activity totals for a user

use serde::Serialize;

/// Totals computed from a user's workouts, meals and goals
///
/// Never persisted; see [`User::summary`](super::User::summary).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct UserSummary {
    pub workout_count: usize,
    pub total_minutes: u64,
    pub calories_burned: u64,
    pub meal_count: usize,
    pub calories_consumed: u64,
    pub proteins_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
    pub goal_count: usize,
    pub goals_completed: usize,
}

impl UserSummary {
    /// Calories consumed minus calories burned
    pub fn net_calories(&self) -> i64 {
        self.calories_consumed as i64 - self.calories_burned as i64
    }
}
