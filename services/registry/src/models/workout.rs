//! Workout model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single workout session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub workout_type: String,
    pub duration_minutes: u32,
    pub calories_burned: u32,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

impl Workout {
    /// Create a workout without notes
    pub fn new(
        workout_type: impl Into<String>,
        duration_minutes: u32,
        calories_burned: u32,
        date: NaiveDate,
    ) -> Self {
        Self {
            workout_type: workout_type.into(),
            duration_minutes,
            calories_burned,
            date,
            notes: String::new(),
        }
    }

    /// Attach free-text notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_without_notes() {
        let json = r#"{
            "workout_type": "Running",
            "duration_minutes": 30,
            "calories_burned": 350,
            "date": "2023-10-15"
        }"#;

        let workout: Workout = serde_json::from_str(json).unwrap();

        assert_eq!(workout.notes, "");
        assert_eq!(workout.date, NaiveDate::from_ymd_opt(2023, 10, 15).unwrap());
    }

    #[test]
    fn test_decode_rejects_bad_date() {
        let json = r#"{
            "workout_type": "Running",
            "duration_minutes": 30,
            "calories_burned": 350,
            "date": "15/10/2023"
        }"#;

        assert!(serde_json::from_str::<Workout>(json).is_err());
    }

    #[test]
    fn test_date_encodes_as_iso() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        let json = serde_json::to_value(Workout::new("Yoga", 60, 200, date)).unwrap();

        assert_eq!(json["date"], "2023-01-05");
    }
}
