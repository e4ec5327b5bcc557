//! Goal model

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// A fitness or health goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub goal_type: String,
    /// Free-text description of the target, e.g. "Lose 5kg"
    pub target_value: String,
    pub deadline: NaiveDate,
    #[serde(default = "today")]
    pub start_date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl Goal {
    /// Create a goal starting today
    pub fn new(
        goal_type: impl Into<String>,
        target_value: impl Into<String>,
        deadline: NaiveDate,
    ) -> Self {
        Self::with_start_date(goal_type, target_value, deadline, today())
    }

    /// Create a goal with an explicit start date
    pub fn with_start_date(
        goal_type: impl Into<String>,
        target_value: impl Into<String>,
        deadline: NaiveDate,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            goal_type: goal_type.into(),
            target_value: target_value.into(),
            deadline,
            start_date,
            completed: false,
        }
    }

    /// Whether the goal is still open after its deadline
    pub fn is_overdue(&self, on: NaiveDate) -> bool {
        !self.completed && on > self.deadline
    }
}
