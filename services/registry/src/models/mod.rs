//! Registry models

use serde::{Serializer, ser::Error};

pub mod goal;
pub mod meal;
pub mod summary;
pub mod user;
pub mod workout;

// Re-export for convenience
pub use goal::Goal;
pub use meal::Meal;
pub use summary::UserSummary;
pub use user::User;
pub use workout::Workout;

/// Serialize an `f64`, refusing NaN and infinities
///
/// JSON has no number for them; serde_json would write `null`, which no
/// longer decodes as an `f64`.
pub(crate) fn finite_f64<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return Err(S::Error::custom(format!("non-finite number {}", value)));
    }
    serializer.serialize_f64(*value)
}
