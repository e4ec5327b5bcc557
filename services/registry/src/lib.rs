//! Fitness profile registry
//!
//! Keeps user profiles with their workouts, meals and goals in memory,
//! persists the whole registry to a JSON snapshot after every change, and
//! authenticates users against hashed credentials.
//!
//! ```rust,no_run
//! use common::SnapshotConfig;
//! use registry::{User, UserRegistry};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = UserRegistry::open_from_config(&SnapshotConfig::from_env()?)?;
//!     registry.add_user(User::new("alice", "pw123", "Alice", 30, "F", 165.0, 60.0))?;
//!     let alice = registry.authenticate_user("alice", "pw123")?;
//!     println!("Welcome back, {}", alice.display_name);
//!     Ok(())
//! }
//! ```

pub mod credentials;
pub mod error;
pub mod models;
pub mod repositories;
pub mod validation;

pub use error::{RegistryError, RegistryResult};
pub use models::{Goal, Meal, User, UserSummary, Workout};
pub use repositories::{OpenReport, UserRegistry};
