//! Repositories over the snapshot-backed user registry

pub mod user;

pub use user::{OpenReport, UserRegistry};
