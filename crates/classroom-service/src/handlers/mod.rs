//! API handlers.

pub mod courses;
pub mod health;
