//! HTTP route handlers.

pub mod attendance;
pub mod geofence;
pub mod health;
pub mod tracking;
