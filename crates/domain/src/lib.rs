//! Domain layer for the attendance backend.
//!
//! This crate contains:
//! - Domain models (zones, subjects, location pings, attendance, alerts)
//! - Geofence evaluation, spoof detection and the attendance decision pipeline
//! - Collaborator ports and in-memory adapters

pub mod models;
pub mod services;
