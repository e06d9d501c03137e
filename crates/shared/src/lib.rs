//! Shared utilities and common types for the attendance backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Geodesy helpers (coordinates, Haversine distance)
//! - Common validation logic for location payloads

pub mod geodesy;
pub mod validation;

pub use crate::geodesy::{haversine_distance, Coordinate, EARTH_RADIUS_METERS};
