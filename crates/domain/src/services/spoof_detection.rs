//! GPS spoof detection.
//!
//! Compares a new coordinate with the subject's most recent prior ping and
//! flags movement no patrol on foot or by vehicle could produce. Two
//! independent tripwires apply: average speed and raw displacement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::geodesy::{haversine_distance, Coordinate};

use crate::models::location::LocationPing;

/// Speed above which movement is implausible (about 144 km/h).
pub const MAX_PLAUSIBLE_SPEED_MPS: f64 = 40.0;

/// Displacement between consecutive pings treated as a teleport regardless
/// of elapsed time.
pub const MAX_JUMP_DISTANCE_METERS: f64 = 5_000.0;

/// Elapsed time floor, so identical or sub-second timestamps never divide
/// by zero.
pub const MIN_ELAPSED_SECONDS: i64 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SpoofThresholds {
    pub max_speed_mps: f64,
    pub max_jump_meters: f64,
}

impl Default for SpoofThresholds {
    fn default() -> Self {
        Self {
            max_speed_mps: MAX_PLAUSIBLE_SPEED_MPS,
            max_jump_meters: MAX_JUMP_DISTANCE_METERS,
        }
    }
}

/// Which tripwire fired.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpoofSignal {
    ImplausibleSpeed,
    Teleport,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpoofVerdict {
    pub is_spoofed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<SpoofSignal>,
    /// Movement figures; `None` when there was no prior ping.
    pub distance_meters: Option<f64>,
    pub elapsed_seconds: Option<i64>,
    pub speed_mps: Option<f64>,
}

impl SpoofVerdict {
    /// Verdict for a subject's first-ever ping: always trusted.
    pub fn no_baseline() -> Self {
        Self {
            is_spoofed: false,
            signals: Vec::new(),
            distance_meters: None,
            elapsed_seconds: None,
            speed_mps: None,
        }
    }
}

/// Seam used by the decision pipeline so tests can observe spoof checks.
pub trait SpoofCheck {
    fn check(
        &self,
        prior: Option<&LocationPing>,
        at: Coordinate,
        now: DateTime<Utc>,
    ) -> SpoofVerdict;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpoofDetector {
    thresholds: SpoofThresholds,
}

impl SpoofDetector {
    pub fn new(thresholds: SpoofThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> SpoofThresholds {
        self.thresholds
    }
}

impl SpoofCheck for SpoofDetector {
    fn check(
        &self,
        prior: Option<&LocationPing>,
        at: Coordinate,
        now: DateTime<Utc>,
    ) -> SpoofVerdict {
        let Some(prior) = prior else {
            return SpoofVerdict::no_baseline();
        };

        let elapsed_seconds = (now - prior.recorded_at)
            .num_seconds()
            .abs()
            .max(MIN_ELAPSED_SECONDS);
        let distance_meters = haversine_distance(prior.coordinate, at);
        let speed_mps = distance_meters / elapsed_seconds as f64;

        let mut signals = Vec::new();
        if speed_mps > self.thresholds.max_speed_mps {
            signals.push(SpoofSignal::ImplausibleSpeed);
        }
        if distance_meters > self.thresholds.max_jump_meters {
            signals.push(SpoofSignal::Teleport);
        }

        SpoofVerdict {
            is_spoofed: !signals.is_empty(),
            signals,
            distance_meters: Some(distance_meters),
            elapsed_seconds: Some(elapsed_seconds),
            speed_mps: Some(speed_mps),
        }
    }
}

/// Checks `at` against `prior` with the default thresholds.
pub fn check_spoofed(
    prior: Option<&LocationPing>,
    at: Coordinate,
    now: DateTime<Utc>,
) -> SpoofVerdict {
    SpoofDetector::default().check(prior, at, now)
}
