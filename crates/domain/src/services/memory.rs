//! In-memory adapters for the collaborator ports.
//!
//! Used by the API binary (seeded from a directory snapshot file) and by
//! tests. Everything lives behind `tokio::sync::RwLock`; nothing is durable.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ports::{AlertSink, AttendanceStore, LocationHistory, StoreError, SubjectDirectory};
use crate::models::attendance::{AttendanceKind, AttendanceRecord};
use crate::models::location::LocationPing;
use crate::models::subject::{effective_zones, OrganizationalUnit, Subject};
use crate::models::tracking_alert::TrackingAlert;
use crate::models::zone::ZoneDefinition;

/// Assigns a zone to a subject, a unit, or both.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneAssignment {
    pub zone_id: Uuid,
    #[serde(default)]
    pub subject_id: Option<Uuid>,
    #[serde(default)]
    pub unit_id: Option<Uuid>,
}

/// Serialized directory contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub units: Vec<OrganizationalUnit>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub zones: Vec<ZoneDefinition>,
    #[serde(default)]
    pub assignments: Vec<ZoneAssignment>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    subjects: HashMap<Uuid, Subject>,
    zones: HashMap<Uuid, ZoneDefinition>,
    /// Zone ids per subject, in assignment order.
    subject_zones: HashMap<Uuid, Vec<Uuid>>,
    /// Zone ids per unit, in assignment order.
    unit_zones: HashMap<Uuid, Vec<Uuid>>,
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a directory from a snapshot. Assignments that reference an
    /// unknown zone are dropped with a warning.
    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        let unit_count = snapshot.units.len();
        let mut state = DirectoryState {
            subjects: snapshot.subjects.into_iter().map(|s| (s.id, s)).collect(),
            zones: snapshot.zones.into_iter().map(|z| (z.id, z)).collect(),
            ..Default::default()
        };

        for assignment in snapshot.assignments {
            if !state.zones.contains_key(&assignment.zone_id) {
                tracing::warn!(zone_id = %assignment.zone_id, "Ignoring assignment of unknown zone");
                continue;
            }
            if let Some(subject_id) = assignment.subject_id {
                state
                    .subject_zones
                    .entry(subject_id)
                    .or_default()
                    .push(assignment.zone_id);
            }
            if let Some(unit_id) = assignment.unit_id {
                state
                    .unit_zones
                    .entry(unit_id)
                    .or_default()
                    .push(assignment.zone_id);
            }
        }

        tracing::info!(
            units = unit_count,
            subjects = state.subjects.len(),
            zones = state.zones.len(),
            "Loaded subject directory"
        );

        Self {
            state: RwLock::new(state),
        }
    }

    pub async fn insert_subject(&self, subject: Subject) {
        self.state.write().await.subjects.insert(subject.id, subject);
    }

    pub async fn insert_zone(&self, zone: ZoneDefinition) {
        self.state.write().await.zones.insert(zone.id, zone);
    }

    pub async fn assign_to_subject(&self, zone_id: Uuid, subject_id: Uuid) {
        self.state
            .write()
            .await
            .subject_zones
            .entry(subject_id)
            .or_default()
            .push(zone_id);
    }

    pub async fn assign_to_unit(&self, zone_id: Uuid, unit_id: Uuid) {
        self.state
            .write()
            .await
            .unit_zones
            .entry(unit_id)
            .or_default()
            .push(zone_id);
    }

    pub async fn subject_count(&self) -> usize {
        self.state.read().await.subjects.len()
    }
}

impl DirectoryState {
    fn resolve(&self, ids: Option<&Vec<Uuid>>) -> Vec<ZoneDefinition> {
        ids.into_iter()
            .flatten()
            .filter_map(|id| self.zones.get(id).cloned())
            .collect()
    }
}

#[async_trait::async_trait]
impl SubjectDirectory for InMemoryDirectory {
    async fn find_subject(&self, subject_id: Uuid) -> Result<Option<Subject>, StoreError> {
        Ok(self.state.read().await.subjects.get(&subject_id).cloned())
    }

    async fn effective_zones(&self, subject: &Subject) -> Result<Vec<ZoneDefinition>, StoreError> {
        let state = self.state.read().await;
        let direct = state.resolve(state.subject_zones.get(&subject.id));
        let unit = subject
            .unit_id
            .map(|unit_id| state.resolve(state.unit_zones.get(&unit_id)))
            .unwrap_or_default();
        Ok(effective_zones(direct, unit))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLocationHistory {
    pings: RwLock<HashMap<Uuid, Vec<LocationPing>>>,
}

impl InMemoryLocationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn pings_for(&self, subject_id: Uuid) -> Vec<LocationPing> {
        self.pings
            .read()
            .await
            .get(&subject_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LocationHistory for InMemoryLocationHistory {
    async fn latest_ping(&self, subject_id: Uuid) -> Result<Option<LocationPing>, StoreError> {
        // max_by_key keeps the last of equal timestamps, i.e. the newest append.
        Ok(self
            .pings
            .read()
            .await
            .get(&subject_id)
            .and_then(|pings| pings.iter().max_by_key(|p| p.recorded_at).cloned()))
    }

    async fn append_ping(&self, ping: LocationPing) -> Result<(), StoreError> {
        self.pings
            .write()
            .await
            .entry(ping.subject_id)
            .or_default()
            .push(ping);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAttendanceStore {
    records: RwLock<Vec<AttendanceRecord>>,
}

impl InMemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records_for(&self, subject_id: Uuid) -> Vec<AttendanceRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl AttendanceStore for InMemoryAttendanceStore {
    async fn find_for_day(
        &self,
        subject_id: Uuid,
        day: NaiveDate,
        kind: AttendanceKind,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.subject_id == subject_id && r.kind == kind && r.day() == day)
            .cloned())
    }

    async fn save(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let mut records = self.records.write().await;
        let day = record.day();
        if records
            .iter()
            .any(|r| r.subject_id == record.subject_id && r.kind == record.kind && r.day() == day)
        {
            return Err(StoreError::Conflict(format!(
                "{} already recorded for subject {} on {}",
                record.kind, record.subject_id, day
            )));
        }
        records.push(record.clone());
        Ok(record)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAlertSink {
    alerts: RwLock<Vec<TrackingAlert>>,
}

impl InMemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn alerts(&self) -> Vec<TrackingAlert> {
        self.alerts.read().await.clone()
    }
}

#[async_trait::async_trait]
impl AlertSink for InMemoryAlertSink {
    async fn raise(&self, alert: TrackingAlert) -> Result<(), StoreError> {
        self.alerts.write().await.push(alert);
        Ok(())
    }
}
