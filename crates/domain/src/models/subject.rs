//! Geofenced subjects (employees) and their organizational units.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::zone::ZoneDefinition;

/// Per-subject attendance policy flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPolicy {
    /// Accept check-ins even when the subject is outside every zone.
    #[serde(default)]
    pub allow_outside_geofence: bool,

    /// Run the GPS spoof tripwires before evaluating the geofence.
    #[serde(default = "default_spoof_check_enabled")]
    pub spoof_check_enabled: bool,
}

fn default_spoof_check_enabled() -> bool {
    true
}

impl Default for SubjectPolicy {
    fn default() -> Self {
        Self {
            allow_outside_geofence: false,
            spoof_check_enabled: default_spoof_check_enabled(),
        }
    }
}

/// An employee whose attendance is geofenced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub unit_id: Option<Uuid>,
    #[serde(default)]
    pub policy: SubjectPolicy,
}

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            unit_id: None,
            policy: SubjectPolicy::default(),
        }
    }

    pub fn with_unit(mut self, unit_id: Uuid) -> Self {
        self.unit_id = Some(unit_id);
        self
    }

    pub fn with_policy(mut self, policy: SubjectPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// A department or office that zones can be assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationalUnit {
    pub id: Uuid,
    pub name: String,
}

/// Union of a subject's direct zones and its unit's zones, deduplicated by
/// zone id. Direct zones keep their position ahead of unit zones.
pub fn effective_zones<I, J>(direct: I, unit: J) -> Vec<ZoneDefinition>
where
    I: IntoIterator<Item = ZoneDefinition>,
    J: IntoIterator<Item = ZoneDefinition>,
{
    let mut seen = HashSet::new();
    direct
        .into_iter()
        .chain(unit)
        .filter(|zone| seen.insert(zone.id))
        .collect()
}
