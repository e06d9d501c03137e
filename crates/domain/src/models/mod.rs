//! Domain models for the attendance backend.

pub mod attendance;
pub mod location;
pub mod subject;
pub mod tracking_alert;
pub mod zone;

pub use attendance::{AttendanceKind, AttendanceRecord, AttendanceRequest};
pub use location::{LocationPing, RecordLocationRequest, Telemetry};
pub use subject::{effective_zones, OrganizationalUnit, Subject, SubjectPolicy};
pub use tracking_alert::{TrackingAlert, TrackingAlertType};
pub use zone::{Zone, ZoneDefinition, ZoneGeometry, ZoneGeometryError, ZoneShape, ZoneSummary};
