//! Geofence zone domain model.

use geo::{LineString, Rect};
use serde::{Deserialize, Serialize};
use shared::geodesy::Coordinate;
use thiserror::Error;
use uuid::Uuid;

/// Supported zone shapes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ZoneShape {
    Circle,
    Polygon,
    Rectangle,
}

impl ZoneShape {
    /// Converts to the stored string tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneShape::Circle => "circle",
            ZoneShape::Polygon => "polygon",
            ZoneShape::Rectangle => "rectangle",
        }
    }

    /// Parses the stored string tag (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "circle" => Some(ZoneShape::Circle),
            "polygon" => Some(ZoneShape::Polygon),
            "rectangle" => Some(ZoneShape::Rectangle),
            _ => None,
        }
    }
}

impl std::fmt::Display for ZoneShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A zone as it is stored by the administrative tooling.
///
/// The shape tag and geometry are unchecked; convert with
/// `Zone::try_from(&definition)` before evaluating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDefinition {
    pub id: Uuid,
    pub name: String,
    pub shape: String,
    #[serde(default)]
    pub coordinates: Vec<Coordinate>,
    #[serde(default, alias = "radius")]
    pub radius_meters: Option<f64>,
}

impl ZoneDefinition {
    pub fn circle(name: impl Into<String>, center: Coordinate, radius_meters: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            shape: ZoneShape::Circle.as_str().to_string(),
            coordinates: vec![center],
            radius_meters: Some(radius_meters),
        }
    }

    pub fn polygon(name: impl Into<String>, vertices: Vec<Coordinate>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            shape: ZoneShape::Polygon.as_str().to_string(),
            coordinates: vertices,
            radius_meters: None,
        }
    }

    pub fn rectangle(name: impl Into<String>, corner_a: Coordinate, corner_b: Coordinate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            shape: ZoneShape::Rectangle.as_str().to_string(),
            coordinates: vec![corner_a, corner_b],
            radius_meters: None,
        }
    }
}

/// Reasons a stored zone cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZoneGeometryError {
    #[error("unknown zone shape '{0}'")]
    UnknownShape(String),

    #[error("circle zone has no center coordinate")]
    MissingCenter,

    #[error("circle zone radius must be a positive number of meters")]
    InvalidRadius,

    #[error("polygon zone needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("rectangle zone needs exactly 2 corners, got {0}")]
    RectangleCorners(usize),

    #[error("zone geometry contains a non-finite coordinate")]
    NonFiniteCoordinate,
}

/// Checked zone geometry.
///
/// Planar geometries use x = longitude, y = latitude.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneGeometry {
    Circle {
        center: Coordinate,
        radius_meters: f64,
    },
    /// Closed ring; the last vertex connects back to the first.
    Polygon { ring: LineString<f64> },
    /// Axis-aligned box with min/max already normalised.
    Rectangle { bounds: Rect<f64> },
}

impl ZoneGeometry {
    pub fn shape(&self) -> ZoneShape {
        match self {
            ZoneGeometry::Circle { .. } => ZoneShape::Circle,
            ZoneGeometry::Polygon { .. } => ZoneShape::Polygon,
            ZoneGeometry::Rectangle { .. } => ZoneShape::Rectangle,
        }
    }
}

/// A zone ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: Uuid,
    pub name: String,
    pub geometry: ZoneGeometry,
}

impl Zone {
    pub fn shape(&self) -> ZoneShape {
        self.geometry.shape()
    }

    pub fn summary(&self) -> ZoneSummary {
        ZoneSummary {
            id: self.id,
            name: self.name.clone(),
            shape: self.shape(),
        }
    }
}

impl TryFrom<&ZoneDefinition> for Zone {
    type Error = ZoneGeometryError;

    fn try_from(def: &ZoneDefinition) -> Result<Self, Self::Error> {
        let shape = ZoneShape::from_str(&def.shape)
            .ok_or_else(|| ZoneGeometryError::UnknownShape(def.shape.clone()))?;

        if def.coordinates.iter().any(|c| !c.is_finite()) {
            return Err(ZoneGeometryError::NonFiniteCoordinate);
        }

        let geometry = match shape {
            ZoneShape::Circle => {
                let center = *def
                    .coordinates
                    .first()
                    .ok_or(ZoneGeometryError::MissingCenter)?;
                let radius_meters = def
                    .radius_meters
                    .filter(|r| r.is_finite() && *r > 0.0)
                    .ok_or(ZoneGeometryError::InvalidRadius)?;
                ZoneGeometry::Circle {
                    center,
                    radius_meters,
                }
            }
            ZoneShape::Polygon => {
                if def.coordinates.len() < 3 {
                    return Err(ZoneGeometryError::TooFewVertices(def.coordinates.len()));
                }
                let mut ring: LineString<f64> = def
                    .coordinates
                    .iter()
                    .map(|c| geo::Coord::from(*c))
                    .collect();
                ring.close();
                ZoneGeometry::Polygon { ring }
            }
            ZoneShape::Rectangle => match def.coordinates.as_slice() {
                [a, b] => ZoneGeometry::Rectangle {
                    bounds: Rect::new(geo::Coord::from(*a), geo::Coord::from(*b)),
                },
                other => return Err(ZoneGeometryError::RectangleCorners(other.len())),
            },
        };

        Ok(Zone {
            id: def.id,
            name: def.name.clone(),
            geometry,
        })
    }
}

/// Lightweight zone reference returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSummary {
    pub id: Uuid,
    pub name: String,
    pub shape: ZoneShape,
}
