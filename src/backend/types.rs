use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use utoipa::ToSchema;

use crate::map::LatLng;

/// Opaque vehicle identifier.
///
/// The backend sends integers, the selection widget sends strings; both end up
/// here as text. Ordering is numeric when both sides are integers so that
/// `"9"` sorts before `"10"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        VehicleId(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(id: &str) -> Self {
        VehicleId::new(id)
    }
}

impl Ord for VehicleId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for VehicleId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'de> Deserialize<'de> for VehicleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => VehicleId(n.to_string()),
            Raw::Text(s) => VehicleId::new(s),
        })
    }
}

/// Roster entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vehicle {
    #[serde(rename = "vehiculo_id", alias = "vehicleId")]
    pub vehicle_id: VehicleId,
    #[serde(default)]
    pub name: String,
}

impl Vehicle {
    /// Label shown in the selection list.
    pub fn label(&self) -> String {
        format!("{} - {}", self.vehicle_id, self.name)
    }
}

/// A reported vehicle position. Track points share the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Position {
    #[serde(rename = "vehiculo_id", alias = "vehicleId")]
    pub vehicle_id: VehicleId,
    #[serde(default)]
    pub name: String,
    #[serde(with = "timestamp")]
    #[schema(value_type = String, example = "2024-05-01 13:45:10")]
    pub timestamp: NaiveDateTime,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lon: f64,
}

pub type TrackPoint = Position;

impl Position {
    pub fn lat_lng(&self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }

    pub fn display_time(&self) -> String {
        timestamp::format(&self.timestamp)
    }
}

pub(crate) mod timestamp {
    use super::*;
    use serde::Serializer;

    // `%.f` prints nothing for whole seconds.
    const DISPLAY: &str = "%Y-%m-%d %H:%M:%S%.f";
    const ACCEPTED: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    pub fn format(ts: &NaiveDateTime) -> String {
        ts.format(DISPLAY).to_string()
    }

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        ACCEPTED
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .or_else(|| {
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.naive_local())
            })
    }

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s)))
    }
}
