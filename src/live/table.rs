use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::backend::{TrackPoint, VehicleId};
use crate::map::LatLng;

/// Points fetched for one vehicle in a track refresh, backend order.
#[derive(Debug, Clone)]
pub struct TrackResult {
    pub vehicle_id: VehicleId,
    pub points: Vec<TrackPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrackRow {
    pub vehicle_id: VehicleId,
    /// 1-based position within the vehicle's track.
    pub index: usize,
    #[serde(with = "crate::backend::timestamp")]
    #[schema(value_type = String)]
    pub timestamp: NaiveDateTime,
    pub lat: f64,
    pub lon: f64,
}

impl TrackRow {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }

    pub fn latitude_fixed(&self) -> String {
        format!("{:.6}", self.lat)
    }

    pub fn longitude_fixed(&self) -> String {
        format!("{:.6}", self.lon)
    }

    pub fn display_time(&self) -> String {
        crate::backend::timestamp::format(&self.timestamp)
    }
}

/// Flattens every vehicle's points into one list ordered by vehicle then index.
pub fn render_rows(results: &[TrackResult]) -> Vec<TrackRow> {
    let mut rows: Vec<TrackRow> = results
        .iter()
        .flat_map(|result| {
            result.points.iter().enumerate().map(|(i, point)| TrackRow {
                vehicle_id: result.vehicle_id.clone(),
                index: i + 1,
                timestamp: point.timestamp,
                lat: point.lat,
                lon: point.lon,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        a.vehicle_id
            .cmp(&b.vehicle_id)
            .then(a.index.cmp(&b.index))
    });
    rows
}

/// Zoom for centering on a row: never zooms out.
pub fn focus_zoom(current: u8, floor: u8) -> u8 {
    current.max(floor)
}
