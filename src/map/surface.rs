use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

use super::geo::{Bounds, LatLng};
use crate::backend::{Position, VehicleId};

/// Handle to a layer attached to a `MapSurface`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(transparent)]
pub struct LayerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct LineStyle {
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct CircleStyle {
    pub radius: u32,
    pub weight: u32,
    pub color: Rgb,
    pub opacity: f64,
    pub fill_color: Rgb,
    pub fill_opacity: f64,
}

/// Popup content as data; the surface decides how to present it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Popup {
    Latest {
        name: String,
        vehicle_id: VehicleId,
        timestamp: String,
    },
    TrackPoint {
        name: String,
        vehicle_id: VehicleId,
        /// 1-based position within the track.
        index: usize,
        total: usize,
        timestamp: String,
    },
}

impl Popup {
    pub fn latest(position: &Position) -> Self {
        Popup::Latest {
            name: position.name.clone(),
            vehicle_id: position.vehicle_id.clone(),
            timestamp: position.display_time(),
        }
    }

    pub fn track_point(point: &Position, index: usize, total: usize) -> Self {
        Popup::TrackPoint {
            name: point.name.clone(),
            vehicle_id: point.vehicle_id.clone(),
            index,
            total,
            timestamp: point.display_time(),
        }
    }
}

/// The map widget as seen by the layer registry.
///
/// Removing or reordering an unknown layer is a no-op.
pub trait MapSurface {
    fn add_marker(&mut self, at: LatLng, popup: Popup) -> LayerId;
    fn move_marker(&mut self, layer: LayerId, at: LatLng, popup: Popup);
    fn add_polyline(&mut self, path: &[LatLng], style: LineStyle) -> LayerId;
    fn add_circle(&mut self, at: LatLng, style: CircleStyle, popup: Popup) -> LayerId;
    fn remove_layer(&mut self, layer: LayerId);
    fn bring_to_front(&mut self, layer: LayerId);
    fn bring_to_back(&mut self, layer: LayerId);

    fn fit_bounds(&mut self, bounds: Bounds, padding: u32);
    fn set_view(&mut self, center: LatLng, zoom: u8);
    fn zoom(&self) -> u8;
}
