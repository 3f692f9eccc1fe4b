use std::collections::{HashMap, HashSet};

use super::interpolate::{color_from_progress, opacity_from_progress, progress};
use crate::backend::{Position, TrackPoint, VehicleId};
use crate::map::{Bounds, CircleStyle, LatLng, LayerId, LineStyle, MapSurface, Popup};

const TRACK_LINE_OPACITY: f64 = 0.25;
const POINT_WEIGHT: u32 = 2;
const DEFAULT_POINT_RADIUS: u32 = 8;

/// Layers drawn for one vehicle's track.
#[derive(Debug)]
pub struct TrackEntry {
    line: Option<LayerId>,
    line_bounds: Option<Bounds>,
    points: Vec<LayerId>,
}

impl TrackEntry {
    pub fn line(&self) -> Option<LayerId> {
        self.line
    }

    /// Extent of the connecting line, `None` for tracks shorter than two points.
    pub fn line_bounds(&self) -> Option<Bounds> {
        self.line.and(self.line_bounds)
    }

    pub fn points(&self) -> &[LayerId] {
        &self.points
    }

    fn layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.line.into_iter().chain(self.points.iter().copied())
    }
}

/// Owns the map surface and every layer placed on it.
///
/// Each attached layer belongs to exactly one entry: a latest-position marker
/// or a track. Layers are detached in the same call that drops their entry.
pub struct LayerRegistry<M> {
    map: M,
    latest: HashMap<VehicleId, LayerId>,
    tracks: HashMap<VehicleId, TrackEntry>,
    point_radius: u32,
}

impl<M: MapSurface> LayerRegistry<M> {
    pub fn new(map: M) -> Self {
        Self {
            map,
            latest: HashMap::new(),
            tracks: HashMap::new(),
            point_radius: DEFAULT_POINT_RADIUS,
        }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    /// Radius used for track points created from now on.
    pub fn set_point_radius(&mut self, radius: u32) {
        self.point_radius = radius;
    }

    pub fn latest_marker(&self, vehicle: &VehicleId) -> Option<LayerId> {
        self.latest.get(vehicle).copied()
    }

    pub fn latest_vehicles(&self) -> HashSet<VehicleId> {
        self.latest.keys().cloned().collect()
    }

    pub fn track(&self, vehicle: &VehicleId) -> Option<&TrackEntry> {
        self.tracks.get(vehicle)
    }

    pub fn tracked_vehicles(&self) -> HashSet<VehicleId> {
        self.tracks.keys().cloned().collect()
    }

    pub fn upsert_latest_marker(&mut self, position: &Position) {
        let popup = Popup::latest(position);
        match self.latest_marker(&position.vehicle_id) {
            Some(marker) => self.map.move_marker(marker, position.lat_lng(), popup),
            None => {
                let marker = self.map.add_marker(position.lat_lng(), popup);
                self.latest.insert(position.vehicle_id.clone(), marker);
            }
        }
    }

    /// Detaches every latest marker whose vehicle is not in `keep`.
    pub fn remove_latest_markers_not_in(&mut self, keep: &HashSet<VehicleId>) -> usize {
        let map = &mut self.map;
        let before = self.latest.len();
        self.latest.retain(|vehicle, marker| {
            if keep.contains(vehicle) {
                true
            } else {
                map.remove_layer(*marker);
                false
            }
        });
        before - self.latest.len()
    }

    /// Replaces the vehicle's track with a fresh set of layers for `points`.
    pub fn replace_track(&mut self, vehicle: &VehicleId, points: &[TrackPoint]) {
        if let Some(old) = self.tracks.remove(vehicle) {
            destroy_track(&mut self.map, &old);
        }

        let path: Vec<LatLng> = points.iter().map(Position::lat_lng).collect();
        let line = (path.len() >= 2).then(|| {
            self.map.add_polyline(
                &path,
                LineStyle {
                    opacity: TRACK_LINE_OPACITY,
                },
            )
        });

        let total = points.len();
        let point_layers: Vec<LayerId> = points
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let t = progress(i, total);
                let color = color_from_progress(t);
                let opacity = opacity_from_progress(t);
                let style = CircleStyle {
                    radius: self.point_radius,
                    weight: POINT_WEIGHT,
                    color,
                    opacity,
                    fill_color: color,
                    fill_opacity: opacity,
                };
                self.map
                    .add_circle(point.lat_lng(), style, Popup::track_point(point, i + 1, total))
            })
            .collect();

        for layer in &point_layers {
            self.map.bring_to_front(*layer);
        }
        if let Some(line) = line {
            self.map.bring_to_back(line);
        }

        self.tracks.insert(
            vehicle.clone(),
            TrackEntry {
                line,
                line_bounds: Bounds::from_points(path),
                points: point_layers,
            },
        );
    }

    pub fn remove_tracks_not_in(&mut self, keep: &HashSet<VehicleId>) -> usize {
        let map = &mut self.map;
        let before = self.tracks.len();
        self.tracks.retain(|vehicle, entry| {
            if keep.contains(vehicle) {
                true
            } else {
                destroy_track(map, entry);
                false
            }
        });
        before - self.tracks.len()
    }

    pub fn clear_all_tracks(&mut self) {
        for (_, entry) in self.tracks.drain() {
            destroy_track(&mut self.map, &entry);
        }
    }
}

fn destroy_track<M: MapSurface>(map: &mut M, entry: &TrackEntry) {
    for layer in entry.layers() {
        map.remove_layer(layer);
    }
}
