use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::oneshot;

use crate::backend::{Backend, FetchError, Position, TrackPoint, Vehicle, VehicleId};
use crate::live::{LiveSettings, LiveView};
use crate::map::{LatLng, Scene};

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .unwrap()
}

pub fn point(id: &str, secs: i64, lat: f64, lon: f64) -> Position {
    Position {
        vehicle_id: VehicleId::new(id),
        name: format!("unit {}", id),
        timestamp: base_time() + Duration::seconds(secs),
        lat,
        lon,
    }
}

/// `count` points heading north-east, oldest first.
pub fn points(id: &str, count: usize) -> Vec<TrackPoint> {
    (0..count)
        .map(|i| point(id, i as i64 * 10, -33.45 + i as f64 * 0.01, -70.66 + i as f64 * 0.01))
        .collect()
}

#[derive(Default)]
struct Script {
    vehicles: Vec<Vehicle>,
    vehicles_error: Option<FetchError>,
    latest: Vec<Position>,
    latest_error: Option<FetchError>,
    latest_gate: Option<oneshot::Receiver<()>>,
    tracks: HashMap<VehicleId, Result<Vec<TrackPoint>, FetchError>>,
    latest_queries: Vec<Vec<VehicleId>>,
    track_queries: Vec<(VehicleId, u32)>,
}

/// Scripted in-memory backend.
#[derive(Default)]
pub struct FakeBackend {
    script: Mutex<Script>,
}

impl FakeBackend {
    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn set_vehicles(&self, vehicles: &[(&str, &str)]) {
        self.script().vehicles = vehicles
            .iter()
            .map(|(id, name)| Vehicle {
                vehicle_id: VehicleId::new(*id),
                name: name.to_string(),
            })
            .collect();
    }

    pub fn fail_vehicles(&self, err: FetchError) {
        self.script().vehicles_error = Some(err);
    }

    pub fn clear_vehicles_error(&self) {
        self.script().vehicles_error = None;
    }

    pub fn set_latest(&self, latest: Vec<Position>) {
        let mut script = self.script();
        script.latest = latest;
        script.latest_error = None;
    }

    pub fn fail_latest(&self, err: FetchError) {
        self.script().latest_error = Some(err);
    }

    /// The next latest request stalls until the returned sender fires.
    pub fn hold_next_latest(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.script().latest_gate = Some(rx);
        tx
    }

    pub fn set_track(&self, id: &str, points: Vec<TrackPoint>) {
        self.script().tracks.insert(VehicleId::new(id), Ok(points));
    }

    pub fn fail_track(&self, id: &str, err: FetchError) {
        self.script().tracks.insert(VehicleId::new(id), Err(err));
    }

    pub fn latest_queries(&self) -> Vec<Vec<VehicleId>> {
        self.script().latest_queries.clone()
    }

    pub fn track_queries(&self) -> Vec<(VehicleId, u32)> {
        self.script().track_queries.clone()
    }
}

impl Backend for FakeBackend {
    async fn vehicles(&self) -> Result<Vec<Vehicle>, FetchError> {
        let script = self.script();
        match &script.vehicles_error {
            Some(err) => Err(err.clone()),
            None => Ok(script.vehicles.clone()),
        }
    }

    async fn latest(&self, ids: &[VehicleId]) -> Result<Vec<Position>, FetchError> {
        let (response, gate) = {
            let mut script = self.script();
            script.latest_queries.push(ids.to_vec());
            let response = match &script.latest_error {
                Some(err) => Err(err.clone()),
                None => Ok(script
                    .latest
                    .iter()
                    .filter(|p| ids.is_empty() || ids.contains(&p.vehicle_id))
                    .cloned()
                    .collect()),
            };
            (response, script.latest_gate.take())
        };

        if let Some(gate) = gate {
            let _ = gate.await;
        }
        response
    }

    async fn track(&self, id: &VehicleId, limit: u32) -> Result<Vec<TrackPoint>, FetchError> {
        let mut script = self.script();
        script.track_queries.push((id.clone(), limit));
        match script.tracks.get(id) {
            Some(Ok(points)) => {
                let skip = points.len().saturating_sub(limit as usize);
                Ok(points[skip..].to_vec())
            }
            Some(Err(err)) => Err(err.clone()),
            None => Ok(Vec::new()),
        }
    }
}

pub fn live_view(backend: FakeBackend) -> LiveView<FakeBackend, Scene> {
    LiveView::new(
        backend,
        Scene::new(LatLng::new(-33.45, -70.66), 12),
        LiveSettings::default(),
    )
}
