use chrono::Local;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use utoipa::ToSchema;

use super::layers::LayerRegistry;
use super::selection::{Selection, MAX_TRACK_POINTS};
use super::table::{focus_zoom, render_rows, TrackResult, TrackRow};
use crate::backend::{Backend, Position, Vehicle, VehicleId};
use crate::map::{Bounds, MapSurface};

const SELECT_PROMPT: &str = "Select one or more vehicles to see their tracks.";

#[derive(Debug, Clone, Copy)]
pub struct LiveSettings {
    pub track_limit: u32,
    pub fit_padding: u32,
    pub focus_zoom: u8,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            track_limit: MAX_TRACK_POINTS,
            fit_padding: 30,
            focus_zoom: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Fresh data reached the registry.
    Applied,
    /// The request failed; the registry was left as it was.
    Failed,
    /// A newer refresh of the same kind started meanwhile; results dropped.
    Superseded,
    /// Nothing selected, tracks were cleared.
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CycleReport {
    pub latest: RefreshOutcome,
    pub tracks: RefreshOutcome,
    pub fitted: bool,
}

/// Everything a dashboard shows besides the map itself.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ViewSnapshot {
    pub status: String,
    pub track_info: String,
    pub selected: Vec<VehicleId>,
    pub track_limit: String,
    pub roster: Vec<Vehicle>,
    pub rows: Vec<TrackRow>,
}

struct ViewState<M> {
    registry: LayerRegistry<M>,
    selection: Selection,
    roster: Vec<Vehicle>,
    roster_failed: bool,
    latest_cache: Vec<Position>,
    rows: Vec<TrackRow>,
    status: String,
    track_info: String,
    latest_generation: u64,
    tracks_generation: u64,
}

impl<M> ViewState<M> {
    /// Invalidates every refresh still in flight.
    fn supersede(&mut self) {
        self.latest_generation += 1;
        self.tracks_generation += 1;
    }
}

/// The live-tracking view: selection, layer registry and table state kept in
/// sync with the backend.
///
/// Cheap to clone; clones share the same state. The state lock is only held
/// between awaits, so overlapping refreshes interleave at backend round trips.
/// Each refresh takes a generation number and drops its results if a newer
/// refresh of the same kind started meanwhile.
pub struct LiveView<B, M> {
    backend: Arc<B>,
    state: Arc<Mutex<ViewState<M>>>,
    settings: LiveSettings,
}

impl<B, M> Clone for LiveView<B, M> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            state: self.state.clone(),
            settings: self.settings,
        }
    }
}

impl<B: Backend, M: MapSurface> LiveView<B, M> {
    pub fn new(backend: B, map: M, settings: LiveSettings) -> Self {
        Self {
            backend: Arc::new(backend),
            state: Arc::new(Mutex::new(ViewState {
                registry: LayerRegistry::new(map),
                selection: Selection::new(settings.track_limit),
                roster: Vec::new(),
                roster_failed: false,
                latest_cache: Vec::new(),
                rows: Vec::new(),
                status: String::new(),
                track_info: SELECT_PROMPT.to_string(),
                latest_generation: 0,
                tracks_generation: 0,
            })),
            settings,
        }
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    fn lock(&self) -> MutexGuard<'_, ViewState<M>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the selection. Refreshes already in flight for the old
    /// selection will not be applied.
    pub fn select<I, S>(&self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.lock();
        state.selection.select(entries);
        state.supersede();
    }

    pub fn set_track_limit(&self, raw: impl Into<String>) {
        let mut state = self.lock();
        state.selection.set_track_limit_input(raw);
        state.supersede();
    }

    /// Radius for track points drawn from the next refresh on.
    pub fn set_point_radius(&self, radius: u32) {
        self.lock().registry.set_point_radius(radius);
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let state = self.lock();
        ViewSnapshot {
            status: state.status.clone(),
            track_info: state.track_info.clone(),
            selected: state.selection.selected_vehicle_ids(),
            track_limit: state.selection.track_limit_input().to_string(),
            roster: state.roster.clone(),
            rows: state.rows.clone(),
        }
    }

    pub fn rows(&self) -> Vec<TrackRow> {
        self.lock().rows.clone()
    }

    pub fn with_registry<R>(&self, f: impl FnOnce(&LayerRegistry<M>) -> R) -> R {
        f(&self.lock().registry)
    }

    pub fn with_map<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(self.lock().registry.map())
    }

    /// Whether the roster is empty or its last load failed.
    pub fn needs_vehicles(&self) -> bool {
        let state = self.lock();
        state.roster.is_empty() || state.roster_failed
    }

    pub async fn load_vehicles(&self) -> RefreshOutcome {
        let result = self.backend.vehicles().await;

        let mut state = self.lock();
        match result {
            Ok(roster) => {
                log::info!("Loaded {} vehicles", roster.len());
                state.roster = roster;
                state.roster_failed = false;
                RefreshOutcome::Applied
            }
            Err(e) => {
                log::warn!("Failed to load vehicle roster: {}", e);
                state.status = format!("ERROR vehicles: {}", e);
                state.roster_failed = true;
                RefreshOutcome::Failed
            }
        }
    }

    /// Fetches latest positions for the selection (or every vehicle when
    /// nothing is selected) and reconciles the latest markers.
    pub async fn refresh_latest(&self) -> RefreshOutcome {
        let (selected, generation) = {
            let mut state = self.lock();
            state.latest_generation += 1;
            (state.selection.selected_vehicle_ids(), state.latest_generation)
        };

        let result = self.backend.latest(&selected).await;

        let mut state = self.lock();
        if state.latest_generation != generation {
            log::debug!("Dropping superseded latest refresh #{}", generation);
            return RefreshOutcome::Superseded;
        }

        let latest = match result {
            Ok(latest) => latest,
            Err(e) => {
                log::warn!("Failed to fetch latest positions: {}", e);
                state.status = format!("ERROR latest: {}", e);
                return RefreshOutcome::Failed;
            }
        };

        let selected: HashSet<VehicleId> = selected.into_iter().collect();
        let visible: Vec<Position> = latest
            .into_iter()
            .filter(|p| selected.is_empty() || selected.contains(&p.vehicle_id))
            .collect();
        let keep: HashSet<VehicleId> = visible.iter().map(|p| p.vehicle_id.clone()).collect();

        for position in &visible {
            state.registry.upsert_latest_marker(position);
        }
        let removed = state.registry.remove_latest_markers_not_in(&keep);
        if removed > 0 {
            log::debug!("Removed {} stale latest markers", removed);
        }

        state.status = format!(
            "Live • visible: {} • {}",
            visible.len(),
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        state.latest_cache = visible;
        RefreshOutcome::Applied
    }

    /// Redraws the track of every selected vehicle, one request at a time in
    /// selection order, and rebuilds the table from what was fetched.
    pub async fn refresh_tracks_for_selection(&self) -> RefreshOutcome {
        let (selected, limit, generation) = {
            let mut state = self.lock();
            state.tracks_generation += 1;
            let generation = state.tracks_generation;

            let selected = state.selection.selected_vehicle_ids();
            if selected.is_empty() {
                state.registry.clear_all_tracks();
                state.track_info = SELECT_PROMPT.to_string();
                state.rows.clear();
                return RefreshOutcome::Cleared;
            }

            let limit = state.selection.clamp_track_limit();
            let keep: HashSet<VehicleId> = selected.iter().cloned().collect();
            state.registry.remove_tracks_not_in(&keep);
            (selected, limit, generation)
        };

        let mut results = Vec::with_capacity(selected.len());
        for vehicle in &selected {
            let fetched = self.backend.track(vehicle, limit).await;

            let mut state = self.lock();
            if state.tracks_generation != generation {
                log::debug!("Dropping superseded track refresh #{}", generation);
                return RefreshOutcome::Superseded;
            }
            match fetched {
                Ok(points) => {
                    state.registry.replace_track(vehicle, &points);
                    results.push(TrackResult {
                        vehicle_id: vehicle.clone(),
                        points,
                    });
                }
                Err(e) => log::warn!("Failed to fetch track for vehicle {}: {}", vehicle, e),
            }
        }

        let mut state = self.lock();
        state.track_info = format!(
            "Selected: {} • points per vehicle: {} (max {})",
            selected.len(),
            limit,
            MAX_TRACK_POINTS
        );
        state.rows = render_rows(&results);

        if results.is_empty() {
            RefreshOutcome::Failed
        } else {
            RefreshOutcome::Applied
        }
    }

    /// Frames the selected tracks, falling back to the last latest positions.
    /// Returns whether the view moved.
    pub fn fit_to_selection(&self) -> bool {
        let mut state = self.lock();
        let selected = state.selection.selected_vehicle_ids();

        let bounds = selected
            .iter()
            .filter_map(|vehicle| state.registry.track(vehicle))
            .filter_map(|track| track.line_bounds())
            .reduce(Bounds::union)
            .or_else(|| Bounds::from_points(state.latest_cache.iter().map(Position::lat_lng)));

        match bounds {
            Some(bounds) => {
                state
                    .registry
                    .map_mut()
                    .fit_bounds(bounds, self.settings.fit_padding);
                true
            }
            None => false,
        }
    }

    /// One polling cycle: latest markers, then tracks.
    pub async fn refresh_cycle(&self) -> CycleReport {
        let latest = self.refresh_latest().await;
        let tracks = self.refresh_tracks_for_selection().await;
        CycleReport {
            latest,
            tracks,
            fitted: false,
        }
    }

    pub async fn refresh_all(&self, fit: bool) -> CycleReport {
        let mut report = self.refresh_cycle().await;
        if fit {
            report.fitted = self.fit_to_selection();
        }
        report
    }

    /// Centers the map on the table row of `vehicle` with the given 1-based
    /// track index. `None` when the current table has no such row.
    pub fn activate_row(&self, vehicle: &VehicleId, index: usize) -> Option<TrackRow> {
        let mut state = self.lock();
        let row = state
            .rows
            .iter()
            .find(|row| row.vehicle_id == *vehicle && row.index == index)?
            .clone();

        let map = state.registry.map_mut();
        let zoom = focus_zoom(map.zoom(), self.settings.focus_zoom);
        map.set_view(row.position(), zoom);
        Some(row)
    }
}
