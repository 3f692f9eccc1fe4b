use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::panel::ViewportClass;
use crate::web::api::view::vehicle_options;
use crate::web::state::AppState;

use super::templates::DashboardTemplate;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub viewport: Option<ViewportClass>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    if let Some(viewport) = query.viewport {
        state.set_viewport(viewport);
    }
    if state.view.needs_vehicles() {
        state.view.load_vehicles().await;
    }

    let snapshot = state.view.snapshot();
    let auto_refresh = state.poller.lock().await.is_running();
    let (panel_open, narrow) = {
        let panel = state.panel();
        (panel.is_open(), panel.viewport() == ViewportClass::Narrow)
    };
    let scene_view = state.view.with_map(|map| map.view().clone());

    DashboardTemplate {
        vehicles: vehicle_options(&snapshot),
        status: snapshot.status,
        track_info: snapshot.track_info,
        track_limit: snapshot.track_limit,
        rows: snapshot.rows,
        panel_open,
        narrow,
        auto_refresh,
        poll_ms: state.config.live.poll_interval.as_millis(),
        center_lat: scene_view.center.lat,
        center_lon: scene_view.center.lon,
        zoom: scene_view.zoom,
    }
}
