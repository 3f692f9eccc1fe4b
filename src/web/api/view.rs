use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::backend::VehicleId;
use crate::live::{CycleReport, PollMode, TrackRow, ViewSnapshot};
use crate::map::SceneSnapshot;
use crate::panel::ViewportClass;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VehicleOption {
    pub vehicle_id: VehicleId,
    /// `"<id> - <name>"`
    pub label: String,
    pub selected: bool,
}

/// Roster entries in backend order, flagged with the current selection.
pub fn vehicle_options(snapshot: &ViewSnapshot) -> Vec<VehicleOption> {
    snapshot
        .roster
        .iter()
        .map(|vehicle| VehicleOption {
            vehicle_id: vehicle.vehicle_id.clone(),
            label: vehicle.label(),
            selected: snapshot.selected.contains(&vehicle.vehicle_id),
        })
        .collect()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PanelStatus {
    pub open: bool,
    pub viewport: ViewportClass,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub track_info: String,
    pub selected: Vec<VehicleId>,
    pub track_limit: String,
    pub auto_refresh: PollMode,
    pub panel: PanelStatus,
}

/// Track limit as typed by the user: a JSON number or free text.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum LimitInput {
    Number(f64),
    Text(String),
}

impl LimitInput {
    fn into_raw(self) -> String {
        match self {
            LimitInput::Number(n) => n.to_string(),
            LimitInput::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectionRequest {
    pub vehicle_ids: Vec<String>,
    #[serde(default)]
    pub track_limit: Option<LimitInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AutoRefreshRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ViewportRequest {
    pub viewport: ViewportClass,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PanelRequest {
    pub open: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FitResponse {
    pub fitted: bool,
}

fn panel_status(state: &AppState) -> PanelStatus {
    let panel = state.panel();
    PanelStatus {
        open: panel.is_open(),
        viewport: panel.viewport(),
    }
}

#[utoipa::path(
    get,
    path = "/api/view/vehicles",
    tag = "view",
    responses(
        (status = 200, description = "Vehicle roster", body = Vec<VehicleOption>)
    )
)]
pub async fn vehicles(State(state): State<AppState>) -> Json<Vec<VehicleOption>> {
    if state.view.needs_vehicles() {
        state.view.load_vehicles().await;
    }
    Json(vehicle_options(&state.view.snapshot()))
}

#[utoipa::path(
    get,
    path = "/api/view/scene",
    tag = "view",
    responses(
        (status = 200, description = "Map view and layers in drawing order", body = SceneSnapshot)
    )
)]
pub async fn scene(State(state): State<AppState>) -> Json<SceneSnapshot> {
    Json(state.view.with_map(|map| map.snapshot()))
}

#[utoipa::path(
    get,
    path = "/api/view/table",
    tag = "view",
    responses(
        (status = 200, description = "Track table rows", body = Vec<TrackRow>)
    )
)]
pub async fn table(State(state): State<AppState>) -> Json<Vec<TrackRow>> {
    Json(state.view.rows())
}

#[utoipa::path(
    get,
    path = "/api/view/status",
    tag = "view",
    responses(
        (status = 200, description = "Status, selection, poller and panel", body = StatusResponse)
    )
)]
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.view.snapshot();
    let auto_refresh = state.poller.lock().await.mode();

    Json(StatusResponse {
        status: snapshot.status,
        track_info: snapshot.track_info,
        selected: snapshot.selected,
        track_limit: snapshot.track_limit,
        auto_refresh,
        panel: panel_status(&state),
    })
}

#[utoipa::path(
    put,
    path = "/api/view/selection",
    tag = "view",
    request_body = SelectionRequest,
    responses(
        (status = 200, description = "Selection applied and view refreshed", body = CycleReport)
    )
)]
pub async fn select(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> Json<CycleReport> {
    state.view.select(request.vehicle_ids);
    if let Some(limit) = request.track_limit {
        state.view.set_track_limit(limit.into_raw());
    }
    state.set_panel_if_narrow(true);

    Json(state.view.refresh_all(true).await)
}

#[utoipa::path(
    post,
    path = "/api/view/refresh",
    tag = "view",
    responses(
        (status = 200, description = "Latest markers and tracks refreshed", body = CycleReport)
    )
)]
pub async fn refresh(State(state): State<AppState>) -> Json<CycleReport> {
    Json(state.view.refresh_all(true).await)
}

#[utoipa::path(
    post,
    path = "/api/view/fit",
    tag = "view",
    responses(
        (status = 200, description = "Whether the map was reframed", body = FitResponse)
    )
)]
pub async fn fit(State(state): State<AppState>) -> Json<FitResponse> {
    Json(FitResponse {
        fitted: state.view.fit_to_selection(),
    })
}

#[utoipa::path(
    put,
    path = "/api/view/auto-refresh",
    tag = "view",
    request_body = AutoRefreshRequest,
    responses(
        (status = 200, description = "Poller state", body = PollMode)
    )
)]
pub async fn set_auto_refresh(
    State(state): State<AppState>,
    Json(request): Json<AutoRefreshRequest>,
) -> Json<PollMode> {
    let mut poller = state.poller.lock().await;
    poller.set_enabled(request.enabled, &state.view);
    Json(poller.mode())
}

#[utoipa::path(
    put,
    path = "/api/view/viewport",
    tag = "view",
    request_body = ViewportRequest,
    responses(
        (status = 200, description = "Panel state for the new viewport", body = PanelStatus)
    )
)]
pub async fn set_viewport(
    State(state): State<AppState>,
    Json(request): Json<ViewportRequest>,
) -> Json<PanelStatus> {
    state.set_viewport(request.viewport);
    Json(panel_status(&state))
}

#[utoipa::path(
    post,
    path = "/api/view/panel/toggle",
    tag = "view",
    responses(
        (status = 200, description = "Panel toggled", body = PanelStatus),
        (status = 500, description = "Preference could not be saved", body = ErrorResponse)
    )
)]
pub async fn toggle_panel(State(state): State<AppState>) -> ApiResult<Json<PanelStatus>> {
    state.panel().toggle()?;
    Ok(Json(panel_status(&state)))
}

#[utoipa::path(
    put,
    path = "/api/view/panel",
    tag = "view",
    request_body = PanelRequest,
    responses(
        (status = 200, description = "Panel state set", body = PanelStatus),
        (status = 500, description = "Preference could not be saved", body = ErrorResponse)
    )
)]
pub async fn set_panel(
    State(state): State<AppState>,
    Json(request): Json<PanelRequest>,
) -> ApiResult<Json<PanelStatus>> {
    state.panel().set_open(request.open)?;
    Ok(Json(panel_status(&state)))
}

#[utoipa::path(
    post,
    path = "/api/view/rows/{vehicle_id}/{index}/activate",
    tag = "view",
    params(
        ("vehicle_id" = String, Path, description = "Vehicle of the row"),
        ("index" = usize, Path, description = "Position within the vehicle's track, from 1")
    ),
    responses(
        (status = 200, description = "Map centered on the row", body = TrackRow),
        (status = 404, description = "Row no longer in the table", body = ErrorResponse)
    )
)]
pub async fn activate_row(
    State(state): State<AppState>,
    Path((vehicle_id, index)): Path<(String, usize)>,
) -> ApiResult<Json<TrackRow>> {
    let row = state
        .view
        .activate_row(&VehicleId::new(vehicle_id), index)
        .ok_or(ApiError::NotFound("row_not_found"))?;
    state.set_panel_if_narrow(false);
    Ok(Json(row))
}
