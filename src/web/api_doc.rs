use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::view::{
    AutoRefreshRequest, FitResponse, LimitInput, PanelRequest, PanelStatus, SelectionRequest,
    StatusResponse, VehicleOption, ViewportRequest,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::view::vehicles,
        super::api::view::scene,
        super::api::view::table,
        super::api::view::status,
        super::api::view::select,
        super::api::view::refresh,
        super::api::view::fit,
        super::api::view::set_auto_refresh,
        super::api::view::set_viewport,
        super::api::view::toggle_panel,
        super::api::view::set_panel,
        super::api::view::activate_row,
    ),
    components(
        schemas(
            VehicleOption,
            StatusResponse,
            PanelStatus,
            SelectionRequest,
            LimitInput,
            AutoRefreshRequest,
            ViewportRequest,
            PanelRequest,
            FitResponse,
            ErrorResponse,
            crate::live::CycleReport,
            crate::live::RefreshOutcome,
            crate::live::PollMode,
            crate::live::TrackRow,
            crate::map::SceneSnapshot,
            crate::panel::ViewportClass,
        )
    ),
    info(
        title = "Fleet Map API",
        description = "Live vehicle tracking view: selection, map layers and track table",
        version = "0.1.0"
    ),
    tags(
        (name = "view", description = "Live tracking view")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_view_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| *p == "/api/view/selection"));
        assert!(paths.iter().any(|p| *p == "/api/view/rows/{vehicle_id}/{index}/activate"));
        assert_eq!(paths.len(), 12);
    }
}
