use askama::Template;
use askama_web::WebTemplate;

use crate::live::TrackRow;
use crate::web::api::view::VehicleOption;

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub status: String,
    pub track_info: String,
    pub track_limit: String,
    pub vehicles: Vec<VehicleOption>,
    pub rows: Vec<TrackRow>,
    pub panel_open: bool,
    pub narrow: bool,
    pub auto_refresh: bool,
    /// How often the page re-reads the view, in milliseconds.
    pub poll_ms: u128,
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
}
