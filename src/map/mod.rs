mod geo;
mod scene;
mod surface;

pub use geo::{Bounds, LatLng};
pub use scene::{Scene, SceneLayer, SceneSnapshot};
pub use surface::{CircleStyle, LayerId, LineStyle, MapSurface, Popup, Rgb};
