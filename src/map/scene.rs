use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

use super::geo::{Bounds, LatLng};
use super::surface::{CircleStyle, LayerId, LineStyle, MapSurface, Popup};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneLayer {
    Marker {
        at: LatLng,
        popup: Popup,
    },
    Polyline {
        path: Vec<LatLng>,
        style: LineStyle,
    },
    Circle {
        at: LatLng,
        style: CircleStyle,
        popup: Popup,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SceneView {
    pub center: LatLng,
    pub zoom: u8,
    /// Last framing request, cleared by an explicit `set_view`.
    pub fit: Option<Framing>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Framing {
    pub bounds: Bounds,
    pub padding: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlacedLayer {
    pub id: LayerId,
    #[serde(flatten)]
    pub layer: SceneLayer,
}

/// Serialised scene, layers listed back to front.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SceneSnapshot {
    pub view: SceneView,
    pub layers: Vec<PlacedLayer>,
}

/// In-memory map surface. Keeps every attached layer and its stacking order so
/// a browser client can draw the same picture from a snapshot.
#[derive(Debug)]
pub struct Scene {
    next_id: u64,
    layers: HashMap<LayerId, SceneLayer>,
    order: Vec<LayerId>,
    view: SceneView,
}

impl Scene {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            next_id: 1,
            layers: HashMap::new(),
            order: Vec::new(),
            view: SceneView {
                center,
                zoom,
                fit: None,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn contains(&self, layer: LayerId) -> bool {
        self.layers.contains_key(&layer)
    }

    pub fn layer(&self, layer: LayerId) -> Option<&SceneLayer> {
        self.layers.get(&layer)
    }

    pub fn view(&self) -> &SceneView {
        &self.view
    }

    /// Position in the stacking order, 0 being the bottom.
    pub fn depth(&self, layer: LayerId) -> Option<usize> {
        self.order.iter().position(|id| *id == layer)
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            view: self.view.clone(),
            layers: self
                .order
                .iter()
                .filter_map(|id| {
                    self.layers.get(id).map(|layer| PlacedLayer {
                        id: *id,
                        layer: layer.clone(),
                    })
                })
                .collect(),
        }
    }

    fn attach(&mut self, layer: SceneLayer) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        self.layers.insert(id, layer);
        self.order.push(id);
        id
    }
}

impl MapSurface for Scene {
    fn add_marker(&mut self, at: LatLng, popup: Popup) -> LayerId {
        self.attach(SceneLayer::Marker { at, popup })
    }

    fn move_marker(&mut self, layer: LayerId, at: LatLng, popup: Popup) {
        if let Some(SceneLayer::Marker {
            at: position,
            popup: content,
        }) = self.layers.get_mut(&layer)
        {
            *position = at;
            *content = popup;
        }
    }

    fn add_polyline(&mut self, path: &[LatLng], style: LineStyle) -> LayerId {
        self.attach(SceneLayer::Polyline {
            path: path.to_vec(),
            style,
        })
    }

    fn add_circle(&mut self, at: LatLng, style: CircleStyle, popup: Popup) -> LayerId {
        self.attach(SceneLayer::Circle { at, style, popup })
    }

    fn remove_layer(&mut self, layer: LayerId) {
        if self.layers.remove(&layer).is_some() {
            self.order.retain(|id| *id != layer);
        }
    }

    fn bring_to_front(&mut self, layer: LayerId) {
        if let Some(depth) = self.depth(layer) {
            let id = self.order.remove(depth);
            self.order.push(id);
        }
    }

    fn bring_to_back(&mut self, layer: LayerId) {
        if let Some(depth) = self.depth(layer) {
            let id = self.order.remove(depth);
            self.order.insert(0, id);
        }
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: u32) {
        self.view.center = bounds.center();
        self.view.fit = Some(Framing { bounds, padding });
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.view.center = center;
        self.view.zoom = zoom;
        self.view.fit = None;
    }

    fn zoom(&self) -> u8 {
        self.view.zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Rgb;

    fn style() -> CircleStyle {
        CircleStyle {
            radius: 8,
            weight: 2,
            color: Rgb::new(255, 0, 0),
            opacity: 1.0,
            fill_color: Rgb::new(255, 0, 0),
            fill_opacity: 1.0,
        }
    }

    fn popup() -> Popup {
        Popup::Latest {
            name: "B-1".into(),
            vehicle_id: "1".into(),
            timestamp: "2024-05-01 10:00:00".into(),
        }
    }

    #[test]
    fn stacking_order_follows_front_and_back_requests() {
        let mut scene = Scene::new(LatLng::new(0.0, 0.0), 12);
        let a = scene.add_circle(LatLng::new(0.0, 0.0), style(), popup());
        let line = scene.add_polyline(
            &[LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)],
            LineStyle { opacity: 0.25 },
        );
        let b = scene.add_circle(LatLng::new(1.0, 1.0), style(), popup());

        scene.bring_to_front(a);
        scene.bring_to_back(line);

        let order: Vec<LayerId> = scene.snapshot().layers.iter().map(|l| l.id).collect();
        assert_eq!(order, vec![line, b, a]);
    }

    #[test]
    fn removed_layers_leave_the_snapshot() {
        let mut scene = Scene::new(LatLng::new(0.0, 0.0), 12);
        let marker = scene.add_marker(LatLng::new(1.0, 2.0), popup());
        scene.remove_layer(marker);
        scene.remove_layer(marker);

        assert!(scene.is_empty());
        assert!(scene.snapshot().layers.is_empty());
    }

    #[test]
    fn set_view_clears_framing() {
        let mut scene = Scene::new(LatLng::new(0.0, 0.0), 12);
        scene.fit_bounds(Bounds::around(LatLng::new(5.0, 5.0)), 30);
        assert!(scene.view().fit.is_some());

        scene.set_view(LatLng::new(1.0, 1.0), 15);
        assert!(scene.view().fit.is_none());
        assert_eq!(scene.zoom(), 15);
    }
}
