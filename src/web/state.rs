use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backend::{FetchError, HttpBackend};
use crate::live::{LiveView, Poller};
use crate::map::Scene;
use crate::panel::{FileStore, PanelState, ViewportClass};

use super::config::Config;

pub type FleetView = LiveView<HttpBackend, Scene>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub view: FleetView,
    pub poller: Arc<tokio::sync::Mutex<Poller>>,
    pub panel: Arc<Mutex<PanelState<FileStore>>>,
}

impl AppState {
    /// Wires the view, an idle poller and the persisted panel state. Nothing
    /// is fetched yet.
    pub fn from_config(config: Config) -> Result<Self, FetchError> {
        let backend = HttpBackend::new(&config.backend.base_url, config.backend.timeout)?;
        let initial = config.live.initial_view;
        let view = LiveView::new(
            backend,
            Scene::new(initial.center(), initial.zoom),
            config.live.settings(),
        );

        let store = FileStore::open(&config.panel.store).unwrap_or_else(|e| {
            log::warn!(
                "Failed to load panel preferences from {}: {}",
                config.panel.store.display(),
                e
            );
            FileStore::empty(&config.panel.store)
        });
        let viewport = ViewportClass::default();
        let panel = PanelState::load(store, viewport);
        view.set_point_radius(viewport.point_radius());

        let poller = Poller::new(config.live.poll_interval);

        Ok(Self {
            config: Arc::new(config),
            view,
            poller: Arc::new(tokio::sync::Mutex::new(poller)),
            panel: Arc::new(Mutex::new(panel)),
        })
    }

    pub fn panel(&self) -> MutexGuard<'_, PanelState<FileStore>> {
        self.panel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the viewport class reported by the client, re-deriving the
    /// panel state on a change of class, and resizes track points drawn from
    /// now on.
    pub fn set_viewport(&self, viewport: ViewportClass) {
        self.panel().set_viewport(viewport);
        self.view.set_point_radius(viewport.point_radius());
    }

    /// Opens or closes the panel when the viewport is narrow. Persistence
    /// failures are logged, the in-memory state still changes.
    pub fn set_panel_if_narrow(&self, open: bool) {
        let mut panel = self.panel();
        if panel.viewport() != ViewportClass::Narrow {
            return;
        }
        if let Err(e) = panel.set_open(open) {
            log::warn!("Failed to persist panel state: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::{PreferenceStore, PANEL_OPEN_KEY};
    use std::path::Path;

    fn state_with_store(path: &Path) -> AppState {
        let yaml = format!(
            "backend:\n  base_url: http://127.0.0.1:9\npanel:\n  store: {}\n",
            path.display()
        );
        AppState::from_config(Config::from_yaml(&yaml).unwrap()).unwrap()
    }

    #[test]
    fn narrow_client_starts_with_panel_collapsed() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_store(&dir.path().join("panel.json"));

        state.set_viewport(ViewportClass::Narrow);

        assert!(!state.panel().is_open());
        assert_eq!(state.panel().viewport(), ViewportClass::Narrow);
    }

    #[test]
    fn wide_client_uses_saved_preference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.json");
        FileStore::open(&path)
            .unwrap()
            .set(PANEL_OPEN_KEY, "0")
            .unwrap();
        let state = state_with_store(&path);

        state.set_viewport(ViewportClass::Wide);
        assert!(!state.panel().is_open());
    }

    #[test]
    fn narrow_only_panel_changes() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_store(&dir.path().join("panel.json"));

        state.set_viewport(ViewportClass::Wide);
        state.set_panel_if_narrow(false);
        assert!(state.panel().is_open());

        state.set_viewport(ViewportClass::Narrow);
        state.set_panel_if_narrow(true);
        assert!(state.panel().is_open());
    }
}
