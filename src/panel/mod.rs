mod store;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use store::{FileStore, MemoryStore, PreferenceStore, StoreError};

pub const PANEL_OPEN_KEY: &str = "panelOpen";

/// Width class of the host viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViewportClass {
    Narrow,
    #[default]
    Wide,
}

impl ViewportClass {
    /// Track point radius in pixels.
    pub fn point_radius(self) -> u32 {
        match self {
            ViewportClass::Narrow => 7,
            ViewportClass::Wide => 8,
        }
    }
}

/// Narrow viewports start collapsed; wide ones honour the saved preference
/// and default to open.
pub fn default_panel_open(viewport: ViewportClass, saved: Option<bool>) -> bool {
    match viewport {
        ViewportClass::Narrow => false,
        ViewportClass::Wide => saved.unwrap_or(true),
    }
}

/// Side panel visibility, persisted in a preference store.
pub struct PanelState<S> {
    store: S,
    viewport: ViewportClass,
    /// Whether the host has reported its viewport class yet.
    reported: bool,
    open: bool,
}

impl<S: PreferenceStore> PanelState<S> {
    pub fn load(store: S, viewport: ViewportClass) -> Self {
        let saved = saved_preference(&store);
        Self {
            store,
            viewport,
            reported: false,
            open: default_panel_open(viewport, saved),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn viewport(&self) -> ViewportClass {
        self.viewport
    }

    /// Applies the viewport class reported by the host. The first report and
    /// every change of class re-derive the open state from the saved preference.
    pub fn set_viewport(&mut self, viewport: ViewportClass) {
        if self.reported && viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.reported = true;
        self.open = default_panel_open(viewport, saved_preference(&self.store));
    }

    /// Sets and persists the panel state. The in-memory state changes even
    /// when persisting fails.
    pub fn set_open(&mut self, open: bool) -> Result<(), StoreError> {
        self.open = open;
        self.store
            .set(PANEL_OPEN_KEY, if open { "1" } else { "0" })
    }

    pub fn toggle(&mut self) -> Result<bool, StoreError> {
        let open = !self.open;
        self.set_open(open)?;
        Ok(open)
    }
}

fn saved_preference<S: PreferenceStore>(store: &S) -> Option<bool> {
    store.get(PANEL_OPEN_KEY).map(|v| v == "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        assert!(!default_panel_open(ViewportClass::Narrow, None));
        assert!(!default_panel_open(ViewportClass::Narrow, Some(true)));
        assert!(default_panel_open(ViewportClass::Wide, None));
        assert!(!default_panel_open(ViewportClass::Wide, Some(false)));
        assert!(default_panel_open(ViewportClass::Wide, Some(true)));
    }

    #[test]
    fn toggling_persists_preference() {
        let mut panel = PanelState::load(MemoryStore::default(), ViewportClass::Wide);
        assert!(panel.is_open());

        assert!(!panel.toggle().unwrap());
        assert_eq!(panel.store.get(PANEL_OPEN_KEY).as_deref(), Some("0"));

        let reloaded = PanelState::load(panel.store, ViewportClass::Wide);
        assert!(!reloaded.is_open());
    }

    #[test]
    fn narrow_viewport_ignores_saved_preference() {
        let mut store = MemoryStore::default();
        store.set(PANEL_OPEN_KEY, "1").unwrap();

        let panel = PanelState::load(store, ViewportClass::Narrow);
        assert!(!panel.is_open());
    }

    #[test]
    fn first_narrow_report_collapses_the_panel() {
        let mut panel = PanelState::load(MemoryStore::default(), ViewportClass::Wide);
        assert!(panel.is_open());

        panel.set_viewport(ViewportClass::Narrow);
        assert!(!panel.is_open());
        assert_eq!(panel.viewport(), ViewportClass::Narrow);
    }

    #[test]
    fn repeated_report_keeps_user_choice() {
        let mut panel = PanelState::load(MemoryStore::default(), ViewportClass::Wide);
        panel.set_viewport(ViewportClass::Narrow);
        panel.set_open(true).unwrap();

        panel.set_viewport(ViewportClass::Narrow);
        assert!(panel.is_open());
    }

    #[test]
    fn widening_restores_saved_preference() {
        let mut store = MemoryStore::default();
        store.set(PANEL_OPEN_KEY, "0").unwrap();
        let mut panel = PanelState::load(store, ViewportClass::Narrow);
        panel.set_viewport(ViewportClass::Narrow);

        panel.set_viewport(ViewportClass::Wide);
        assert!(!panel.is_open());

        panel.set_open(true).unwrap();
        panel.set_viewport(ViewportClass::Narrow);
        panel.set_viewport(ViewportClass::Wide);
        assert!(panel.is_open());
    }

    #[test]
    fn point_radius_by_viewport() {
        assert_eq!(ViewportClass::Narrow.point_radius(), 7);
        assert_eq!(ViewportClass::Wide.point_radius(), 8);
    }
}
