//! Store-backed plugins implementing every capability the command catalog
//! uses. They move state only; nothing here renders or measures pages.

mod annotation;
mod export;
pub mod loader;
mod search;
mod selection;
mod ui;
mod view;

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use crate::capability::{CapabilityHandle, CapabilityRegistry};
use crate::config::ResolvedPluginConfigs;
use crate::store::{Store, StoreAction, ZoomLevel};

pub use annotation::AnnotationPlugin;
pub use export::ExportPlugin;
pub use loader::{LoadError, LoadedDocument, load_document, spawn_load};
pub use search::{SearchPlugin, extract_page_text, find_hits};
pub use selection::SelectionPlugin;
pub use ui::{UiPlugin, seed_ui_state};
pub use view::{
    CapturePlugin, FullscreenPlugin, InteractionManagerPlugin, RotatePlugin, ScrollPlugin,
    SpreadPlugin, ZoomPlugin,
};

/// One instance of every reference plugin, sharing a store.
pub struct ReferencePlugins {
    store: Arc<Store>,
    pub zoom: Arc<ZoomPlugin>,
    pub scroll: Arc<ScrollPlugin>,
    pub spread: Arc<SpreadPlugin>,
    pub rotate: Arc<RotatePlugin>,
    pub annotation: Arc<AnnotationPlugin>,
    pub search: Arc<SearchPlugin>,
    pub selection: Arc<SelectionPlugin>,
    pub interaction: Arc<InteractionManagerPlugin>,
    pub fullscreen: Arc<FullscreenPlugin>,
    pub export: Arc<ExportPlugin>,
    pub capture: Arc<CapturePlugin>,
    pub ui: Arc<UiPlugin>,
}

impl ReferencePlugins {
    pub fn new(store: Arc<Store>, download_dir: Option<PathBuf>) -> Self {
        let interaction = Arc::new(InteractionManagerPlugin::new(store.clone()));
        Self {
            zoom: Arc::new(ZoomPlugin::new(store.clone(), interaction.clone())),
            scroll: Arc::new(ScrollPlugin::new(store.clone())),
            spread: Arc::new(SpreadPlugin::new(store.clone())),
            rotate: Arc::new(RotatePlugin::new(store.clone())),
            annotation: Arc::new(AnnotationPlugin::new(store.clone())),
            search: Arc::new(SearchPlugin::new(store.clone())),
            selection: Arc::new(SelectionPlugin::new(store.clone())),
            fullscreen: Arc::new(FullscreenPlugin::new(store.clone())),
            export: Arc::new(ExportPlugin::new(download_dir)),
            capture: Arc::new(CapturePlugin::new(interaction.clone())),
            ui: Arc::new(UiPlugin::new(store.clone())),
            interaction,
            store,
        }
    }

    /// Capability handles for these plugins. The annotation plugin is left
    /// out when disabled in `config`. History has no reference plugin.
    pub fn capabilities(&self, config: &ResolvedPluginConfigs) -> CapabilityRegistry {
        let mut registry = CapabilityRegistry::new()
            .with(CapabilityHandle::Zoom(self.zoom.clone()))
            .with(CapabilityHandle::Scroll(self.scroll.clone()))
            .with(CapabilityHandle::Spread(self.spread.clone()))
            .with(CapabilityHandle::Rotate(self.rotate.clone()))
            .with(CapabilityHandle::Search(self.search.clone()))
            .with(CapabilityHandle::Selection(self.selection.clone()))
            .with(CapabilityHandle::InteractionManager(self.interaction.clone()))
            .with(CapabilityHandle::Fullscreen(self.fullscreen.clone()))
            .with(CapabilityHandle::Export(self.export.clone()))
            .with(CapabilityHandle::Capture(self.capture.clone()))
            .with(CapabilityHandle::Ui(self.ui.clone()));
        if config.annotation.enabled {
            registry.register(CapabilityHandle::Annotation(self.annotation.clone()));
        } else {
            debug!("Annotation plugin disabled by configuration");
        }
        registry
    }

    /// Applies the configured starting zoom, layout and rotation.
    pub fn apply_defaults(&self, config: &ResolvedPluginConfigs) {
        let store = &self.store;
        store.dispatch(StoreAction::SetViewportGap(config.viewport.viewport_gap));
        store.dispatch(StoreAction::SetScrollStrategy(config.scroll.strategy));
        store.dispatch(StoreAction::SetSpreadMode(config.spread.default_spread_mode));
        store.dispatch(StoreAction::SetRotation(config.rotate.default_rotation));
        let current = match config.zoom.default_zoom_level {
            ZoomLevel::Scale(scale) => scale,
            ZoomLevel::Mode(_) => 1.0,
        };
        store.dispatch(StoreAction::SetZoom {
            level: config.zoom.default_zoom_level,
            current,
        });
    }

    /// Publishes `document` to the store and the export and search plugins.
    pub fn open_document(&self, document: LoadedDocument) {
        self.export
            .set_document(&document.info.name, Arc::clone(&document.bytes));
        self.search
            .set_document(&document.bytes, document.info.page_count);
        self.store
            .dispatch(StoreAction::SetDocument(Some(document.info)));
    }

    pub fn close_document(&self) {
        self.export.clear_document();
        self.search.clear_document();
        self.store.dispatch(StoreAction::SetDocument(None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{ExportCapability, PluginId};
    use crate::config::{AnnotationPatch, PluginConfigs, ZoomPatch, default_plugin_configs, merge};
    use crate::store::{DocumentInfo, ScrollStrategy};

    #[test]
    fn defaults_flow_into_store() {
        let store = Arc::new(Store::default());
        let plugins = ReferencePlugins::new(store.clone(), None);
        let user = PluginConfigs {
            zoom: Some(ZoomPatch {
                default_zoom_level: Some(ZoomLevel::Scale(1.5)),
            }),
            ..Default::default()
        };
        plugins.apply_defaults(&merge(&default_plugin_configs(), &user));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.plugins.zoom.current_zoom_level, 1.5);
        assert_eq!(snapshot.plugins.scroll.strategy, ScrollStrategy::Vertical);
        assert_eq!(snapshot.plugins.viewport.viewport_gap, 10);
    }

    #[test]
    fn disabled_annotation_is_not_registered() {
        let plugins = ReferencePlugins::new(Arc::new(Store::default()), None);
        let user = PluginConfigs {
            annotation: Some(AnnotationPatch {
                enabled: Some(false),
            }),
            ..Default::default()
        };
        let registry = plugins.capabilities(&merge(&default_plugin_configs(), &user));
        assert!(!registry.contains(PluginId::Annotation));
        assert!(!registry.contains(PluginId::History));
        assert!(registry.contains(PluginId::Export));
        assert!(registry.contains(PluginId::Search));
    }

    #[test]
    fn opening_a_document_feeds_export() {
        let store = Arc::new(Store::default());
        let plugins = ReferencePlugins::new(store.clone(), None);
        plugins.open_document(LoadedDocument {
            info: DocumentInfo {
                id: "1".into(),
                name: "a.pdf".into(),
                page_count: 3,
                size_bytes: 4,
            },
            bytes: Arc::new(b"%PDF".to_vec()),
        });
        assert_eq!(store.snapshot().plugins.scroll.total_pages, 3);
        assert!(plugins.export.save_as_copy().is_settled());
        plugins.close_document();
        assert!(store.snapshot().core.document.is_none());
    }
}
