//! Typed lookup of plugin capabilities.
//!
//! Plugins are identified by the closed [`PluginId`] enumeration and register
//! one [`CapabilityHandle`] each. Accessors such as
//! [`CapabilityRegistry::zoom`] return `None` when the plugin is not
//! registered, which callers treat as "do nothing".

mod traits;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

pub use traits::*;

/// Every plugin the viewer composes, whether or not it exposes a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluginId {
    Loader,
    Viewport,
    Scroll,
    Render,
    Tiling,
    Zoom,
    Spread,
    Rotate,
    Search,
    Selection,
    Thumbnail,
    Annotation,
    History,
    InteractionManager,
    Pan,
    Capture,
    Fullscreen,
    Export,
    Print,
    Bookmark,
    Attachment,
    Ui,
}

impl PluginId {
    pub const ALL: [PluginId; 22] = [
        PluginId::Loader,
        PluginId::Viewport,
        PluginId::Scroll,
        PluginId::Render,
        PluginId::Tiling,
        PluginId::Zoom,
        PluginId::Spread,
        PluginId::Rotate,
        PluginId::Search,
        PluginId::Selection,
        PluginId::Thumbnail,
        PluginId::Annotation,
        PluginId::History,
        PluginId::InteractionManager,
        PluginId::Pan,
        PluginId::Capture,
        PluginId::Fullscreen,
        PluginId::Export,
        PluginId::Print,
        PluginId::Bookmark,
        PluginId::Attachment,
        PluginId::Ui,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluginId::Loader => "loader",
            PluginId::Viewport => "viewport",
            PluginId::Scroll => "scroll",
            PluginId::Render => "render",
            PluginId::Tiling => "tiling",
            PluginId::Zoom => "zoom",
            PluginId::Spread => "spread",
            PluginId::Rotate => "rotate",
            PluginId::Search => "search",
            PluginId::Selection => "selection",
            PluginId::Thumbnail => "thumbnail",
            PluginId::Annotation => "annotation",
            PluginId::History => "history",
            PluginId::InteractionManager => "interaction-manager",
            PluginId::Pan => "pan",
            PluginId::Capture => "capture",
            PluginId::Fullscreen => "fullscreen",
            PluginId::Export => "export",
            PluginId::Print => "print",
            PluginId::Bookmark => "bookmark",
            PluginId::Attachment => "attachment",
            PluginId::Ui => "ui",
        }
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! capabilities {
    ($($variant:ident => $method:ident : $cap:ident),* $(,)?) => {
        /// A registered capability, tagged with the plugin that provides it.
        #[derive(Clone)]
        pub enum CapabilityHandle {
            $($variant(Arc<dyn $cap>),)*
        }

        impl CapabilityHandle {
            pub fn plugin_id(&self) -> PluginId {
                match self {
                    $(CapabilityHandle::$variant(_) => PluginId::$variant,)*
                }
            }
        }

        impl CapabilityRegistry {
            $(
                pub fn $method(&self) -> Option<Arc<dyn $cap>> {
                    match self.handles.get(&PluginId::$variant) {
                        Some(CapabilityHandle::$variant(cap)) => Some(Arc::clone(cap)),
                        _ => None,
                    }
                }
            )*
        }
    };
}

capabilities! {
    Zoom => zoom: ZoomCapability,
    Scroll => scroll: ScrollCapability,
    Spread => spread: SpreadCapability,
    Rotate => rotate: RotateCapability,
    Annotation => annotation: AnnotationCapability,
    Search => search: SearchCapability,
    Selection => selection: SelectionCapability,
    History => history: HistoryCapability,
    InteractionManager => interaction_manager: InteractionManagerCapability,
    Fullscreen => fullscreen: FullscreenCapability,
    Export => export: ExportCapability,
    Capture => capture: CaptureCapability,
    Ui => ui: UiCapability,
}

impl fmt::Debug for CapabilityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapabilityHandle({})", self.plugin_id())
    }
}

/// Capabilities of one viewer instance.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    handles: BTreeMap<PluginId, CapabilityHandle>,
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handles.keys()).finish()
    }
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handle`, returning the one it replaced.
    pub fn register(&mut self, handle: CapabilityHandle) -> Option<CapabilityHandle> {
        let id = handle.plugin_id();
        debug!("Registering capability {id}");
        self.handles.insert(id, handle)
    }

    pub fn with(mut self, handle: CapabilityHandle) -> Self {
        self.register(handle);
        self
    }

    pub fn unregister(&mut self, id: PluginId) -> Option<CapabilityHandle> {
        self.handles.remove(&id)
    }

    pub fn contains(&self, id: PluginId) -> bool {
        self.handles.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = PluginId> + '_ {
        self.handles.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FormattedSelection, SpreadMode};
    use crate::task::Task;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FixedSpread(Mutex<SpreadMode>);

    impl SpreadCapability for FixedSpread {
        fn set_spread_mode(&self, mode: SpreadMode) {
            *self.0.lock().unwrap() = mode;
        }

        fn spread_mode(&self) -> SpreadMode {
            *self.0.lock().unwrap()
        }
    }

    struct EmptySelection;

    impl SelectionCapability for EmptySelection {
        fn formatted_selection(&self) -> Vec<FormattedSelection> {
            Vec::new()
        }
        fn selected_text(&self) -> Task<Vec<String>> {
            Task::resolved(Vec::new())
        }
        fn copy_to_clipboard(&self) {}
        fn clear(&self) {}
    }

    #[test]
    fn lookup_is_by_plugin_id() {
        let spread = Arc::new(FixedSpread::default());
        let registry = CapabilityRegistry::new()
            .with(CapabilityHandle::Spread(spread.clone()))
            .with(CapabilityHandle::Selection(Arc::new(EmptySelection)));

        assert!(registry.contains(PluginId::Spread));
        assert!(registry.zoom().is_none());
        assert!(registry.export().is_none());

        registry
            .spread()
            .expect("spread registered")
            .set_spread_mode(SpreadMode::Even);
        assert_eq!(spread.spread_mode(), SpreadMode::Even);
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec![PluginId::Spread, PluginId::Selection]
        );
    }

    #[test]
    fn registering_twice_replaces() {
        let mut registry = CapabilityRegistry::new();
        assert!(
            registry
                .register(CapabilityHandle::Spread(Arc::new(FixedSpread::default())))
                .is_none()
        );
        let replaced =
            registry.register(CapabilityHandle::Spread(Arc::new(FixedSpread::default())));
        assert_eq!(replaced.map(|h| h.plugin_id()), Some(PluginId::Spread));
        assert_eq!(registry.len(), 1);
        assert!(registry.unregister(PluginId::Spread).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn plugin_names_are_stable() {
        assert_eq!(PluginId::InteractionManager.to_string(), "interaction-manager");
        assert_eq!(PluginId::ALL.len(), 22);
    }
}
