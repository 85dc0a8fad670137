//! Composition root: one store, one set of registries and the renderers for
//! a single viewer instance.

mod layout;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info, warn};

use crate::capability::CapabilityRegistry;
use crate::command::{
    CommandRegistry, DispatchOutcome, MenuItemKind, RegistryError, dispatch, viewer_commands,
};
use crate::component::{ComponentKind, ComponentRegistry, MountedComponent, UiComponent, viewer_components};
use crate::config::{ConfigHandle, ViewerConfig};
use crate::plugins::{ReferencePlugins, seed_ui_state};
use crate::props::Props;
use crate::store::{GlobalState, InteractionMode, SpreadMode, Store, StoreAction, SubscriptionId};
use crate::tui::{ComponentRenderer, default_renderers};

pub use layout::{
    DEFAULT_LAYOUT_WIDTH_PX, FloatingRegions, HeaderRegions, PageLayer, PanelRegions, RenderNode,
    ViewerLayout, ViewportContent, slot_visible,
};
use layout::MAX_DEPTH;

/// Id of the primary command menu component.
pub const COMMAND_MENU: &str = "commandMenu";

pub const ENGINE_LOADING_TEXT: &str = "Initializing PDF engine...";
pub const DOCUMENT_LOADING_TEXT: &str = "Loading PDF document...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    EngineLoading,
    PluginsInitializing,
    Ready,
}

impl ViewerPhase {
    pub fn loading_text(&self) -> Option<&'static str> {
        match self {
            ViewerPhase::EngineLoading => Some(ENGINE_LOADING_TEXT),
            ViewerPhase::PluginsInitializing => Some(DOCUMENT_LOADING_TEXT),
            ViewerPhase::Ready => None,
        }
    }
}

pub struct Viewer {
    config: ConfigHandle,
    store: Arc<Store>,
    capabilities: CapabilityRegistry,
    commands: Arc<CommandRegistry>,
    components: Arc<ComponentRegistry>,
    mounted: HashMap<String, MountedComponent>,
    renderers: BTreeMap<String, Arc<dyn ComponentRenderer>>,
    missing_renderers: Mutex<HashSet<String>>,
    engine_loading: bool,
    plugins_ready: bool,
    plugins: Option<ReferencePlugins>,
    redraw: Arc<AtomicBool>,
    subscription: SubscriptionId,
}

impl Viewer {
    /// Merges the plugin configuration and builds the store and registries.
    pub fn new(config: &ViewerConfig) -> Result<Self, RegistryError> {
        let resolved = ConfigHandle::new(config.resolved_plugins());
        let commands = Arc::new(viewer_commands(resolved.clone())?);
        let components = Arc::new(viewer_components(Arc::clone(&commands))?);
        info!(
            "Viewer built: {} commands, {} components",
            commands.len(),
            components.len()
        );

        let store = Arc::new(Store::default());
        store.dispatch(StoreAction::SeedUi(seed_ui_state(&components)));

        let mounted = components
            .iter()
            .filter(|c| c.initial_state.is_some())
            .map(|c| (c.id.clone(), MountedComponent::mount(c)))
            .collect();

        let redraw = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&redraw);
        let subscription = store.subscribe(move |_| flag.store(true, Ordering::Release));

        Ok(Self {
            config: resolved,
            store,
            capabilities: CapabilityRegistry::new(),
            commands,
            components,
            mounted,
            renderers: BTreeMap::new(),
            missing_renderers: Mutex::new(HashSet::new()),
            engine_loading: true,
            plugins_ready: false,
            plugins: None,
            redraw,
            subscription,
        })
    }

    /// A viewer wired to the in-memory reference plugins.
    pub fn with_reference_plugins(
        config: &ViewerConfig,
        download_dir: Option<PathBuf>,
    ) -> Result<Self, RegistryError> {
        let mut viewer = Self::new(config)?;
        let plugins = ReferencePlugins::new(Arc::clone(&viewer.store), download_dir);
        plugins.apply_defaults(&viewer.config);
        viewer.register_plugins(plugins.capabilities(&viewer.config));
        viewer.plugins = Some(plugins);
        Ok(viewer)
    }

    pub fn register_plugins(&mut self, capabilities: CapabilityRegistry) {
        debug!("Registering plugins: {capabilities:?}");
        self.capabilities = capabilities;
    }

    pub fn register_renderer(&mut self, key: &str, renderer: Arc<dyn ComponentRenderer>) {
        self.renderers.insert(key.to_string(), renderer);
        self.missing_renderers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Registers a terminal renderer for every kind the catalog uses.
    pub fn register_default_renderers(&mut self) {
        for (key, renderer) in default_renderers() {
            self.register_renderer(key, renderer);
        }
    }

    pub fn renderer(&self, key: &str) -> Option<&Arc<dyn ComponentRenderer>> {
        self.renderers.get(key)
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<GlobalState> {
        self.store.snapshot()
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    pub fn plugins(&self) -> Option<&ReferencePlugins> {
        self.plugins.as_ref()
    }

    pub fn set_engine_loading(&mut self, loading: bool) {
        self.engine_loading = loading;
        self.redraw.store(true, Ordering::Release);
    }

    pub fn set_plugins_ready(&mut self, ready: bool) {
        self.plugins_ready = ready;
        self.redraw.store(true, Ordering::Release);
    }

    pub fn phase(&self) -> ViewerPhase {
        if self.engine_loading {
            ViewerPhase::EngineLoading
        } else if !self.plugins_ready {
            ViewerPhase::PluginsInitializing
        } else {
            ViewerPhase::Ready
        }
    }

    /// True once after any state change, phase change or explicit request.
    pub fn take_redraw(&self) -> bool {
        self.redraw.swap(false, Ordering::AcqRel)
    }

    pub fn request_redraw(&self) {
        self.redraw.store(true, Ordering::Release);
    }

    /// Resolves and dispatches `command_id` against the current snapshot.
    pub fn execute(&self, command_id: &str) -> DispatchOutcome {
        let Some(item) = self.commands.resolve(command_id) else {
            warn!("Unknown command '{command_id}'");
            return DispatchOutcome::Unknown;
        };
        let state = self.store.snapshot();
        dispatch(item, &self.capabilities, &state)
    }

    /// What a click does: menus toggle the command menu, actions dispatch
    /// and close it.
    pub fn activate(&self, command_id: &str, trigger: Option<&str>) -> DispatchOutcome {
        let Some(item) = self.commands.resolve(command_id) else {
            warn!("Unknown command '{command_id}'");
            return DispatchOutcome::Unknown;
        };
        let state = self.store.snapshot();
        let menu = state.plugins.ui.command_menu();

        if item.kind != MenuItemKind::Action {
            if !item.is_visible(&state) {
                return DispatchOutcome::Hidden;
            }
            if item.is_disabled(&state) {
                return DispatchOutcome::Disabled;
            }
            let Some(ui) = self.capabilities.ui() else {
                return DispatchOutcome::NoAction;
            };
            if menu.open && menu.active_command.as_deref() == Some(command_id) {
                ui.close_command_menu(COMMAND_MENU);
            } else {
                ui.open_command_menu(COMMAND_MENU, command_id, trigger);
            }
            return DispatchOutcome::Dispatched;
        }

        let outcome = dispatch(item, &self.capabilities, &state);
        if outcome == DispatchOutcome::Dispatched && menu.open {
            self.close_command_menu();
        }
        outcome
    }

    pub fn close_command_menu(&self) {
        if let Some(ui) = self.capabilities.ui() {
            ui.close_command_menu(COMMAND_MENU);
        }
    }

    /// Shallow-merges `patch` into a mounted component's local state.
    pub fn patch_local(&mut self, component_id: &str, patch: Props) -> bool {
        match self.mounted.get_mut(component_id) {
            Some(mounted) => {
                mounted.patch_local(patch);
                self.redraw.store(true, Ordering::Release);
                true
            }
            None => {
                warn!("No mounted component '{component_id}'");
                false
            }
        }
    }

    /// Current props of `component_id`, as its renderer would see them.
    pub fn component_props(&self, component_id: &str, state: &GlobalState) -> Option<Props> {
        let component = self.components.get(component_id)?;
        Some(self.props_for(component, state))
    }

    fn props_for(&self, component: &UiComponent, state: &GlobalState) -> Props {
        match self.mounted.get(&component.id) {
            Some(mounted) => mounted.props(component, state, &Props::new()),
            None => component.build_props(state, &Props::new(), None),
        }
    }

    pub fn layout(&self, state: &GlobalState) -> ViewerLayout {
        self.layout_at(state, DEFAULT_LAYOUT_WIDTH_PX)
    }

    /// Lays out every region for `state`, resolving slot breakpoints
    /// against `width_px`.
    pub fn layout_at(&self, state: &GlobalState, width_px: u32) -> ViewerLayout {
        let phase = self.phase();
        let mut layout = ViewerLayout {
            headers: HeaderRegions::default(),
            panels: PanelRegions::default(),
            viewport: ViewportContent::Loading(ENGINE_LOADING_TEXT),
            floating: FloatingRegions::default(),
            command_menu: None,
        };
        if phase == ViewerPhase::EngineLoading {
            return layout;
        }
        layout.viewport = match phase.loading_text() {
            Some(text) => ViewportContent::Loading(text),
            None => page_surface(state),
        };

        let root_context = Props::new();
        for component in self.components.iter() {
            let region = match component.kind {
                ComponentKind::Header
                | ComponentKind::Panel
                | ComponentKind::Floating
                | ComponentKind::CommandMenu => component.kind,
                _ => continue,
            };
            // Floating components nested in another's slots are not roots.
            if region == ComponentKind::Floating && self.is_slotted(&component.id) {
                continue;
            }
            let Some(node) = self.build_node(component, state, &root_context, width_px, 0) else {
                continue;
            };
            match region {
                ComponentKind::Header => match node.props.str("placement") {
                    Some("bottom") => layout.headers.bottom.push(node),
                    Some("left") => layout.headers.left.push(node),
                    Some("right") => layout.headers.right.push(node),
                    _ => layout.headers.top.push(node),
                },
                ComponentKind::Panel => match node.props.str("location") {
                    Some("right") => layout.panels.right.push(node),
                    _ => layout.panels.left.push(node),
                },
                ComponentKind::Floating => match node.props.str("scrollerPosition") {
                    Some("inside") => layout.floating.inside_scroller.push(node),
                    _ => layout.floating.outside_scroller.push(node),
                },
                _ => layout.command_menu = Some(node),
            }
        }
        layout
    }

    fn is_slotted(&self, component_id: &str) -> bool {
        self.components
            .iter()
            .any(|c| c.slots.iter().any(|s| s.component_id == component_id))
    }

    fn build_node(
        &self,
        component: &UiComponent,
        state: &GlobalState,
        context: &Props,
        width_px: u32,
        depth: usize,
    ) -> Option<RenderNode> {
        if depth > MAX_DEPTH {
            warn!("Component '{}' nested too deeply, skipping", component.id);
            return None;
        }
        let key = component.renderer_key();
        if !self.renderers.contains_key(key) {
            self.note_missing_renderer(key);
            return None;
        }

        let props = self.props_for(component, state);
        if props.bool("visible") == Some(false) {
            return None;
        }
        let closable = matches!(
            component.kind,
            ComponentKind::Panel | ComponentKind::Floating | ComponentKind::CommandMenu
        );
        if closable && props.bool("open") == Some(false) {
            return None;
        }

        let child_context = match component.child_context_for(&props) {
            Some(own) => context.clone().overlaid(own),
            None => context.clone(),
        };
        let only_child = match component.kind {
            ComponentKind::Header | ComponentKind::Panel => {
                props.str("visibleChild").map(str::to_string)
            }
            _ => None,
        };
        let children = self
            .components
            .resolve_slots(component)
            .filter(|(slot, _)| slot_visible(slot.class_name.as_deref(), width_px))
            .filter(|(_, child)| only_child.as_deref().is_none_or(|only| child.id == only))
            .filter_map(|(_, child)| {
                self.build_node(child, state, &child_context, width_px, depth + 1)
            })
            .collect();

        Some(RenderNode {
            id: component.id.clone(),
            kind: component.kind,
            renderer: key.to_string(),
            props,
            context: context.clone(),
            children,
        })
    }

    fn note_missing_renderer(&self, key: &str) {
        let mut missing = self
            .missing_renderers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if missing.insert(key.to_string()) {
            warn!("No renderer registered for '{key}', skipping");
        }
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}

/// Pages on screen and the overlay layers that have something to draw.
fn page_surface(state: &GlobalState) -> ViewportContent {
    let current = state.plugins.scroll.current_page.max(1);
    let total = state.plugins.scroll.total_pages.max(1);
    let mut visible_pages = vec![current];
    if state.plugins.spread.spread_mode != SpreadMode::None && current < total {
        visible_pages.push(current + 1);
    }

    let on_screen = |page_index: usize| visible_pages.contains(&(page_index + 1));
    let layers = PageLayer::STACK
        .into_iter()
        .filter(|layer| match layer {
            PageLayer::Render | PageLayer::Tiling => true,
            PageLayer::Search => state
                .plugins
                .search
                .results
                .iter()
                .any(|hit| on_screen(hit.page_index)),
            PageLayer::Annotation => state
                .plugins
                .annotation
                .pages
                .keys()
                .any(|page| on_screen(*page)),
            PageLayer::MarqueeZoom => {
                state.plugins.interaction_manager.active_mode == InteractionMode::MarqueeZoom
            }
            PageLayer::MarqueeCapture => {
                state.plugins.interaction_manager.active_mode == InteractionMode::MarqueeCapture
            }
            PageLayer::Selection => state
                .plugins
                .selection
                .ranges
                .iter()
                .any(|r| on_screen(r.page_index)),
        })
        .collect();

    ViewportContent::Pages {
        visible_pages,
        layers,
    }
}
