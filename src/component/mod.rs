//! UI component descriptors and their registry.
//!
//! A [`UiComponent`] describes one node of the viewer chrome: which renderer
//! draws it, its static or state-derived props, the slots it fills with other
//! components, and the context it hands to them. Descriptors are immutable;
//! per-mount local state lives in [`MountedComponent`].

mod catalog;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::warn;

use crate::command::RegistryError;
use crate::props::Props;
use crate::store::GlobalState;

pub use catalog::viewer_components;

pub type ComponentId = String;
pub type MapStateToProps = Arc<dyn Fn(&GlobalState, &Props) -> Props + Send + Sync>;
pub type PropsFromState = Arc<dyn Fn(&Props) -> Props + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    IconButton,
    TabButton,
    SelectButton,
    Divider,
    GroupedItems,
    Header,
    Panel,
    Floating,
    Custom,
    CommandMenu,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::IconButton => "iconButton",
            ComponentKind::TabButton => "tabButton",
            ComponentKind::SelectButton => "selectButton",
            ComponentKind::Divider => "divider",
            ComponentKind::GroupedItems => "groupedItems",
            ComponentKind::Header => "header",
            ComponentKind::Panel => "panel",
            ComponentKind::Floating => "floating",
            ComponentKind::Custom => "custom",
            ComponentKind::CommandMenu => "commandMenu",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub enum PropsSource {
    Static(Props),
    FromInitialState(PropsFromState),
}

impl fmt::Debug for PropsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropsSource::Static(props) => f.debug_tuple("Static").field(props).finish(),
            PropsSource::FromInitialState(_) => f.write_str("FromInitialState(..)"),
        }
    }
}

pub enum ChildContext {
    Static(Props),
    Derived(PropsFromState),
}

impl fmt::Debug for ChildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildContext::Static(props) => f.debug_tuple("Static").field(props).finish(),
            ChildContext::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// A child reference with its ordering priority and presentation class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub component_id: ComponentId,
    pub priority: i32,
    pub class_name: Option<String>,
}

pub struct UiComponent {
    pub id: ComponentId,
    pub kind: ComponentKind,
    /// Renderer key for `custom` and `floating` components.
    pub render: Option<String>,
    pub initial_state: Option<Props>,
    pub props: PropsSource,
    pub map_state_to_props: Option<MapStateToProps>,
    pub slots: Vec<Slot>,
    pub child_context: Option<ChildContext>,
}

impl fmt::Debug for UiComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiComponent")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("render", &self.render)
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

impl UiComponent {
    pub fn new(id: &str, kind: ComponentKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            render: None,
            initial_state: None,
            props: PropsSource::Static(Props::new()),
            map_state_to_props: None,
            slots: Vec::new(),
            child_context: None,
        }
    }

    pub fn render(mut self, renderer: &str) -> Self {
        self.render = Some(renderer.to_string());
        self
    }

    pub fn initial_state(mut self, state: Props) -> Self {
        self.initial_state = Some(state);
        self
    }

    pub fn props(mut self, props: Props) -> Self {
        self.props = PropsSource::Static(props);
        self
    }

    pub fn props_from_state<F>(mut self, f: F) -> Self
    where
        F: Fn(&Props) -> Props + Send + Sync + 'static,
    {
        self.props = PropsSource::FromInitialState(Arc::new(f));
        self
    }

    pub fn map_state<F>(mut self, f: F) -> Self
    where
        F: Fn(&GlobalState, &Props) -> Props + Send + Sync + 'static,
    {
        self.map_state_to_props = Some(Arc::new(f));
        self
    }

    pub fn slot(self, component_id: &str, priority: i32) -> Self {
        self.push_slot(component_id, priority, None)
    }

    pub fn slot_with_class(self, component_id: &str, priority: i32, class_name: &str) -> Self {
        self.push_slot(component_id, priority, Some(class_name))
    }

    fn push_slot(mut self, component_id: &str, priority: i32, class_name: Option<&str>) -> Self {
        self.slots.push(Slot {
            component_id: component_id.to_string(),
            priority,
            class_name: class_name.map(str::to_string),
        });
        self
    }

    pub fn child_context(mut self, context: Props) -> Self {
        self.child_context = Some(ChildContext::Static(context));
        self
    }

    pub fn child_context_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Props) -> Props + Send + Sync + 'static,
    {
        self.child_context = Some(ChildContext::Derived(Arc::new(f)));
        self
    }

    /// Key used to look up the renderer: the explicit one, or the kind.
    pub fn renderer_key(&self) -> &str {
        self.render.as_deref().unwrap_or(self.kind.as_str())
    }

    /// Props before the state projection: static props, or props computed
    /// from `local_state` (the initial state when nothing is mounted).
    pub fn base_props(&self, local_state: Option<&Props>) -> Props {
        match &self.props {
            PropsSource::Static(props) => props.clone(),
            PropsSource::FromInitialState(f) => {
                let empty = Props::new();
                let source = local_state
                    .or(self.initial_state.as_ref())
                    .unwrap_or(&empty);
                f(source)
            }
        }
    }

    /// Base props overlaid with `own_props`, then with the state projection.
    pub fn build_props(
        &self,
        state: &GlobalState,
        own_props: &Props,
        local_state: Option<&Props>,
    ) -> Props {
        let own = self.base_props(local_state).overlaid(own_props.clone());
        match &self.map_state_to_props {
            Some(map) => {
                let mapped = map(state, &own);
                own.overlaid(mapped)
            }
            None => own,
        }
    }

    /// Slots in ascending priority; equal priorities keep declaration order.
    pub fn ordered_slots(&self) -> Vec<&Slot> {
        let mut slots: Vec<&Slot> = self.slots.iter().collect();
        slots.sort_by_key(|s| s.priority);
        slots
    }

    pub fn child_context_for(&self, props: &Props) -> Option<Props> {
        self.child_context.as_ref().map(|ctx| match ctx {
            ChildContext::Static(value) => value.clone(),
            ChildContext::Derived(f) => f(props),
        })
    }
}

pub fn build_props(component: &UiComponent, state: &GlobalState, own_props: &Props) -> Props {
    component.build_props(state, own_props, None)
}

pub fn ordered_slots(component: &UiComponent) -> Vec<&Slot> {
    component.ordered_slots()
}

/// A component instance with its own local state cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MountedComponent {
    component_id: ComponentId,
    local_state: Option<Props>,
}

impl MountedComponent {
    pub fn mount(component: &UiComponent) -> Self {
        Self {
            component_id: component.id.clone(),
            local_state: component.initial_state.clone(),
        }
    }

    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    pub fn local_state(&self) -> Option<&Props> {
        self.local_state.as_ref()
    }

    /// Shallow-merges `patch` into the local state.
    pub fn patch_local(&mut self, patch: Props) {
        match &mut self.local_state {
            Some(local) => local.overlay(patch),
            None => self.local_state = Some(patch),
        }
    }

    pub fn props(&self, component: &UiComponent, state: &GlobalState, own_props: &Props) -> Props {
        component.build_props(state, own_props, self.local_state.as_ref())
    }
}

/// Immutable id -> component map for one viewer instance.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: HashMap<ComponentId, UiComponent>,
    order: Vec<ComponentId>,
}

impl ComponentRegistry {
    pub fn builder() -> ComponentRegistryBuilder {
        ComponentRegistryBuilder::default()
    }

    pub fn get(&self, id: &str) -> Option<&UiComponent> {
        self.components.get(id)
    }

    pub fn try_get(&self, id: &str) -> Result<&UiComponent, RegistryError> {
        self.get(id)
            .ok_or_else(|| RegistryError::UnknownComponent(id.to_string()))
    }

    /// Components in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &UiComponent> {
        self.order.iter().filter_map(|id| self.components.get(id))
    }

    pub fn of_kind(&self, kind: ComponentKind) -> impl Iterator<Item = &UiComponent> {
        self.iter().filter(move |c| c.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Children of `component` in slot order. Dangling ids are skipped.
    pub fn resolve_slots<'a>(
        &'a self,
        component: &'a UiComponent,
    ) -> impl Iterator<Item = (&'a Slot, &'a UiComponent)> + 'a {
        component.ordered_slots().into_iter().filter_map(move |slot| {
            let child = self.components.get(&slot.component_id);
            if child.is_none() {
                warn!(
                    "Component '{}' references unknown slot '{}'",
                    component.id, slot.component_id
                );
            }
            child.map(|c| (slot, c))
        })
    }

    /// Every `(parent, missing child)` pair. These are warnings, not errors.
    pub fn validate(&self) -> Vec<(ComponentId, ComponentId)> {
        self.iter()
            .flat_map(|c| {
                c.slots
                    .iter()
                    .filter(|s| !self.components.contains_key(&s.component_id))
                    .map(|s| (c.id.clone(), s.component_id.clone()))
            })
            .collect()
    }
}

#[derive(Default)]
pub struct ComponentRegistryBuilder {
    components: HashMap<ComponentId, UiComponent>,
    order: Vec<ComponentId>,
}

impl ComponentRegistryBuilder {
    pub fn insert(&mut self, component: UiComponent) -> Result<&mut Self, RegistryError> {
        if self.components.contains_key(&component.id) {
            return Err(RegistryError::DuplicateComponent(component.id));
        }
        self.order.push(component.id.clone());
        self.components.insert(component.id.clone(), component);
        Ok(self)
    }

    pub fn extend<I>(&mut self, components: I) -> Result<&mut Self, RegistryError>
    where
        I: IntoIterator<Item = UiComponent>,
    {
        for component in components {
            self.insert(component)?;
        }
        Ok(self)
    }

    pub fn build(self) -> ComponentRegistry {
        let registry = ComponentRegistry {
            components: self.components,
            order: self.order,
        };
        for (parent, child) in registry.validate() {
            warn!("Component '{parent}' has a dangling slot '{child}'");
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreAction;
    use serde_json::json;

    #[test]
    fn slots_sort_by_priority_and_keep_ties_stable() {
        let header = UiComponent::new("h", ComponentKind::Header)
            .slot("c", 3)
            .slot("a", 1)
            .slot("b1", 2)
            .slot("b2", 2);
        let ids: Vec<_> = ordered_slots(&header)
            .iter()
            .map(|s| s.component_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b1", "b2", "c"]);
    }

    #[test]
    fn map_state_overlays_base_props() {
        let button = UiComponent::new("fsButton", ComponentKind::IconButton)
            .props(
                Props::new()
                    .with("commandId", "enterFS")
                    .with("active", false),
            )
            .map_state(|state, own| {
                Props::new()
                    .with("active", state.plugins.fullscreen.is_fullscreen)
                    .with("seenCommand", own.str("commandId").unwrap_or_default())
            });

        let mut state = GlobalState::default();
        let _ = state.apply(StoreAction::SetFullscreen(true));
        let props = build_props(&button, &state, &Props::new().with("label", "FS"));

        assert_eq!(props.bool("active"), Some(true));
        assert_eq!(props.str("commandId"), Some("enterFS"));
        assert_eq!(props.str("label"), Some("FS"));
        assert_eq!(props.str("seenCommand"), Some("enterFS"));
    }

    #[test]
    fn props_can_derive_from_local_state() {
        let controls = UiComponent::new("pageControls", ComponentKind::Custom)
            .render("pageControls")
            .initial_state(Props::from_value(json!({"currentPage": 1, "pageCount": 1})))
            .props_from_state(|local| Props::new().with("page", local.u64("currentPage").unwrap_or(0)));

        let mut mounted = MountedComponent::mount(&controls);
        let state = GlobalState::default();
        assert_eq!(mounted.props(&controls, &state, &Props::new()).u64("page"), Some(1));

        mounted.patch_local(Props::new().with("currentPage", 4));
        assert_eq!(mounted.props(&controls, &state, &Props::new()).u64("page"), Some(4));
        assert_eq!(mounted.local_state().and_then(|l| l.u64("pageCount")), Some(1));

        // Re-projection leaves the local cell alone.
        let _ = mounted.props(&controls, &state, &Props::new());
        assert_eq!(mounted.local_state().and_then(|l| l.u64("currentPage")), Some(4));
    }

    #[test]
    fn child_context_static_and_derived() {
        let menu = UiComponent::new("menu", ComponentKind::Floating)
            .child_context(Props::new().with("direction", "horizontal"));
        assert_eq!(
            menu.child_context_for(&Props::new())
                .and_then(|c| c.str("direction").map(str::to_string)),
            Some("horizontal".to_string())
        );

        let header = UiComponent::new("side", ComponentKind::Header).child_context_with(|props| {
            let vertical = matches!(props.str("placement"), Some("left" | "right"));
            Props::new().with("direction", if vertical { "vertical" } else { "horizontal" })
        });
        let ctx = header
            .child_context_for(&Props::new().with("placement", "left"))
            .unwrap();
        assert_eq!(ctx.str("direction"), Some("vertical"));
        assert!(UiComponent::new("x", ComponentKind::Divider)
            .child_context_for(&Props::new())
            .is_none());
    }

    #[test]
    fn dangling_slots_are_reported_and_skipped() {
        let mut builder = ComponentRegistry::builder();
        builder
            .insert(
                UiComponent::new("group", ComponentKind::GroupedItems)
                    .slot("present", 0)
                    .slot("missing", 1),
            )
            .unwrap()
            .insert(UiComponent::new("present", ComponentKind::Divider))
            .unwrap();
        let registry = builder.build();

        assert_eq!(
            registry.validate(),
            vec![("group".to_string(), "missing".to_string())]
        );
        let group = registry.get("group").unwrap();
        let children: Vec<_> = registry
            .resolve_slots(group)
            .map(|(_, c)| c.id.as_str())
            .collect();
        assert_eq!(children, vec!["present"]);
    }

    #[test]
    fn duplicate_components_are_rejected() {
        let mut builder = ComponentRegistry::builder();
        builder
            .insert(UiComponent::new("a", ComponentKind::Divider))
            .unwrap();
        let err = builder
            .insert(UiComponent::new("a", ComponentKind::Divider))
            .err();
        assert_eq!(err, Some(RegistryError::DuplicateComponent("a".into())));
    }

    #[test]
    fn renderer_key_prefers_explicit_render() {
        let custom = UiComponent::new("zoom", ComponentKind::Custom).render("zoom");
        assert_eq!(custom.renderer_key(), "zoom");
        let divider = UiComponent::new("divider1", ComponentKind::Divider);
        assert_eq!(divider.renderer_key(), "divider");
    }
}
