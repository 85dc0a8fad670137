//! Declarative menu items and the registry that resolves them.
//!
//! A [`MenuItem`] never holds state of its own. Its label, icon and
//! predicates are projections of a [`GlobalState`] snapshot, and its action
//! talks to plugins only through the [`CapabilityRegistry`] it is handed.

mod annotation;
mod catalog;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;

use crate::capability::CapabilityRegistry;
use crate::perf;
use crate::props::Props;
use crate::store::GlobalState;

pub use catalog::viewer_commands;

pub type CommandId = String;
pub type Predicate = Arc<dyn Fn(&GlobalState) -> bool + Send + Sync>;
pub type Action = Arc<dyn Fn(&CapabilityRegistry, &GlobalState) + Send + Sync>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate command id '{0}'")]
    DuplicateCommand(String),

    #[error("unknown command id '{0}'")]
    UnknownCommand(String),

    #[error("'{0}' is a menu or group without children")]
    EmptyChildren(String),

    #[error("'{parent}' lists unknown child '{child}'")]
    DanglingChild { parent: String, child: String },

    #[error("command cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("action '{0}' has no handler")]
    MissingAction(String),

    #[error("duplicate component id '{0}'")]
    DuplicateComponent(String),

    #[error("unknown component id '{0}'")]
    UnknownComponent(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItemKind {
    Action,
    Menu,
    Group,
}

/// A value that is either fixed or computed from the current state.
pub enum Projection<T> {
    Static(T),
    Derived(Arc<dyn Fn(&GlobalState) -> T + Send + Sync>),
}

impl<T: Clone> Projection<T> {
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&GlobalState) -> T + Send + Sync + 'static,
    {
        Projection::Derived(Arc::new(f))
    }

    pub fn resolve(&self, state: &GlobalState) -> T {
        match self {
            Projection::Static(value) => value.clone(),
            Projection::Derived(f) => f(state),
        }
    }
}

impl<T: Clone> Clone for Projection<T> {
    fn clone(&self) -> Self {
        match self {
            Projection::Static(value) => Projection::Static(value.clone()),
            Projection::Derived(f) => Projection::Derived(Arc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Projection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Projection::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Colours applied to an icon, typically the active tool colour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconProps {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
}

impl IconProps {
    pub fn primary(color: impl Into<String>) -> Self {
        Self {
            primary_color: Some(color.into()),
            secondary_color: None,
        }
    }

    pub fn to_props(&self) -> Props {
        let mut props = Props::new();
        if let Some(c) = &self.primary_color {
            props.set("primaryColor", c.as_str());
        }
        if let Some(c) = &self.secondary_color {
            props.set("secondaryColor", c.as_str());
        }
        props
    }
}

/// A key chord bound to a command, e.g. `ArrowRight` or `Meta+C`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub key: String,
    pub label: String,
}

#[derive(Clone)]
pub struct MenuItem {
    pub id: CommandId,
    pub kind: MenuItemKind,
    pub label: Projection<String>,
    pub icon: Option<Projection<String>>,
    pub icon_props: Option<Projection<IconProps>>,
    pub action: Option<Action>,
    pub active: Option<Predicate>,
    pub disabled: Option<Predicate>,
    pub visible: Option<Predicate>,
    pub children: Vec<CommandId>,
    pub divider_before: bool,
    pub shortcut: Option<Shortcut>,
}

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuItem")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("children", &self.children)
            .field("has_action", &self.action.is_some())
            .finish_non_exhaustive()
    }
}

impl MenuItem {
    fn new(id: &str, kind: MenuItemKind, label: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            label: Projection::Static(label.to_string()),
            icon: None,
            icon_props: None,
            action: None,
            active: None,
            disabled: None,
            visible: None,
            children: Vec::new(),
            divider_before: false,
            shortcut: None,
        }
    }

    pub fn action(id: &str, label: &str) -> Self {
        Self::new(id, MenuItemKind::Action, label)
    }

    pub fn menu(id: &str, label: &str, children: &[&str]) -> Self {
        Self::new(id, MenuItemKind::Menu, label).children(children)
    }

    pub fn group(id: &str, label: &str, children: &[&str]) -> Self {
        Self::new(id, MenuItemKind::Group, label).children(children)
    }

    fn children(mut self, children: &[&str]) -> Self {
        self.children = children.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn label_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&GlobalState) -> String + Send + Sync + 'static,
    {
        self.label = Projection::derived(f);
        self
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(Projection::Static(icon.to_string()));
        self
    }

    pub fn icon_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&GlobalState) -> String + Send + Sync + 'static,
    {
        self.icon = Some(Projection::derived(f));
        self
    }

    pub fn icon_props_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&GlobalState) -> IconProps + Send + Sync + 'static,
    {
        self.icon_props = Some(Projection::derived(f));
        self
    }

    pub fn on_action<F>(mut self, f: F) -> Self
    where
        F: Fn(&CapabilityRegistry, &GlobalState) + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(f));
        self
    }

    pub fn active_when<F>(mut self, f: F) -> Self
    where
        F: Fn(&GlobalState) -> bool + Send + Sync + 'static,
    {
        self.active = Some(Arc::new(f));
        self
    }

    pub fn disabled_when<F>(mut self, f: F) -> Self
    where
        F: Fn(&GlobalState) -> bool + Send + Sync + 'static,
    {
        self.disabled = Some(Arc::new(f));
        self
    }

    pub fn visible_when<F>(mut self, f: F) -> Self
    where
        F: Fn(&GlobalState) -> bool + Send + Sync + 'static,
    {
        self.visible = Some(Arc::new(f));
        self
    }

    pub fn divider_before(mut self) -> Self {
        self.divider_before = true;
        self
    }

    pub fn shortcut(mut self, key: &str, label: &str) -> Self {
        self.shortcut = Some(Shortcut {
            key: key.to_string(),
            label: label.to_string(),
        });
        self
    }

    pub fn is_active(&self, state: &GlobalState) -> bool {
        self.active.as_ref().is_some_and(|p| p(state))
    }

    pub fn is_disabled(&self, state: &GlobalState) -> bool {
        self.disabled.as_ref().is_some_and(|p| p(state))
    }

    pub fn is_visible(&self, state: &GlobalState) -> bool {
        self.visible.as_ref().is_none_or(|p| p(state))
    }

    pub fn label(&self, state: &GlobalState) -> String {
        self.label.resolve(state)
    }

    pub fn icon_name(&self, state: &GlobalState) -> Option<String> {
        self.icon.as_ref().map(|i| i.resolve(state))
    }

    pub fn resolved_icon_props(&self, state: &GlobalState) -> Option<IconProps> {
        self.icon_props.as_ref().map(|p| p.resolve(state))
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, MenuItemKind::Menu | MenuItemKind::Group)
    }
}

pub fn is_active(item: &MenuItem, state: &GlobalState) -> bool {
    item.is_active(state)
}

pub fn is_disabled(item: &MenuItem, state: &GlobalState) -> bool {
    item.is_disabled(state)
}

pub fn is_visible(item: &MenuItem, state: &GlobalState) -> bool {
    item.is_visible(state)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Dispatched,
    Disabled,
    Hidden,
    NoAction,
    Unknown,
}

/// Runs the item's action against `capabilities` if it is visible and enabled.
pub fn dispatch(
    item: &MenuItem,
    capabilities: &CapabilityRegistry,
    state: &GlobalState,
) -> DispatchOutcome {
    let Some(action) = &item.action else {
        return DispatchOutcome::NoAction;
    };
    if !item.is_visible(state) {
        debug!("Command '{}' is hidden, not dispatching", item.id);
        return DispatchOutcome::Hidden;
    }
    if item.is_disabled(state) {
        debug!("Command '{}' is disabled, not dispatching", item.id);
        return DispatchOutcome::Disabled;
    }
    let _span = perf::span(format!("dispatch {}", item.id));
    action(capabilities, state);
    DispatchOutcome::Dispatched
}

/// Immutable id -> item map for one viewer instance.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    items: HashMap<CommandId, MenuItem>,
    order: Vec<CommandId>,
}

impl CommandRegistry {
    pub fn builder() -> CommandRegistryBuilder {
        CommandRegistryBuilder::default()
    }

    pub fn resolve(&self, id: &str) -> Option<&MenuItem> {
        self.items.get(id)
    }

    pub fn try_resolve(&self, id: &str) -> Result<&MenuItem, RegistryError> {
        self.resolve(id)
            .ok_or_else(|| RegistryError::UnknownCommand(id.to_string()))
    }

    /// Items in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &MenuItem> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolvable children of `item`. Unknown ids are skipped with a warning.
    pub fn children<'a>(&'a self, item: &'a MenuItem) -> impl Iterator<Item = &'a MenuItem> + 'a {
        item.children.iter().filter_map(move |child| {
            let resolved = self.items.get(child);
            if resolved.is_none() {
                warn!("Command '{}' lists unknown child '{child}'", item.id);
            }
            resolved
        })
    }

    pub fn find_by_shortcut(&self, key: &str) -> Option<&MenuItem> {
        self.iter()
            .find(|item| item.shortcut.as_ref().is_some_and(|s| s.key == key))
    }

    /// First child of `menu` that is active, used by select-style buttons.
    pub fn first_active_child(&self, menu: &str, state: &GlobalState) -> Option<&MenuItem> {
        let menu = self.resolve(menu)?;
        self.children(menu).find(|child| child.is_active(state))
    }
}

#[derive(Default)]
pub struct CommandRegistryBuilder {
    items: HashMap<CommandId, MenuItem>,
    order: Vec<CommandId>,
}

impl CommandRegistryBuilder {
    pub fn insert(&mut self, item: MenuItem) -> Result<&mut Self, RegistryError> {
        if self.items.contains_key(&item.id) {
            return Err(RegistryError::DuplicateCommand(item.id));
        }
        self.order.push(item.id.clone());
        self.items.insert(item.id.clone(), item);
        Ok(self)
    }

    pub fn extend<I>(&mut self, items: I) -> Result<&mut Self, RegistryError>
    where
        I: IntoIterator<Item = MenuItem>,
    {
        for item in items {
            self.insert(item)?;
        }
        Ok(self)
    }

    pub fn build(self) -> Result<CommandRegistry, RegistryError> {
        for id in &self.order {
            let item = &self.items[id];
            match item.kind {
                MenuItemKind::Action if item.action.is_none() => {
                    return Err(RegistryError::MissingAction(id.clone()));
                }
                MenuItemKind::Menu | MenuItemKind::Group => {
                    if item.children.is_empty() {
                        return Err(RegistryError::EmptyChildren(id.clone()));
                    }
                    if let Some(child) = item.children.iter().find(|c| !self.items.contains_key(*c))
                    {
                        return Err(RegistryError::DanglingChild {
                            parent: id.clone(),
                            child: child.clone(),
                        });
                    }
                }
                MenuItemKind::Action => {}
            }
        }

        let mut finished = HashSet::new();
        for id in &self.order {
            let mut path = Vec::new();
            self.check_cycles(id, &mut path, &mut finished)?;
        }

        Ok(CommandRegistry {
            items: self.items,
            order: self.order,
        })
    }

    fn check_cycles(
        &self,
        id: &str,
        path: &mut Vec<String>,
        finished: &mut HashSet<String>,
    ) -> Result<(), RegistryError> {
        if finished.contains(id) {
            return Ok(());
        }
        if let Some(start) = path.iter().position(|p| p == id) {
            let mut cycle = path[start..].to_vec();
            cycle.push(id.to_string());
            return Err(RegistryError::Cycle(cycle));
        }
        path.push(id.to_string());
        if let Some(item) = self.items.get(id) {
            for child in &item.children {
                self.check_cycles(child, path, finished)?;
            }
        }
        path.pop();
        finished.insert(id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GlobalState, HistoryFlags, StoreAction};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> impl Fn(&CapabilityRegistry, &GlobalState) + Send + Sync + 'static {
        |_, _| {}
    }

    #[test]
    fn predicates_default_when_absent() {
        let item = MenuItem::action("plain", "Plain").on_action(noop());
        let state = GlobalState::default();
        assert!(!is_active(&item, &state));
        assert!(!is_disabled(&item, &state));
        assert!(is_visible(&item, &state));
    }

    #[test]
    fn predicates_are_pure() {
        let item = MenuItem::action("undo", "Undo")
            .on_action(noop())
            .disabled_when(|s| !s.plugins.history.global.can_undo);
        let mut state = GlobalState::default();
        let _ = state.apply(StoreAction::SetHistory(HistoryFlags {
            can_undo: true,
            can_redo: false,
        }));
        let before = state.clone();

        let first = item.is_disabled(&state);
        let second = item.is_disabled(&state);
        assert_eq!(first, second);
        assert!(!first);
        assert_eq!(state, before);
    }

    #[test]
    fn dispatch_respects_disabled_and_hidden() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let item = MenuItem::action("count", "Count")
            .on_action(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .disabled_when(|s| s.plugins.fullscreen.is_fullscreen)
            .visible_when(|s| s.plugins.viewport.viewport_gap > 0);

        let registry = CapabilityRegistry::new();
        let mut state = GlobalState::default();
        assert_eq!(dispatch(&item, &registry, &state), DispatchOutcome::Dispatched);

        let _ = state.apply(StoreAction::SetFullscreen(true));
        assert_eq!(dispatch(&item, &registry, &state), DispatchOutcome::Disabled);

        let _ = state.apply(StoreAction::SetViewportGap(0));
        assert_eq!(dispatch(&item, &registry, &state), DispatchOutcome::Hidden);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn menus_without_actions_report_no_action() {
        let mut builder = CommandRegistry::builder();
        builder
            .insert(MenuItem::action("a", "A").on_action(noop()))
            .unwrap()
            .insert(MenuItem::menu("m", "Menu", &["a"]))
            .unwrap();
        let registry = builder.build().unwrap();
        let menu = registry.resolve("m").unwrap();
        assert_eq!(
            dispatch(menu, &CapabilityRegistry::new(), &GlobalState::default()),
            DispatchOutcome::NoAction
        );
        assert_eq!(registry.children(menu).count(), 1);
    }

    #[test]
    fn builder_rejects_duplicates() {
        let mut builder = CommandRegistry::builder();
        builder
            .insert(MenuItem::action("a", "A").on_action(noop()))
            .unwrap();
        let err = builder
            .insert(MenuItem::action("a", "Again").on_action(noop()))
            .err();
        assert_eq!(err, Some(RegistryError::DuplicateCommand("a".into())));
    }

    #[test]
    fn build_validates_structure() {
        let mut builder = CommandRegistry::builder();
        builder.insert(MenuItem::action("bare", "Bare")).unwrap();
        assert_eq!(
            builder.build().err(),
            Some(RegistryError::MissingAction("bare".into()))
        );

        let mut builder = CommandRegistry::builder();
        builder.insert(MenuItem::menu("m", "M", &["ghost"])).unwrap();
        assert_eq!(
            builder.build().err(),
            Some(RegistryError::DanglingChild {
                parent: "m".into(),
                child: "ghost".into()
            })
        );

        let mut builder = CommandRegistry::builder();
        builder.insert(MenuItem::group("g", "G", &[])).unwrap();
        assert_eq!(
            builder.build().err(),
            Some(RegistryError::EmptyChildren("g".into()))
        );
    }

    #[test]
    fn build_detects_cycles() {
        let mut builder = CommandRegistry::builder();
        builder
            .extend([
                MenuItem::menu("a", "A", &["b"]),
                MenuItem::menu("b", "B", &["c"]),
                MenuItem::group("c", "C", &["a"]),
            ])
            .unwrap();
        let err = builder.build().err().unwrap();
        assert_eq!(
            err,
            RegistryError::Cycle(vec!["a".into(), "b".into(), "c".into(), "a".into()])
        );
        assert_eq!(err.to_string(), "command cycle: a -> b -> c -> a");
    }

    #[test]
    fn derived_projections_follow_state() {
        let item = MenuItem::action("fs", "Fullscreen")
            .on_action(noop())
            .label_with(|s| {
                if s.plugins.fullscreen.is_fullscreen {
                    "Exit full screen".into()
                } else {
                    "Full screen".into()
                }
            })
            .icon("fullscreen");
        let mut state = GlobalState::default();
        assert_eq!(item.label(&state), "Full screen");
        let _ = state.apply(StoreAction::SetFullscreen(true));
        assert_eq!(item.label(&state), "Exit full screen");
        assert_eq!(item.icon_name(&state).as_deref(), Some("fullscreen"));
        assert!(item.resolved_icon_props(&state).is_none());
    }
}
