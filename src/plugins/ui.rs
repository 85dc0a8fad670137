use std::sync::Arc;

use log::debug;

use crate::capability::{HeaderVisibility, PanelToggle, UiCapability};
use crate::component::{ComponentKind, ComponentRegistry};
use crate::props::Props;
use crate::store::{
    CommandMenuState, HeaderState, PanelState, Store, StoreAction, UiCategory, UiState,
};

/// Initial ui slice, seeded from each component's `initial_state`.
pub fn seed_ui_state(components: &ComponentRegistry) -> UiState {
    let mut ui = UiState::default();
    for component in components.iter() {
        let Some(initial) = &component.initial_state else {
            continue;
        };
        let id = component.id.clone();
        match component.kind {
            ComponentKind::Panel => {
                ui.panels.insert(id, PanelState::from_props(initial));
            }
            ComponentKind::Header => {
                ui.headers.insert(id, HeaderState::from_props(initial));
            }
            ComponentKind::Floating => {
                ui.floating.insert(id, initial.clone());
            }
            ComponentKind::CommandMenu => {
                ui.command_menu.insert(
                    id,
                    CommandMenuState {
                        open: initial.bool("open").unwrap_or(false),
                        active_command: initial.str("activeCommand").map(str::to_string),
                        trigger: None,
                        flatten: initial.bool("flatten").unwrap_or(false),
                    },
                );
            }
            _ => {
                ui.custom.insert(id, initial.clone());
            }
        }
    }
    ui
}

/// Panels, headers, floating surfaces and the command menu.
pub struct UiPlugin {
    store: Arc<Store>,
}

impl UiPlugin {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn seed(&self, components: &ComponentRegistry) {
        self.store
            .dispatch(StoreAction::SeedUi(seed_ui_state(components)));
    }
}

impl UiCapability for UiPlugin {
    /// With `open` unset, a panel already showing the requested child closes;
    /// otherwise it opens on that child.
    fn toggle_panel(&self, request: PanelToggle) {
        let current = self.store.snapshot().plugins.ui.panel(&request.id);
        let same_child = request.visible_child.is_none()
            || request.visible_child == current.visible_child;
        let open = request.open.unwrap_or(!(current.open && same_child));
        let visible_child = request.visible_child.or(current.visible_child);
        debug!("Panel {} -> open={open} child={visible_child:?}", request.id);
        self.store.dispatch(StoreAction::SetPanel {
            id: request.id,
            state: PanelState {
                open,
                visible_child,
            },
        });
    }

    fn set_header_visible(&self, request: HeaderVisibility) {
        let current = self.store.snapshot().plugins.ui.header(&request.id);
        self.store.dispatch(StoreAction::SetHeader {
            id: request.id,
            state: HeaderState {
                visible: request.visible,
                visible_child: request.visible_child.or(current.visible_child),
            },
        });
    }

    fn update_component_state(&self, category: UiCategory, id: &str, patch: Props) {
        self.store.dispatch(StoreAction::PatchComponentState {
            category,
            id: id.to_string(),
            patch,
        });
    }

    fn open_command_menu(&self, menu: &str, command: &str, trigger: Option<&str>) {
        self.store.dispatch(StoreAction::OpenCommandMenu {
            menu: menu.to_string(),
            command: command.to_string(),
            trigger: trigger.map(str::to_string),
        });
    }

    fn close_command_menu(&self, menu: &str) {
        self.store.dispatch(StoreAction::CloseCommandMenu {
            menu: menu.to_string(),
        });
    }
}
