//! The viewer chrome: buttons, toolbars, panels and floating surfaces.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::command::{CommandRegistry, RegistryError};
use crate::props::Props;
use crate::store::GlobalState;

use super::{ComponentKind, ComponentRegistry, UiComponent};

/// Direction handed to header children, from the header's placement.
fn header_direction(props: &Props) -> Props {
    let horizontal = matches!(props.str("placement"), Some("top" | "bottom") | None);
    Props::new().with(
        "direction",
        if horizontal { "horizontal" } else { "vertical" },
    )
}

/// Projects a command's flags and icon colours onto a button.
fn command_flags(commands: &CommandRegistry, command_id: &str, state: &GlobalState) -> Props {
    let Some(item) = commands.resolve(command_id) else {
        return Props::new();
    };
    let mut props = Props::new()
        .with("active", item.is_active(state))
        .with("disabled", item.is_disabled(state))
        .with("visible", item.is_visible(state));
    if let Some(icon) = item.icon_name(state) {
        props.set("icon", icon);
    }
    if let Some(icon_props) = item.resolved_icon_props(state) {
        props.set("iconProps", icon_props.to_props().into_value());
    }
    props
}

fn icon_button(commands: &Arc<CommandRegistry>, id: &str, command_id: &str, label: &str) -> UiComponent {
    let commands = Arc::clone(commands);
    let command = command_id.to_string();
    UiComponent::new(id, ComponentKind::IconButton)
        .props(
            Props::new()
                .with("commandId", command_id)
                .with("active", false)
                .with("label", label),
        )
        .map_state(move |state, _| command_flags(&commands, &command, state))
}

fn tab_button(commands: &Arc<CommandRegistry>, id: &str, command_id: &str, label: &str) -> UiComponent {
    let commands = Arc::clone(commands);
    let command = command_id.to_string();
    UiComponent::new(id, ComponentKind::TabButton)
        .props(
            Props::new()
                .with("commandId", command_id)
                .with("active", false)
                .with("label", label),
        )
        .map_state(move |state, _| command_flags(&commands, &command, state))
}

/// A button whose menu is open when either command menu shows.
fn menu_button(
    commands: &Arc<CommandRegistry>,
    id: &str,
    command_id: &str,
    label: &str,
    also_active_for: &[&str],
) -> UiComponent {
    let commands = Arc::clone(commands);
    let ids: Vec<String> = std::iter::once(command_id)
        .chain(also_active_for.iter().copied())
        .map(str::to_string)
        .collect();
    UiComponent::new(id, ComponentKind::IconButton)
        .props(
            Props::new()
                .with("commandId", command_id)
                .with("active", false)
                .with("label", label),
        )
        .map_state(move |state, _| {
            let active = ids
                .iter()
                .filter_map(|id| commands.resolve(id))
                .any(|item| item.is_active(state));
            Props::new().with("active", active)
        })
}

fn grouped(id: &str, slots: &[(&str, i32, Option<&str>)]) -> UiComponent {
    slots.iter().fold(
        UiComponent::new(id, ComponentKind::GroupedItems).props(Props::new().with("gap", 10)),
        |component, (slot, priority, class)| match class {
            Some(class) => component.slot_with_class(slot, *priority, class),
            None => component.slot(slot, *priority),
        },
    )
}

const TOOL_BUTTONS: [(&str, &str, &str); 14] = [
    ("circleButton", "circle", "Circle"),
    ("freeTextButton", "freeText", "Free Text"),
    ("squareButton", "square", "Square"),
    ("polygonButton", "polygon", "Polygon"),
    ("lineButton", "line", "Line"),
    ("lineArrowButton", "lineArrow", "Line Arrow"),
    ("polylineButton", "polyline", "Polyline"),
    ("underlineButton", "underline", "Underline"),
    ("squigglyButton", "squiggly", "Squiggly"),
    ("strikethroughButton", "strikethrough", "Strikethrough"),
    ("highlightButton", "highlight", "Highlight"),
    ("freehandButton", "freehand", "Freehand"),
    ("signatureButton", "signature", "Signature"),
    ("photoButton", "photo", "Photo"),
];

const ACTION_BUTTONS: [(&str, &str, &str); 15] = [
    ("menuButton", "menuCtr", "Menu"),
    ("deleteAnnotationButton", "deleteAnnotation", "Delete"),
    ("styleButton", "styleAnnotation", "Style"),
    ("undoButton", "undo", "Undo"),
    ("redoButton", "redo", "Redo"),
    ("commitAnnotationsButton", "commitAnnotations", "Commit"),
    ("copyButton", "copy", "Copy"),
    ("panModeButton", "panMode", "Pan"),
    ("pointerModeButton", "pointerMode", "Pointer"),
    ("highlightSelectionButton", "highlightSelection", "Highlight"),
    ("underlineSelectionButton", "underlineSelection", "Underline"),
    ("strikethroughSelectionButton", "strikethroughSelection", "Strikethrough"),
    ("squigglySelectionButton", "squigglySelection", "Squiggly"),
    ("searchButton", "search", "Search"),
    ("sidebarButton", "sidebar", "Sidebar"),
];

fn buttons(commands: &Arc<CommandRegistry>) -> Vec<UiComponent> {
    let mut items: Vec<UiComponent> = TOOL_BUTTONS
        .iter()
        .chain(ACTION_BUTTONS.iter())
        .map(|(id, command, label)| icon_button(commands, id, command, label))
        .collect();

    let custom_commands = Arc::clone(commands);
    items.push(
        UiComponent::new("customButton", ComponentKind::IconButton)
            .props(
                Props::new()
                    .with("commandId", "customButton")
                    .with("active", false)
                    .with("label", "Custom Action"),
            )
            .map_state(move |state, _| {
                let mut props = command_flags(&custom_commands, "customButton", state);
                if let Some(item) = custom_commands.resolve("customButton") {
                    props.set("label", item.label(state));
                }
                props
            }),
    );
    items.extend([
        UiComponent::new("filePickerButton", ComponentKind::IconButton)
            .props(Props::new().with("label", "Open File").with("icon", "fileImport")),
        icon_button(commands, "downloadButton", "download", "Download"),
        menu_button(commands, "zoomButton", "zoom", "Zoom", &["changeZoomLevel"]),
        menu_button(commands, "expandLeftActionsButton", "leftAction", "Left Panel Actions", &[]),
        menu_button(commands, "tabOverflowButton", "tabOverflow", "More", &[]),
        menu_button(
            commands,
            "annotationToolOverflowButton",
            "annotationToolOverflow",
            "More",
            &[],
        ),
        menu_button(commands, "shapeToolOverflowButton", "shapeToolOverflow", "More", &[]),
        UiComponent::new("divider1", ComponentKind::Divider),
        tab_button(commands, "viewTab", "view", "View"),
        tab_button(commands, "annotateTab", "annotate", "Annotate"),
        tab_button(commands, "shapesTab", "shapes", "Shapes"),
        tab_button(commands, "formTab", "form", "Form"),
    ]);

    let select_commands = Arc::clone(commands);
    items.push(
        UiComponent::new("selectButton", ComponentKind::SelectButton)
            .props(
                Props::new()
                    .with("menuCommandId", "tabOverflow")
                    .with("commandIds", vec!["annotate"])
                    .with("activeCommandId", "annotate")
                    .with("active", false),
            )
            .map_state(move |state, own| {
                let ids = own.strings("commandIds");
                let active_command = ids
                    .iter()
                    .find(|id| {
                        select_commands
                            .resolve(id)
                            .is_some_and(|item| item.is_active(state))
                    })
                    .or(ids.first())
                    .cloned();
                let menu_open = select_commands
                    .resolve("tabOverflow")
                    .is_some_and(|item| item.is_active(state));
                Props::new()
                    .with("activeCommandId", active_command)
                    .with("active", menu_open)
            }),
    );
    items
}

fn toolbars() -> Vec<UiComponent> {
    vec![
        grouped(
            "headerStart",
            &[
                ("menuButton", 0, None),
                ("divider1", 1, Some("flex")),
                ("sidebarButton", 2, None),
                ("expandLeftActionsButton", 3, Some("@min-[400px]:hidden")),
                ("viewCtrButton", 4, Some("hidden @min-[400px]:block")),
                ("divider1", 6, Some("hidden @min-[400px]:flex")),
                ("zoomButton", 7, Some("hidden @min-[400px]:block @min-[600px]:hidden")),
                ("zoom", 8, Some("hidden @min-[600px]:block")),
                ("divider1", 9, Some("hidden @min-[600px]:flex")),
                ("panModeButton", 10, Some("hidden @min-[600px]:block")),
                ("pointerModeButton", 11, Some("hidden @min-[600px]:block")),
            ],
        ),
        grouped("headerCenter", &[]),
        grouped("headerEnd", &[("customButton", 0, None), ("searchButton", 1, None)]),
        grouped(
            "textSelectionMenuButtons",
            &[
                ("copyButton", 0, None),
                ("highlightSelectionButton", 1, None),
                ("underlineSelectionButton", 2, None),
                ("strikethroughSelectionButton", 3, None),
                ("squigglySelectionButton", 4, None),
            ],
        ),
        grouped(
            "annotationTools",
            &[
                ("highlightButton", 1, None),
                ("underlineButton", 2, None),
                ("strikethroughButton", 3, None),
                ("squigglyButton", 4, None),
                ("freehandButton", 5, Some("hidden @min-[500px]:block")),
                ("freeTextButton", 6, Some("hidden @min-[500px]:block")),
                ("photoButton", 7, Some("hidden @min-[500px]:block")),
                ("signatureButton", 8, Some("hidden @min-[500px]:block")),
                ("annotationToolOverflowButton", 9, Some("@min-[500px]:hidden")),
                ("divider1", 10, None),
                ("styleButton", 11, None),
                ("divider1", 12, None),
                ("undoButton", 13, None),
                ("redoButton", 14, None),
            ],
        ),
        grouped(
            "shapeTools",
            &[
                ("circleButton", 6, None),
                ("squareButton", 7, None),
                ("polygonButton", 8, None),
                ("polylineButton", 9, None),
                ("lineButton", 10, Some("hidden @min-[500px]:block")),
                ("lineArrowButton", 11, Some("hidden @min-[500px]:block")),
                ("shapeToolOverflowButton", 12, Some("@min-[500px]:hidden")),
                ("divider1", 12, None),
                ("styleButton", 13, None),
                ("divider1", 14, None),
                ("undoButton", 15, None),
                ("redoButton", 16, None),
            ],
        ),
        grouped(
            "redactionTools",
            &[
                ("redactButton", 1, None),
                ("divider1", 2, None),
                ("styleButton", 3, None),
                ("divider1", 4, None),
                ("undoButton", 5, None),
                ("redoButton", 6, None),
            ],
        ),
        grouped(
            "formTools",
            &[
                ("textButton", 1, None),
                ("checkButton", 2, None),
                ("radioButton", 3, None),
                ("dropdownButton", 4, None),
                ("divider1", 5, None),
                ("styleButton", 6, None),
                ("divider1", 7, None),
                ("undoButton", 8, None),
                ("redoButton", 9, None),
            ],
        ),
    ]
}

fn headers() -> Vec<UiComponent> {
    vec![
        UiComponent::new("topHeader", ComponentKind::Header)
            .props(
                Props::new()
                    .with("placement", "top")
                    .with("style", json!({"backgroundColor": "#ffffff", "gap": "10px"})),
            )
            .slot("headerStart", 0)
            .slot("headerCenter", 1)
            .slot("headerEnd", 2)
            .child_context_with(header_direction),
        UiComponent::new("toolsHeader", ComponentKind::Header)
            .initial_state(
                Props::new()
                    .with("visible", true)
                    .with("visibleChild", "annotationTools"),
            )
            .props_from_state(|initial| {
                Props::new()
                    .with("placement", "top")
                    .with("visible", initial.bool("visible").unwrap_or(true))
                    .with("visibleChild", initial.str("visibleChild"))
                    .with(
                        "style",
                        json!({"backgroundColor": "#f1f3f5", "justifyContent": "center"}),
                    )
            })
            .map_state(|state, _| {
                let header = state.plugins.ui.header("toolsHeader");
                Props::new()
                    .with("visible", header.visible)
                    .with("visibleChild", header.visible_child)
            })
            .slot("annotationTools", 0)
            .slot("shapeTools", 1)
            .slot("redactionTools", 2)
            .slot("formTools", 3)
            .child_context_with(header_direction),
    ]
}

fn panel(id: &str, location: &str, visible_child: Option<&str>) -> UiComponent {
    let panel_id = id.to_string();
    UiComponent::new(id, ComponentKind::Panel)
        .initial_state(
            Props::new()
                .with("open", false)
                .with("visibleChild", visible_child),
        )
        .props_from_state({
            let location = location.to_string();
            move |initial| {
                Props::new()
                    .with("open", initial.bool("open").unwrap_or(false))
                    .with("visibleChild", initial.str("visibleChild"))
                    .with("location", location.as_str())
            }
        })
        .map_state(move |state, _| {
            let panel = state.plugins.ui.panel(&panel_id);
            Props::new()
                .with("open", panel.open)
                .with("visibleChild", panel.visible_child)
        })
}

fn document_value(state: &GlobalState) -> Value {
    state
        .core
        .document
        .as_ref()
        .and_then(|doc| serde_json::to_value(doc).ok())
        .unwrap_or(Value::Null)
}

fn panels(commands: &Arc<CommandRegistry>) -> Vec<UiComponent> {
    let zoom_commands = Arc::clone(commands);
    vec![
        panel("leftPanel", "left", Some("leftPanelMain"))
            .slot("leftPanelMain", 0)
            .slot("leftPanelAnnotationStyle", 1),
        panel("rightPanel", "right", None).slot("search", 0),
        UiComponent::new("leftPanelMain", ComponentKind::Custom)
            .render("leftPanelMain")
            .initial_state(Props::new().with("visibleChild", "annotate"))
            .props_from_state(|initial| {
                Props::new()
                    .with("visibleChild", initial.str("visibleChild"))
                    .with("tabsCommandId", "sidebarMenu")
            })
            .map_state(|state, own| {
                let custom = state.plugins.ui.custom("leftPanelMain");
                let child = custom
                    .str("visibleChild")
                    .or(own.str("visibleChild"))
                    .map(str::to_string);
                Props::new().with("visibleChild", child)
            })
            .slot("thumbnails", 0)
            .slot("outline", 1)
            .slot("attachments", 2),
        UiComponent::new("leftPanelAnnotationStyle", ComponentKind::Custom)
            .render("leftPanelAnnotationStyle")
            .map_state(|state, _| {
                let annotation = &state.plugins.annotation;
                let selected = annotation
                    .selected_annotation()
                    .and_then(|a| serde_json::to_value(a).ok())
                    .unwrap_or(Value::Null);
                let tool_defaults: serde_json::Map<String, Value> = annotation
                    .tool_defaults
                    .iter()
                    .map(|(subtype, defaults)| {
                        (
                            subtype.name().to_string(),
                            json!({
                                "color": defaults.color,
                                "strokeColor": defaults.stroke_color,
                                "fontColor": defaults.font_color,
                                "opacity": defaults.opacity,
                            }),
                        )
                    })
                    .collect();
                Props::new()
                    .with("selectedAnnotation", selected)
                    .with(
                        "activeVariant",
                        annotation.active_variant.as_ref().map(|k| k.to_string()),
                    )
                    .with("colorPresets", annotation.color_presets.clone())
                    .with("toolDefaults", tool_defaults)
            }),
        UiComponent::new("thumbnails", ComponentKind::Custom)
            .render("thumbnails")
            .map_state(|state, _| {
                Props::new()
                    .with("currentPage", state.plugins.scroll.current_page)
                    .with(
                        "pageCount",
                        state.core.document.as_ref().map_or(0, |d| d.page_count),
                    )
            }),
        UiComponent::new("outline", ComponentKind::Custom)
            .render("outline")
            .props(Props::new().with("document", Value::Null))
            .map_state(|state, _| Props::new().with("document", document_value(state))),
        UiComponent::new("attachments", ComponentKind::Custom)
            .render("attachments")
            .props(Props::new().with("document", Value::Null))
            .map_state(|state, _| Props::new().with("document", document_value(state))),
        UiComponent::new("search", ComponentKind::Custom)
            .render("search")
            .map_state(|state, _| {
                let search = &state.plugins.search;
                let results: Vec<Value> = search
                    .results
                    .iter()
                    .map(|hit| json!({"pageIndex": hit.page_index, "excerpt": hit.excerpt}))
                    .collect();
                Props::new()
                    .with("query", search.query.as_str())
                    .with("total", search.results.len())
                    .with("results", results)
                    .with("activeResultIndex", search.active_result_index)
                    .with("active", !search.query.is_empty())
                    .with("loading", search.loading)
            }),
        UiComponent::new("zoom", ComponentKind::Custom)
            .render("zoom")
            .initial_state(Props::new().with("zoomLevel", 1))
            .props_from_state(|initial| {
                Props::new()
                    .with("zoomLevel", initial.f64("zoomLevel").unwrap_or(1.0))
                    .with("commandZoomIn", "zoomIn")
                    .with("commandZoomOut", "zoomOut")
                    .with("commandZoomMenu", "zoom")
                    .with("zoomMenuActive", false)
            })
            .map_state(move |state, _| {
                let menu_active = ["zoom", "changeZoomLevel"]
                    .iter()
                    .filter_map(|id| zoom_commands.resolve(id))
                    .any(|item| item.is_active(state));
                Props::new()
                    .with("zoomLevel", state.plugins.zoom.current_zoom_level)
                    .with("zoomMenuActive", menu_active)
            }),
    ]
}

fn floating() -> Vec<UiComponent> {
    vec![
        UiComponent::new("pageControls", ComponentKind::Custom)
            .render("pageControls")
            .initial_state(Props::new().with("currentPage", 1).with("pageCount", 1))
            .props_from_state(|initial| {
                Props::new()
                    .with("currentPage", initial.u64("currentPage").unwrap_or(1))
                    .with("pageCount", initial.u64("pageCount").unwrap_or(1))
                    .with("nextPageCommandId", "nextPage")
                    .with("previousPageCommandId", "previousPage")
            })
            .map_state(|state, _| {
                Props::new()
                    .with("currentPage", state.plugins.scroll.current_page)
                    .with(
                        "pageCount",
                        state.core.document.as_ref().map_or(1, |d| d.page_count),
                    )
            }),
        UiComponent::new("pageControlsContainer", ComponentKind::Floating)
            .render("pageControlsContainer")
            .props(Props::new().with("scrollerPosition", "outside"))
            .slot("pageControls", 0),
        UiComponent::new("printModal", ComponentKind::Floating)
            .render("printModal")
            .initial_state(Props::new().with("open", false))
            .props_from_state(|initial| {
                Props::new()
                    .with("open", initial.bool("open").unwrap_or(false))
                    .with("scrollerPosition", "outside")
            })
            .map_state(|state, _| {
                let open = state.plugins.ui.floating("printModal").bool("open");
                Props::new().with("open", open.unwrap_or(false))
            }),
        UiComponent::new("textSelectionMenu", ComponentKind::Floating)
            .render("textSelectionMenu")
            .props(
                Props::new()
                    .with("open", false)
                    .with("scrollerPosition", "inside"),
            )
            .map_state(|state, _| {
                let selection = &state.plugins.selection;
                Props::new()
                    .with("isScrolling", state.plugins.viewport.is_scrolling)
                    .with("scale", state.core.scale)
                    .with("rotation", state.core.rotation.degrees())
                    .with("spread", state.plugins.spread.spread_mode.as_str())
                    .with("open", !selection.is_empty() && !selection.selecting)
            })
            .slot("textSelectionMenuButtons", 0)
            .child_context(Props::new().with("direction", "horizontal")),
        UiComponent::new("commandMenu", ComponentKind::CommandMenu)
            .initial_state(
                Props::new()
                    .with("open", false)
                    .with("activeCommand", Value::Null)
                    .with("flatten", false),
            )
            .props_from_state(|initial| initial.clone())
            .map_state(|state, _| {
                let menu = state.plugins.ui.command_menu();
                Props::new()
                    .with("open", menu.open)
                    .with("activeCommand", menu.active_command)
                    .with("triggerElement", menu.trigger)
                    .with("flatten", menu.flatten)
            }),
    ]
}

/// Builds the component registry, projecting command state through `commands`.
pub fn viewer_components(
    commands: Arc<CommandRegistry>,
) -> Result<ComponentRegistry, RegistryError> {
    let mut builder = ComponentRegistry::builder();
    builder
        .extend(buttons(&commands))?
        .extend(toolbars())?
        .extend(headers())?
        .extend(panels(&commands))?
        .extend(floating())?;
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::viewer_commands;
    use crate::config::ConfigHandle;
    use crate::store::{HeaderState, StoreAction};

    fn registries() -> (Arc<CommandRegistry>, ComponentRegistry) {
        let commands = Arc::new(viewer_commands(ConfigHandle::default()).unwrap());
        let components = viewer_components(Arc::clone(&commands)).unwrap();
        (commands, components)
    }

    #[test]
    fn every_button_points_at_a_known_command() {
        let (commands, components) = registries();
        for component in components.iter() {
            let props = component.build_props(&GlobalState::default(), &Props::new(), None);
            if let Some(command) = props.str("commandId") {
                assert!(
                    commands.resolve(command).is_some(),
                    "{} -> {command}",
                    component.id
                );
            }
        }
    }

    #[test]
    fn catalog_keeps_known_dangling_slots() {
        let (_, components) = registries();
        let dangling = components.validate();
        for (parent, child) in [
            ("headerStart", "viewCtrButton"),
            ("redactionTools", "redactButton"),
            ("formTools", "textButton"),
        ] {
            assert!(
                dangling.contains(&(parent.to_string(), child.to_string())),
                "{parent} -> {child}"
            );
        }
        assert!(components.get("topHeader").is_some());
        assert!(components.get("commandMenu").is_some());
    }

    #[test]
    fn tools_header_follows_ui_state() {
        let (_, components) = registries();
        let header = components.get("toolsHeader").unwrap();
        let mut state = GlobalState::default();
        let _ = state.apply(StoreAction::SetHeader {
            id: "toolsHeader".into(),
            state: HeaderState {
                visible: true,
                visible_child: Some("shapeTools".into()),
            },
        });
        let props = header.build_props(&state, &Props::new(), None);
        assert_eq!(props.str("visibleChild"), Some("shapeTools"));
        assert_eq!(props.str("placement"), Some("top"));
        let ctx = header.child_context_for(&props).unwrap();
        assert_eq!(ctx.str("direction"), Some("horizontal"));
    }

    #[test]
    fn undo_button_is_disabled_without_history() {
        let (_, components) = registries();
        let undo = components.get("undoButton").unwrap();
        let props = undo.build_props(&GlobalState::default(), &Props::new(), None);
        assert_eq!(props.bool("disabled"), Some(true));
        assert_eq!(props.str("label"), Some("Undo"));
    }

    #[test]
    fn highlight_button_carries_tool_colour() {
        let (_, components) = registries();
        let highlight = components.get("highlightButton").unwrap();
        let props = highlight.build_props(&GlobalState::default(), &Props::new(), None);
        let icon = props.get("iconProps").cloned().unwrap_or(Value::Null);
        assert_eq!(icon["primaryColor"], json!("#FFCD45"));
        assert_eq!(props.bool("active"), Some(false));
    }

    #[test]
    fn page_controls_track_scroll() {
        let (_, components) = registries();
        let controls = components.get("pageControls").unwrap();
        let mut state = GlobalState::default();
        let _ = state.apply(StoreAction::SetDocument(Some(crate::store::DocumentInfo {
            id: "doc".into(),
            name: "doc.pdf".into(),
            page_count: 12,
            size_bytes: 1024,
        })));
        let _ = state.apply(StoreAction::SetCurrentPage(5));
        let props = controls.build_props(&state, &Props::new(), None);
        assert_eq!(props.u64("currentPage"), Some(5));
        assert_eq!(props.u64("pageCount"), Some(12));
        assert_eq!(props.str("nextPageCommandId"), Some("nextPage"));
    }
}
