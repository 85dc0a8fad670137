//! The viewer's built-in command set.

use log::{error, info};

use crate::capability::{HeaderVisibility, PanelToggle};
use crate::config::ConfigHandle;
use crate::props::Props;
use crate::store::{
    GlobalState, InteractionMode, ScrollStrategy, SpreadMode, UiCategory, ZoomLevel, ZoomMode,
};

use super::annotation::{annotation_commands, left_panel_shows};
use super::{CommandRegistry, MenuItem, RegistryError};

const ZOOM_PRESETS: [(&str, &str, f32); 9] = [
    ("zoom25", "25%", 0.25),
    ("zoom50", "50%", 0.5),
    ("zoom100", "100%", 1.0),
    ("zoom125", "125%", 1.25),
    ("zoom150", "150%", 1.5),
    ("zoom200", "200%", 2.0),
    ("zoom400", "400%", 4.0),
    ("zoom800", "800%", 8.0),
    ("zoom1600", "1600%", 16.0),
];

/// True while the primary command menu shows `command`.
fn menu_shows(state: &GlobalState, command: &str) -> bool {
    state.plugins.ui.command_menu().active_command.as_deref() == Some(command)
}

fn command_menu(id: &str, label: &str, icon: Option<&str>, children: &[&str]) -> MenuItem {
    let owned = id.to_string();
    let item = MenuItem::menu(id, label, children).active_when(move |s| menu_shows(s, &owned));
    match icon {
        Some(icon) => item.icon(icon),
        None => item,
    }
}

fn zoom_preset(id: &str, label: &str, level: f32) -> MenuItem {
    MenuItem::action(id, label)
        .on_action(move |registry, _| {
            if let Some(zoom) = registry.zoom() {
                zoom.request_zoom(ZoomLevel::Scale(level));
            }
        })
        .active_when(move |s| (s.plugins.zoom.current_zoom_level - level).abs() < f32::EPSILON)
}

fn fit_mode(id: &str, label: &str, mode: ZoomMode) -> MenuItem {
    MenuItem::action(id, label)
        .icon(id)
        .on_action(move |registry, _| {
            if let Some(zoom) = registry.zoom() {
                zoom.request_zoom(ZoomLevel::Mode(mode));
            }
        })
        .active_when(move |s| s.plugins.zoom.zoom_level == ZoomLevel::Mode(mode))
}

fn scroll_layout(id: &str, label: &str, strategy: ScrollStrategy) -> MenuItem {
    MenuItem::action(id, label)
        .icon(id)
        .on_action(move |registry, _| {
            if let Some(scroll) = registry.scroll() {
                scroll.set_scroll_strategy(strategy);
            }
        })
        .active_when(move |s| s.plugins.scroll.strategy == strategy)
}

fn page_layout(id: &str, label: &str, icon: &str, mode: SpreadMode) -> MenuItem {
    MenuItem::action(id, label)
        .icon(icon)
        .on_action(move |registry, _| {
            if let Some(spread) = registry.spread() {
                spread.set_spread_mode(mode);
            }
        })
        .disabled_when(|s| s.plugins.scroll.strategy == ScrollStrategy::Horizontal)
        .active_when(move |s| s.plugins.spread.spread_mode == mode)
}

/// Opens the left panel on its main view with `child` selected.
fn left_panel_tab(id: &str, label: &str, icon: &str) -> MenuItem {
    let child = id.to_string();
    let shown = id.to_string();
    MenuItem::action(id, label)
        .icon(icon)
        .on_action(move |registry, _| {
            let Some(ui) = registry.ui() else {
                return;
            };
            ui.toggle_panel(PanelToggle {
                id: "leftPanel".into(),
                visible_child: Some("leftPanelMain".into()),
                open: Some(true),
            });
            ui.update_component_state(
                UiCategory::Custom,
                "leftPanelMain",
                Props::new().with("visibleChild", child.as_str()),
            );
        })
        .active_when(move |s| {
            s.plugins.ui.custom("leftPanelMain").str("visibleChild") == Some(shown.as_str())
        })
}

/// Shows the tools header with `child` as its visible toolbar.
fn tools_header_tab(id: &str, label: &str, child: &str) -> MenuItem {
    let target = child.to_string();
    let shown = child.to_string();
    MenuItem::action(id, label)
        .on_action(move |registry, _| {
            if let Some(ui) = registry.ui() {
                ui.set_header_visible(HeaderVisibility {
                    id: "toolsHeader".into(),
                    visible: true,
                    visible_child: Some(target.clone()),
                });
            }
        })
        .active_when(move |s| {
            let header = s.plugins.ui.header("toolsHeader");
            header.visible && header.visible_child.as_deref() == Some(shown.as_str())
        })
}

fn interaction_mode(id: &str, label: &str, icon: &str, mode: InteractionMode) -> MenuItem {
    MenuItem::action(id, label)
        .icon(icon)
        .on_action(move |registry, _| {
            let Some(manager) = registry.interaction_manager() else {
                return;
            };
            if manager.active_mode() == mode {
                manager.activate_default_mode();
            } else {
                manager.activate(mode);
            }
        })
        .active_when(move |s| s.plugins.interaction_manager.active_mode == mode)
}

fn document_commands(config: &ConfigHandle) -> Vec<MenuItem> {
    let button = config.clone();
    let callback_config = config.clone();
    let visible_config = config.clone();

    vec![
        command_menu(
            "menuCtr",
            "Menu",
            Some("menu"),
            &["download", "enterFS", "screenshot"],
        ),
        MenuItem::action("download", "Download")
            .icon("download")
            .on_action(|registry, _| {
                if let Some(export) = registry.export() {
                    export.download();
                }
            }),
        MenuItem::action("enterFS", "Enter full screen")
            .label_with(|s| {
                if s.plugins.fullscreen.is_fullscreen {
                    "Exit full screen".into()
                } else {
                    "Enter full screen".into()
                }
            })
            .icon_with(|s| {
                if s.plugins.fullscreen.is_fullscreen {
                    "fullscreenExit".into()
                } else {
                    "fullscreen".into()
                }
            })
            .on_action(|registry, _| {
                let Some(fullscreen) = registry.fullscreen() else {
                    return;
                };
                if fullscreen.is_fullscreen() {
                    fullscreen.exit_fullscreen();
                } else {
                    fullscreen.enable_fullscreen();
                }
            }),
        MenuItem::action("screenshot", "Screenshot")
            .icon("screenshot")
            .on_action(|registry, _| {
                if let Some(capture) = registry.capture() {
                    capture.toggle_marquee_capture();
                }
            })
            .active_when(|s| {
                s.plugins.interaction_manager.active_mode == InteractionMode::MarqueeCapture
            }),
        MenuItem::action("save", "Save")
            .icon("save")
            .on_action(|_, _| info!("save requested")),
        MenuItem::action("print", "Print")
            .icon("print")
            .on_action(|registry, _| {
                if let Some(ui) = registry.ui() {
                    ui.update_component_state(
                        UiCategory::Floating,
                        "printModal",
                        Props::new().with("open", true),
                    );
                }
            }),
        MenuItem::action("settings", "Settings")
            .icon("settings")
            .divider_before()
            .on_action(|_, _| info!("settings requested")),
        MenuItem::action("customButton", "Custom Action")
            .label_with(move |_| button.custom_button.label.clone())
            .icon(&config.custom_button.icon)
            .on_action(move |registry, _| {
                let callback = callback_config.custom_button.callback.clone();
                let Some(export) = registry.export() else {
                    error!("Export plugin not available");
                    callback.call(Vec::new());
                    return;
                };
                let on_failure = callback.clone();
                export.save_as_copy().wait(
                    move |bytes| callback.call(bytes),
                    move |e| {
                        error!("Failed to get edited file: {e}");
                        on_failure.call(Vec::new());
                    },
                );
            })
            .visible_when(move |_| visible_config.custom_button.enabled),
    ]
}

fn view_commands() -> Vec<MenuItem> {
    let mut items = vec![
        command_menu(
            "viewCtr",
            "View controls",
            Some("viewSettings"),
            &["pageOrientation", "scrollLayout", "pageLayout", "enterFS"],
        ),
        MenuItem::group(
            "pageOrientation",
            "Page orientation",
            &["rotateClockwise", "rotateCounterClockwise"],
        ),
        MenuItem::action("rotateClockwise", "Rotate clockwise")
            .icon("rotateClockwise")
            .on_action(|registry, _| {
                if let Some(rotate) = registry.rotate() {
                    rotate.rotate_forward();
                }
            }),
        MenuItem::action("rotateCounterClockwise", "Rotate counter clockwise")
            .icon("rotateCounterClockwise")
            .on_action(|registry, _| {
                if let Some(rotate) = registry.rotate() {
                    rotate.rotate_backward();
                }
            }),
        MenuItem::group("scrollLayout", "Scroll layout", &["vertical", "horizontal"]),
        scroll_layout("vertical", "Vertical", ScrollStrategy::Vertical),
        scroll_layout("horizontal", "Horizontal", ScrollStrategy::Horizontal),
        MenuItem::group(
            "pageLayout",
            "Page layout",
            &["singlePage", "doublePage", "coverFacingPage"],
        ),
        page_layout("singlePage", "Single page", "singlePage", SpreadMode::None),
        page_layout("doublePage", "Double page", "book", SpreadMode::Odd),
        page_layout("coverFacingPage", "Cover facing page", "book2", SpreadMode::Even),
        MenuItem::menu(
            "leftAction",
            "Left action",
            &["viewCtr", "zoom", "panMode", "pointerMode"],
        )
        .icon("dots")
        .active_when(|s| {
            ["leftAction", "zoom", "changeZoomLevel", "viewCtr"]
                .iter()
                .any(|id| menu_shows(s, id))
        }),
        command_menu(
            "zoom",
            "Zoom Controls",
            Some("zoomIn"),
            &[
                "changeZoomLevel",
                "zoomIn",
                "zoomOut",
                "fitToWidth",
                "fitToPage",
                "zoomInArea",
            ],
        ),
        MenuItem::action("zoomInArea", "Zoom in area")
            .icon("zoomInArea")
            .divider_before()
            .on_action(|registry, _| {
                if let Some(zoom) = registry.zoom() {
                    zoom.toggle_marquee_zoom();
                }
            })
            .active_when(|s| {
                s.plugins.interaction_manager.active_mode == InteractionMode::MarqueeZoom
            }),
        command_menu(
            "changeZoomLevel",
            "Zoom level",
            None,
            &ZOOM_PRESETS.map(|(id, _, _)| id),
        )
        .label_with(|s| {
            format!(
                "Zoom level ({:.0}%)",
                s.plugins.zoom.current_zoom_level * 100.0
            )
        }),
    ];

    items.extend(
        ZOOM_PRESETS
            .iter()
            .map(|(id, label, level)| zoom_preset(id, label, *level)),
    );

    items.extend([
        MenuItem::action("zoomIn", "Zoom in")
            .icon("zoomIn")
            .on_action(|registry, _| {
                if let Some(zoom) = registry.zoom() {
                    zoom.zoom_in();
                }
            }),
        MenuItem::action("zoomOut", "Zoom out")
            .icon("zoomOut")
            .on_action(|registry, _| {
                if let Some(zoom) = registry.zoom() {
                    zoom.zoom_out();
                }
            }),
        fit_mode("fitToWidth", "Fit to width", ZoomMode::FitWidth),
        fit_mode("fitToPage", "Fit to page", ZoomMode::FitPage),
        interaction_mode("panMode", "Pan", "hand", InteractionMode::Pan).divider_before(),
        interaction_mode("pointerMode", "Pointer", "pointer", InteractionMode::Pointer),
    ]);
    items
}

fn navigation_commands() -> Vec<MenuItem> {
    vec![
        MenuItem::action("search", "Search")
            .icon("search")
            .on_action(|registry, _| {
                if let Some(ui) = registry.ui() {
                    ui.toggle_panel(PanelToggle {
                        id: "rightPanel".into(),
                        visible_child: Some("search".into()),
                        open: None,
                    });
                }
            })
            .active_when(|s| {
                let panel = s.plugins.ui.panel("rightPanel");
                panel.open && panel.visible_child.as_deref() == Some("search")
            }),
        MenuItem::action("sidebar", "Sidebar")
            .icon("sidebar")
            .on_action(|registry, state| {
                if let Some(ui) = registry.ui() {
                    ui.toggle_panel(PanelToggle {
                        id: "leftPanel".into(),
                        visible_child: Some("leftPanelMain".into()),
                        open: Some(!left_panel_shows(state, "leftPanelMain")),
                    });
                }
            })
            .active_when(|s| left_panel_shows(s, "leftPanelMain")),
        MenuItem::menu("sidebarMenu", "Sidebar Menu", &["annotate", "thumbnails", "outline"]),
        left_panel_tab("thumbnails", "Thumbnails", "squares"),
        left_panel_tab("outline", "Outline", "listTree"),
        left_panel_tab("attachments", "Attachments", "paperclip"),
        MenuItem::action("view", "View")
            .on_action(|registry, _| {
                if let Some(ui) = registry.ui() {
                    ui.set_header_visible(HeaderVisibility {
                        id: "toolsHeader".into(),
                        visible: false,
                        visible_child: None,
                    });
                }
                if let Some(annotation) = registry.annotation() {
                    annotation.set_active_variant(None);
                }
            })
            .active_when(|s| !s.plugins.ui.header("toolsHeader").visible),
        tools_header_tab("annotate", "Sign", "annotationTools"),
        tools_header_tab("shapes", "Shapes", "shapeTools"),
        tools_header_tab("redaction", "Redaction", "redactionTools"),
        tools_header_tab("form", "Form", "formTools"),
        command_menu(
            "tabOverflow",
            "More",
            Some("dots"),
            &["view", "annotate", "shapes", "redaction", "form"],
        ),
        command_menu(
            "annotationToolOverflow",
            "More",
            Some("dots"),
            &[
                "highlight",
                "underline",
                "strikethrough",
                "squiggly",
                "freehand",
                "freeText",
                "photo",
            ],
        ),
        command_menu(
            "shapeToolOverflow",
            "More",
            Some("dots"),
            &["circle", "square", "polygon", "polyline", "line", "lineArrow"],
        ),
        MenuItem::action("nextPage", "Next page")
            .icon("chevronRight")
            .shortcut("ArrowRight", "Arrow Right")
            .on_action(|registry, _| {
                if let Some(scroll) = registry.scroll() {
                    scroll.scroll_to_next_page();
                }
            }),
        MenuItem::action("previousPage", "Previous page")
            .icon("chevronLeft")
            .shortcut("ArrowLeft", "Arrow Left")
            .on_action(|registry, _| {
                if let Some(scroll) = registry.scroll() {
                    scroll.scroll_to_previous_page();
                }
            }),
        MenuItem::action("copy", "Copy")
            .icon("copy")
            .shortcut("Meta+C", "Cmd+C")
            .on_action(|registry, _| {
                if let Some(selection) = registry.selection() {
                    selection.copy_to_clipboard();
                    selection.clear();
                }
            }),
        MenuItem::action("undo", "Undo")
            .icon("arrowBackUp")
            .on_action(|registry, _| {
                if let Some(history) = registry.history() {
                    history.undo();
                }
            })
            .disabled_when(|s| !s.plugins.history.global.can_undo),
        MenuItem::action("redo", "Redo")
            .icon("arrowForwardUp")
            .on_action(|registry, _| {
                if let Some(history) = registry.history() {
                    history.redo();
                }
            })
            .disabled_when(|s| !s.plugins.history.global.can_redo),
    ]
}

/// Builds the command registry for one viewer.
///
/// `config` is captured by the commands that depend on plugin configuration
/// (the custom button); everything else reads only the store snapshot.
pub fn viewer_commands(config: ConfigHandle) -> Result<CommandRegistry, RegistryError> {
    let mut builder = CommandRegistry::builder();
    builder
        .extend(document_commands(&config))?
        .extend(view_commands())?
        .extend(navigation_commands())?
        .extend(annotation_commands())?;
    builder.build()
}
