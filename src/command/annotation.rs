//! Annotation tool toggles and selection-to-markup commands.

use chrono::Utc;
use log::debug;
use uuid::Uuid;

use crate::capability::{CapabilityRegistry, PanelToggle};
use crate::store::{AnnotationObject, AnnotationRef, BlendMode, GlobalState};
use crate::task::ignore;
use crate::variant::{AnnotationSubtype, VariantKey, variant_key};

use super::{IconProps, MenuItem};

/// Which tool-default colours feed the icon.
#[derive(Debug, Clone, Copy)]
enum IconTint {
    None,
    Fill,
    Stroke,
    StrokeAndFill,
    Font,
}

fn tint(state: &GlobalState, subtype: AnnotationSubtype, mode: IconTint) -> IconProps {
    let defaults = state.plugins.annotation.tool_defaults(subtype);
    match mode {
        IconTint::None => IconProps::default(),
        IconTint::Fill => IconProps {
            primary_color: defaults.color,
            secondary_color: None,
        },
        IconTint::Stroke => IconProps {
            primary_color: defaults.stroke_color,
            secondary_color: None,
        },
        IconTint::StrokeAndFill => IconProps {
            primary_color: defaults.stroke_color,
            secondary_color: defaults.color,
        },
        IconTint::Font => IconProps {
            primary_color: defaults.font_color,
            secondary_color: None,
        },
    }
}

/// A command that arms the tool `key`, or disarms it when already armed.
fn tool_toggle(
    id: &str,
    label: &str,
    icon: &str,
    key: VariantKey,
    icon_tint: IconTint,
    deselect_first: bool,
) -> MenuItem {
    let subtype = key.subtype();
    let action_key = key.clone();
    let mut item = MenuItem::action(id, label)
        .icon(icon)
        .on_action(move |registry, state| {
            let Some(annotation) = registry.annotation() else {
                return;
            };
            if state.plugins.annotation.active_variant.as_ref() == Some(&action_key) {
                annotation.set_active_variant(None);
            } else {
                if deselect_first {
                    annotation.deselect_annotation();
                }
                annotation.set_active_variant(Some(action_key.clone()));
            }
        })
        .active_when(move |state| state.plugins.annotation.active_variant.as_ref() == Some(&key));
    if !matches!(icon_tint, IconTint::None) {
        item = item.icon_props_with(move |state| tint(state, subtype, icon_tint));
    }
    item
}

/// Turns every formatted selection run into a markup annotation of `subtype`.
fn selection_markup(id: &str, label: &str, icon: &str, subtype: AnnotationSubtype) -> MenuItem {
    MenuItem::action(id, label)
        .icon(icon)
        .icon_props_with(move |state| tint(state, subtype, IconTint::Fill))
        .on_action(move |registry, _state| apply_markup_to_selection(registry, subtype))
}

fn apply_markup_to_selection(registry: &CapabilityRegistry, subtype: AnnotationSubtype) {
    let (Some(selection), Some(annotation)) = (registry.selection(), registry.annotation()) else {
        return;
    };

    let defaults = annotation.tool_defaults(subtype);
    let blend_mode = if subtype == AnnotationSubtype::Highlight {
        BlendMode::Multiply
    } else {
        BlendMode::Normal
    };
    let ranges = selection.formatted_selection();
    debug!("Creating {} {subtype} annotation(s) from selection", ranges.len());
    let text = selection.selected_text();

    for range in ranges {
        let annotation = annotation.clone();
        let color = defaults.color.clone();
        let opacity = defaults.opacity;
        text.wait(
            move |lines| {
                let id = Uuid::new_v4().to_string();
                let page_index = range.page_index;
                annotation.create_annotation(AnnotationObject {
                    id: id.clone(),
                    subtype,
                    page_index,
                    rect: range.rect,
                    segment_rects: range.segment_rects,
                    blend_mode,
                    color,
                    opacity,
                    created: Utc::now(),
                    text: Some(lines.join("\n")),
                });
                annotation.select_annotation(page_index, &id);
            },
            ignore,
        );
    }
    selection.clear();
}

struct ToolSpec {
    id: &'static str,
    label: &'static str,
    icon: &'static str,
    subtype: AnnotationSubtype,
    variant: Option<&'static str>,
    tint: IconTint,
}

const fn tool(
    id: &'static str,
    label: &'static str,
    icon: &'static str,
    subtype: AnnotationSubtype,
    tint: IconTint,
) -> ToolSpec {
    ToolSpec {
        id,
        label,
        icon,
        subtype,
        variant: None,
        tint,
    }
}

const TOOLS: [ToolSpec; 14] = [
    tool("highlight", "Highlight", "highlight", AnnotationSubtype::Highlight, IconTint::Fill),
    tool("underline", "Underline", "underline", AnnotationSubtype::Underline, IconTint::Fill),
    tool("strikethrough", "Strikethrough", "strikethrough", AnnotationSubtype::Strikeout, IconTint::Fill),
    tool("squiggly", "Squiggly", "squiggly", AnnotationSubtype::Squiggly, IconTint::Fill),
    tool("freehand", "Freehand", "pencilMarker", AnnotationSubtype::Ink, IconTint::Fill),
    tool("circle", "Circle", "circle", AnnotationSubtype::Circle, IconTint::StrokeAndFill),
    tool("square", "Square", "square", AnnotationSubtype::Square, IconTint::StrokeAndFill),
    tool("line", "Line", "line", AnnotationSubtype::Line, IconTint::Stroke),
    ToolSpec {
        variant: Some("LineArrow"),
        ..tool("lineArrow", "Line Arrow", "lineArrow", AnnotationSubtype::Line, IconTint::Stroke)
    },
    tool("polyline", "Polyline", "zigzag", AnnotationSubtype::Polyline, IconTint::Stroke),
    tool("polygon", "Polygon", "polygon", AnnotationSubtype::Polygon, IconTint::StrokeAndFill),
    tool("freeText", "Free Text", "text", AnnotationSubtype::FreeText, IconTint::Font),
    tool("photo", "Stamp", "photo", AnnotationSubtype::Stamp, IconTint::None),
    ToolSpec {
        variant: Some("signature"),
        ..tool("signature", "Signature", "signature", AnnotationSubtype::Stamp, IconTint::None)
    },
];

const SELECTION_MARKUP: [(&str, &str, &str, AnnotationSubtype); 4] = [
    ("highlightSelection", "Highlight Selection", "highlight", AnnotationSubtype::Highlight),
    ("underlineSelection", "Underline Selection", "underline", AnnotationSubtype::Underline),
    ("strikethroughSelection", "Strikethrough Selection", "strikethrough", AnnotationSubtype::Strikeout),
    ("squigglySelection", "Squiggly Selection", "squiggly", AnnotationSubtype::Squiggly),
];

pub(super) fn annotation_commands() -> Vec<MenuItem> {
    let mut items: Vec<MenuItem> = TOOLS
        .iter()
        .map(|t| {
            let key = variant_key(t.subtype, t.variant);
            // Arming ink drops the current selection first.
            let deselect_first = t.subtype == AnnotationSubtype::Ink;
            tool_toggle(t.id, t.label, t.icon, key, t.tint, deselect_first)
        })
        .collect();
    items.extend(
        SELECTION_MARKUP
            .iter()
            .map(|(id, label, icon, subtype)| selection_markup(id, label, icon, *subtype)),
    );
    items.extend([
        MenuItem::action("styleAnnotation", "Style")
            .icon("palette")
            .on_action(|registry, state| {
                let Some(ui) = registry.ui() else {
                    return;
                };
                let open = !left_panel_shows(state, "leftPanelAnnotationStyle");
                ui.toggle_panel(PanelToggle {
                    id: "leftPanel".into(),
                    visible_child: Some("leftPanelAnnotationStyle".into()),
                    open: Some(open),
                });
            })
            .active_when(|state| left_panel_shows(state, "leftPanelAnnotationStyle")),
        MenuItem::action("deleteAnnotation", "Delete")
            .icon("trash")
            .on_action(|registry, _state| {
                let Some(annotation) = registry.annotation() else {
                    return;
                };
                let Some(selected) = annotation.selected_annotation() else {
                    return;
                };
                annotation.delete_annotation(&AnnotationRef {
                    page_index: selected.page_index,
                    id: selected.id,
                });
            }),
        MenuItem::action("commitAnnotations", "Commit")
            .icon("deviceFloppy")
            .on_action(|registry, _state| {
                if let Some(annotation) = registry.annotation() {
                    annotation.commit();
                }
            }),
    ]);
    items
}

/// True when the left panel is open on `child`.
pub(super) fn left_panel_shows(state: &GlobalState, child: &str) -> bool {
    let panel = state.plugins.ui.panel("leftPanel");
    panel.open && panel.visible_child.as_deref() == Some(child)
}
