//! The partitioned state tree shared by every plugin.
//!
//! `GlobalState` is `core` plus one typed slice per plugin. Nothing outside
//! the reducer gets a mutable reference to it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::props::Props;
use crate::variant::{AnnotationSubtype, VariantKey};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalState {
    pub core: CoreState,
    pub plugins: PluginStates,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoreState {
    pub document: Option<DocumentInfo>,
    pub scale: f32,
    pub rotation: Rotation,
}

impl Default for CoreState {
    fn default() -> Self {
        Self {
            document: None,
            scale: 1.0,
            rotation: Rotation::Degree0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: String,
    pub name: String,
    pub page_count: usize,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginStates {
    pub viewport: ViewportState,
    pub scroll: ScrollState,
    pub zoom: ZoomState,
    pub spread: SpreadState,
    pub search: SearchState,
    pub selection: SelectionState,
    pub annotation: AnnotationState,
    pub fullscreen: FullscreenState,
    pub interaction_manager: InteractionManagerState,
    pub history: HistoryState,
    pub ui: UiState,
}

/// Page rotation in quarter turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    Degree0,
    Degree90,
    Degree180,
    Degree270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Degree0 => 0,
            Rotation::Degree90 => 90,
            Rotation::Degree180 => 180,
            Rotation::Degree270 => 270,
        }
    }

    pub fn clockwise(self) -> Self {
        match self {
            Rotation::Degree0 => Rotation::Degree90,
            Rotation::Degree90 => Rotation::Degree180,
            Rotation::Degree180 => Rotation::Degree270,
            Rotation::Degree270 => Rotation::Degree0,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        match self {
            Rotation::Degree0 => Rotation::Degree270,
            Rotation::Degree90 => Rotation::Degree0,
            Rotation::Degree180 => Rotation::Degree90,
            Rotation::Degree270 => Rotation::Degree180,
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Degree0),
            90 => Ok(Rotation::Degree90),
            180 => Ok(Rotation::Degree180),
            270 => Ok(Rotation::Degree270),
            other => Err(format!("rotation must be 0, 90, 180 or 270, got {other}")),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollStrategy {
    #[default]
    Vertical,
    Horizontal,
}

impl ScrollStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollStrategy::Vertical => "Vertical",
            ScrollStrategy::Horizontal => "Horizontal",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadMode {
    /// One page per row.
    #[default]
    None,
    /// Pairs starting at the first page.
    Odd,
    /// Cover page alone, then pairs.
    Even,
}

impl SpreadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpreadMode::None => "Single",
            SpreadMode::Odd => "Double",
            SpreadMode::Even => "Cover",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomMode {
    Automatic,
    FitPage,
    FitWidth,
}

/// Requested zoom: a fit mode or an explicit scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoomLevel {
    Mode(ZoomMode),
    Scale(f32),
}

impl Default for ZoomLevel {
    fn default() -> Self {
        ZoomLevel::Mode(ZoomMode::FitPage)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMode {
    #[default]
    Pointer,
    Pan,
    MarqueeZoom,
    MarqueeCapture,
}

impl InteractionMode {
    pub fn id(&self) -> &'static str {
        match self {
            InteractionMode::Pointer => "pointerMode",
            InteractionMode::Pan => "panMode",
            InteractionMode::MarqueeZoom => "marqueeZoom",
            InteractionMode::MarqueeCapture => "marqueeCapture",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Page-space rectangle in PDF points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    pub origin: Point,
    pub size: Size,
}

impl PageRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point { x, y },
            size: Size { width, height },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    pub viewport_gap: u32,
    pub is_scrolling: bool,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            viewport_gap: 10,
            is_scrolling: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollState {
    pub strategy: ScrollStrategy,
    /// 1-based, 0 only while no document is loaded.
    pub current_page: usize,
    pub total_pages: usize,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            strategy: ScrollStrategy::Vertical,
            current_page: 1,
            total_pages: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoomState {
    pub zoom_level: ZoomLevel,
    pub current_zoom_level: f32,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            zoom_level: ZoomLevel::default(),
            current_zoom_level: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpreadState {
    pub spread_mode: SpreadMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub page_index: usize,
    pub excerpt: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub active_result_index: Option<usize>,
    pub loading: bool,
}

/// One selected text run, grouped per page.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedSelection {
    pub page_index: usize,
    pub rect: PageRect,
    pub segment_rects: Vec<PageRect>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub ranges: Vec<FormattedSelection>,
    /// Selected text, one entry per line.
    pub text: Vec<String>,
    pub selecting: bool,
}

impl SelectionState {
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Per-tool appearance defaults. Only the fields a subtype uses are set.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefaults {
    pub color: Option<String>,
    pub stroke_color: Option<String>,
    pub font_color: Option<String>,
    pub opacity: f32,
}

impl ToolDefaults {
    fn fill(color: &str) -> Self {
        Self {
            color: Some(color.to_string()),
            stroke_color: None,
            font_color: None,
            opacity: 1.0,
        }
    }

    fn stroke(color: &str) -> Self {
        Self {
            color: None,
            stroke_color: Some(color.to_string()),
            font_color: None,
            opacity: 1.0,
        }
    }

    fn shape(fill: &str, stroke: &str) -> Self {
        Self {
            color: Some(fill.to_string()),
            stroke_color: Some(stroke.to_string()),
            font_color: None,
            opacity: 1.0,
        }
    }

    fn text(color: &str) -> Self {
        Self {
            color: None,
            stroke_color: None,
            font_color: Some(color.to_string()),
            opacity: 1.0,
        }
    }

    /// Colour used when the subtype is drawn as a swatch.
    pub fn swatch(&self) -> Option<&str> {
        self.font_color
            .as_deref()
            .or(self.stroke_color.as_deref())
            .or(self.color.as_deref())
            .filter(|c| *c != "transparent")
    }
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self::fill("#E44234")
    }
}

fn default_tool_defaults() -> BTreeMap<AnnotationSubtype, ToolDefaults> {
    use AnnotationSubtype::*;
    BTreeMap::from([
        (Highlight, ToolDefaults::fill("#FFCD45")),
        (Underline, ToolDefaults::fill("#E44234")),
        (Strikeout, ToolDefaults::fill("#E44234")),
        (Squiggly, ToolDefaults::fill("#E44234")),
        (Ink, ToolDefaults::fill("#E44234")),
        (Circle, ToolDefaults::shape("transparent", "#E44234")),
        (Square, ToolDefaults::shape("transparent", "#E44234")),
        (Polygon, ToolDefaults::shape("transparent", "#E44234")),
        (Line, ToolDefaults::stroke("#E44234")),
        (Polyline, ToolDefaults::stroke("#E44234")),
        (FreeText, ToolDefaults::text("#000000")),
        (Stamp, ToolDefaults::fill("#000000")),
    ])
}

pub const COLOR_PRESETS: [&str; 9] = [
    "#E44234", "#FF8D00", "#FFCD45", "#5CC96E", "#25D2D1", "#597CE2", "#C544CE", "#7D2E25",
    "#000000",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationObject {
    pub id: String,
    pub subtype: AnnotationSubtype,
    pub page_index: usize,
    pub rect: PageRect,
    pub segment_rects: Vec<PageRect>,
    pub blend_mode: BlendMode,
    pub color: Option<String>,
    pub opacity: f32,
    pub created: DateTime<Utc>,
    /// Text covered by a markup annotation.
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRef {
    pub page_index: usize,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationState {
    pub active_variant: Option<VariantKey>,
    pub selected: Option<AnnotationRef>,
    pub pages: BTreeMap<usize, Vec<AnnotationObject>>,
    pub tool_defaults: BTreeMap<AnnotationSubtype, ToolDefaults>,
    pub color_presets: Vec<String>,
    pub has_pending_changes: bool,
}

impl Default for AnnotationState {
    fn default() -> Self {
        Self {
            active_variant: None,
            selected: None,
            pages: BTreeMap::new(),
            tool_defaults: default_tool_defaults(),
            color_presets: COLOR_PRESETS.iter().map(|c| c.to_string()).collect(),
            has_pending_changes: false,
        }
    }
}

impl AnnotationState {
    pub fn find(&self, target: &AnnotationRef) -> Option<&AnnotationObject> {
        self.pages
            .get(&target.page_index)?
            .iter()
            .find(|a| a.id == target.id)
    }

    pub fn selected_annotation(&self) -> Option<&AnnotationObject> {
        self.selected.as_ref().and_then(|s| self.find(s))
    }

    pub fn count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn tool_defaults(&self, subtype: AnnotationSubtype) -> ToolDefaults {
        self.tool_defaults.get(&subtype).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FullscreenState {
    pub is_fullscreen: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionManagerState {
    pub active_mode: InteractionMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryFlags {
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryState {
    pub global: HistoryFlags,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelState {
    pub open: bool,
    pub visible_child: Option<String>,
}

impl PanelState {
    pub fn from_props(props: &Props) -> Self {
        Self {
            open: props.bool("open").unwrap_or(false),
            visible_child: props.str("visibleChild").map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderState {
    pub visible: bool,
    pub visible_child: Option<String>,
}

impl Default for HeaderState {
    fn default() -> Self {
        Self {
            visible: true,
            visible_child: None,
        }
    }
}

impl HeaderState {
    pub fn from_props(props: &Props) -> Self {
        Self {
            visible: props.bool("visible").unwrap_or(true),
            visible_child: props.str("visibleChild").map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandMenuState {
    pub open: bool,
    pub active_command: Option<String>,
    /// Component that opened the menu, used to anchor the popup.
    pub trigger: Option<String>,
    pub flatten: bool,
}

/// Which bucket of the ui slice a component's state lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiCategory {
    Panel,
    Header,
    Floating,
    Custom,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub command_menu: BTreeMap<String, CommandMenuState>,
    pub panels: BTreeMap<String, PanelState>,
    pub headers: BTreeMap<String, HeaderState>,
    pub floating: BTreeMap<String, Props>,
    pub custom: BTreeMap<String, Props>,
}

impl UiState {
    /// State of the primary command menu, closed when none was seeded.
    pub fn command_menu(&self) -> CommandMenuState {
        self.command_menu
            .get("commandMenu")
            .cloned()
            .unwrap_or_default()
    }

    pub fn panel(&self, id: &str) -> PanelState {
        self.panels.get(id).cloned().unwrap_or_default()
    }

    pub fn header(&self, id: &str) -> HeaderState {
        self.headers.get(id).cloned().unwrap_or_default()
    }

    pub fn floating(&self, id: &str) -> Props {
        self.floating.get(id).cloned().unwrap_or_default()
    }

    pub fn custom(&self, id: &str) -> Props {
        self.custom.get(id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps_both_ways() {
        let mut r = Rotation::Degree0;
        for _ in 0..4 {
            r = r.clockwise();
        }
        assert_eq!(r, Rotation::Degree0);
        assert_eq!(Rotation::Degree0.counter_clockwise(), Rotation::Degree270);
        assert_eq!(Rotation::try_from(45u16), Err("rotation must be 0, 90, 180 or 270, got 45".into()));
    }

    #[test]
    fn zoom_level_accepts_modes_and_scales() {
        let mode: ZoomLevel = serde_yaml::from_str("fit_width").unwrap();
        assert_eq!(mode, ZoomLevel::Mode(ZoomMode::FitWidth));
        let scale: ZoomLevel = serde_yaml::from_str("1.5").unwrap();
        assert_eq!(scale, ZoomLevel::Scale(1.5));
    }

    #[test]
    fn missing_ui_entries_read_as_defaults() {
        let ui = UiState::default();
        assert!(!ui.panel("leftPanel").open);
        assert!(ui.header("toolsHeader").visible);
        assert!(!ui.command_menu().open);
        assert!(ui.custom("leftPanelMain").is_empty());
    }

    #[test]
    fn transparent_fill_has_no_swatch_but_stroke_does() {
        let state = AnnotationState::default();
        let circle = state.tool_defaults(AnnotationSubtype::Circle);
        assert_eq!(circle.swatch(), Some("#E44234"));
        let highlight = state.tool_defaults(AnnotationSubtype::Highlight);
        assert_eq!(highlight.swatch(), Some("#FFCD45"));
    }

    #[test]
    fn annotations_survive_a_json_round_trip() {
        let annotation = AnnotationObject {
            id: "a1".into(),
            subtype: AnnotationSubtype::FreeText,
            page_index: 2,
            rect: PageRect::new(10.0, 20.0, 30.0, 40.0),
            segment_rects: vec![PageRect::new(10.0, 20.0, 15.0, 40.0)],
            blend_mode: BlendMode::Multiply,
            color: Some("#FFCD45".into()),
            opacity: 0.5,
            created: Utc::now(),
            text: Some("note".into()),
        };

        let value = serde_json::to_value(&annotation).unwrap();
        assert_eq!(value["subtype"], "freeText");
        let back: AnnotationObject = serde_json::from_value(value).unwrap();
        assert_eq!(back, annotation);
    }
}
