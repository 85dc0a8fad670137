use crate::props::Props;
use crate::variant::VariantKey;

use super::state::{
    AnnotationObject, AnnotationRef, DocumentInfo, FormattedSelection, HeaderState, HistoryFlags,
    InteractionMode, PanelState, Rotation, ScrollStrategy, SearchHit, SpreadMode, UiCategory,
    UiState, ZoomLevel,
};

/// Every way the global state can change.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    SetDocument(Option<DocumentInfo>),
    SetRotation(Rotation),

    SetViewportGap(u32),
    SetScrolling(bool),

    SetScrollStrategy(ScrollStrategy),
    /// 1-based page number, clamped to the document.
    SetCurrentPage(usize),

    SetZoom {
        level: ZoomLevel,
        current: f32,
    },

    SetSpreadMode(SpreadMode),

    SetSearchQuery(String),
    SetSearchResults(Vec<SearchHit>),
    SetActiveSearchResult(Option<usize>),

    SetSelection {
        ranges: Vec<FormattedSelection>,
        text: Vec<String>,
    },
    SetSelecting(bool),
    ClearSelection,

    SetActiveVariant(Option<VariantKey>),
    AddAnnotation(AnnotationObject),
    RemoveAnnotation(AnnotationRef),
    SelectAnnotation(Option<AnnotationRef>),
    CommitAnnotations,

    SetFullscreen(bool),
    SetInteractionMode(InteractionMode),
    SetHistory(HistoryFlags),

    SeedUi(UiState),
    SetPanel {
        id: String,
        state: PanelState,
    },
    SetHeader {
        id: String,
        state: HeaderState,
    },
    OpenCommandMenu {
        menu: String,
        command: String,
        trigger: Option<String>,
    },
    CloseCommandMenu {
        menu: String,
    },
    PatchComponentState {
        category: UiCategory,
        id: String,
        patch: Props,
    },
}
