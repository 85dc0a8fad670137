//! The operations each plugin exposes to commands.
//!
//! Capabilities are shared behind `Arc` and may be called from task
//! callbacks, so every trait is `Send + Sync`.

use crate::props::Props;
use crate::store::{
    AnnotationObject, AnnotationRef, FormattedSelection, InteractionMode, ScrollStrategy,
    SearchHit, SpreadMode, ToolDefaults, UiCategory, ZoomLevel,
};
use crate::task::Task;
use crate::variant::{AnnotationSubtype, VariantKey};

pub trait ZoomCapability: Send + Sync {
    fn request_zoom(&self, level: ZoomLevel);
    fn zoom_in(&self);
    fn zoom_out(&self);
    fn is_marquee_zoom_active(&self) -> bool;
    fn enable_marquee_zoom(&self);
    fn disable_marquee_zoom(&self);

    fn toggle_marquee_zoom(&self) {
        if self.is_marquee_zoom_active() {
            self.disable_marquee_zoom();
        } else {
            self.enable_marquee_zoom();
        }
    }
}

pub trait ScrollCapability: Send + Sync {
    fn set_scroll_strategy(&self, strategy: ScrollStrategy);
    /// 1-based page number.
    fn scroll_to_page(&self, page: usize);
    fn scroll_to_next_page(&self);
    fn scroll_to_previous_page(&self);
}

pub trait SpreadCapability: Send + Sync {
    fn set_spread_mode(&self, mode: SpreadMode);
    fn spread_mode(&self) -> SpreadMode;
}

pub trait RotateCapability: Send + Sync {
    fn rotate_forward(&self);
    fn rotate_backward(&self);
}

pub trait AnnotationCapability: Send + Sync {
    fn set_active_variant(&self, variant: Option<VariantKey>);
    fn active_variant(&self) -> Option<VariantKey>;
    fn tool_defaults(&self, subtype: AnnotationSubtype) -> ToolDefaults;
    fn create_annotation(&self, annotation: AnnotationObject);
    fn select_annotation(&self, page_index: usize, id: &str);
    fn deselect_annotation(&self);
    fn selected_annotation(&self) -> Option<AnnotationObject>;
    fn delete_annotation(&self, target: &AnnotationRef);
    fn commit(&self);
}

pub trait SearchCapability: Send + Sync {
    /// Runs `query` over every page. The store holds the query, the hits and
    /// the result cursor once the task settles.
    fn search_all_pages(&self, query: &str) -> Task<Vec<SearchHit>>;
    fn next_result(&self);
    fn previous_result(&self);
    fn stop_search(&self);
}

pub trait SelectionCapability: Send + Sync {
    fn formatted_selection(&self) -> Vec<FormattedSelection>;
    /// Text of the current selection, one entry per line.
    fn selected_text(&self) -> Task<Vec<String>>;
    fn copy_to_clipboard(&self);
    fn clear(&self);
}

pub trait HistoryCapability: Send + Sync {
    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;
    fn undo(&self);
    fn redo(&self);
}

pub trait InteractionManagerCapability: Send + Sync {
    fn active_mode(&self) -> InteractionMode;
    fn activate(&self, mode: InteractionMode);
    fn activate_default_mode(&self);
}

pub trait FullscreenCapability: Send + Sync {
    fn is_fullscreen(&self) -> bool;
    fn enable_fullscreen(&self);
    fn exit_fullscreen(&self);
}

pub trait ExportCapability: Send + Sync {
    fn download(&self);
    fn save_as_copy(&self) -> Task<Vec<u8>>;
}

pub trait CaptureCapability: Send + Sync {
    fn is_marquee_capture_active(&self) -> bool;
    fn enable_marquee_capture(&self);
    fn disable_marquee_capture(&self);

    fn toggle_marquee_capture(&self) {
        if self.is_marquee_capture_active() {
            self.disable_marquee_capture();
        } else {
            self.enable_marquee_capture();
        }
    }
}

/// Panel toggle request. `open: None` flips the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelToggle {
    pub id: String,
    pub visible_child: Option<String>,
    pub open: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderVisibility {
    pub id: String,
    pub visible: bool,
    pub visible_child: Option<String>,
}

pub trait UiCapability: Send + Sync {
    fn toggle_panel(&self, request: PanelToggle);
    fn set_header_visible(&self, request: HeaderVisibility);
    fn update_component_state(&self, category: UiCategory, id: &str, patch: Props);
    fn open_command_menu(&self, menu: &str, command: &str, trigger: Option<&str>);
    fn close_command_menu(&self, menu: &str);
}
