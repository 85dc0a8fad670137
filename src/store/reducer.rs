//! The single reducer step applied under the store lock.

use log::debug;

use crate::props::Props;

use super::action::StoreAction;
use super::state::{GlobalState, HeaderState, PanelState, UiCategory};

const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 16.0;

impl GlobalState {
    /// Apply an action. Returns true when the state changed.
    #[must_use]
    pub fn apply(&mut self, action: StoreAction) -> bool {
        match action {
            StoreAction::SetDocument(document) => {
                if self.core.document == document {
                    return false;
                }
                let pages = document.as_ref().map_or(0, |d| d.page_count);
                self.plugins.scroll.total_pages = pages.max(1);
                self.plugins.scroll.current_page = if document.is_some() { 1 } else { 0 };
                self.plugins.annotation.pages.clear();
                self.plugins.annotation.selected = None;
                self.plugins.selection = Default::default();
                self.plugins.search = Default::default();
                self.core.document = document;
                true
            }

            StoreAction::SetRotation(rotation) => {
                replace(&mut self.core.rotation, rotation)
            }

            StoreAction::SetViewportGap(gap) => replace(&mut self.plugins.viewport.viewport_gap, gap),

            StoreAction::SetScrolling(scrolling) => {
                replace(&mut self.plugins.viewport.is_scrolling, scrolling)
            }

            StoreAction::SetScrollStrategy(strategy) => {
                replace(&mut self.plugins.scroll.strategy, strategy)
            }

            StoreAction::SetCurrentPage(page) => {
                let last = self.plugins.scroll.total_pages.max(1);
                replace(&mut self.plugins.scroll.current_page, page.clamp(1, last))
            }

            StoreAction::SetZoom { level, current } => {
                let clamped = current.clamp(MIN_ZOOM, MAX_ZOOM);
                let zoom = &mut self.plugins.zoom;
                if zoom.zoom_level == level
                    && (zoom.current_zoom_level - clamped).abs() <= f32::EPSILON
                {
                    return false;
                }
                zoom.zoom_level = level;
                zoom.current_zoom_level = clamped;
                self.core.scale = clamped;
                true
            }

            StoreAction::SetSpreadMode(mode) => {
                replace(&mut self.plugins.spread.spread_mode, mode)
            }

            StoreAction::SetSearchQuery(query) => {
                let search = &mut self.plugins.search;
                if search.query == query {
                    return false;
                }
                search.query = query;
                search.results.clear();
                search.active_result_index = None;
                search.loading = !search.query.is_empty();
                true
            }

            StoreAction::SetSearchResults(results) => {
                let search = &mut self.plugins.search;
                search.active_result_index = if results.is_empty() { None } else { Some(0) };
                search.results = results;
                search.loading = false;
                true
            }

            StoreAction::SetActiveSearchResult(index) => {
                let total = self.plugins.search.results.len();
                let index = index.filter(|i| *i < total);
                replace(&mut self.plugins.search.active_result_index, index)
            }

            StoreAction::SetSelection { ranges, text } => {
                let selection = &mut self.plugins.selection;
                if selection.ranges == ranges && selection.text == text && !selection.selecting {
                    return false;
                }
                selection.ranges = ranges;
                selection.text = text;
                selection.selecting = false;
                true
            }

            StoreAction::SetSelecting(selecting) => {
                replace(&mut self.plugins.selection.selecting, selecting)
            }

            StoreAction::ClearSelection => {
                let selection = &mut self.plugins.selection;
                if selection.ranges.is_empty() && selection.text.is_empty() {
                    return false;
                }
                selection.ranges.clear();
                selection.text.clear();
                true
            }

            StoreAction::SetActiveVariant(variant) => {
                replace(&mut self.plugins.annotation.active_variant, variant)
            }

            StoreAction::AddAnnotation(annotation) => {
                let annotations = &mut self.plugins.annotation;
                annotations
                    .pages
                    .entry(annotation.page_index)
                    .or_default()
                    .push(annotation);
                annotations.has_pending_changes = true;
                true
            }

            StoreAction::RemoveAnnotation(target) => {
                let annotations = &mut self.plugins.annotation;
                let Some(page) = annotations.pages.get_mut(&target.page_index) else {
                    return false;
                };
                let before = page.len();
                page.retain(|a| a.id != target.id);
                if page.len() == before {
                    return false;
                }
                if page.is_empty() {
                    annotations.pages.remove(&target.page_index);
                }
                if annotations.selected.as_ref() == Some(&target) {
                    annotations.selected = None;
                }
                annotations.has_pending_changes = true;
                true
            }

            StoreAction::SelectAnnotation(target) => {
                if let Some(t) = &target {
                    if self.plugins.annotation.find(t).is_none() {
                        debug!("Ignoring selection of unknown annotation {}", t.id);
                        return false;
                    }
                }
                replace(&mut self.plugins.annotation.selected, target)
            }

            StoreAction::CommitAnnotations => {
                replace(&mut self.plugins.annotation.has_pending_changes, false)
            }

            StoreAction::SetFullscreen(on) => {
                replace(&mut self.plugins.fullscreen.is_fullscreen, on)
            }

            StoreAction::SetInteractionMode(mode) => {
                replace(&mut self.plugins.interaction_manager.active_mode, mode)
            }

            StoreAction::SetHistory(flags) => replace(&mut self.plugins.history.global, flags),

            StoreAction::SeedUi(ui) => replace(&mut self.plugins.ui, ui),

            StoreAction::SetPanel { id, state } => {
                let current = self.plugins.ui.panels.entry(id).or_default();
                replace(current, state)
            }

            StoreAction::SetHeader { id, state } => {
                let current = self.plugins.ui.headers.entry(id).or_default();
                replace(current, state)
            }

            StoreAction::OpenCommandMenu {
                menu,
                command,
                trigger,
            } => {
                let current = self.plugins.ui.command_menu.entry(menu).or_default();
                current.open = true;
                current.active_command = Some(command);
                current.trigger = trigger;
                true
            }

            StoreAction::CloseCommandMenu { menu } => {
                let current = self.plugins.ui.command_menu.entry(menu).or_default();
                if !current.open && current.active_command.is_none() {
                    return false;
                }
                current.open = false;
                current.active_command = None;
                current.trigger = None;
                true
            }

            StoreAction::PatchComponentState {
                category,
                id,
                patch,
            } => {
                let ui = &mut self.plugins.ui;
                match category {
                    UiCategory::Panel => {
                        let panel = ui.panels.entry(id).or_default();
                        let mut props = panel_props(panel);
                        props.overlay(patch);
                        replace(panel, PanelState::from_props(&props))
                    }
                    UiCategory::Header => {
                        let header = ui.headers.entry(id).or_default();
                        let mut props = Props::new().with("visible", header.visible);
                        if let Some(child) = &header.visible_child {
                            props.set("visibleChild", child.as_str());
                        }
                        props.overlay(patch);
                        replace(header, HeaderState::from_props(&props))
                    }
                    UiCategory::Floating => {
                        let entry = ui.floating.entry(id).or_default();
                        let next = entry.clone().overlaid(patch);
                        replace(entry, next)
                    }
                    UiCategory::Custom => {
                        let entry = ui.custom.entry(id).or_default();
                        let next = entry.clone().overlaid(patch);
                        replace(entry, next)
                    }
                }
            }
        }
    }
}

fn panel_props(panel: &PanelState) -> Props {
    let mut props = Props::new().with("open", panel.open);
    if let Some(child) = &panel.visible_child {
        props.set("visibleChild", child.as_str());
    }
    props
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::state::{
        AnnotationObject, AnnotationRef, BlendMode, DocumentInfo, FormattedSelection, PageRect,
        ZoomLevel, ZoomMode,
    };
    use crate::variant::AnnotationSubtype;

    fn with_document(pages: usize) -> GlobalState {
        let mut state = GlobalState::default();
        let _ = state.apply(StoreAction::SetDocument(Some(DocumentInfo {
            id: "doc".into(),
            name: "doc.pdf".into(),
            page_count: pages,
            size_bytes: 10,
        })));
        state
    }

    fn annotation(id: &str, page: usize) -> AnnotationObject {
        AnnotationObject {
            id: id.into(),
            subtype: AnnotationSubtype::Highlight,
            page_index: page,
            rect: PageRect::new(0.0, 0.0, 10.0, 10.0),
            segment_rects: vec![],
            blend_mode: BlendMode::Multiply,
            color: None,
            opacity: 1.0,
            created: chrono::Utc::now(),
            text: None,
        }
    }

    #[test]
    fn current_page_is_clamped_to_document() {
        let mut state = with_document(5);
        assert!(state.apply(StoreAction::SetCurrentPage(9)));
        assert_eq!(state.plugins.scroll.current_page, 5);
        assert!(state.apply(StoreAction::SetCurrentPage(0)));
        assert_eq!(state.plugins.scroll.current_page, 1);
        assert!(!state.apply(StoreAction::SetCurrentPage(1)));
    }

    #[test]
    fn repeated_selection_is_not_a_change() {
        let mut state = with_document(2);
        let set = || StoreAction::SetSelection {
            ranges: vec![FormattedSelection {
                page_index: 0,
                rect: PageRect::new(0.0, 0.0, 20.0, 8.0),
                segment_rects: Vec::new(),
            }],
            text: vec!["word".into()],
        };
        assert!(state.apply(set()));
        assert!(!state.apply(set()));

        assert!(state.apply(StoreAction::SetSelecting(true)));
        assert!(state.apply(set()));
        assert!(!state.plugins.selection.selecting);
    }

    #[test]
    fn zoom_updates_core_scale() {
        let mut state = GlobalState::default();
        assert!(state.apply(StoreAction::SetZoom {
            level: ZoomLevel::Scale(2.0),
            current: 2.0,
        }));
        assert_eq!(state.core.scale, 2.0);
        assert!(!state.apply(StoreAction::SetZoom {
            level: ZoomLevel::Scale(2.0),
            current: 2.0,
        }));
        assert!(state.apply(StoreAction::SetZoom {
            level: ZoomLevel::Mode(ZoomMode::FitWidth),
            current: 100.0,
        }));
        assert_eq!(state.plugins.zoom.current_zoom_level, MAX_ZOOM);
    }

    #[test]
    fn removing_selected_annotation_clears_selection() {
        let mut state = with_document(3);
        assert!(state.apply(StoreAction::AddAnnotation(annotation("a1", 0))));
        let target = AnnotationRef {
            page_index: 0,
            id: "a1".into(),
        };
        assert!(state.apply(StoreAction::SelectAnnotation(Some(target.clone()))));
        assert!(state.apply(StoreAction::RemoveAnnotation(target.clone())));
        assert!(state.plugins.annotation.selected.is_none());
        assert!(!state.apply(StoreAction::RemoveAnnotation(target)));
    }

    #[test]
    fn selecting_unknown_annotation_is_ignored() {
        let mut state = with_document(1);
        assert!(!state.apply(StoreAction::SelectAnnotation(Some(AnnotationRef {
            page_index: 0,
            id: "ghost".into(),
        }))));
    }

    #[test]
    fn component_patches_merge_into_typed_panels() {
        let mut state = GlobalState::default();
        assert!(state.apply(StoreAction::PatchComponentState {
            category: UiCategory::Panel,
            id: "leftPanel".into(),
            patch: Props::new().with("open", true).with("visibleChild", "search"),
        }));
        let panel = state.plugins.ui.panel("leftPanel");
        assert!(panel.open);
        assert_eq!(panel.visible_child.as_deref(), Some("search"));

        assert!(state.apply(StoreAction::PatchComponentState {
            category: UiCategory::Custom,
            id: "leftPanelMain".into(),
            patch: Props::new().with("visibleChild", "outline"),
        }));
        assert_eq!(
            state.plugins.ui.custom("leftPanelMain").str("visibleChild"),
            Some("outline")
        );
    }

    #[test]
    fn command_menu_open_and_close() {
        let mut state = GlobalState::default();
        assert!(state.apply(StoreAction::OpenCommandMenu {
            menu: "commandMenu".into(),
            command: "menuCtr".into(),
            trigger: Some("menuButton".into()),
        }));
        assert_eq!(
            state.plugins.ui.command_menu().active_command.as_deref(),
            Some("menuCtr")
        );
        assert!(state.apply(StoreAction::CloseCommandMenu {
            menu: "commandMenu".into()
        }));
        assert!(!state.apply(StoreAction::CloseCommandMenu {
            menu: "commandMenu".into()
        }));
    }
}
