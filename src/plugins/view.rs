//! Plugins that move view state: zoom, scroll, spread, rotation, fullscreen
//! and the interaction modes.

use std::sync::Arc;

use log::debug;

use crate::capability::{
    CaptureCapability, FullscreenCapability, InteractionManagerCapability, RotateCapability,
    ScrollCapability, SpreadCapability, ZoomCapability,
};
use crate::store::{
    InteractionMode, ScrollStrategy, SpreadMode, Store, StoreAction, ZoomLevel,
};

/// Scale used for the fit modes. There is no page geometry to fit against.
const FIT_SCALE: f32 = 1.0;

pub struct ZoomPlugin {
    store: Arc<Store>,
    interaction: Arc<InteractionManagerPlugin>,
}

impl ZoomPlugin {
    /// Multiplier per zoom-in step.
    pub const ZOOM_IN_RATE: f32 = 1.1;
    /// Divisor per zoom-out step.
    pub const ZOOM_OUT_RATE: f32 = 1.05;

    pub fn new(store: Arc<Store>, interaction: Arc<InteractionManagerPlugin>) -> Self {
        Self { store, interaction }
    }

    fn set_scale(&self, level: ZoomLevel, current: f32) {
        self.store.dispatch(StoreAction::SetZoom { level, current });
    }
}

impl ZoomCapability for ZoomPlugin {
    fn request_zoom(&self, level: ZoomLevel) {
        let current = match level {
            ZoomLevel::Scale(scale) => scale,
            ZoomLevel::Mode(_) => FIT_SCALE,
        };
        debug!("Zoom requested: {level:?} -> {current}");
        self.set_scale(level, current);
    }

    fn zoom_in(&self) {
        let current = self.store.snapshot().plugins.zoom.current_zoom_level;
        let next = current * Self::ZOOM_IN_RATE;
        self.set_scale(ZoomLevel::Scale(next), next);
    }

    fn zoom_out(&self) {
        let current = self.store.snapshot().plugins.zoom.current_zoom_level;
        let next = current / Self::ZOOM_OUT_RATE;
        self.set_scale(ZoomLevel::Scale(next), next);
    }

    fn is_marquee_zoom_active(&self) -> bool {
        self.interaction.active_mode() == InteractionMode::MarqueeZoom
    }

    fn enable_marquee_zoom(&self) {
        self.interaction.activate(InteractionMode::MarqueeZoom);
    }

    fn disable_marquee_zoom(&self) {
        self.interaction.activate_default_mode();
    }
}

pub struct ScrollPlugin {
    store: Arc<Store>,
}

impl ScrollPlugin {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Pages advanced per step; two when pages are shown side by side.
    fn step(&self) -> usize {
        match self.store.snapshot().plugins.spread.spread_mode {
            SpreadMode::None => 1,
            SpreadMode::Odd | SpreadMode::Even => 2,
        }
    }
}

impl ScrollCapability for ScrollPlugin {
    fn set_scroll_strategy(&self, strategy: ScrollStrategy) {
        self.store.dispatch(StoreAction::SetScrollStrategy(strategy));
    }

    fn scroll_to_page(&self, page: usize) {
        self.store.dispatch(StoreAction::SetCurrentPage(page));
    }

    fn scroll_to_next_page(&self) {
        let current = self.store.snapshot().plugins.scroll.current_page;
        self.scroll_to_page(current + self.step());
    }

    fn scroll_to_previous_page(&self) {
        let current = self.store.snapshot().plugins.scroll.current_page;
        self.scroll_to_page(current.saturating_sub(self.step()).max(1));
    }
}

pub struct SpreadPlugin {
    store: Arc<Store>,
}

impl SpreadPlugin {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

impl SpreadCapability for SpreadPlugin {
    fn set_spread_mode(&self, mode: SpreadMode) {
        self.store.dispatch(StoreAction::SetSpreadMode(mode));
    }

    fn spread_mode(&self) -> SpreadMode {
        self.store.snapshot().plugins.spread.spread_mode
    }
}

pub struct RotatePlugin {
    store: Arc<Store>,
}

impl RotatePlugin {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

impl RotateCapability for RotatePlugin {
    fn rotate_forward(&self) {
        let rotation = self.store.snapshot().core.rotation.clockwise();
        self.store.dispatch(StoreAction::SetRotation(rotation));
    }

    fn rotate_backward(&self) {
        let rotation = self.store.snapshot().core.rotation.counter_clockwise();
        self.store.dispatch(StoreAction::SetRotation(rotation));
    }
}

pub struct FullscreenPlugin {
    store: Arc<Store>,
}

impl FullscreenPlugin {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

impl FullscreenCapability for FullscreenPlugin {
    fn is_fullscreen(&self) -> bool {
        self.store.snapshot().plugins.fullscreen.is_fullscreen
    }

    fn enable_fullscreen(&self) {
        self.store.dispatch(StoreAction::SetFullscreen(true));
    }

    fn exit_fullscreen(&self) {
        self.store.dispatch(StoreAction::SetFullscreen(false));
    }
}

pub struct InteractionManagerPlugin {
    store: Arc<Store>,
}

impl InteractionManagerPlugin {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

impl InteractionManagerCapability for InteractionManagerPlugin {
    fn active_mode(&self) -> InteractionMode {
        self.store.snapshot().plugins.interaction_manager.active_mode
    }

    fn activate(&self, mode: InteractionMode) {
        debug!("Interaction mode -> {}", mode.id());
        self.store.dispatch(StoreAction::SetInteractionMode(mode));
    }

    fn activate_default_mode(&self) {
        self.activate(InteractionMode::default());
    }
}

pub struct CapturePlugin {
    interaction: Arc<InteractionManagerPlugin>,
}

impl CapturePlugin {
    pub fn new(interaction: Arc<InteractionManagerPlugin>) -> Self {
        Self { interaction }
    }
}

impl CaptureCapability for CapturePlugin {
    fn is_marquee_capture_active(&self) -> bool {
        self.interaction.active_mode() == InteractionMode::MarqueeCapture
    }

    fn enable_marquee_capture(&self) {
        self.interaction.activate(InteractionMode::MarqueeCapture);
    }

    fn disable_marquee_capture(&self) {
        self.interaction.activate_default_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentInfo, Rotation, ZoomMode};

    fn store_with_pages(pages: usize) -> Arc<Store> {
        let store = Arc::new(Store::default());
        store.dispatch(StoreAction::SetDocument(Some(DocumentInfo {
            id: "d".into(),
            name: "d.pdf".into(),
            page_count: pages,
            size_bytes: 0,
        })));
        store
    }

    #[test]
    fn zoom_steps_and_modes() {
        let store = Arc::new(Store::default());
        let interaction = Arc::new(InteractionManagerPlugin::new(store.clone()));
        let zoom = ZoomPlugin::new(store.clone(), interaction);

        zoom.request_zoom(ZoomLevel::Scale(2.0));
        assert_eq!(store.snapshot().plugins.zoom.current_zoom_level, 2.0);

        zoom.zoom_in();
        let zoomed = store.snapshot().plugins.zoom.current_zoom_level;
        assert!((zoomed - 2.2).abs() < 1e-4);

        zoom.request_zoom(ZoomLevel::Mode(ZoomMode::FitWidth));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.plugins.zoom.zoom_level, ZoomLevel::Mode(ZoomMode::FitWidth));
        assert_eq!(snapshot.plugins.zoom.current_zoom_level, FIT_SCALE);
    }

    #[test]
    fn marquee_modes_are_exclusive() {
        let store = Arc::new(Store::default());
        let interaction = Arc::new(InteractionManagerPlugin::new(store.clone()));
        let zoom = ZoomPlugin::new(store.clone(), interaction.clone());
        let capture = CapturePlugin::new(interaction.clone());

        zoom.toggle_marquee_zoom();
        assert!(zoom.is_marquee_zoom_active());
        capture.toggle_marquee_capture();
        assert!(capture.is_marquee_capture_active());
        assert!(!zoom.is_marquee_zoom_active());
        capture.toggle_marquee_capture();
        assert_eq!(interaction.active_mode(), InteractionMode::Pointer);
    }

    #[test]
    fn scrolling_respects_bounds_and_spread() {
        let store = store_with_pages(6);
        let scroll = ScrollPlugin::new(store.clone());

        scroll.scroll_to_previous_page();
        assert_eq!(store.snapshot().plugins.scroll.current_page, 1);

        store.dispatch(StoreAction::SetSpreadMode(SpreadMode::Odd));
        scroll.scroll_to_next_page();
        assert_eq!(store.snapshot().plugins.scroll.current_page, 3);

        scroll.scroll_to_page(99);
        assert_eq!(store.snapshot().plugins.scroll.current_page, 6);
    }

    #[test]
    fn rotation_cycles() {
        let store = Arc::new(Store::default());
        let rotate = RotatePlugin::new(store.clone());
        rotate.rotate_backward();
        assert_eq!(store.snapshot().core.rotation, Rotation::Degree270);
        rotate.rotate_forward();
        rotate.rotate_forward();
        assert_eq!(store.snapshot().core.rotation, Rotation::Degree90);
    }
}
