//! Plugin configuration: partial user input, defaults, and the merge between them.
//!
//! Every plugin section exists twice: a resolved struct with all fields set,
//! and a patch struct with every field optional. [`merge`] overlays a
//! [`PluginConfigs`] patch on the defaults one section at a time, so a user
//! who only sets `zoom.default_zoom_level` keeps every other default.

pub mod file;

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{Rotation, ScrollStrategy, SpreadMode, ZoomLevel, ZoomMode};

pub use file::{load_viewer_config, preferred_config_path, save_viewer_config};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a configuration directory")]
    NoConfigDir,

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

macro_rules! plugin_section {
    (
        $(#[$meta:meta])*
        $name:ident / $patch:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty = $default:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self { $( $field: $default, )* }
            }
        }

        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $patch {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        impl $name {
            /// Fields set in `patch` win, the rest keep their current value.
            pub fn merged(&self, patch: &$patch) -> Self {
                Self {
                    $( $field: patch.$field.clone().unwrap_or_else(|| self.$field.clone()), )*
                }
            }
        }

        impl From<$name> for $patch {
            fn from(resolved: $name) -> Self {
                Self { $( $field: Some(resolved.$field), )* }
            }
        }
    };
}

plugin_section! {
    ViewportConfig / ViewportPatch {
        /// Gap between pages, in pixels.
        viewport_gap: u32 = 10,
    }
}

plugin_section! {
    ScrollConfig / ScrollPatch {
        strategy: ScrollStrategy = ScrollStrategy::Vertical,
    }
}

plugin_section! {
    ZoomConfig / ZoomPatch {
        default_zoom_level: ZoomLevel = ZoomLevel::Mode(ZoomMode::FitPage),
    }
}

plugin_section! {
    SpreadConfig / SpreadPatch {
        default_spread_mode: SpreadMode = SpreadMode::None,
    }
}

plugin_section! {
    RotateConfig / RotatePatch {
        default_rotation: Rotation = Rotation::Degree0,
    }
}

plugin_section! {
    TilingConfig / TilingPatch {
        tile_size: u32 = 768,
        overlap_px: f32 = 2.5,
        extra_rings: u32 = 0,
    }
}

plugin_section! {
    ThumbnailConfig / ThumbnailPatch {
        width: u32 = 150,
        gap: u32 = 10,
        buffer: u32 = 3,
        label_height: u32 = 30,
    }
}

plugin_section! {
    AnnotationConfig / AnnotationPatch {
        enabled: bool = true,
    }
}

/// Receives the bytes of an exported copy, or an empty buffer on failure.
#[derive(Clone)]
pub struct ExportCallback(Arc<dyn Fn(Vec<u8>) + Send + Sync>);

static NOOP_CALLBACK: LazyLock<ExportCallback> =
    LazyLock::new(|| ExportCallback(Arc::new(|_bytes: Vec<u8>| {})));

impl ExportCallback {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    /// The shared callback that ignores its input.
    pub fn noop() -> Self {
        NOOP_CALLBACK.clone()
    }

    pub fn call(&self, bytes: Vec<u8>) {
        (self.0)(bytes)
    }
}

impl Default for ExportCallback {
    fn default() -> Self {
        Self::noop()
    }
}

impl PartialEq for ExportCallback {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ExportCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self == &*NOOP_CALLBACK {
            f.write_str("ExportCallback(noop)")
        } else {
            f.write_str("ExportCallback(..)")
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomButtonConfig {
    pub enabled: bool,
    pub label: String,
    pub icon: String,
    pub callback: ExportCallback,
}

impl Default for CustomButtonConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            label: "Custom Action".to_string(),
            icon: "save".to_string(),
            callback: ExportCallback::noop(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomButtonPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Only settable from code.
    #[serde(skip)]
    pub callback: Option<ExportCallback>,
}

impl CustomButtonConfig {
    pub fn merged(&self, patch: &CustomButtonPatch) -> Self {
        Self {
            enabled: patch.enabled.unwrap_or(self.enabled),
            label: patch.label.clone().unwrap_or_else(|| self.label.clone()),
            icon: patch.icon.clone().unwrap_or_else(|| self.icon.clone()),
            callback: patch
                .callback
                .clone()
                .unwrap_or_else(|| self.callback.clone()),
        }
    }
}

impl From<CustomButtonConfig> for CustomButtonPatch {
    fn from(resolved: CustomButtonConfig) -> Self {
        Self {
            enabled: Some(resolved.enabled),
            label: Some(resolved.label),
            icon: Some(resolved.icon),
            callback: Some(resolved.callback),
        }
    }
}

/// User-supplied plugin configuration. Any section or field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfigs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<ViewportPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll: Option<ScrollPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<ZoomPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<SpreadPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<RotatePatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiling: Option<TilingPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ThumbnailPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<AnnotationPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_button: Option<CustomButtonPatch>,
}

/// Fully populated plugin configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPluginConfigs {
    pub viewport: ViewportConfig,
    pub scroll: ScrollConfig,
    pub zoom: ZoomConfig,
    pub spread: SpreadConfig,
    pub rotate: RotateConfig,
    pub tiling: TilingConfig,
    pub thumbnail: ThumbnailConfig,
    pub annotation: AnnotationConfig,
    pub custom_button: CustomButtonConfig,
}

pub fn default_plugin_configs() -> ResolvedPluginConfigs {
    ResolvedPluginConfigs::default()
}

fn merge_section<R, P>(default: &R, user: Option<&P>, merged: impl Fn(&R, &P) -> R) -> R
where
    R: Clone,
{
    match user {
        Some(patch) => merged(default, patch),
        None => default.clone(),
    }
}

/// Overlays `user` on `defaults`, one plugin section at a time.
pub fn merge(defaults: &ResolvedPluginConfigs, user: &PluginConfigs) -> ResolvedPluginConfigs {
    ResolvedPluginConfigs {
        viewport: merge_section(&defaults.viewport, user.viewport.as_ref(), ViewportConfig::merged),
        scroll: merge_section(&defaults.scroll, user.scroll.as_ref(), ScrollConfig::merged),
        zoom: merge_section(&defaults.zoom, user.zoom.as_ref(), ZoomConfig::merged),
        spread: merge_section(&defaults.spread, user.spread.as_ref(), SpreadConfig::merged),
        rotate: merge_section(&defaults.rotate, user.rotate.as_ref(), RotateConfig::merged),
        tiling: merge_section(&defaults.tiling, user.tiling.as_ref(), TilingConfig::merged),
        thumbnail: merge_section(
            &defaults.thumbnail,
            user.thumbnail.as_ref(),
            ThumbnailConfig::merged,
        ),
        annotation: merge_section(
            &defaults.annotation,
            user.annotation.as_ref(),
            AnnotationConfig::merged,
        ),
        custom_button: merge_section(
            &defaults.custom_button,
            user.custom_button.as_ref(),
            CustomButtonConfig::merged,
        ),
    }
}

impl From<ResolvedPluginConfigs> for PluginConfigs {
    fn from(resolved: ResolvedPluginConfigs) -> Self {
        Self {
            viewport: Some(resolved.viewport.into()),
            scroll: Some(resolved.scroll.into()),
            zoom: Some(resolved.zoom.into()),
            spread: Some(resolved.spread.into()),
            rotate: Some(resolved.rotate.into()),
            tiling: Some(resolved.tiling.into()),
            thumbnail: Some(resolved.thumbnail.into()),
            annotation: Some(resolved.annotation.into()),
            custom_button: Some(resolved.custom_button.into()),
        }
    }
}

/// Shared, read-only view of one viewer's resolved plugin configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle(Arc<ResolvedPluginConfigs>);

impl ConfigHandle {
    pub fn new(configs: ResolvedPluginConfigs) -> Self {
        Self(Arc::new(configs))
    }
}

impl Deref for ConfigHandle {
    type Target = ResolvedPluginConfigs;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn default_true() -> bool {
    true
}

/// Everything a viewer instance is started with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Path of the document to open.
    #[serde(default)]
    pub src: String,

    /// Run the PDF engine off the UI thread.
    #[serde(default = "default_true")]
    pub worker: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wasm_url: Option<String>,

    #[serde(default)]
    pub plugins: PluginConfigs,

    /// Verbose and performance logging.
    #[serde(default)]
    pub log: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            src: String::new(),
            worker: true,
            wasm_url: None,
            plugins: PluginConfigs::default(),
            log: false,
        }
    }
}

impl ViewerConfig {
    pub fn resolved_plugins(&self) -> ResolvedPluginConfigs {
        merge(&default_plugin_configs(), &self.plugins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_table() {
        let d = default_plugin_configs();
        assert_eq!(d.viewport.viewport_gap, 10);
        assert_eq!(d.scroll.strategy, ScrollStrategy::Vertical);
        assert_eq!(d.zoom.default_zoom_level, ZoomLevel::Mode(ZoomMode::FitPage));
        assert_eq!(d.spread.default_spread_mode, SpreadMode::None);
        assert_eq!(d.rotate.default_rotation, Rotation::Degree0);
        assert_eq!(d.tiling.tile_size, 768);
        assert_eq!(d.tiling.overlap_px, 2.5);
        assert_eq!(d.tiling.extra_rings, 0);
        assert_eq!(d.thumbnail.width, 150);
        assert_eq!(d.thumbnail.gap, 10);
        assert_eq!(d.thumbnail.buffer, 3);
        assert_eq!(d.thumbnail.label_height, 30);
        assert!(d.annotation.enabled);
        assert!(!d.custom_button.enabled);
        assert_eq!(d.custom_button.label, "Custom Action");
        assert_eq!(d.custom_button.icon, "save");
        assert_eq!(d.custom_button.callback, ExportCallback::noop());
    }

    #[test]
    fn partial_section_keeps_other_fields() {
        let user = PluginConfigs {
            tiling: Some(TilingPatch {
                tile_size: Some(512),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(&default_plugin_configs(), &user);
        assert_eq!(merged.tiling.tile_size, 512);
        assert_eq!(merged.tiling.overlap_px, 2.5);
        assert_eq!(merged.viewport, ViewportConfig::default());
    }

    #[test]
    fn merging_twice_changes_nothing() {
        let user: PluginConfigs = serde_yaml::from_str(
            "zoom:\n  default_zoom_level: fit_width\ncustom_button:\n  enabled: true\n",
        )
        .unwrap();
        let defaults = default_plugin_configs();
        let once = merge(&defaults, &user);
        let twice = merge(&defaults, &once.clone().into());
        assert_eq!(once, twice);
        assert!(once.custom_button.enabled);
        assert_eq!(once.custom_button.label, "Custom Action");
    }

    #[test]
    fn user_callback_survives_merge() {
        let callback = ExportCallback::new(|_| {});
        let user = PluginConfigs {
            custom_button: Some(CustomButtonPatch {
                callback: Some(callback.clone()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(&default_plugin_configs(), &user);
        assert_eq!(merged.custom_button.callback, callback);
        assert_ne!(merged.custom_button.callback, ExportCallback::noop());
    }

    #[test]
    fn viewer_config_fills_missing_fields() {
        let config: ViewerConfig = serde_yaml::from_str("src: paper.pdf\n").unwrap();
        assert_eq!(config.src, "paper.pdf");
        assert!(config.worker);
        assert!(!config.log);
        assert_eq!(config.resolved_plugins(), default_plugin_configs());
    }
}
