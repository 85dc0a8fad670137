//! YAML configuration file discovery, loading and first-run defaults.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use super::{ConfigError, PluginConfigs, ViewerConfig, default_plugin_configs};

const CONFIG_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pdfdeck";

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(CONFIG_FILENAME))
}

/// Reads and parses one configuration file.
pub fn read_viewer_config(path: &Path) -> Result<ViewerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Loads the viewer configuration.
///
/// An explicit path must exist. Without one the preferred location is used,
/// and a commented default file is written there on first run. Any failure
/// is logged and yields the built-in defaults.
pub fn load_viewer_config(explicit: Option<&Path>) -> ViewerConfig {
    if let Some(path) = explicit {
        return match read_viewer_config(path) {
            Ok(config) => {
                debug!("Loaded configuration from {path:?}");
                config
            }
            Err(e) => {
                error!("{e}");
                ViewerConfig::default()
            }
        };
    }

    let Some(path) = preferred_config_path() else {
        warn!("{}, using default configuration", ConfigError::NoConfigDir);
        return ViewerConfig::default();
    };

    if path.exists() {
        match read_viewer_config(&path) {
            Ok(config) => {
                debug!("Loaded configuration from {path:?}");
                config
            }
            Err(e) => {
                error!("{e}");
                ViewerConfig::default()
            }
        }
    } else {
        info!("Configuration file not found, creating with defaults at {path:?}");
        let config = ViewerConfig::default();
        if let Err(e) = save_viewer_config(&config, &path) {
            error!("{e}");
        }
        config
    }
}

pub fn save_viewer_config(config: &ViewerConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.display().to_string(),
                source,
            })?;
        }
    }

    let content = generate_config_yaml(config)?;
    fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })?;
    debug!("Saved configuration to {path:?}");
    Ok(())
}

/// Renders `config` with every plugin default spelled out, so the written
/// file documents all the knobs.
pub fn generate_config_yaml(config: &ViewerConfig) -> Result<String, ConfigError> {
    let mut expanded = config.clone();
    let resolved = super::merge(&default_plugin_configs(), &config.plugins);
    expanded.plugins = PluginConfigs::from(resolved);
    if let Some(button) = expanded.plugins.custom_button.as_mut() {
        button.callback = None;
    }

    let mut content = String::from(HEADER_TEMPLATE);
    content.push_str(&serde_yaml::to_string(&expanded)?);
    Ok(content)
}

const HEADER_TEMPLATE: &str = r#"# ============================================================================
# pdfdeck configuration
# ============================================================================
# src:        document opened when no path is given on the command line
# worker:     run the PDF engine off the UI thread
# log:        verbose logging plus timing of command dispatch and layout
#
# plugins.zoom.default_zoom_level accepts automatic, fit_page, fit_width
# or a scale factor such as 1.5.
# plugins.scroll.strategy accepts vertical or horizontal.
# plugins.spread.default_spread_mode accepts none, odd or even.
# plugins.rotate.default_rotation accepts 0, 90, 180 or 270.

"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ZoomLevel, ZoomMode};
    use tempfile::TempDir;

    #[test]
    fn written_defaults_read_back_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);

        save_viewer_config(&ViewerConfig::default(), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# ====="));
        assert!(content.contains("viewport_gap: 10"));
        assert!(content.contains("tile_size: 768"));

        let loaded = read_viewer_config(&path).unwrap();
        assert_eq!(loaded.resolved_plugins(), default_plugin_configs());
        assert!(loaded.worker);
    }

    #[test]
    fn explicit_file_overrides_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(
            &path,
            "src: thesis.pdf\nlog: true\nplugins:\n  zoom:\n    default_zoom_level: fit_width\n",
        )
        .unwrap();

        let config = load_viewer_config(Some(&path));
        assert_eq!(config.src, "thesis.pdf");
        assert!(config.log);
        assert_eq!(
            config.resolved_plugins().zoom.default_zoom_level,
            ZoomLevel::Mode(ZoomMode::FitWidth)
        );
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "plugins: [not, a, map]\n").unwrap();

        assert!(matches!(
            read_viewer_config(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(load_viewer_config(Some(&path)), ViewerConfig::default());
    }

    #[test]
    fn missing_explicit_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(matches!(
            read_viewer_config(&path),
            Err(ConfigError::Read { .. })
        ));
    }
}
