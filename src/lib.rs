// Export modules for use in tests
pub mod capability;
pub mod command;
pub mod component;
pub mod config;
pub mod event_source;
pub mod panic_handler;
pub mod perf;
pub mod plugins;
pub mod props;
pub mod store;
pub mod task;
pub mod theme;
pub mod tui;
pub mod variant;
pub mod viewer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export the pieces the binary wires together
pub use command::{DispatchOutcome, viewer_commands};
pub use component::viewer_components;
pub use config::{ConfigHandle, ViewerConfig};
pub use store::Store;
pub use tui::{Shell, run_shell};
pub use viewer::{Viewer, ViewerPhase};
