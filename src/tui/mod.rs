//! Terminal renderers for every component kind, and the shell that runs them.

mod command_menu;
mod containers;
mod controls;
mod custom;
pub mod hud;
pub mod keymap;
mod renderer;
mod shell;

pub use command_menu::{MenuEntry, menu_entries};
pub use hud::{HudMessage, HudMode};
pub use keymap::{KeyAction, map_key};
pub use renderer::{ComponentRenderer, HitTarget, RenderContext, default_renderers};
pub use shell::{CELL_WIDTH_PX, Shell, run_shell};
