use std::fs::{self, File};
use std::io::stdout;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use pdfdeck::config::{ExportCallback, ViewerConfig, load_viewer_config};
use pdfdeck::event_source::KeyboardEventSource;
use pdfdeck::panic_handler::initialize_panic_handler;
use pdfdeck::store::GlobalState;
use pdfdeck::{Shell, Viewer, perf, run_shell};

#[derive(Parser)]
#[command(
    name = "pdfdeck",
    version,
    about = "Terminal PDF viewer driven by a declarative command and component catalog"
)]
struct Args {
    /// Document to open; overrides `src` from the configuration file.
    #[arg(value_name = "SRC")]
    src: Option<PathBuf>,

    /// Configuration file to read instead of the default location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug and performance logging.
    #[arg(long)]
    log: bool,

    /// Load documents on the UI thread.
    #[arg(long = "no-worker")]
    no_worker: bool,

    /// Engine module location, recorded in the configuration.
    #[arg(long = "wasm-url", value_name = "URL")]
    wasm_url: Option<String>,

    /// Enable the custom export button and write its bytes to PATH.
    #[arg(long = "save-copy-to", value_name = "PATH")]
    save_copy_to: Option<PathBuf>,

    /// Print the command catalog and exit.
    #[arg(long = "list-commands")]
    list_commands: bool,
}

fn apply_args(config: &mut ViewerConfig, args: &Args) {
    if let Some(src) = &args.src {
        config.src = src.display().to_string();
    }
    if args.log {
        config.log = true;
    }
    if args.no_worker {
        config.worker = false;
    }
    if args.wasm_url.is_some() {
        config.wasm_url = args.wasm_url.clone();
    }
    if let Some(target) = args.save_copy_to.clone() {
        let button = config.plugins.custom_button.get_or_insert_with(Default::default);
        button.enabled = Some(true);
        button.callback = Some(ExportCallback::new(move |bytes: Vec<u8>| {
            match fs::write(&target, &bytes) {
                Ok(()) => info!("Wrote {} bytes to {}", bytes.len(), target.display()),
                Err(e) => error!("Failed to write {}: {e}", target.display()),
            }
        }));
    }
}

fn list_commands(viewer: &Viewer) {
    let state = GlobalState::default();
    for item in viewer.commands().iter() {
        let shortcut = item
            .shortcut
            .as_ref()
            .map(|s| format!("  [{}]", s.label))
            .unwrap_or_default();
        println!(
            "{:<28} {:<7} {}{shortcut}",
            item.id,
            format!("{:?}", item.kind).to_lowercase(),
            item.label(&state)
        );
    }
}

fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Filtered by the global max level, which the configuration may raise.
    WriteLogger::init(
        LevelFilter::Debug,
        Config::default(),
        File::create("pdfdeck.log")?,
    )?;
    log::set_max_level(level_for(args.log));

    let mut config = load_viewer_config(args.config.as_deref());
    apply_args(&mut config, &args);
    log::set_max_level(level_for(config.log));
    perf::set_enabled(config.log);

    info!("Starting pdfdeck");

    let mut viewer = Viewer::with_reference_plugins(&config, dirs::download_dir())?;
    if args.list_commands {
        list_commands(&viewer);
        return Ok(());
    }
    viewer.register_default_renderers();

    let mut shell = Shell::new(viewer);
    shell.set_worker(config.worker);
    if config.src.is_empty() {
        shell.start_empty();
    } else {
        shell.open(PathBuf::from(&config.src));
    }

    initialize_panic_handler();

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut event_source = KeyboardEventSource;
    let res = run_shell(&mut terminal, &mut shell, &mut event_source);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down pdfdeck");
    Ok(())
}
