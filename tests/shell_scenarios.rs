use std::io::Write;

use pdfdeck::config::ViewerConfig;
use pdfdeck::event_source::{EventSource, SimulatedEventSource};
use pdfdeck::run_shell;
use pdfdeck::test_utils::test_helpers::{
    TestScenarioBuilder, capture_terminal_state, create_test_terminal, ready_shell,
    reference_viewer,
};
use pdfdeck::theme::{ThemeId, current_theme_id, set_theme};
use pdfdeck::tui::Shell;
use pdfdeck::viewer::ViewerPhase;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use serial_test::serial;
use tempfile::NamedTempFile;

const THREE_PAGES: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
    2 0 obj << /Type /Pages /Kids [3 0 R 4 0 R 5 0 R] /Count 3 >> endobj\n\
    3 0 obj << /Type /Page /Parent 2 0 R >> endobj\n\
    4 0 obj << /Type /Page /Parent 2 0 R >> endobj\n\
    5 0 obj << /Type /Page /Parent 2 0 R >> endobj\n%%EOF\n";

const TEXT_ON_PAGE_TWO: &[u8] = b"%PDF-1.4\n\
    3 0 obj << /Type /Page >> endobj\n\
    4 0 obj << /Type /Page /Contents 5 0 R >> endobj\n\
    5 0 obj << /Length 30 >> stream\nBT (Hello world) Tj ET\nendstream endobj\n%%EOF\n";

fn draw(terminal: &mut Terminal<TestBackend>, shell: &mut Shell) -> String {
    terminal.draw(|f| shell.draw(f)).unwrap();
    capture_terminal_state(terminal)
}

fn feed(shell: &mut Shell, mut events: SimulatedEventSource) {
    while events.remaining() > 0 {
        shell.handle_event(events.read().unwrap());
    }
}

/// Cell of the first occurrence of `needle` on screen.
fn locate(screen: &str, needle: &str) -> Option<(u16, u16)> {
    screen.lines().enumerate().find_map(|(row, line)| {
        line.find(needle).map(|byte| {
            let column = line[..byte].chars().count();
            (column as u16, row as u16)
        })
    })
}

fn open_document(shell: &mut Shell) -> NamedTempFile {
    open_bytes(shell, THREE_PAGES)
}

fn open_bytes(shell: &mut Shell, bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    shell.set_worker(false);
    shell.open(file.path().to_path_buf());
    file
}

#[test]
fn empty_viewer_draws_header_and_hint() {
    let mut terminal = create_test_terminal(120, 30);
    let mut shell = ready_shell(&ViewerConfig::default());

    let screen = draw(&mut terminal, &mut shell);
    assert!(screen.contains("Menu"), "{screen}");
    assert!(screen.contains("Sidebar"), "{screen}");
    assert!(screen.contains("No document"), "{screen}");
    assert!(screen.contains("q quit"), "{screen}");
}

#[test]
fn engine_loading_shows_loading_text() {
    let mut terminal = create_test_terminal(100, 20);
    let mut shell = Shell::new(reference_viewer(&ViewerConfig::default()));
    assert_eq!(shell.viewer().phase(), ViewerPhase::EngineLoading);

    let screen = draw(&mut terminal, &mut shell);
    assert!(screen.contains("Initializing PDF engine..."), "{screen}");
    assert!(!screen.contains("Sidebar"), "{screen}");
}

#[test]
fn menu_opens_and_confirms_with_keys() {
    let mut terminal = create_test_terminal(120, 30);
    let mut shell = ready_shell(&ViewerConfig::default());

    feed(&mut shell, TestScenarioBuilder::new().press_char('m').build());
    let screen = draw(&mut terminal, &mut shell);
    assert!(screen.contains("Download"), "{screen}");
    assert!(screen.contains("Enter full screen"), "{screen}");

    feed(
        &mut shell,
        TestScenarioBuilder::new().press_char('j').press_enter().build(),
    );
    let state = shell.viewer().snapshot();
    assert!(state.plugins.fullscreen.is_fullscreen);
    assert!(!state.plugins.ui.command_menu().open);

    let screen = draw(&mut terminal, &mut shell);
    assert!(!screen.contains("Sidebar"), "{screen}");
}

#[test]
fn escape_closes_the_menu() {
    let mut shell = ready_shell(&ViewerConfig::default());
    feed(&mut shell, TestScenarioBuilder::new().press_char('m').build());
    assert!(shell.viewer().snapshot().plugins.ui.command_menu().open);

    feed(&mut shell, TestScenarioBuilder::new().press_esc().build());
    assert!(!shell.viewer().snapshot().plugins.ui.command_menu().open);
}

#[test]
fn clicking_a_button_runs_its_command() {
    let mut terminal = create_test_terminal(120, 30);
    let mut shell = ready_shell(&ViewerConfig::default());

    let screen = draw(&mut terminal, &mut shell);
    let (column, row) = locate(&screen, "Sidebar").unwrap();
    feed(&mut shell, TestScenarioBuilder::new().click(column, row).build());

    let panel = shell.viewer().snapshot().plugins.ui.panel("leftPanel");
    assert!(panel.open);
    assert_eq!(panel.visible_child.as_deref(), Some("leftPanelMain"));
}

#[test]
fn clicking_outside_closes_the_menu() {
    let mut terminal = create_test_terminal(120, 30);
    let mut shell = ready_shell(&ViewerConfig::default());

    feed(&mut shell, TestScenarioBuilder::new().press_char('m').build());
    draw(&mut terminal, &mut shell);
    feed(&mut shell, TestScenarioBuilder::new().click(0, 28).build());
    assert!(!shell.viewer().snapshot().plugins.ui.command_menu().open);
}

#[test]
fn opened_document_pages_with_keys() {
    let mut terminal = create_test_terminal(120, 30);
    let mut shell = ready_shell(&ViewerConfig::default());
    let _file = open_document(&mut shell);
    assert_eq!(shell.viewer().phase(), ViewerPhase::Ready);

    let state = shell.viewer().snapshot();
    assert_eq!(state.core.document.as_ref().unwrap().page_count, 3);

    feed(&mut shell, TestScenarioBuilder::new().type_text("jj").build());
    assert_eq!(shell.viewer().snapshot().plugins.scroll.current_page, 3);
    feed(&mut shell, TestScenarioBuilder::new().press_char('j').build());
    assert_eq!(shell.viewer().snapshot().plugins.scroll.current_page, 3);

    let screen = draw(&mut terminal, &mut shell);
    assert!(screen.contains("3 / 3"), "{screen}");
}

#[test]
fn zoom_keys_change_the_scale() {
    let mut shell = ready_shell(&ViewerConfig::default());
    let _file = open_document(&mut shell);
    let before = shell.viewer().snapshot().plugins.zoom.current_zoom_level;

    feed(&mut shell, TestScenarioBuilder::new().press_char('+').build());
    let after = shell.viewer().snapshot().plugins.zoom.current_zoom_level;
    assert!(after > before, "{before} -> {after}");
}

#[test]
fn search_input_writes_the_query() {
    let mut shell = ready_shell(&ViewerConfig::default());
    feed(
        &mut shell,
        TestScenarioBuilder::new()
            .press_char('/')
            .type_text("pdf")
            .build(),
    );
    assert!(shell.is_searching());
    assert_eq!(shell.viewer().snapshot().plugins.search.query, "pdf");
    assert!(
        shell
            .viewer()
            .snapshot()
            .plugins
            .ui
            .panel("rightPanel")
            .open
    );

    feed(&mut shell, TestScenarioBuilder::new().press_enter().build());
    assert!(!shell.is_searching());
}

#[test]
fn search_without_hits_settles() {
    let mut terminal = create_test_terminal(120, 30);
    let mut shell = ready_shell(&ViewerConfig::default());
    let _file = open_document(&mut shell);

    feed(
        &mut shell,
        TestScenarioBuilder::new()
            .press_char('/')
            .type_text("pdf")
            .press_enter()
            .build(),
    );
    for _ in 0..5 {
        shell.poll_background();
    }

    let search = shell.viewer().snapshot().plugins.search.clone();
    assert_eq!(search.query, "pdf");
    assert!(!search.loading);
    assert!(search.results.is_empty());

    let screen = draw(&mut terminal, &mut shell);
    assert!(!screen.contains("Searching..."), "{screen}");
    assert!(screen.contains("0 result(s)"), "{screen}");
}

#[test]
fn search_hits_move_to_their_page() {
    let mut terminal = create_test_terminal(120, 30);
    let mut shell = ready_shell(&ViewerConfig::default());
    let _file = open_bytes(&mut shell, TEXT_ON_PAGE_TWO);

    feed(
        &mut shell,
        TestScenarioBuilder::new()
            .press_char('/')
            .type_text("WORLD")
            .build(),
    );

    let state = shell.viewer().snapshot();
    assert!(!state.plugins.search.loading);
    assert_eq!(state.plugins.search.results.len(), 1);
    assert_eq!(state.plugins.search.results[0].page_index, 1);
    assert_eq!(state.plugins.scroll.current_page, 2);

    let screen = draw(&mut terminal, &mut shell);
    assert!(screen.contains("1 result(s)"), "{screen}");
    assert!(screen.contains("p.2 Hello world"), "{screen}");
}

#[test]
fn run_shell_stops_on_quit() {
    let mut terminal = create_test_terminal(80, 24);
    let mut shell = ready_shell(&ViewerConfig::default());
    let mut events = TestScenarioBuilder::new().press_char('s').quit().build();

    run_shell(&mut terminal, &mut shell, &mut events).unwrap();

    assert!(shell.should_quit());
    assert!(shell.viewer().snapshot().plugins.ui.panel("leftPanel").open);
}

#[test]
#[serial]
fn theme_key_cycles_and_reports() {
    set_theme(ThemeId::OceanicNext);
    let mut shell = ready_shell(&ViewerConfig::default());

    feed(&mut shell, TestScenarioBuilder::new().press_char('t').build());
    assert_eq!(current_theme_id(), ThemeId::CatppuccinMocha);
    assert_eq!(shell.hud().unwrap().message, "Theme: Catppuccin Mocha");

    set_theme(ThemeId::OceanicNext);
}
