//! The terminal front end: draws a [`Viewer`] and feeds it input.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};
use flume::{Receiver, Sender, TryRecvError};
use log::{debug, info, warn};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};

use crate::command::DispatchOutcome;
use crate::event_source::EventSource;
use crate::plugins::{LoadError, LoadedDocument, load_document, spawn_load};
use crate::props::Props;
use crate::store::{GlobalState, StoreAction, UiCategory};
use crate::task::ignore;
use crate::theme::{Base16Palette, current_theme, current_theme_id, set_theme};
use crate::viewer::{COMMAND_MENU, RenderNode, Viewer, ViewerLayout, ViewportContent};

use super::command_menu::menu_entries;
use super::hud::HudMessage;
use super::keymap::{KeyAction, map_key};
use super::renderer::{HitTarget, RenderContext};

/// Pixels per terminal column when resolving slot breakpoints.
pub const CELL_WIDTH_PX: u32 = 8;

const PANEL_WIDTH: u16 = 28;
const PAGE_COLUMNS: f32 = 34.0;
const PAGE_ROWS: f32 = 22.0;

type LoadResult = Result<LoadedDocument, LoadError>;

pub struct Shell {
    viewer: Viewer,
    hits: Vec<HitTarget>,
    hud: Option<HudMessage>,
    notices_tx: Sender<HudMessage>,
    notices_rx: Receiver<HudMessage>,
    loader: Option<Receiver<LoadResult>>,
    search_input: Option<String>,
    menu_for: Option<String>,
    worker: bool,
    should_quit: bool,
}

impl Shell {
    pub fn new(viewer: Viewer) -> Self {
        let (notices_tx, notices_rx) = flume::unbounded();
        Self {
            viewer,
            hits: Vec::new(),
            hud: None,
            notices_tx,
            notices_rx,
            loader: None,
            search_input: None,
            menu_for: None,
            worker: true,
            should_quit: false,
        }
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut Viewer {
        &mut self.viewer
    }

    /// Sender for status messages from other threads.
    pub fn notifier(&self) -> Sender<HudMessage> {
        self.notices_tx.clone()
    }

    pub fn hud(&self) -> Option<&HudMessage> {
        self.hud.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn is_searching(&self) -> bool {
        self.search_input.is_some()
    }

    /// Starts loading `path` in the background. The viewport shows the
    /// document loading text until it arrives.
    pub fn open(&mut self, path: PathBuf) {
        info!("Opening {}", path.display());
        self.viewer.set_engine_loading(false);
        self.viewer.set_plugins_ready(false);
        if self.worker {
            self.loader = Some(spawn_load(path));
        } else {
            let result = load_document(&path);
            self.finish_load(result);
        }
    }

    /// Whether `open` loads on a background thread. On by default.
    pub fn set_worker(&mut self, worker: bool) {
        self.worker = worker;
    }

    /// Shows the viewer without a document.
    pub fn start_empty(&mut self) {
        self.viewer.set_engine_loading(false);
        self.viewer.set_plugins_ready(true);
    }

    /// Picks up finished loads, queued notices and HUD expiry. Returns true
    /// when something on screen changed.
    pub fn poll_background(&mut self) -> bool {
        let mut changed = false;

        if let Some(loader) = &self.loader {
            let outcome = match loader.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(LoadError::Disconnected)),
            };
            if let Some(result) = outcome {
                self.loader = None;
                self.finish_load(result);
                changed = true;
            }
        }

        while let Ok(notice) = self.notices_rx.try_recv() {
            self.hud = Some(notice);
            changed = true;
        }

        if self.hud.as_ref().is_some_and(HudMessage::is_expired) {
            self.hud = None;
            changed = true;
        }
        changed
    }

    fn finish_load(&mut self, result: LoadResult) {
        match result {
            Ok(document) => {
                let message = format!(
                    "Opened {} ({} pages)",
                    document.info.name, document.info.page_count
                );
                if let Some(plugins) = self.viewer.plugins() {
                    plugins.open_document(document);
                }
                self.hud = Some(HudMessage::info(message));
            }
            Err(err) => {
                warn!("Document load failed: {err}");
                self.hud = Some(HudMessage::error(err.to_string()));
            }
        }
        self.viewer.set_plugins_ready(true);
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                    self.handle_click(mouse.column, mouse.row);
                }
            }
            Event::Resize(_, _) => self.viewer.request_redraw(),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.search_input.is_some() {
            self.handle_search_key(key);
            return;
        }
        let state = self.viewer.snapshot();
        let menu_open = state.plugins.ui.command_menu().open;
        let Some(action) = map_key(&key, self.viewer.commands(), menu_open) else {
            return;
        };
        debug!("Key {:?} -> {action:?}", key.code);

        match action {
            KeyAction::Quit => self.should_quit = true,
            KeyAction::Command(id) => self.activate(&id, None),
            KeyAction::MenuUp => self.move_menu_cursor(&state, -1),
            KeyAction::MenuDown => self.move_menu_cursor(&state, 1),
            KeyAction::MenuConfirm => self.confirm_menu(&state),
            KeyAction::Dismiss => self.dismiss(&state),
            KeyAction::BeginSearch => self.begin_search(&state),
            KeyAction::CycleTheme => {
                set_theme(current_theme_id().next());
                self.hud = Some(HudMessage::info(format!("Theme: {}", current_theme_id().name())));
                self.viewer.request_redraw();
            }
        }
        self.sync_menu_cursor();
    }

    /// Activates whatever was drawn under the cursor last frame; a click
    /// outside an open command menu closes it.
    pub fn handle_click(&mut self, column: u16, row: u16) {
        let target = self
            .hits
            .iter()
            .rev()
            .find(|hit| hit.area.contains((column, row).into()))
            .cloned();
        match target {
            Some(hit) => self.activate(&hit.command_id, hit.trigger.as_deref()),
            None => {
                if self.viewer.snapshot().plugins.ui.command_menu().open {
                    self.viewer.close_command_menu();
                }
            }
        }
        self.sync_menu_cursor();
    }

    fn activate(&mut self, command_id: &str, trigger: Option<&str>) {
        let outcome = self.viewer.activate(command_id, trigger);
        let label = self
            .viewer
            .commands()
            .resolve(command_id)
            .map(|item| item.label(&self.viewer.snapshot()))
            .unwrap_or_else(|| command_id.to_string());
        match outcome {
            DispatchOutcome::Disabled => {
                self.hud = Some(HudMessage::info(format!("{label} is not available")));
            }
            DispatchOutcome::Unknown => {
                self.hud = Some(HudMessage::error(format!("Unknown command '{command_id}'")));
            }
            DispatchOutcome::Dispatched | DispatchOutcome::Hidden | DispatchOutcome::NoAction => {}
        }
    }

    fn menu_len(&self, state: &GlobalState) -> usize {
        state
            .plugins
            .ui
            .command_menu()
            .active_command
            .map_or(0, |menu| menu_entries(self.viewer.commands(), state, &menu).len())
    }

    fn menu_cursor(&self, state: &GlobalState) -> usize {
        self.viewer
            .component_props(COMMAND_MENU, state)
            .and_then(|p| p.u64("selected"))
            .unwrap_or(0) as usize
    }

    fn move_menu_cursor(&mut self, state: &GlobalState, delta: isize) {
        let len = self.menu_len(state);
        if len == 0 {
            return;
        }
        let current = self.menu_cursor(state).min(len - 1);
        let next = (current as isize + delta).rem_euclid(len as isize) as usize;
        self.viewer
            .patch_local(COMMAND_MENU, Props::new().with("selected", next));
    }

    fn confirm_menu(&mut self, state: &GlobalState) {
        let Some(menu) = state.plugins.ui.command_menu().active_command else {
            return;
        };
        let entries = menu_entries(self.viewer.commands(), state, &menu);
        let Some(entry) = entries.get(self.menu_cursor(state).min(entries.len().saturating_sub(1)))
        else {
            return;
        };
        let id = entry.command_id.clone();
        self.activate(&id, Some(COMMAND_MENU));
    }

    /// Resets the cursor whenever a different menu opens.
    fn sync_menu_cursor(&mut self) {
        let menu = self.viewer.snapshot().plugins.ui.command_menu();
        let current = menu.open.then_some(menu.active_command).flatten();
        if current != self.menu_for {
            self.viewer
                .patch_local(COMMAND_MENU, Props::new().with("selected", 0));
            self.menu_for = current;
        }
    }

    fn dismiss(&mut self, state: &GlobalState) {
        let ui = &state.plugins.ui;
        if ui.command_menu().open {
            self.viewer.close_command_menu();
        } else if ui.floating("printModal").bool("open") == Some(true) {
            if let Some(capability) = self.viewer.capabilities().ui() {
                capability.update_component_state(
                    UiCategory::Floating,
                    "printModal",
                    Props::new().with("open", false),
                );
            }
        }
    }

    fn begin_search(&mut self, state: &GlobalState) {
        let panel = state.plugins.ui.panel("rightPanel");
        if !(panel.open && panel.visible_child.as_deref() == Some("search")) {
            self.activate("search", None);
        }
        self.search_input = Some(state.plugins.search.query.clone());
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let Some(query) = self.search_input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.search_input = None;
                self.viewer.request_redraw();
                return;
            }
            KeyCode::Backspace => {
                query.pop();
            }
            KeyCode::Char(c) => query.push(c),
            KeyCode::Down | KeyCode::Up => {
                if let Some(search) = self.viewer.capabilities().search() {
                    if key.code == KeyCode::Down {
                        search.next_result();
                    } else {
                        search.previous_result();
                    }
                }
                return;
            }
            _ => return,
        }
        let query = query.clone();
        match self.viewer.capabilities().search() {
            Some(search) => search.search_all_pages(&query).wait(
                |hits| debug!("Search settled with {} hit(s)", hits.len()),
                ignore,
            ),
            None => {
                // Nothing can answer the query, so it settles with no hits.
                let store = self.viewer.store();
                store.dispatch(StoreAction::SetSearchQuery(query));
                store.dispatch(StoreAction::SetSearchResults(Vec::new()));
            }
        }
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let state = self.viewer.snapshot();
        let width_px = u32::from(area.width) * CELL_WIDTH_PX;
        let layout = self.viewer.layout_at(&state, width_px);
        let palette = current_theme();

        let buf = frame.buffer_mut();
        buf.set_style(area, Style::default().bg(palette.base_00).fg(palette.base_05));
        let mut cx = RenderContext::new(&self.viewer, &state, palette);
        draw_layout(&mut cx, &layout, area, buf, state.plugins.fullscreen.is_fullscreen);

        let status = Rect::new(area.x, area.bottom().saturating_sub(1), area.width, 1.min(area.height));
        draw_status(buf, status, palette, self.hud.as_ref(), self.search_input.as_deref());
        self.hits = cx.into_hits();
    }
}

/// Splits `area` into regions and renders every root of `layout`.
fn draw_layout(
    cx: &mut RenderContext<'_>,
    layout: &ViewerLayout,
    area: Rect,
    buf: &mut Buffer,
    fullscreen: bool,
) {
    // Last row is the status line.
    let mut body = Rect {
        height: area.height.saturating_sub(1),
        ..area
    };

    if !fullscreen {
        for node in &layout.headers.top {
            let height = cx.node_height(node).min(body.height);
            cx.render_node(node, Rect { height, ..body }, buf);
            body.y += height;
            body.height -= height;
        }
        for node in layout.headers.bottom.iter().rev() {
            let height = cx.node_height(node).min(body.height);
            body.height -= height;
            cx.render_node(node, Rect::new(body.x, body.bottom(), body.width, height), buf);
        }
        for node in &layout.headers.left {
            let width = cx.node_width(node).min(body.width);
            cx.render_node(node, Rect { width, ..body }, buf);
            body.x += width;
            body.width -= width;
        }
        for node in layout.headers.right.iter().rev() {
            let width = cx.node_width(node).min(body.width);
            body.width -= width;
            cx.render_node(node, Rect::new(body.right(), body.y, width, body.height), buf);
        }
        for node in &layout.panels.left {
            let width = PANEL_WIDTH.min(body.width / 2);
            cx.render_node(node, Rect { width, ..body }, buf);
            body.x += width;
            body.width -= width;
        }
        for node in &layout.panels.right {
            let width = PANEL_WIDTH.min(body.width / 2);
            body.width -= width;
            cx.render_node(node, Rect::new(body.right(), body.y, width, body.height), buf);
        }
    }

    draw_viewport(cx, &layout.viewport, body, buf);

    for node in &layout.floating.inside_scroller {
        let inset = Rect::new(
            body.x + 1,
            body.y + 1,
            body.width.saturating_sub(2),
            body.height.saturating_sub(2),
        );
        cx.render_node(node, inset, buf);
    }
    for node in &layout.floating.outside_scroller {
        draw_floating(cx, node, body, buf);
    }
    if let Some(menu) = &layout.command_menu {
        cx.render_node(menu, area, buf);
    }
}

/// Short floating surfaces sit on the viewport's last row; tall ones get
/// the whole viewport.
fn draw_floating(cx: &mut RenderContext<'_>, node: &RenderNode, viewport: Rect, buf: &mut Buffer) {
    let height = cx.node_height(node);
    if height > 1 {
        cx.render_node(node, viewport, buf);
    } else {
        let row = Rect::new(viewport.x, viewport.bottom().saturating_sub(1), viewport.width, 1);
        cx.render_node(node, row, buf);
    }
}

fn draw_viewport(cx: &mut RenderContext<'_>, content: &ViewportContent, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
        return;
    }
    let palette = cx.palette;
    match content {
        ViewportContent::Loading(text) => {
            let y = area.y + area.height / 2;
            let line = Line::from(Span::styled(
                *text,
                Style::default().fg(palette.base_04).add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center);
            let line_area = Rect::new(area.x, y, area.width, 1);
            Paragraph::new(line).render(line_area, buf);
        }
        ViewportContent::Pages {
            visible_pages,
            layers,
        } => {
            let state = cx.state;
            if state.core.document.is_none() {
                let y = area.y + area.height / 2;
                let line = Line::from("No document. Run pdfdeck <file.pdf>").centered();
                Paragraph::new(line).render(Rect::new(area.x, y, area.width, 1), buf);
                return;
            }
            let scale = state.plugins.zoom.current_zoom_level.max(0.1);
            let (mut w, mut h) = (PAGE_COLUMNS * scale, PAGE_ROWS * scale);
            if state.core.rotation.degrees() % 180 == 90 {
                std::mem::swap(&mut w, &mut h);
            }
            let count = visible_pages.len().max(1) as u16;
            let gap = u16::from(count > 1);
            let page_width = (w as u16).max(8).min(area.width.saturating_sub(gap) / count);
            let page_height = (h as u16).max(4).min(area.height);
            let total = page_width * count + gap;
            let mut x = area.x + area.width.saturating_sub(total) / 2;
            let y = area.y + area.height.saturating_sub(page_height) / 2;

            let layer_names: Vec<&str> = layers.iter().map(|l| l.as_str()).collect();
            for page in visible_pages {
                let page_area = Rect::new(x, y, page_width, page_height).intersection(area);
                let annotations = state
                    .plugins
                    .annotation
                    .pages
                    .get(&(page - 1))
                    .map_or(0, Vec::len);
                let block = Block::default()
                    .title(format!(" {page} "))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.base_04))
                    .style(Style::default().bg(palette.base_07).fg(palette.base_00));
                let inner = block.inner(page_area);
                block.render(page_area, buf);
                let mut text = vec![
                    Line::from(format!("Page {page}")).centered(),
                    Line::from(format!("{} deg, {:.0}%", state.core.rotation.degrees(), scale * 100.0))
                        .centered(),
                ];
                if annotations > 0 {
                    text.push(Line::from(format!("{annotations} annotation(s)")).centered());
                }
                text.push(Line::from(layer_names.join(" / ")).centered());
                Paragraph::new(text)
                    .wrap(Wrap { trim: true })
                    .render(inner, buf);
                x += page_width + gap;
            }
        }
    }
}

fn draw_status(
    buf: &mut Buffer,
    area: Rect,
    palette: &Base16Palette,
    hud: Option<&HudMessage>,
    search: Option<&str>,
) {
    if area.is_empty() {
        return;
    }
    let line = if let Some(query) = search {
        Line::from(vec![
            Span::styled("/", Style::default().fg(palette.base_0d)),
            Span::raw(query.to_string()),
            Span::styled("█", Style::default().fg(palette.base_04)),
        ])
    } else if let Some(hud) = hud {
        hud.styled_line(palette)
    } else {
        Line::from(Span::styled(
            "q quit  m menu  s sidebar  / search  +/- zoom  j/k page",
            Style::default().fg(palette.base_03),
        ))
    };
    Paragraph::new(line).render(area, buf);
}

/// Drives `shell` until it asks to quit, drawing only when something changed.
pub fn run_shell<B>(
    terminal: &mut Terminal<B>,
    shell: &mut Shell,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B: Backend,
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();
    loop {
        let mut events_processed = 0;
        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;
            shell.handle_event(event);
            if shell.should_quit() {
                break;
            }
        }
        if shell.should_quit() {
            info!("Shell exiting");
            return Ok(());
        }

        let mut needs_redraw = events_processed > 0;
        if last_tick.elapsed() >= tick_rate {
            needs_redraw |= shell.poll_background();
            last_tick = Instant::now();
        }
        // Store changes from other threads land here too.
        needs_redraw |= shell.viewer().take_redraw();

        if needs_redraw {
            terminal.draw(|f| shell.draw(f))?;
        }

        // Wait for input or the next tick.
        event_source.poll(tick_rate.saturating_sub(last_tick.elapsed()))?;
    }
}
