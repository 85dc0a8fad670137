//! Recording capability fakes and terminal helpers shared by unit and
//! integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::capability::{ExportCapability, HistoryCapability, ZoomCapability};
use crate::store::{Store, StoreAction, ZoomLevel};
use crate::task::Task;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Records every zoom request; mirrors scale requests into `store` if given.
#[derive(Default)]
pub struct RecordingZoom {
    store: Option<Arc<Store>>,
    requests: Mutex<Vec<ZoomLevel>>,
    marquee: AtomicBool,
    steps: AtomicUsize,
}

impl RecordingZoom {
    pub fn with_store(store: Arc<Store>) -> Self {
        Self {
            store: Some(store),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<ZoomLevel> {
        lock(&self.requests).clone()
    }

    /// Calls to `zoom_in` plus `zoom_out`.
    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }
}

impl ZoomCapability for RecordingZoom {
    fn request_zoom(&self, level: ZoomLevel) {
        lock(&self.requests).push(level);
        if let (Some(store), ZoomLevel::Scale(scale)) = (&self.store, level) {
            store.dispatch(StoreAction::SetZoom {
                level,
                current: scale,
            });
        }
    }

    fn zoom_in(&self) {
        self.steps.fetch_add(1, Ordering::SeqCst);
    }

    fn zoom_out(&self) {
        self.steps.fetch_add(1, Ordering::SeqCst);
    }

    fn is_marquee_zoom_active(&self) -> bool {
        self.marquee.load(Ordering::SeqCst)
    }

    fn enable_marquee_zoom(&self) {
        self.marquee.store(true, Ordering::SeqCst);
    }

    fn disable_marquee_zoom(&self) {
        self.marquee.store(false, Ordering::SeqCst);
    }
}

/// Counts downloads and hands out fixed bytes for `save_as_copy`.
#[derive(Default)]
pub struct RecordingExport {
    pub bytes: Vec<u8>,
    downloads: AtomicUsize,
    copies: AtomicUsize,
}

impl RecordingExport {
    pub fn with_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            ..Default::default()
        }
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn copies(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }
}

impl ExportCapability for RecordingExport {
    fn download(&self) {
        self.downloads.fetch_add(1, Ordering::SeqCst);
    }

    fn save_as_copy(&self) -> Task<Vec<u8>> {
        self.copies.fetch_add(1, Ordering::SeqCst);
        Task::resolved(self.bytes.clone())
    }
}

/// History whose flags tests set directly.
#[derive(Default)]
pub struct RecordingHistory {
    pub can_undo: AtomicBool,
    pub can_redo: AtomicBool,
    undos: AtomicUsize,
    redos: AtomicUsize,
}

impl RecordingHistory {
    pub fn undos(&self) -> usize {
        self.undos.load(Ordering::SeqCst)
    }

    pub fn redos(&self) -> usize {
        self.redos.load(Ordering::SeqCst)
    }
}

impl HistoryCapability for RecordingHistory {
    fn can_undo(&self) -> bool {
        self.can_undo.load(Ordering::SeqCst)
    }

    fn can_redo(&self) -> bool {
        self.can_redo.load(Ordering::SeqCst)
    }

    fn undo(&self) {
        self.undos.fetch_add(1, Ordering::SeqCst);
    }

    fn redo(&self) {
        self.redos.fetch_add(1, Ordering::SeqCst);
    }
}

pub mod test_helpers {
    use crate::config::ViewerConfig;
    use crate::event_source::{Event, KeyCode, SimulatedEventSource};
    use crate::tui::Shell;
    use crate::viewer::Viewer;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press_ctrl_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::ctrl_char_key(c));
            self
        }

        pub fn type_text(mut self, text: &str) -> Self {
            self.events.extend(SimulatedEventSource::typed(text));
            self
        }

        pub fn press_enter(mut self) -> Self {
            self.events.push(SimulatedEventSource::key(KeyCode::Enter));
            self
        }

        pub fn press_esc(mut self) -> Self {
            self.events.push(SimulatedEventSource::key(KeyCode::Esc));
            self
        }

        pub fn click(mut self, column: u16, row: u16) -> Self {
            self.events
                .push(SimulatedEventSource::left_click(column, row));
            self
        }

        pub fn quit(mut self) -> Self {
            self.events.push(SimulatedEventSource::char_key('q'));
            self
        }

        pub fn len(&self) -> usize {
            self.events.len()
        }

        pub fn is_empty(&self) -> bool {
            self.events.is_empty()
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// A viewer on the reference plugins with every default renderer.
    pub fn reference_viewer(config: &ViewerConfig) -> Viewer {
        let mut viewer = Viewer::with_reference_plugins(config, None).unwrap();
        viewer.register_default_renderers();
        viewer
    }

    /// A shell past the loading phases, with no document.
    pub fn ready_shell(config: &ViewerConfig) -> Shell {
        let mut shell = Shell::new(reference_viewer(config));
        shell.start_empty();
        shell
    }

    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Buffer contents, one trimmed line per row, trailing blank rows dropped.
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }
}
