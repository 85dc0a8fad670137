use std::sync::Arc;

use log::{debug, warn};

use crate::capability::SelectionCapability;
use crate::store::{FormattedSelection, Store, StoreAction};
use crate::task::{Task, TaskError};

/// Text selection held in the store; the shell feeds it, commands read it.
pub struct SelectionPlugin {
    store: Arc<Store>,
}

impl SelectionPlugin {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Replaces the selection with `ranges` covering `text`.
    pub fn select(&self, ranges: Vec<FormattedSelection>, text: Vec<String>) {
        debug!("Selected {} range(s)", ranges.len());
        self.store.dispatch(StoreAction::SetSelection { ranges, text });
    }

    pub fn set_selecting(&self, selecting: bool) {
        self.store.dispatch(StoreAction::SetSelecting(selecting));
    }
}

impl SelectionCapability for SelectionPlugin {
    fn formatted_selection(&self) -> Vec<FormattedSelection> {
        self.store.snapshot().plugins.selection.ranges.clone()
    }

    fn selected_text(&self) -> Task<Vec<String>> {
        let snapshot = self.store.snapshot();
        let selection = &snapshot.plugins.selection;
        if selection.is_empty() {
            return Task::rejected(TaskError::generic("nothing is selected"));
        }
        Task::resolved(selection.text.clone())
    }

    fn copy_to_clipboard(&self) {
        let task = self.selected_text();
        task.wait(
            |lines| {
                let text = lines.join("\n");
                match arboard::Clipboard::new() {
                    Ok(mut clipboard) => match clipboard.set_text(text) {
                        Ok(()) => debug!("Successfully copied selected text to clipboard"),
                        Err(e) => warn!("Failed to copy text to clipboard: {e}"),
                    },
                    Err(e) => warn!("Failed to access clipboard: {e}"),
                }
            },
            |e| debug!("Nothing to copy: {e}"),
        );
    }

    fn clear(&self) {
        self.store.dispatch(StoreAction::ClearSelection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PageRect;
    use std::sync::Mutex;

    fn range(page: usize) -> FormattedSelection {
        FormattedSelection {
            page_index: page,
            rect: PageRect::new(0.0, 0.0, 100.0, 12.0),
            segment_rects: vec![PageRect::new(0.0, 0.0, 100.0, 12.0)],
        }
    }

    #[test]
    fn empty_selection_rejects_text_task() {
        let plugin = SelectionPlugin::new(Arc::new(Store::default()));
        let failed = Arc::new(Mutex::new(false));
        let flag = failed.clone();
        plugin
            .selected_text()
            .wait(|_| {}, move |_| *flag.lock().unwrap() = true);
        assert!(*failed.lock().unwrap());
    }

    #[test]
    fn select_then_clear() {
        let store = Arc::new(Store::default());
        let plugin = SelectionPlugin::new(store.clone());
        plugin.select(vec![range(0), range(1)], vec!["one".into(), "two".into()]);

        assert_eq!(plugin.formatted_selection().len(), 2);
        let text = Arc::new(Mutex::new(Vec::new()));
        let sink = text.clone();
        plugin
            .selected_text()
            .wait(move |lines| *sink.lock().unwrap() = lines, |_| {});
        assert_eq!(*text.lock().unwrap(), vec!["one", "two"]);

        plugin.clear();
        assert!(store.snapshot().plugins.selection.is_empty());
    }
}
