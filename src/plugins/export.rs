use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use log::{error, info};

use crate::capability::ExportCapability;
use crate::task::{Task, TaskError};

struct ExportSource {
    name: String,
    bytes: Arc<Vec<u8>>,
}

/// Hands out copies of the loaded document's bytes.
pub struct ExportPlugin {
    source: Mutex<Option<ExportSource>>,
    target_dir: Option<PathBuf>,
}

impl Default for ExportPlugin {
    fn default() -> Self {
        Self::new(dirs::download_dir())
    }
}

impl ExportPlugin {
    /// `target_dir` receives downloads; `None` uses the working directory.
    pub fn new(target_dir: Option<PathBuf>) -> Self {
        Self {
            source: Mutex::new(None),
            target_dir,
        }
    }

    pub fn set_document(&self, name: &str, bytes: Arc<Vec<u8>>) {
        let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        *source = Some(ExportSource {
            name: name.to_string(),
            bytes,
        });
    }

    pub fn clear_document(&self) {
        *self.source.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn download_path(&self, name: &str) -> PathBuf {
        match &self.target_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

impl ExportCapability for ExportPlugin {
    fn download(&self) {
        let source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(source) = source.as_ref() else {
            error!("Download requested with no document loaded");
            return;
        };
        let path = self.download_path(&source.name);
        match fs::write(&path, source.bytes.as_slice()) {
            Ok(()) => info!("Downloaded {} bytes to {}", source.bytes.len(), path.display()),
            Err(e) => error!("Failed to write {}: {e}", path.display()),
        }
    }

    fn save_as_copy(&self) -> Task<Vec<u8>> {
        let source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        match source.as_ref() {
            Some(source) => Task::resolved(source.bytes.as_ref().clone()),
            None => Task::rejected(TaskError::Unavailable("document".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copy_fails_without_document() {
        let plugin = ExportPlugin::new(None);
        let error = Arc::new(Mutex::new(None));
        let sink = error.clone();
        plugin
            .save_as_copy()
            .wait(|_| {}, move |e| *sink.lock().unwrap() = Some(e));
        assert_eq!(
            *error.lock().unwrap(),
            Some(TaskError::Unavailable("document".into()))
        );
    }

    #[test]
    fn download_writes_document_bytes() {
        let dir = TempDir::new().unwrap();
        let plugin = ExportPlugin::new(Some(dir.path().to_path_buf()));
        plugin.set_document("book.pdf", Arc::new(b"%PDF-1.7".to_vec()));

        plugin.download();
        let written = fs::read(dir.path().join("book.pdf")).unwrap();
        assert_eq!(written, b"%PDF-1.7");

        let copy = Arc::new(Mutex::new(Vec::new()));
        let sink = copy.clone();
        plugin
            .save_as_copy()
            .wait(move |bytes| *sink.lock().unwrap() = bytes, |_| {});
        assert_eq!(copy.lock().unwrap().as_slice(), b"%PDF-1.7");
    }
}
