//! Opens a document and reads the little metadata the viewer needs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::thread;

use flume::Receiver;
use log::{debug, info};
use regex::bytes::Regex;
use thiserror::Error;
use uuid::Uuid;

use crate::perf;
use crate::store::DocumentInfo;

/// Matches page objects, not the `/Pages` tree nodes.
static PAGE_OBJECT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/Type\s*/Page(?-u:[^s]|$)").ok());

static PDF_HEADER: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not a PDF document")]
    NotPdf(PathBuf),

    #[error("loader thread exited before reporting")]
    Disconnected,
}

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub info: DocumentInfo,
    pub bytes: Arc<Vec<u8>>,
}

pub fn count_pages(bytes: &[u8]) -> usize {
    PAGE_OBJECT
        .as_ref()
        .map_or(0, |re| re.find_iter(bytes).count())
}

/// Byte offset of every page object, in file order.
pub fn page_offsets(bytes: &[u8]) -> Vec<usize> {
    PAGE_OBJECT
        .as_ref()
        .map_or_else(Vec::new, |re| re.find_iter(bytes).map(|m| m.start()).collect())
}

pub fn load_document(path: &Path) -> Result<LoadedDocument, LoadError> {
    let _span = perf::span(format!("load {}", path.display()));
    let bytes = fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if !bytes.starts_with(PDF_HEADER) {
        return Err(LoadError::NotPdf(path.to_path_buf()));
    }

    let page_count = count_pages(&bytes).max(1);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    info!("Loaded {name}: {page_count} page(s), {} bytes", bytes.len());

    Ok(LoadedDocument {
        info: DocumentInfo {
            id: Uuid::new_v4().to_string(),
            name,
            page_count,
            size_bytes: bytes.len(),
        },
        bytes: Arc::new(bytes),
    })
}

/// Loads `path` on a worker thread; the result arrives on the returned channel.
pub fn spawn_load(path: PathBuf) -> Receiver<Result<LoadedDocument, LoadError>> {
    let (tx, rx) = flume::bounded(1);
    thread::spawn(move || {
        debug!("Loader thread started for {}", path.display());
        let result = load_document(&path);
        if tx.send(result).is_err() {
            debug!("Loader result dropped, receiver gone");
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TWO_PAGES: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
        2 0 obj << /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 >> endobj\n\
        3 0 obj << /Type /Page /Parent 2 0 R >> endobj\n\
        4 0 obj << /Type/Page /Parent 2 0 R >> endobj\n%%EOF";

    fn write_temp(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn counts_page_objects_only() {
        assert_eq!(count_pages(TWO_PAGES), 2);
        assert_eq!(count_pages(b"nothing here"), 0);
        let offsets = page_offsets(TWO_PAGES);
        assert_eq!(offsets.len(), 2);
        assert!(offsets[0] < offsets[1]);
    }

    #[test]
    fn loads_document_info() {
        let file = write_temp(TWO_PAGES);
        let doc = load_document(file.path()).unwrap();
        assert_eq!(doc.info.page_count, 2);
        assert_eq!(doc.info.size_bytes, TWO_PAGES.len());
        assert_eq!(doc.bytes.len(), TWO_PAGES.len());
    }

    #[test]
    fn rejects_non_pdf() {
        let file = write_temp(b"hello");
        assert!(matches!(load_document(file.path()), Err(LoadError::NotPdf(_))));
    }

    #[test]
    fn worker_reports_through_channel() {
        let file = write_temp(TWO_PAGES);
        let rx = spawn_load(file.path().to_path_buf());
        let doc = rx.recv().unwrap().unwrap();
        assert_eq!(doc.info.page_count, 2);
    }
}
