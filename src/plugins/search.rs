//! Full-text search over the text-showing operators of the loaded document.
//!
//! Text is pulled from `Tj`, `'`, `"` and `TJ` operators in uncompressed
//! content. Each run belongs to the last page object that precedes it in the
//! file; text ahead of the first page object goes to the first page.

use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use log::{debug, warn};
use regex::RegexBuilder;
use regex::bytes::Regex;

use crate::capability::SearchCapability;
use crate::store::{SearchHit, Store, StoreAction};
use crate::task::Task;

use super::loader::page_offsets;

/// A `[...] TJ` array or a `(...) Tj` string.
static TEXT_OPERATOR: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?s-u)\[((?:[^\]\\]|\\.)*)\]\s*TJ|\(((?:[^()\\]|\\.)*)\)\s*(?:Tj|'|")"#).ok()
});

/// Literal strings inside a `TJ` array.
static LITERAL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s-u)\(((?:[^()\\]|\\.)*)\)").ok());

/// Characters of context kept on each side of a match.
const EXCERPT_CONTEXT: usize = 20;

fn unescape(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter().copied();
    while let Some(b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match bytes.next() {
            Some(b'n' | b'r' | b't') => out.push(b' '),
            Some(other) => out.push(other),
            None => {}
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Text of each page, `page_count` entries long.
pub fn extract_page_text(bytes: &[u8], page_count: usize) -> Vec<String> {
    let mut pages = vec![String::new(); page_count.max(1)];
    let (Some(operator), Some(literal)) = (TEXT_OPERATOR.as_ref(), LITERAL.as_ref()) else {
        return pages;
    };
    let starts = page_offsets(bytes);

    for caps in operator.captures_iter(bytes) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let text = match (caps.get(1), caps.get(2)) {
            (Some(array), _) => literal
                .captures_iter(array.as_bytes())
                .filter_map(|c| c.get(1))
                .map(|s| unescape(s.as_bytes()))
                .collect::<String>(),
            (None, Some(string)) => unescape(string.as_bytes()),
            (None, None) => continue,
        };
        let page = starts
            .iter()
            .take_while(|start| **start <= whole.start())
            .count()
            .saturating_sub(1)
            .min(pages.len() - 1);
        let target = &mut pages[page];
        if !target.is_empty() {
            target.push(' ');
        }
        target.push_str(&text);
    }
    pages
}

fn excerpt(text: &str, start: usize, end: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(EXCERPT_CONTEXT - 1)
        .map_or(0, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(EXCERPT_CONTEXT)
        .map_or(text.len(), |(i, _)| end + i);
    text[from..to].trim().to_string()
}

/// Case-insensitive matches of `query` in `pages`, in page order.
pub fn find_hits(pages: &[String], query: &str) -> Vec<SearchHit> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let matcher = match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(matcher) => matcher,
        Err(e) => {
            warn!("Search query rejected: {e}");
            return Vec::new();
        }
    };

    pages
        .iter()
        .enumerate()
        .flat_map(|(page_index, text)| {
            matcher.find_iter(text).map(move |m| SearchHit {
                page_index,
                excerpt: excerpt(text, m.start(), m.end()),
            })
        })
        .collect()
}

/// Searches the loaded document and keeps the result cursor in the store.
pub struct SearchPlugin {
    store: Arc<Store>,
    pages: Mutex<Vec<String>>,
}

impl SearchPlugin {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            pages: Mutex::new(Vec::new()),
        }
    }

    pub fn set_document(&self, bytes: &[u8], page_count: usize) {
        let pages = extract_page_text(bytes, page_count);
        debug!(
            "Indexed {} page(s), {} with text",
            pages.len(),
            pages.iter().filter(|p| !p.is_empty()).count()
        );
        *self.pages.lock().unwrap_or_else(PoisonError::into_inner) = pages;
    }

    pub fn clear_document(&self) {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.stop_search();
    }

    fn step(&self, forward: bool) {
        let state = self.store.snapshot();
        let search = &state.plugins.search;
        let len = search.results.len();
        if len == 0 {
            return;
        }
        let next = match (search.active_result_index, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        self.store
            .dispatch(StoreAction::SetActiveSearchResult(Some(next)));
        let page = search.results[next].page_index + 1;
        self.store.dispatch(StoreAction::SetCurrentPage(page));
    }
}

impl SearchCapability for SearchPlugin {
    fn search_all_pages(&self, query: &str) -> Task<Vec<SearchHit>> {
        self.store
            .dispatch(StoreAction::SetSearchQuery(query.to_string()));
        let hits = {
            let pages = self.pages.lock().unwrap_or_else(PoisonError::into_inner);
            find_hits(&pages, query)
        };
        debug!("Search '{query}': {} hit(s)", hits.len());
        self.store
            .dispatch(StoreAction::SetSearchResults(hits.clone()));
        if let Some(first) = hits.first() {
            self.store
                .dispatch(StoreAction::SetCurrentPage(first.page_index + 1));
        }
        Task::resolved(hits)
    }

    fn next_result(&self) {
        self.step(true);
    }

    fn previous_result(&self) {
        self.step(false);
    }

    fn stop_search(&self) {
        self.store.dispatch(StoreAction::SetSearchQuery(String::new()));
    }
}
