//! Style-variable sinks
//!
//! A sink is a flat key/value namespace shared by every module. Writes are
//! last-write-wins per key; callers keep to their own key prefixes.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Write end of the global style-variable namespace
pub trait VisualSink: Send + Sync {
    /// Set `key` to `value`. Keys carry no leading `--`.
    fn set(&self, key: &str, value: &str);

    /// Called once after a batch of writes
    fn flush(&self) {}
}

impl<S: VisualSink + ?Sized> VisualSink for Arc<S> {
    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn flush(&self) {
        (**self).flush()
    }
}

impl<S: VisualSink + ?Sized> VisualSink for &S {
    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn flush(&self) {
        (**self).flush()
    }
}

/// In-memory sink. The revision counter moves only when a value changes.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: DashMap<String, String>,
    revision: AtomicU64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    /// Ordered copy of every entry
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Number of effective changes so far
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VisualSink for MemorySink {
    fn set(&self, key: &str, value: &str) {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get() == value {
                    return;
                }
                entry.insert(value.to_string());
            }
            Entry::Vacant(entry) => {
                entry.insert(value.to_string());
            }
        }
        self.revision.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sink rendered as a `:root { --key: value; }` stylesheet on disk
///
/// The file is rewritten on `flush` only when some value changed since the
/// last write.
pub struct StylesheetSink {
    path: PathBuf,
    state: Mutex<SheetState>,
}

#[derive(Default)]
struct SheetState {
    entries: BTreeMap<String, String>,
    dirty: bool,
}

impl StylesheetSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(SheetState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> BTreeMap<String, String> {
        self.state.lock().entries.clone()
    }

    fn render(entries: &BTreeMap<String, String>) -> String {
        let mut css = String::from(":root {\n");
        for (key, value) in entries {
            css.push_str(&format!("  --{}: {};\n", key, value));
        }
        css.push_str("}\n");
        css
    }

    fn write(&self, css: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("css.tmp");
        std::fs::write(&tmp, css)?;
        std::fs::rename(&tmp, &self.path)
    }
}

impl VisualSink for StylesheetSink {
    fn set(&self, key: &str, value: &str) {
        let mut state = self.state.lock();
        if state.entries.get(key).map(String::as_str) == Some(value) {
            return;
        }
        state.entries.insert(key.to_string(), value.to_string());
        state.dirty = true;
    }

    fn flush(&self) {
        let mut state = self.state.lock();
        if !state.dirty {
            return;
        }

        let css = Self::render(&state.entries);
        match self.write(&css) {
            Ok(()) => {
                state.dirty = false;
                debug!("Wrote {} style variables to {:?}", state.entries.len(), self.path);
            }
            Err(e) => warn!("Failed to write stylesheet {:?}: {}", self.path, e),
        }
    }
}
