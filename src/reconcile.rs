use crate::json_utils::{KeyPath, flatten_entries, merge_at_path, to_pretty};
use crate::store::{ChangeEvent, Document, DocumentStore, Origin};
use anyhow::Result;
use indexmap::IndexMap;

/// One default-language leaf with its best-known translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub path: KeyPath,
    pub source: String,
    pub translated: String,
}

impl Row {
    /// The "no input" flag: empty or whitespace-only counts as missing.
    pub fn is_translated(&self) -> bool {
        !self.translated.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Completion {
    pub translated: usize,
    pub total: usize,
}

impl Completion {
    pub fn percent_label(&self) -> String {
        if self.total == 0 {
            // 0/0 would render NaN; show a defined sentinel instead
            return "—".to_string();
        }
        format!("{:.2}%", self.translated as f64 / self.total as f64 * 100.0)
    }

    pub fn summary(&self) -> String {
        format!("{}/{} ({})", self.translated, self.total, self.percent_label())
    }
}

/// What a change event cost the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Rows were torn down and rebuilt; path identities may have changed.
    Rebuilt,
    /// Only translated values and the metric moved. Row identity survived,
    /// and with it any focus/caret state a UI hangs off the rows.
    ValuesOnly,
}

/// Derived row state joining the default document's leaves with their
/// translations. Purely ephemeral: rebuilt from the store on demand, never
/// persisted.
pub struct ReconciliationView {
    rows: Vec<Row>,
    completion: Completion,
}

impl ReconciliationView {
    pub fn new(store: &DocumentStore) -> Self {
        let mut view = Self {
            rows: Vec::new(),
            completion: Completion::default(),
        };
        view.rebuild(store);
        view
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    /// A live edit of the translated document alone refreshes translated
    /// values and the metric in place. Anything else (either document
    /// replaced wholesale, or the default document touched at all) rebuilds
    /// the rows, since path identities may have changed.
    pub fn apply_change(&mut self, store: &DocumentStore, event: &ChangeEvent) -> Refresh {
        match (event.document, event.origin) {
            (Document::Translated, Origin::LiveEdit) => {
                self.refresh_values(store);
                Refresh::ValuesOnly
            }
            _ => {
                self.rebuild(store);
                Refresh::Rebuilt
            }
        }
    }

    fn rebuild(&mut self, store: &DocumentStore) {
        let defaults = flatten_entries(&store.parsed(Document::Default));
        let translations = translation_table(store);
        self.completion = Completion {
            translated: translations.len(),
            total: defaults.len(),
        };
        self.rows = defaults
            .into_iter()
            .map(|entry| {
                let translated = translations.get(&entry.path).cloned().unwrap_or_default();
                Row { path: entry.path, source: entry.value, translated }
            })
            .collect();
    }

    fn refresh_values(&mut self, store: &DocumentStore) {
        let translations = translation_table(store);
        self.completion = Completion {
            translated: translations.len(),
            total: self.rows.len(),
        };
        for row in self.rows.iter_mut() {
            row.translated = translations.get(&row.path).cloned().unwrap_or_default();
        }
    }

    /// Row edit handler: trims the input, merges it into the current
    /// translated tree (empty input deletes the key) and writes the pretty
    /// form back as a live edit.
    pub fn edit_row(store: &mut DocumentStore, path: &KeyPath, input: &str) -> Result<()> {
        let mut tree = store.parsed(Document::Translated);
        merge_at_path(&mut tree, path, Some(input));
        let raw = to_pretty(&tree)?;
        store.set(Document::Translated, &raw, Origin::LiveEdit)
    }
}

// Path → value for every leaf of the translated document, in document order.
// Counts orphans too: a translated leaf with no default counterpart still
// shows up in the metric, same as it always has.
fn translation_table(store: &DocumentStore) -> IndexMap<KeyPath, String> {
    flatten_entries(&store.parsed(Document::Translated))
        .into_iter()
        .map(|entry| (entry.path, entry.value))
        .collect()
}
