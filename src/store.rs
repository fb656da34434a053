use crate::json_utils::parse_document;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Sample written into the default-language slot the first time the store is
/// opened over empty storage.
pub const SEED_DEFAULT_DOCUMENT: &str = "{\n  \"loginPage\": {\n    \"title\": \"Login to continue\",\n    \"username\": \"Username\",\n    \"password\": \"Password\"\n  }\n}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    Default,
    Translated,
}

impl Document {
    /// Storage slot key for this document.
    pub fn key(self) -> &'static str {
        match self {
            Document::Default => "defaultLanguage",
            Document::Translated => "translatedLanguage",
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where a write came from. Live per-entry edits let consumers refresh in
/// place instead of tearing derived state down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    External,
    LiveEdit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub document: Document,
    pub origin: Origin,
}

/// Named string slots. A missing key reads as empty, never as an error.
pub trait TextStorage {
    fn get(&self, key: &str) -> String;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextStorage for MemoryStorage {
    fn get(&self, key: &str) -> String {
        self.slots.get(key).cloned().unwrap_or_default()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per slot. Writes go through a temp file and rename so a crash
/// mid-write never leaves a half document behind.
#[derive(Debug)]
pub struct FileStorage {
    paths: HashMap<String, PathBuf>,
}

impl FileStorage {
    pub fn new(paths: HashMap<String, PathBuf>) -> Self {
        Self { paths }
    }
}

impl TextStorage for FileStorage {
    fn get(&self, key: &str) -> String {
        self.paths
            .get(key)
            .and_then(|path| fs::read_to_string(path).ok())
            .unwrap_or_default()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let Some(path) = self.paths.get(key) else {
            warn!(key = %key, "No file mapped for storage key, dropping write");
            return Ok(());
        };
        let tmp_path = path.with_extension("tmp");
        // backup
        let bak_path = path.with_extension("bak");
        if path.exists() && !bak_path.exists() {
            fs::copy(path, &bak_path).ok();
        }
        fs::write(&tmp_path, value).with_context(|| format!("Writing {:?}", tmp_path))?;
        fs::rename(&tmp_path, path).with_context(|| format!("Renaming into {:?}", path))?;
        Ok(())
    }
}

pub type ListenerId = usize;

struct Listener {
    id: ListenerId,
    callback: Box<dyn FnMut(&ChangeEvent)>,
}

/// Owns the two language documents. All mutation goes through `set`, which
/// persists first and then notifies every registered listener, so listeners
/// always observe the final stored value.
pub struct DocumentStore {
    storage: Box<dyn TextStorage>,
    listeners: Vec<Listener>,
    next_listener: ListenerId,
}

impl DocumentStore {
    /// Opens the store, seeding the default-language slot with the built-in
    /// sample when it is empty. The seed goes straight to the backend: no
    /// listener can be registered yet, so no notification fires for it.
    pub fn new(mut storage: Box<dyn TextStorage>) -> Result<Self> {
        if storage.get(Document::Default.key()).is_empty() {
            storage
                .set(Document::Default.key(), SEED_DEFAULT_DOCUMENT)
                .context("Seeding default language document")?;
        }
        Ok(Self {
            storage,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    pub fn raw(&self, document: Document) -> String {
        self.storage.get(document.key())
    }

    /// Parsed form of a document; malformed intermediate JSON degrades to an
    /// empty object so derived state stays usable while the user types.
    pub fn parsed(&self, document: Document) -> Value {
        parse_document(&self.raw(document))
    }

    /// JSON parseability signal. An empty document counts as valid: nothing
    /// has been typed yet, which is not the same as broken input.
    pub fn is_valid(&self, document: Document) -> bool {
        let raw = self.raw(document);
        raw.is_empty() || serde_json::from_str::<Value>(&raw).is_ok()
    }

    pub fn set(&mut self, document: Document, raw: &str, origin: Origin) -> Result<()> {
        self.storage.set(document.key(), raw)?;
        let event = ChangeEvent { document, origin };
        for listener in self.listeners.iter_mut() {
            (listener.callback)(&event);
        }
        Ok(())
    }

    pub fn on_update(&mut self, callback: Box<dyn FnMut(&ChangeEvent)>) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push(Listener { id, callback });
        id
    }

    pub fn off_update(&mut self, id: ListenerId) {
        self.listeners.retain(|listener| listener.id != id);
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_utils::flatten_entries;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn memory_store() -> DocumentStore {
        DocumentStore::new(Box::new(MemoryStorage::new())).unwrap()
    }

    #[test]
    fn missing_slot_reads_as_empty() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("nope"), "");
    }

    #[test]
    fn fresh_store_seeds_the_default_document() {
        let store = memory_store();
        assert_eq!(store.raw(Document::Default), SEED_DEFAULT_DOCUMENT);

        let entries = flatten_entries(&store.parsed(Document::Default));
        let pairs: Vec<(String, String)> = entries
            .iter()
            .map(|e| (e.path.to_string(), e.value.clone()))
            .collect();
        assert_eq!(
            pairs,
            [
                ("loginPage.title".to_string(), "Login to continue".to_string()),
                ("loginPage.username".to_string(), "Username".to_string()),
                ("loginPage.password".to_string(), "Password".to_string()),
            ]
        );
    }

    #[test]
    fn existing_default_document_is_not_overwritten() {
        let mut storage = MemoryStorage::new();
        storage.set(Document::Default.key(), "{\"kept\": \"yes\"}").unwrap();
        let store = DocumentStore::new(Box::new(storage)).unwrap();
        assert_eq!(store.raw(Document::Default), "{\"kept\": \"yes\"}");
    }

    #[test]
    fn set_persists_before_notifying() {
        let mut store = memory_store();
        let seen: Rc<RefCell<Vec<ChangeEvent>>> = Rc::default();
        let sink = seen.clone();
        store.on_update(Box::new(move |event| sink.borrow_mut().push(*event)));

        store
            .set(Document::Translated, "{\"a\": \"b\"}", Origin::LiveEdit)
            .unwrap();

        assert_eq!(store.raw(Document::Translated), "{\"a\": \"b\"}");
        assert_eq!(
            *seen.borrow(),
            [ChangeEvent { document: Document::Translated, origin: Origin::LiveEdit }]
        );
    }

    #[test]
    fn seeding_fires_no_notification() {
        let mut store = memory_store();
        let count: Rc<RefCell<usize>> = Rc::default();
        let sink = count.clone();
        store.on_update(Box::new(move |_| *sink.borrow_mut() += 1));
        assert_eq!(*count.borrow(), 0);

        store.set(Document::Default, "{}", Origin::External).unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn every_listener_hears_every_set() {
        let mut store = memory_store();
        let first: Rc<RefCell<usize>> = Rc::default();
        let second: Rc<RefCell<usize>> = Rc::default();
        let a = first.clone();
        let b = second.clone();
        store.on_update(Box::new(move |_| *a.borrow_mut() += 1));
        store.on_update(Box::new(move |_| *b.borrow_mut() += 1));

        store.set(Document::Translated, "{}", Origin::External).unwrap();
        assert_eq!((*first.borrow(), *second.borrow()), (1, 1));
    }

    #[test]
    fn removed_listeners_stop_hearing() {
        let mut store = memory_store();
        let count: Rc<RefCell<usize>> = Rc::default();
        let sink = count.clone();
        let id = store.on_update(Box::new(move |_| *sink.borrow_mut() += 1));

        store.set(Document::Translated, "a", Origin::External).unwrap();
        store.off_update(id);
        store.set(Document::Translated, "b", Origin::External).unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn clear_listeners_tears_everything_down() {
        let mut store = memory_store();
        let count: Rc<RefCell<usize>> = Rc::default();
        let sink = count.clone();
        store.on_update(Box::new(move |_| *sink.borrow_mut() += 1));
        store.clear_listeners();
        store.set(Document::Translated, "x", Origin::External).unwrap();
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn validity_signal_flags_broken_json_only() {
        let mut store = memory_store();
        assert!(store.is_valid(Document::Translated)); // empty, not broken
        store.set(Document::Translated, "{bad json", Origin::External).unwrap();
        assert!(!store.is_valid(Document::Translated));
        assert_eq!(store.parsed(Document::Translated), json!({}));
        store.set(Document::Translated, "{\"a\": \"b\"}", Origin::External).unwrap();
        assert!(store.is_valid(Document::Translated));
    }

    #[test]
    fn file_storage_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("es-ES.json");
        let paths = HashMap::from([(Document::Translated.key().to_string(), path.clone())]);

        let mut storage = FileStorage::new(paths.clone());
        assert_eq!(storage.get(Document::Translated.key()), "");

        storage.set(Document::Translated.key(), "{\"a\": \"b\"}").unwrap();
        assert_eq!(storage.get(Document::Translated.key()), "{\"a\": \"b\"}");
        assert!(!path.with_extension("tmp").exists());

        // a second writer over the same files sees the persisted value
        let reopened = FileStorage::new(paths);
        assert_eq!(reopened.get(Document::Translated.key()), "{\"a\": \"b\"}");
    }

    #[test]
    fn file_storage_keeps_a_one_time_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("es-ES.json");
        let paths = HashMap::from([(Document::Translated.key().to_string(), path.clone())]);

        let mut storage = FileStorage::new(paths);
        storage.set(Document::Translated.key(), "first").unwrap();
        storage.set(Document::Translated.key(), "second").unwrap();
        storage.set(Document::Translated.key(), "third").unwrap();

        assert_eq!(fs::read_to_string(path.with_extension("bak")).unwrap(), "first");
    }

    #[test]
    fn store_over_file_storage_seeds_on_first_open() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HashMap::from([
            (Document::Default.key().to_string(), dir.path().join("en-GB.json")),
            (Document::Translated.key().to_string(), dir.path().join("es-ES.json")),
        ]);
        let store = DocumentStore::new(Box::new(FileStorage::new(paths))).unwrap();
        assert_eq!(store.raw(Document::Default), SEED_DEFAULT_DOCUMENT);
        assert_eq!(store.raw(Document::Translated), "");
    }
}
