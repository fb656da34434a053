use crate::errors::LangpadError;
use anyhow::Result;
use serde_json::{Map, Value};
use std::fmt;

/// Ordered key segments locating a leaf from the document root.
///
/// Segments stay a list internally; the dotted form is display-only, with a
/// literal `.` inside a segment escaped as `\.` on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn from_segments(segments: Vec<String>) -> Result<Self, LangpadError> {
        if segments.is_empty() {
            return Err(LangpadError::EmptyPath(String::new()));
        }
        Ok(Self(segments))
    }

    /// Parses a dot path (supports escaping dot as \\.) e.g. loginPage.title
    pub fn parse(raw: &str) -> Result<Self, LangpadError> {
        let mut segments: Vec<String> = Vec::new();
        let mut buf = String::new();
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(next) = chars.next() { buf.push(next); } else { buf.push('\\'); }
                }
                '.' => {
                    if !buf.is_empty() { segments.push(std::mem::take(&mut buf)); }
                }
                _ => buf.push(c),
            }
        }
        if !buf.is_empty() { segments.push(buf); }
        if segments.is_empty() {
            return Err(LangpadError::EmptyPath(raw.to_string()));
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 { f.write_str(".")?; }
            f.write_str(&seg.replace('.', "\\."))?;
        }
        Ok(())
    }
}

/// A (path, value) pair decomposed out of a document. Transient: derived on
/// every pass, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: KeyPath,
    pub value: String,
}

/// Decomposes a nested document into leaf entries, depth-first in object
/// insertion order. Only strings are leaves and only objects are walked;
/// numbers, booleans, null and arrays are skipped and never counted.
pub fn flatten_entries(tree: &Value) -> Vec<Entry> {
    let mut out = Vec::new();
    let mut prefix: Vec<String> = Vec::new();
    collect_entries(tree, &mut prefix, &mut out);
    out
}

fn collect_entries(value: &Value, prefix: &mut Vec<String>, out: &mut Vec<Entry>) {
    if let Value::Object(map) = value {
        for (key, child) in map {
            match child {
                Value::String(s) => {
                    let mut segments = prefix.clone();
                    segments.push(key.clone());
                    out.push(Entry { path: KeyPath(segments), value: s.clone() });
                }
                Value::Object(_) => {
                    prefix.push(key.clone());
                    collect_entries(child, prefix, out);
                    prefix.pop();
                }
                _ => {}
            }
        }
    }
}

/// Rebuilds a tree from flattened entries; inverse of `flatten_entries` for
/// documents whose branches all end in non-empty strings.
pub fn unflatten_entries(entries: &[Entry]) -> Value {
    let mut tree = Value::Object(Map::new());
    for entry in entries {
        merge_at_path(&mut tree, &entry.path, Some(&entry.value));
    }
    tree
}

/// Sets or removes the leaf at `path`. Mutates `tree` in place and leaves
/// every sibling subtree untouched; callers that need the previous tree must
/// clone first.
///
/// Intermediate segments that are missing or hold a non-object are replaced
/// with fresh objects, so translating under a path that used to be a plain
/// string reshapes the tree instead of failing. A `None` or whitespace-only
/// value deletes the key rather than storing an empty string.
pub fn merge_at_path(tree: &mut Value, path: &KeyPath, value: Option<&str>) {
    let segments = path.segments();
    let mut current = ensure_object(tree);
    for seg in &segments[..segments.len() - 1] {
        let child = current
            .entry(seg.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        current = ensure_object(child);
    }
    let last = &segments[segments.len() - 1];
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => {
            current.insert(last.clone(), Value::String(v.to_string()));
        }
        None => {
            // shift_remove keeps the surviving keys in document order
            current.shift_remove(last);
        }
    }
}

// Reshapes anything that is not an object into an empty one.
fn ensure_object(slot: &mut Value) -> &mut Map<String, Value> {
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut().unwrap()
}

/// Parses a raw document, degrading to an empty object so half-typed JSON
/// never raises.
pub fn parse_document(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::Object(Map::new()))
}

// 2-space indentation, key order untouched.
pub fn to_pretty(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
