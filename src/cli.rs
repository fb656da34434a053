use crate::config::{Config, load_config};
use crate::errors::LangpadError;
use crate::json_utils::{KeyPath, flatten_entries};
use crate::reconcile::ReconciliationView;
use crate::store::{ChangeEvent, Document, DocumentStore, FileStorage, Origin};
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "langpad", version, about = "JSON language file translation editor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show every default-language entry with its translation and the completion metric
    Status(StatusArgs),
    /// Set/update one translated entry (empty or omitted text clears it)
    Set(SetArgs),
    /// Replace a document wholesale with the raw text of a file
    Load(LoadArgs),
    /// Report whether each document parses as JSON
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Locale to reconcile against (defaults to target_locale from config)
    #[arg(long)]
    pub locale: Option<String>,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Dot path (supports escaping with \\.) e.g. loginPage.title
    pub path: String,
    /// Translation text; omit or pass an empty string to clear the entry
    pub text: Option<String>,
    /// Locale to edit (defaults to target_locale from config)
    #[arg(long)]
    pub locale: Option<String>,
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Which document to replace
    #[arg(value_enum)]
    pub document: DocumentArg,
    /// File to read the raw text from
    pub file: PathBuf,
    /// Locale the translated document belongs to (defaults to target_locale from config)
    #[arg(long)]
    pub locale: Option<String>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Locale to check (defaults to target_locale from config)
    #[arg(long)]
    pub locale: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DocumentArg {
    Default,
    Translated,
}

impl From<DocumentArg> for Document {
    fn from(arg: DocumentArg) -> Self {
        match arg {
            DocumentArg::Default => Document::Default,
            DocumentArg::Translated => Document::Translated,
        }
    }
}

fn open_store(cfg: &Config, locale: Option<&str>) -> Result<DocumentStore> {
    let target = locale.unwrap_or(&cfg.target_locale);
    let paths = HashMap::from([
        (
            Document::Default.key().to_string(),
            cfg.document_path(&cfg.source_locale),
        ),
        (
            Document::Translated.key().to_string(),
            cfg.document_path(target),
        ),
    ]);
    DocumentStore::new(Box::new(FileStorage::new(paths)))
}

pub fn handle_status(args: StatusArgs) -> Result<()> {
    let cfg = load_config()?;
    let store = open_store(&cfg, args.locale.as_deref())?;
    let view = ReconciliationView::new(&store);

    println!("{}", view.completion().summary());
    for row in view.rows() {
        if row.is_translated() {
            println!("  {}: {:?} -> {:?}", row.path, row.source, row.translated);
        } else {
            println!("  {}: {:?} (missing)", row.path, row.source);
        }
    }
    Ok(())
}

pub fn handle_set(args: SetArgs) -> Result<()> {
    let cfg = load_config()?;
    let mut store = open_store(&cfg, args.locale.as_deref())?;

    // row edits stay suppressed while the translated JSON is broken
    if !store.is_valid(Document::Translated) {
        return Err(LangpadError::UnparseableDocument(Document::Translated.to_string()).into());
    }

    let path = KeyPath::parse(&args.path)?;
    let mut view = ReconciliationView::new(&store);

    let events: Rc<RefCell<Vec<ChangeEvent>>> = Rc::default();
    let sink = events.clone();
    let id = store.on_update(Box::new(move |event| sink.borrow_mut().push(*event)));

    let text = args.text.unwrap_or_default();
    ReconciliationView::edit_row(&mut store, &path, &text)?;
    store.off_update(id);

    for event in events.borrow().iter() {
        view.apply_change(&store, event);
    }

    info!(path = %path, completion = %view.completion().summary(), "Updated translation");
    Ok(())
}

pub fn handle_load(args: LoadArgs) -> Result<()> {
    let cfg = load_config()?;
    let mut store = open_store(&cfg, args.locale.as_deref())?;
    let raw =
        fs::read_to_string(&args.file).with_context(|| format!("Reading {:?}", args.file))?;

    let document: Document = args.document.into();
    store.set(document, &raw, Origin::External)?;
    if !store.is_valid(document) {
        warn!(document = %document, "Loaded text is not valid JSON; entries read as empty until it is fixed");
    }
    info!(document = %document, file = ?args.file, "Replaced document");
    Ok(())
}

pub fn handle_check(args: CheckArgs) -> Result<()> {
    let cfg = load_config()?;
    let store = open_store(&cfg, args.locale.as_deref())?;

    let mut broken = 0;
    for document in [Document::Default, Document::Translated] {
        let raw = store.raw(document);
        if raw.is_empty() {
            println!("{}: empty", document);
        } else if store.is_valid(document) {
            let count = flatten_entries(&store.parsed(document)).len();
            println!("{}: ok ({} entries)", document, count);
        } else {
            println!("{}: invalid JSON", document);
            broken += 1;
        }
    }
    if broken > 0 {
        return Err(anyhow!("{} document(s) failed to parse", broken));
    }
    Ok(())
}
