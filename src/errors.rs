use thiserror::Error;

#[derive(Error, Debug)]
pub enum LangpadError {
    #[error("Empty key path: {0:?}")]
    EmptyPath(String),
    #[error("Document {0} is not valid JSON; fix it before editing entries")]
    UnparseableDocument(String),
}
