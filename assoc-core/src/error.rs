use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// A positional row does not have the length its schema declares.
    #[error("{context}: expected {expected} fields, found {actual}")]
    SchemaMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("{query} matches multiple genes: {}", gene_ids.join(", "))]
    AmbiguousGeneQuery {
        query: String,
        gene_ids: Vec<String>,
    },

    #[error("no match for {query}")]
    NotFound { query: String },

    /// Raised by a dataset-specific filter; never handled inside the engine.
    #[error("custom filter failed: {0}")]
    MalformedFilter(String),

    #[error("unknown column {0}")]
    UnknownColumn(String),

    #[error("unknown analysis group {0}")]
    UnknownGroup(String),

    #[error("unknown dataset {0}")]
    UnknownDataset(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn schema_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Error {
        Error::SchemaMismatch { context: context.into(), expected, actual }
    }
}
