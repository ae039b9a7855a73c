use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("input is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: column '{column}' is not a number: {value:?}")]
    InvalidCoordinate {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("output directory does not exist and could not be created: {0}")]
    OutputDir(PathBuf),

    #[error("failed to export to {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}
