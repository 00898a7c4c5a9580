use std::path::PathBuf;

/// A session record that cannot be aggregated. `index` is the record's
/// position in the input slice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("session #{index}: pages read must not be negative (got {value})")]
    NegativePages { index: usize, value: i64 },

    #[error("session #{index}: duration must not be negative (got {value} minutes)")]
    NegativeDuration { index: usize, value: i64 },

    #[error("session #{index}: missing date")]
    MissingDate { index: usize },

    #[error("session #{index}: unparsable date '{value}'")]
    InvalidDate { index: usize, value: String },
}

impl ValidationError {
    pub fn index(&self) -> usize {
        match self {
            Self::NegativePages { index, .. }
            | Self::NegativeDuration { index, .. }
            | Self::MissingDate { index }
            | Self::InvalidDate { index, .. } => *index,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("session source not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported session file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}{}: {message}", line_suffix(.line))]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("failed to query {path}: {source}")]
    Sqlite {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" (line {line})"),
        None => String::new(),
    }
}
