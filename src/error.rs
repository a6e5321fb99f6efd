use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    Continue,
    Abort,
}

#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("failed reading {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("{}: missing required column {column:?}", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("invalid scoring config: {0}")]
    InvalidConfig(String),

    #[error("no scoring profile for position {0:?}")]
    UnknownProfile(String),

    #[error("data root not found: {}", .0.display())]
    MissingDataRoot(PathBuf),
}

impl ScoutError {
    pub fn recovery(&self) -> Recovery {
        match self {
            ScoutError::MissingFile(_)
            | ScoutError::Unreadable { .. }
            | ScoutError::MissingColumn { .. } => Recovery::Continue,
            ScoutError::InvalidConfig(_)
            | ScoutError::UnknownProfile(_)
            | ScoutError::MissingDataRoot(_) => Recovery::Abort,
        }
    }

    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ScoutError::Unreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
