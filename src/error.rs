use std::path::PathBuf;
use thiserror::Error;

pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_CONFLICT: i32 = 3;

#[derive(Debug, Error)]
pub enum MemsyncError {
    #[error("archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),
    #[error("archive filename must start with YYYY-MM-DD_: {0}")]
    BadArchiveName(String),
    #[error("invalid date `{0}`: expected YYYY-MM-DD")]
    BadDate(String),
    #[error("archive is empty, refusing to emit a record with no lines: {}", .0.display())]
    EmptyArchive(PathBuf),
    #[error("not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("config invalid or unreadable: {0}")]
    InvalidConfig(String),
    #[error("destination already exists: {}", .0.display())]
    Conflict(PathBuf),
    #[error("no complete runs found under {}", .0.display())]
    NoCompleteRuns(PathBuf),
}

impl MemsyncError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ArchiveNotFound(_)
            | Self::BadArchiveName(_)
            | Self::BadDate(_)
            | Self::EmptyArchive(_)
            | Self::SourceNotFound(_)
            | Self::InvalidConfig(_) => EXIT_USAGE,
            Self::Conflict(_) => EXIT_CONFLICT,
            Self::NoCompleteRuns(_) => EXIT_FAILURE,
        }
    }
}

/// Exit code for an error chain: the first typed error wins, anything else is a plain failure.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<MemsyncError>())
        .map(MemsyncError::exit_code)
        .unwrap_or(EXIT_FAILURE)
}
