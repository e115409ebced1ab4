use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Permission denied accessing: {0}")]
    PermissionDenied(PathBuf),

    #[error("Invalid regex pattern \"{pattern}\": {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid selection \"{0}\". Enter numbers separated by commas or ranges like 1-5")]
    InvalidSelectionSyntax(String),

    #[error("No files selected")]
    EmptySelection,

    #[error("File Read Error: Path '{path}', Error: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output file '{path}': {source}")]
    DestinationWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Glob Pattern Error: {0}")]
    Glob(String),

    #[error("WalkDir Error: {0}")]
    WalkDir(String),

    #[error("Data Loading Error: {0}")]
    DataLoading(String),
}

impl AppError {
    /// Maps an I/O failure on `path` to the matching variant.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::PathNotFound(path),
            std::io::ErrorKind::PermissionDenied => AppError::PermissionDenied(path),
            _ => AppError::FileRead { path, source: err },
        }
    }
}

impl From<globset::Error> for AppError {
    fn from(err: globset::Error) -> Self {
        AppError::Glob(format!("Globset error: {}", err))
    }
}

impl From<walkdir::Error> for AppError {
    fn from(err: walkdir::Error) -> Self {
        match err.path() {
            Some(path)
                if err.io_error().map(|e| e.kind())
                    == Some(std::io::ErrorKind::PermissionDenied) =>
            {
                AppError::PermissionDenied(path.to_path_buf())
            }
            _ => AppError::WalkDir(err.to_string()),
        }
    }
}

impl From<serde_yml::Error> for AppError {
    fn from(err: serde_yml::Error) -> Self {
        AppError::DataLoading(format!("YAML error: {}", err))
    }
}
