use std::path::PathBuf;
use thiserror::Error;

/// Rejections raised while checking the input PDF or the output location.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("expected a .{expected} file: {}", .path.display())]
    WrongExtension { path: PathBuf, expected: &'static str },

    #[error("cannot read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid PDF file {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("output file already exists: {} (use overwrite to replace it)", .0.display())]
    AlreadyExists(PathBuf),

    #[error("cannot create output directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output path parent is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Field-level problems reported by `ConversionConfig::validate`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid configuration: {}", .0.join(", "))]
pub struct ConfigError(pub Vec<String>);

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error("conversion completed but output file was not created: {}", .0.display())]
    OutputNotProduced(PathBuf),

    #[error("failed to convert PDF")]
    ConversionFailed(#[source] anyhow::Error),

    #[error("conversion cancelled by user")]
    Interrupted,
}
