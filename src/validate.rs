use crate::{
    error::ValidationError,
    inspect::{DocumentInspector, InspectError},
    util::{has_extension, parent_dir},
};
use std::path::Path;
use tracing::warn;

pub const INPUT_EXTENSION: &str = "pdf";
pub const OUTPUT_EXTENSION: &str = "docx";

pub fn validate_input(inspector: &dyn DocumentInspector, path: &Path) -> Result<(), ValidationError> {
    if !path.exists() {
        return Err(ValidationError::NotFound(path.to_path_buf()));
    }

    if !path.is_file() {
        return Err(ValidationError::NotAFile(path.to_path_buf()));
    }

    if !has_extension(path, INPUT_EXTENSION) {
        return Err(ValidationError::WrongExtension {
            path: path.to_path_buf(),
            expected: INPUT_EXTENSION,
        });
    }

    match inspector.open(path) {
        Ok(summary) if summary.page_count == 0 => Err(ValidationError::Corrupt {
            path: path.to_path_buf(),
            reason: "PDF has no pages".to_string(),
        }),
        Ok(_) => Ok(()),
        // The converter gets the final say on encrypted content.
        Err(InspectError::Encrypted) => {
            warn!("PDF is encrypted; page count unavailable: {}", path.display());
            Ok(())
        }
        Err(InspectError::Unreadable(source)) => Err(ValidationError::Unreadable {
            path: path.to_path_buf(),
            source,
        }),
        Err(InspectError::Corrupt(reason)) => Err(ValidationError::Corrupt {
            path: path.to_path_buf(),
            reason,
        }),
    }
}

/// Checks the output location. Creates the parent directory when missing.
pub fn validate_output(path: &Path, overwrite: bool) -> Result<(), ValidationError> {
    if !has_extension(path, OUTPUT_EXTENSION) {
        return Err(ValidationError::WrongExtension {
            path: path.to_path_buf(),
            expected: OUTPUT_EXTENSION,
        });
    }

    if path.exists() && !overwrite {
        return Err(ValidationError::AlreadyExists(path.to_path_buf()));
    }

    let parent = parent_dir(path);
    if !parent.exists() {
        std::fs::create_dir_all(parent).map_err(|source| {
            ValidationError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source,
            }
        })?;
    }

    if !parent.is_dir() {
        return Err(ValidationError::NotADirectory(parent.to_path_buf()));
    }

    Ok(())
}
