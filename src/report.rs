use crate::inspect::FileInfo;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Summary printed by `--json` after a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub input: FileInfo,
    pub output: PathBuf,
    pub output_bytes: u64,
    pub backup: Option<PathBuf>,
    pub started: String,
    pub finished: String,
    pub status: String,
}
