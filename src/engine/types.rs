use crate::config::TableSettings;
use serde::{Deserialize, Serialize};

/// Everything the converter needs for one `convert` call.
///
/// Page indices are zero-based and inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertIn {
    pub output_docx: String,
    pub start_page: u32,
    pub end_page: Option<u32>,
    pub multi_processing: bool,
    pub cpu_count: Option<u32>,
    pub preserve_layout: bool,
    pub preserve_images: bool,
    pub preserve_tables: bool,
    pub table_settings: TableSettings,
}

/// One line written by the Python runner in reply to a command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerReply {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub traceback: Option<String>,
}
