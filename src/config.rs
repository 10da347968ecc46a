use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

/// Settings for a single conversion request.
///
/// Page indices are zero-based and inclusive. They are signed so that bad
/// values coming from the command line or a config file reach
/// [`ConversionConfig::validate`] instead of failing to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub start_page: i64,
    pub end_page: Option<i64>,

    pub multi_processing: bool,
    pub cpu_count: Option<i64>,

    pub preserve_layout: bool,
    pub preserve_images: bool,
    pub preserve_tables: bool,

    pub overwrite: bool,
    pub create_backup: bool,

    pub table_settings: TableSettings,

    pub verbose: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            start_page: 0,
            end_page: None,
            multi_processing: false,
            cpu_count: None,
            preserve_layout: true,
            preserve_images: true,
            preserve_tables: true,
            overwrite: false,
            create_backup: false,
            table_settings: Default::default(),
            verbose: true,
            log_file: None,
        }
    }
}

impl ConversionConfig {
    /// Returns every violation found; an empty list means the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.start_page < 0 {
            errors.push("start_page must be non-negative".to_string());
        }

        if let Some(end) = self.end_page {
            if end < self.start_page {
                errors.push("end_page must be >= start_page".to_string());
            }
        }

        if let Some(cpus) = self.cpu_count {
            if cpus < 1 {
                errors.push("cpu_count must be >= 1".to_string());
            }
        }

        errors
    }

    /// Number of pages selected by the range for a document of `total_pages`.
    ///
    /// An explicit `end_page` is taken as given, so the count does not depend
    /// on the document being readable. Only an open-ended range falls back to
    /// `total_pages`.
    pub fn pages_in_range(&self, total_pages: u32) -> u32 {
        let start = self.start_page.max(0);
        let end = match self.end_page {
            Some(end) => end,
            None => i64::from(total_pages) - 1,
        };
        if end < start {
            return 0;
        }
        u32::try_from(end - start + 1).unwrap_or(u32::MAX)
    }
}

/// Table detection thresholds handed to the converter untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub min_border_vertical: f64,
    pub min_border_horizontal: f64,
    pub intersection_threshold: f64,
    pub min_words_vertical: u32,
    pub min_words_horizontal: u32,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            min_border_vertical: 0.5,
            min_border_horizontal: 0.5,
            intersection_threshold: 0.25,
            min_words_vertical: 3,
            min_words_horizontal: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Interpreter with `pdf2docx` installed. `auto` consults `PDF2DOCX_PYTHON`.
    pub python_exe: String,
    /// Upper bound for a single session request; 0 disables it.
    pub timeout_seconds: u64,
    pub keep_python_stderr: bool,
    pub env: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            python_exe: "auto".into(),
            timeout_seconds: 0,
            keep_python_stderr: true,
            env: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// Overrides the verbose/quiet default (trace/debug/info/warn/error).
    pub level: Option<String>,
    pub json: bool,
}
