pub mod backup;
pub mod cli;
pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
pub mod inspect;
pub mod interrupt;
pub mod report;
pub mod util;
pub mod validate;

pub use config::{Config, ConversionConfig, TableSettings};
pub use converter::Converter;
pub use error::{ConfigError, ConversionError, ValidationError};
pub use inspect::{DocumentInspector, FileInfo, LopdfInspector};
