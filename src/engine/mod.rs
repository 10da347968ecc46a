pub mod python;
pub mod types;

use anyhow::Result;
use std::path::Path;

pub use types::{ConvertIn, RunnerReply};

/// Opens conversion sessions against an input document.
pub trait ConversionBackend {
    fn open(&self, input: &Path) -> Result<Box<dyn ConversionSession>>;
}

/// One open document inside the external converter.
///
/// `close` releases the engine-side resources; callers invoke it exactly once.
pub trait ConversionSession {
    fn convert(&mut self, req: &ConvertIn) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}
