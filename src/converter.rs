use crate::{
    backup::create_backup,
    config::ConversionConfig,
    engine::{ConversionBackend, ConversionSession, ConvertIn},
    error::{ConfigError, ConversionError, ValidationError},
    inspect::{DocumentInspector, LopdfInspector},
    interrupt::Interrupted,
    util::format_file_size,
    validate::{OUTPUT_EXTENSION, validate_input, validate_output},
};
use anyhow::anyhow;
use std::path::{Path, PathBuf};
use tracing::{Dispatch, debug, error, info, warn};

/// Receives `(current, total)` page counts.
pub type ProgressCallback = Box<dyn FnMut(u32, u32)>;

/// Steps of a single `convert()` call, emitted at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Inspecting,
    BackingUp,
    SessionOpen,
    Converting,
    Verifying,
    Succeeded,
    Failed,
    SessionClosed,
}

fn enter(stage: Stage) {
    debug!(?stage, "conversion stage");
}

/// `input.pdf` -> `input.docx`
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension(OUTPUT_EXTENSION)
}

/// Validates a PDF/DOCX pair up front, then drives one conversion session per
/// [`Converter::convert`] call.
pub struct Converter<B: ConversionBackend, I: DocumentInspector = LopdfInspector> {
    input: PathBuf,
    output: PathBuf,
    config: ConversionConfig,
    backend: B,
    inspector: I,
    progress: Option<ProgressCallback>,
    dispatch: Option<Dispatch>,
    last_backup: Option<PathBuf>,
}

impl<B: ConversionBackend> Converter<B> {
    /// Fails if the input is not a readable PDF or the output location is
    /// unusable. `output` defaults to the input path with a `.docx` extension.
    pub fn new(
        input: impl Into<PathBuf>,
        output: Option<PathBuf>,
        config: ConversionConfig,
        backend: B,
    ) -> Result<Self, ValidationError> {
        Self::with_inspector(input, output, config, backend, LopdfInspector)
    }
}

impl<B: ConversionBackend, I: DocumentInspector> Converter<B, I> {
    pub fn with_inspector(
        input: impl Into<PathBuf>,
        output: Option<PathBuf>,
        config: ConversionConfig,
        backend: B,
        inspector: I,
    ) -> Result<Self, ValidationError> {
        let input = input.into();
        validate_input(&inspector, &input)?;

        let output = output.unwrap_or_else(|| default_output_path(&input));
        validate_output(&output, config.overwrite)?;

        Ok(Self {
            input,
            output,
            config,
            backend,
            inspector,
            progress: None,
            dispatch: None,
            last_backup: None,
        })
    }

    /// Routes this converter's log events to `dispatch` instead of the
    /// process-wide subscriber.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Replaces any previously registered callback.
    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: FnMut(u32, u32) + 'static,
    {
        self.progress = Some(Box::new(callback));
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Backup written by the most recent `convert()`, if any.
    pub fn last_backup(&self) -> Option<&Path> {
        self.last_backup.as_deref()
    }

    pub fn convert(&mut self) -> Result<PathBuf, ConversionError> {
        match self.dispatch.clone() {
            Some(dispatch) => tracing::dispatcher::with_default(&dispatch, || self.run()),
            None => self.run(),
        }
    }

    /// Like [`Converter::convert`], reporting `(0, n)` before the work and
    /// `(n, n)` after it, where `n` is the number of pages in the configured
    /// range. A failure resets the callback to `(0, n)`.
    pub fn convert_with_progress(&mut self) -> Result<PathBuf, ConversionError> {
        let total_pages = self.inspector.inspect(&self.input).page_count;
        let pages = self.config.pages_in_range(total_pages);

        self.report_progress(0, pages);
        match self.convert() {
            Ok(path) => {
                self.report_progress(pages, pages);
                Ok(path)
            }
            Err(err) => {
                self.report_progress(0, pages);
                Err(err)
            }
        }
    }

    fn report_progress(&mut self, current: u32, total: u32) {
        if let Some(callback) = self.progress.as_mut() {
            callback(current, total);
        }
    }

    fn run(&mut self) -> Result<PathBuf, ConversionError> {
        enter(Stage::Validating);
        let errors = self.config.validate();
        if !errors.is_empty() {
            return Err(ConfigError(errors).into());
        }
        let request = self.request()?;
        if let Ok(json) = serde_json::to_string(&self.config) {
            debug!("effective config: {json}");
        }

        enter(Stage::Inspecting);
        self.log_file_info();

        self.last_backup = None;
        if self.config.create_backup && self.output.exists() {
            enter(Stage::BackingUp);
            self.last_backup = create_backup(&self.output);
            if self.last_backup.is_none() {
                warn!("failed to create backup; continuing without one");
            }
        }

        info!("starting conversion to: {}", self.output.display());
        info!("this may take a moment depending on PDF complexity");

        let outcome = self.run_session(&request);
        match &outcome {
            Err(ConversionError::ConversionFailed(cause)) => {
                error!("conversion failed: {cause:#}");
                debug!("cause: {cause:?}");
            }
            Err(err) => error!("conversion failed: {err}"),
            Ok(_) => {}
        }
        outcome
    }

    fn run_session(&self, request: &ConvertIn) -> Result<PathBuf, ConversionError> {
        let mut session = match SessionGuard::open(&self.backend, &self.input) {
            Ok(session) => session,
            Err(err) => {
                enter(Stage::Failed);
                return Err(err);
            }
        };

        enter(Stage::Converting);
        let outcome = session.convert(request).and_then(|()| {
            enter(Stage::Verifying);
            self.verify_output()
        });

        enter(if outcome.is_ok() {
            Stage::Succeeded
        } else {
            Stage::Failed
        });
        session.close();
        outcome
    }

    fn request(&self) -> Result<ConvertIn, ConversionError> {
        let out_of_range = |field: &str| ConfigError(vec![format!("{field} is out of range")]);
        let cfg = &self.config;

        let start_page = u32::try_from(cfg.start_page).map_err(|_| out_of_range("start_page"))?;
        let end_page = cfg
            .end_page
            .map(u32::try_from)
            .transpose()
            .map_err(|_| out_of_range("end_page"))?;
        let cpu_count = cfg
            .cpu_count
            .map(u32::try_from)
            .transpose()
            .map_err(|_| out_of_range("cpu_count"))?;

        Ok(ConvertIn {
            output_docx: self.output.to_string_lossy().into_owned(),
            start_page,
            end_page,
            multi_processing: cfg.multi_processing,
            cpu_count,
            preserve_layout: cfg.preserve_layout,
            preserve_images: cfg.preserve_images,
            preserve_tables: cfg.preserve_tables,
            table_settings: cfg.table_settings.clone(),
        })
    }

    fn log_file_info(&self) {
        let info = self.inspector.inspect(&self.input);
        info!("PDF file: {}", info.name);
        info!("size: {}", format_file_size(info.size_bytes));
        info!("pages: {}", info.page_count);
        info!("encrypted: {}", info.encrypted);

        if info.encrypted {
            warn!("PDF is encrypted; conversion may fail if a password is required");
        }
    }

    fn verify_output(&self) -> Result<PathBuf, ConversionError> {
        let size = match std::fs::metadata(&self.output) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Err(ConversionError::OutputNotProduced(self.output.clone())),
        };

        info!("conversion complete");
        info!("output file: {}", self.output.display());
        info!("output size: {}", format_file_size(size));
        Ok(self.output.clone())
    }
}

fn session_failure(err: anyhow::Error) -> ConversionError {
    if err.is::<Interrupted>() {
        ConversionError::Interrupted
    } else {
        ConversionError::ConversionFailed(err)
    }
}

/// Owns an open session and closes it exactly once, on `close()` or on drop.
struct SessionGuard {
    session: Option<Box<dyn ConversionSession>>,
}

impl SessionGuard {
    fn open<B: ConversionBackend>(backend: &B, input: &Path) -> Result<Self, ConversionError> {
        let session = backend.open(input).map_err(session_failure)?;
        enter(Stage::SessionOpen);
        Ok(Self {
            session: Some(session),
        })
    }

    fn convert(&mut self, request: &ConvertIn) -> Result<(), ConversionError> {
        match self.session.as_mut() {
            Some(session) => session.convert(request).map_err(session_failure),
            None => Err(ConversionError::ConversionFailed(anyhow!(
                "conversion session already closed"
            ))),
        }
    }

    fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(err) = session.close() {
                warn!("failed to close conversion session: {err:#}");
            }
            enter(Stage::SessionClosed);
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.close();
    }
}
