use crate::{
    config::{Config, ConversionConfig},
    converter::{Converter, default_output_path},
    engine::{ConversionBackend, python::PythonBackend},
    error::ConversionError,
    inspect::{DocumentInspector, FileInfo, LopdfInspector},
    interrupt,
    report::ConversionReport,
    util::{ensure_dir, format_file_size, now_rfc3339, parent_dir},
};
use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_INTERRUPTED: i32 = 130;

const DEFAULT_CONFIG_FILE: &str = "pdf-to-docx.toml";

#[derive(Parser, Debug)]
#[command(name = "pdf-to-docx")]
#[command(about = "Convert PDF files to DOCX with layout, image and table preservation (pdf2docx)")]
#[command(allow_negative_numbers = true)]
#[command(after_help = "Examples:
  pdf-to-docx document.pdf
  pdf-to-docx input.pdf output.docx
  pdf-to-docx input.pdf --start-page 0 --end-page 10
  pdf-to-docx input.pdf --overwrite --backup")]
pub struct Args {
    /// Path to the input PDF file.
    pub input: PathBuf,

    /// Path to the output DOCX file. Defaults to the input with a .docx extension.
    pub output: Option<PathBuf>,

    /// First page to convert (0-based).
    #[arg(long)]
    pub start_page: Option<i64>,

    /// Last page to convert (0-based, inclusive). Defaults to the last page.
    #[arg(long)]
    pub end_page: Option<i64>,

    /// Replace the output file if it exists.
    #[arg(long)]
    pub overwrite: bool,

    /// Back up an existing output file before replacing it.
    #[arg(long)]
    pub backup: bool,

    /// Verbose output (the default unless the config file says otherwise).
    #[arg(long)]
    pub verbose: bool,

    /// Only warnings and errors. Wins over --verbose.
    #[arg(long)]
    pub quiet: bool,

    /// Append log lines to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Let pdf2docx use multiple processes.
    #[arg(long)]
    pub multi_processing: bool,

    /// Process count for --multi-processing.
    #[arg(long)]
    pub cpu_count: Option<i64>,

    /// Path to config TOML. If omitted, uses ./pdf-to-docx.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print a JSON report instead of the human-readable summary.
    #[arg(long)]
    pub json: bool,
}

/// Full CLI run: config, logging, conversion, exit code.
pub fn run(args: Args) -> i32 {
    let cfg = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return EXIT_FAILURE;
        }
    };

    let _guard = match init_logging(&args, &cfg) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return EXIT_FAILURE;
        }
    };

    interrupt::install_handler();

    let backend = PythonBackend::new(&cfg.engine);
    debug!("python executable: {}", backend.python_exe().display());

    let result = execute(&args, &cfg, backend);
    exit_code(&result, cfg.conversion.verbose)
}

pub fn load_config(args: &Args) -> Result<Config> {
    let mut cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    apply_overrides(&mut cfg.conversion, args);
    Ok(cfg)
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.exists().then_some(default)
}

/// Command-line flags win over the config file.
pub fn apply_overrides(conv: &mut ConversionConfig, args: &Args) {
    if let Some(start) = args.start_page {
        conv.start_page = start;
    }
    if args.end_page.is_some() {
        conv.end_page = args.end_page;
    }
    conv.overwrite |= args.overwrite;
    conv.create_backup |= args.backup;
    if args.quiet {
        conv.verbose = false;
    } else if args.verbose {
        conv.verbose = true;
    }
    if args.log_file.is_some() {
        conv.log_file = args.log_file.clone();
    }
    conv.multi_processing |= args.multi_processing;
    if args.cpu_count.is_some() {
        conv.cpu_count = args.cpu_count;
    }
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let default_level = if cfg.conversion.verbose { "info" } else { "warn" };
    let level = args
        .log_level
        .as_deref()
        .or(cfg.logging.level.as_deref())
        .unwrap_or(default_level);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = cfg.conversion.log_file.as_deref() {
        ensure_dir(parent_dir(path))?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_filter(LevelFilter::DEBUG)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

/// Converts `args.input` with `backend`. Prints the summary; never exits.
pub fn execute<B: ConversionBackend>(
    args: &Args,
    cfg: &Config,
    backend: B,
) -> Result<ConversionReport> {
    let input = &args.input;
    if !input.exists() {
        bail!("PDF file not found: {}", input.display());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input));
    let verbose = cfg.conversion.verbose;

    let info = LopdfInspector.inspect(input);
    if verbose && !args.json {
        print_file_info(&info);
    }

    let started = now_rfc3339();
    let mut converter = Converter::new(input.clone(), Some(output), cfg.conversion.clone(), backend)?;
    let result_path = converter.convert()?;
    let output_bytes = std::fs::metadata(&result_path)
        .with_context(|| format!("stat output: {}", result_path.display()))?
        .len();

    let report = ConversionReport {
        input: info,
        output: result_path,
        output_bytes,
        backup: converter.last_backup().map(Path::to_path_buf),
        started,
        finished: now_rfc3339(),
        status: "ok".to_string(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if verbose {
        println!();
        println!("Conversion successful!");
        println!("  Output: {}", report.output.display());
        println!("  Size: {}", format_file_size(report.output_bytes));
    }

    Ok(report)
}

/// Maps a run outcome to the process exit code, printing the error if any.
pub fn exit_code<T>(result: &Result<T>, verbose: bool) -> i32 {
    match result {
        Ok(_) => EXIT_SUCCESS,
        Err(err) if is_interrupt(err) => {
            eprintln!("\n\nConversion cancelled by user.");
            EXIT_INTERRUPTED
        }
        Err(err) => {
            eprintln!("\n{}", failure_message(err));
            if verbose {
                eprintln!("{err:?}");
            }
            EXIT_FAILURE
        }
    }
}

/// One-line failure text: the error followed by its whole cause chain.
pub fn failure_message(err: &anyhow::Error) -> String {
    format!("Error: {err:#}")
}

fn is_interrupt(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ConversionError>(),
        Some(ConversionError::Interrupted)
    ) || interrupt::requested()
}

fn print_file_info(info: &FileInfo) {
    println!();
    println!("PDF Information:");
    println!("  File: {}", info.name);
    println!("  Size: {}", format_file_size(info.size_bytes));
    println!("  Pages: {}", info.page_count);
    println!("  Encrypted: {}", info.encrypted);
    if info.encrypted {
        println!("  Warning: PDF is encrypted");
    }
    println!();
}
