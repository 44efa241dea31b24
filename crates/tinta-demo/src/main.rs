//! Tinta Demo — apply grayscale or sepia to a photo through the compute module.
//!
//! Decodes the input, instantiates the compute module on a loader thread
//! behind the readiness gate, and writes one output per requested filter.
//! Every filter is applied to the original decoded image.

mod config;
mod image_loader;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use tinta_core::Kernel;
use tinta_host::readiness;
use tinta_host::{ModuleArena, TransformError, TransformInvoker};
use tinta_module::NativeModule;

use crate::config::{AppConfig, ConfigError};
use crate::image_loader::{ImageLoadError, load_image, save_image};

#[derive(Parser)]
#[command(name = "tinta")]
#[command(about = "Apply pixel filters to a photo through a linear-memory compute module", long_about = None)]
struct Cli {
    /// Image to filter
    input: PathBuf,

    /// Filters to apply, comma-separated (grayscale, sepia)
    #[arg(short, long, value_delimiter = ',', default_value = "grayscale")]
    filter: Vec<Kernel>,

    /// Output path; with several filters the filter name is appended to the stem
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Milliseconds to wait for the compute module to load
    #[arg(long)]
    ready_timeout_ms: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{path}: {source}")]
    Image {
        path: PathBuf,
        source: ImageLoadError,
    },
    #[error("{kernel} failed: {source}")]
    Transform {
        kernel: Kernel,
        source: TransformError,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "tinta=debug" } else { "tinta=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), DemoError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(timeout) = cli.ready_timeout_ms {
        config.invoker.ready_timeout_ms = timeout;
    }

    let original = load_image(&cli.input).map_err(|source| DemoError::Image {
        path: cli.input.clone(),
        source,
    })?;
    tracing::info!(
        "loaded {} ({}x{})",
        cli.input.display(),
        original.width(),
        original.height()
    );

    // The module instantiates off the main thread; the invoker waits on the
    // readiness gate instead of polling for it.
    let (loader, handle) = readiness::channel();
    let module_config = config.module;
    let loading = thread::spawn(move || {
        loader.complete(ModuleArena::new(NativeModule::new(module_config)));
    });

    let invoker = TransformInvoker::new(handle, config.invoker);
    let multiple = cli.filter.len() > 1;
    for &kernel in &cli.filter {
        let filtered = invoker
            .apply(kernel, &original)
            .map_err(|source| DemoError::Transform { kernel, source })?;

        let path = output_path(&cli.input, cli.output.as_deref(), kernel, multiple);
        save_image(&path, &filtered).map_err(|source| DemoError::Image {
            path: path.clone(),
            source,
        })?;
        tracing::info!("{kernel} -> {}", path.display());
    }

    if loading.join().is_err() {
        tracing::warn!("module loader thread panicked");
    }
    Ok(())
}

/// Where to write the result of `kernel`.
///
/// Without `-o`, results land next to the input as `<stem>-<kernel>.png`.
/// With `-o` and several filters, the kernel name is appended to its stem.
fn output_path(input: &Path, output: Option<&Path>, kernel: Kernel, multiple: bool) -> PathBuf {
    match output {
        Some(output) if !multiple => output.to_path_buf(),
        Some(output) => with_suffix(output, kernel, output.extension()),
        None => with_suffix(input, kernel, Some("png".as_ref())),
    }
}

fn with_suffix(path: &Path, kernel: Kernel, extension: Option<&std::ffi::OsStr>) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let mut name = format!("{stem}-{kernel}");
    if let Some(extension) = extension {
        name.push('.');
        name.push_str(&extension.to_string_lossy());
    }
    path.with_file_name(name)
}
