use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::SystemTime;
use taper::activity::{ActivitySink, BatchEvent, FileActivityLog, Tee};
use taper::config::{self, RetentionConfig, TaperConfig};
use taper::imaging::RustBackend;
use taper::{janitor, output, process};

#[derive(Parser)]
#[command(name = "taper")]
#[command(about = "Resize a batch of images toward a target width and zip the results")]
#[command(long_about = "\
Resize a batch of images toward a target width and zip the results

The image in the middle of the batch is resized to exactly the target width.
The others taper linearly toward their own original width the further they
sit from the middle; the first and last images keep their original width
when they are the farthest out. Every output is re-encoded as JPEG and
named <original-base>--<width>.jpg.

Working layout:

  public/uploads/
  ├── archive-<epochMillis>-<random>.zip   # one per successful batch
  ├── resized/                             # shared output area
  └── batches/<id>/                        # per-batch holding area
      ├── 000-<original name>
      └── resized/<base>--<width>.jpg

Run 'taper gen-config' to generate a documented taper.toml.")]
#[command(version)]
struct Cli {
    /// Upload root (overrides workspace.root)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file [default: ./taper.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ResizeArgs {
    /// Width of the middle image, in pixels
    #[arg(long, allow_hyphen_values = true)]
    width: String,

    /// Images in batch order
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Resize a batch and package it as a zip archive
    Resize(ResizeArgs),
    /// Delete uploaded, resized and archived files
    Clean,
    /// Delete archives and batch directories older than the retention age
    Sweep {
        /// Maximum age in hours [default: retention.max_age_hours]
        #[arg(long)]
        max_age_hours: Option<u64>,
    },
    /// Print a stock taper.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| config.workspace.root_path());
    let log = FileActivityLog::new(&config.log.activity_log);

    match run(cli.command, &config, &root, &log) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let event = BatchEvent::Failed {
                message: e.to_string(),
            };
            log.record(&event);
            for line in output::format_batch_event(&event) {
                eprintln!("{}", line);
            }
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<TaperConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

fn run(
    command: Command,
    config: &TaperConfig,
    root: &Path,
    log: &FileActivityLog,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Resize(args) => {
            let outcome = with_printer(log, |sink| {
                process::run_resize(
                    &RustBackend::new(),
                    &args.width,
                    &args.files,
                    root,
                    config,
                    sink,
                )
            })??;
            output::print_outcome(&outcome);
        }
        Command::Clean => {
            let removed = with_printer(log, |sink| janitor::clean_workspace(root, sink))??;
            output::print_clean_summary(removed);
        }
        Command::Sweep { max_age_hours } => {
            let max_age = match max_age_hours {
                Some(max_age_hours) => RetentionConfig { max_age_hours }.max_age(),
                None => config.retention.max_age(),
            };
            let report = with_printer(log, |sink| {
                janitor::sweep_expired(root, max_age, SystemTime::now(), sink)
            })??;
            output::print_sweep_summary(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run `f` with a sink that appends to the activity log and prints each
/// event from a dedicated thread as it happens.
fn with_printer<T>(
    log: &FileActivityLog,
    f: impl FnOnce(&dyn ActivitySink) -> T,
) -> Result<T, Box<dyn Error>> {
    let (tx, rx) = mpsc::channel::<BatchEvent>();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_batch_event(&event);
        }
    });
    let sinks: Vec<&dyn ActivitySink> = vec![log, &tx];
    let value = f(&Tee(sinks));
    drop(tx);
    printer.join().map_err(|_| "output printer panicked")?;
    Ok(value)
}
