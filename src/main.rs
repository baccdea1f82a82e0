use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tfrec::config::Config;
use tfrec::event::{Classification, Envelope};
use tfrec::gcp::client::GcpClient;
use tfrec::gcp::http::format_gcp_error;
use tfrec::resource::ResourceHandler;
use tfrec::sink::Sink;
use tfrec::{ExportError, ExportOutcome, Exporter};
use tokio::io::AsyncReadExt;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Version injected at compile time via TFREC_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("TFREC_VERSION") {
    Some(v) => v,
    None => "dev",
};

/// Default port for the push endpoint when neither --port nor PORT is set
const DEFAULT_PORT: u16 = 8080;

/// Export GCP resources from audit-log events as Terraform
#[derive(Parser, Debug)]
#[command(name = "tfrec", version, about, long_about = None)]
struct Args {
    /// Config file (defaults to <config dir>/tfrec/config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Destination bucket (overrides OUTPUT_BUCKET)
    #[arg(long, global = true)]
    output_bucket: Option<String>,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process one Pub/Sub envelope (bare message or push request)
    Process {
        /// Path to the envelope JSON, or '-' for stdin
        #[arg(long, default_value = "-")]
        event: PathBuf,

        /// Print the declaration instead of uploading it
        #[arg(long)]
        dry_run: bool,
    },
    /// Export a resource given its kind tag and full resource name
    Describe {
        /// Resource kind tag (gcs_bucket, cloud_function, pubsub_topic)
        #[arg(long)]
        kind: String,

        /// Full resource name, e.g. projects/_/buckets/my-bucket
        #[arg(long)]
        name: String,

        /// Print the declaration instead of uploading it
        #[arg(long)]
        dry_run: bool,
    },
    /// Serve a Pub/Sub push endpoint
    Serve {
        /// Port to listen on (defaults to $PORT, then 8080)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&Path>,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let (non_blocking, guard) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level.to_tracing_level()).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(log_file.is_none())
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("tfrec {} started with log level: {:?}", VERSION, level);
    if let Some(path) = log_file {
        tracing::info!("Log file: {:?}", path);
    }

    Ok(guard)
}

async fn build_exporter(args: &Args, dry_run: bool) -> Result<Exporter> {
    let settings = Config::load(args.config.as_deref())?
        .resolve_from_env(args.output_bucket.clone(), dry_run)?;

    let client = GcpClient::new(settings.endpoints).await?;

    let sink = match settings.output_bucket {
        Some(bucket) if !dry_run => {
            tracing::info!("Writing declarations to gs://{}", bucket);
            Sink::gcs(client.clone(), bucket)
        }
        _ => Sink::Stdout,
    };

    Ok(Exporter::new(client, sink)?)
}

async fn read_event(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .context("Failed to read event from stdin")?;
        return Ok(buf);
    }

    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read event file {}", path.display()))
}

/// Print the outcome as JSON. A dry run already printed the artifact on
/// stdout, so the summary goes to stderr there.
fn report(exporter: &Exporter, result: tfrec::Result<ExportOutcome>) -> Result<()> {
    match result {
        Ok(outcome) => {
            tracing::info!("Exported {} to {}", outcome.identifier, outcome.location);
            let summary = serde_json::to_string_pretty(&outcome)?;
            if exporter.sink().writes_to_stdout() {
                eprintln!("{}", summary);
            } else {
                println!("{}", summary);
            }
            Ok(())
        }
        Err(err) => {
            if matches!(err, ExportError::Fetch { .. } | ExportError::Persist { .. }) {
                eprintln!("Hint: {}", format_gcp_error(&err));
            }
            Err(err.into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_file.as_deref())?;

    match &args.command {
        Command::Process { event, dry_run } => {
            let exporter = build_exporter(&args, *dry_run).await?;
            let bytes = read_event(event).await?;
            let result = match Envelope::from_json_slice(&bytes) {
                Ok(envelope) => exporter.handle_envelope(&envelope).await,
                Err(e) => Err(e),
            };
            report(&exporter, result)
        }
        Command::Describe {
            kind,
            name,
            dry_run,
        } => {
            let handler = ResourceHandler::from_tag(kind)?;
            let exporter = build_exporter(&args, *dry_run).await?;
            let classification = Classification::new(handler.kind(), name.as_str());
            let result = exporter.export(&classification).await;
            report(&exporter, result)
        }
        Command::Serve { port } => {
            let port = match port {
                Some(port) => *port,
                None => match std::env::var("PORT") {
                    Ok(raw) => raw
                        .parse()
                        .with_context(|| format!("Invalid PORT value '{}'", raw))?,
                    Err(_) => DEFAULT_PORT,
                },
            };
            let exporter = Arc::new(build_exporter(&args, false).await?);
            let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
            tfrec::server::serve(exporter, addr).await
        }
    }
}
