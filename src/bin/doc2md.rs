//! CLI binary for doc2md-client.
//!
//! A thin shim over the library crate that maps subcommands onto
//! [`Store`] actions and prints what ends up in the state.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use doc2md_client::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use doc2md_client::store::extension_token;
use doc2md_client::{ApiClient, ClientConfig, ConversionOptions, DocumentFile, Store};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Spinner driven by the store's loading flag ───────────────────────────────

/// Terminal spinner that follows `AppState::is_loading` through a store
/// subscription, so it reflects the workflow rather than the call site.
struct LoadingSpinner {
    bar: ProgressBar,
    watcher: JoinHandle<()>,
}

impl LoadingSpinner {
    fn start(store: &Store, message: &'static str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(message);

        let mut rx = store.subscribe();
        let watched = bar.clone();
        let watcher = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                if rx.borrow_and_update().is_loading {
                    watched.enable_steady_tick(Duration::from_millis(80));
                } else {
                    watched.finish_and_clear();
                    break;
                }
            }
        });

        Self { bar, watcher }
    }

    fn finish(self) {
        self.watcher.abort();
        self.bar.finish_and_clear();
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # What can the service convert?
  doc2md formats

  # Convert to stdout
  doc2md convert report.docx

  # Convert to a file, pipe tables, no images
  doc2md convert report.docx -o report.md --table-format pipe --no-images

  # Full JSON response
  doc2md convert thesis.pdf --json > thesis.json

  # Talk to a remote deployment
  DOC2MD_API_URL=https://convert.example.com/api doc2md health

ENVIRONMENT VARIABLES:
  DOC2MD_API_URL   Base URL of the conversion API (default http://localhost:8000/api)
  DOC2MD_TIMEOUT   Request timeout in seconds (default 30)
  RUST_LOG         tracing filter, overrides -v / -q
"#;

/// Convert documents to Markdown through a doc2md conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "doc2md",
    version,
    about = "Convert documents to Markdown through a conversion service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Base URL of the conversion API.
    #[arg(long, global = true, env = "DOC2MD_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Request timeout in seconds.
    #[arg(long, global = true, env = "DOC2MD_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOC2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, global = true, env = "DOC2MD_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the file extensions the service can convert.
    Formats,

    /// Check that the service is up.
    Health,

    /// Convert a document to Markdown.
    Convert(ConvertArgs),

    /// Show a local file's size, extension, and whether it is supported.
    Info {
        /// File to inspect.
        input: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct ConvertArgs {
    /// Document to convert.
    input: PathBuf,

    /// Write Markdown to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Drop source formatting (bold, italics, alignment).
    #[arg(long)]
    no_preserve_formatting: bool,

    /// Leave embedded images out of the Markdown.
    #[arg(long)]
    no_images: bool,

    /// Largest image dimension in pixels.
    #[arg(long)]
    max_image_size: Option<u32>,

    /// Table style, e.g. grid, pipe, simple.
    #[arg(long)]
    table_format: Option<String>,

    /// Print the full JSON response instead of the Markdown.
    #[arg(long)]
    json: bool,
}

impl ConvertArgs {
    /// Only flags the user actually passed become explicit options.
    fn options(&self) -> ConversionOptions {
        ConversionOptions {
            preserve_formatting: self.no_preserve_formatting.then_some(false),
            include_images: self.no_images.then_some(false),
            max_image_size: self.max_image_size,
            table_format: self.table_format.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build client + store ─────────────────────────────────────────────
    let config = ClientConfig::builder()
        .base_url(&cli.api_url)
        .timeout_secs(cli.timeout)
        .build()
        .context("Invalid configuration")?;
    let client = ApiClient::new(config).context("Failed to create HTTP client")?;
    let store = Store::new(client);

    match &cli.command {
        Command::Formats => list_formats(&cli, &store).await,
        Command::Health => health(&store).await,
        Command::Convert(args) => convert(&cli, &store, args).await,
        Command::Info { input } => info(&cli, &store, input).await,
    }
}

/// Run `fetch_supported_formats` with a spinner and fail on a recorded error.
async fn load_formats(cli: &Cli, store: &Store) -> Result<Vec<String>> {
    let spinner = (!cli.quiet).then(|| LoadingSpinner::start(store, "Fetching formats…"));
    let outcome = store.fetch_supported_formats().await;
    if let Some(s) = spinner {
        s.finish();
    }
    outcome?;

    let state = store.state();
    if let Some(err) = state.error {
        bail!("{err}");
    }
    Ok(state.supported_formats)
}

async fn list_formats(cli: &Cli, store: &Store) -> Result<()> {
    let formats = load_formats(cli, store).await?;
    if !cli.quiet {
        eprintln!("{}", bold("Supported formats:"));
    }
    for f in formats {
        println!("  - {f}");
    }
    Ok(())
}

async fn health(store: &Store) -> Result<()> {
    let health = store
        .api()
        .get_health()
        .await
        .context("Health check failed")?;

    let mark = if health.is_healthy() {
        green("✔")
    } else {
        red("✘")
    };
    match health.version {
        Some(v) => println!("{mark} {}  {}", health.status, dim(&format!("v{v}"))),
        None => println!("{mark} {}", health.status),
    }
    Ok(())
}

async fn convert(cli: &Cli, store: &Store, args: &ConvertArgs) -> Result<()> {
    let formats = load_formats(cli, store).await?;

    let name = display_name(&args.input);
    if !store.is_supported_format(&name) {
        bail!(
            "Unsupported file format '{}'. Supported formats: {}",
            name,
            formats.join(", ")
        );
    }

    let file = DocumentFile::from_path(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let spinner = (!cli.quiet).then(|| LoadingSpinner::start(store, "Converting…"));
    let outcome = store.convert_document(&file, &args.options()).await;
    if let Some(s) = spinner {
        s.finish();
    }
    outcome?;

    let state = store.state();
    if let Some(err) = &state.error {
        bail!("Conversion failed: {err}");
    }
    let body = state
        .conversion_result
        .clone()
        .context("Service returned no conversion result")?;

    if args.json {
        let json = serde_json::to_string_pretty(&body).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let response = state
        .conversion_response()
        .context("Unexpected conversion response shape")?;
    if !response.success {
        bail!(
            "Conversion failed: {}",
            response.error.as_deref().unwrap_or("no reason given")
        );
    }
    let markdown = response.content.unwrap_or_default();

    if let Some(ref output_path) = args.output {
        tokio::fs::write(output_path, markdown.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{} {}  →  {}  {}",
                green("✔"),
                name,
                bold(&output_path.display().to_string()),
                dim(&format!("{} bytes", markdown.len())),
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    Ok(())
}

async fn info(cli: &Cli, store: &Store, input: &Path) -> Result<()> {
    let meta = tokio::fs::metadata(input)
        .await
        .with_context(|| format!("Failed to stat {}", input.display()))?;
    let name = display_name(input);

    println!("File:       {name}");
    println!("Size:       {} bytes", meta.len());
    println!(
        "Format:     {}",
        extension_token(&name).unwrap_or_else(|| "(none)".into())
    );

    // The service is the authority on formats; report it unreachable rather
    // than guessing.
    match load_formats(cli, store).await {
        Ok(_) => {
            let supported = store.is_supported_format(&name);
            println!(
                "Supported:  {}",
                if supported { green("yes") } else { red("no") }
            );
        }
        Err(e) => println!("Supported:  {}", dim(&format!("unknown ({e})"))),
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
