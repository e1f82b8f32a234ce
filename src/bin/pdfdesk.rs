//! CLI binary for pdfdesk.
//!
//! A thin shim over the library crate: maps flags to `ClientConfig` and
//! `ToolOptions`, drives one `Workflow`, and prints the returned links.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdfdesk::{
    save_all, ClientConfig, CompressionLevel, HttpTransport, ImageFormat, ManagedFile,
    ResultPresenter, SplitMode, SubmissionResult, SubmitOutcome, Transport, Variant, Workflow,
};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
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

// ── Terminal presenter using indicatif ───────────────────────────────────────

/// Spinner while a request is in flight; file-list and error lines on stderr.
struct CliPresenter {
    bar: ProgressBar,
    quiet: bool,
}

impl CliPresenter {
    fn new(show_progress: bool, quiet: bool) -> Arc<Self> {
        let bar = if show_progress {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar
        } else {
            ProgressBar::hidden()
        };
        Arc::new(Self { bar, quiet })
    }
}

impl ResultPresenter for CliPresenter {
    fn on_collection_changed(&self, names: &[String]) {
        if !self.quiet {
            eprintln!("{} {}", dim("files:"), names.join(", "));
        }
    }

    fn on_admission_errors(&self, message: &str) {
        for line in message.lines() {
            eprintln!("  {} {}", red("✗"), line);
        }
    }

    fn on_challenge_failed(&self, message: &str) {
        eprintln!("{} {}", red("✘"), message);
    }

    fn on_submit_start(&self, label: &str) {
        self.bar.set_message(label.to_string());
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_success(&self, result: &SubmissionResult) {
        self.bar.finish_and_clear();
        if !self.quiet {
            eprintln!(
                "{} {} file(s) ready",
                green("✔"),
                bold(&result.downloads.len().to_string())
            );
        }
    }

    fn on_failure(&self, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), message);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Merge in the given order
  pdfdesk merge intro.pdf body.pdf appendix.pdf

  # Split pages 1-3 and 5 into separate files, save them locally
  pdfdesk --download-dir out/ split --ranges "1-3, 5" report.pdf

  # Strong compression against a remote server
  pdfdesk --server https://pdf.example.org compress --level ultra_high scan.pdf

  # Convert images to WebP, answer given up front
  pdfdesk --answer 7 img2img --format webp a.png b.jpg

  # Bind photos into one PDF, JSON summary
  pdfdesk --json img2pdf page1.jpg page2.jpg

VERIFICATION:
  Every tool except compress asks a short question before submitting. The
  question is printed on stderr and the answer read from stdin. When the
  server rejects the answer a new question is shown. An empty answer aborts.

ENVIRONMENT VARIABLES:
  PDFDESK_SERVER        Service root URL (default http://127.0.0.1:5000/)
  PDFDESK_TIMEOUT       Request timeout in seconds
  PDFDESK_ANSWER        Verification answer (skips the prompt)
  PDFDESK_DOWNLOAD_DIR  Save returned files into this directory
  RUST_LOG              Log filter, overrides -v / -q
"#;

/// Merge, split and compress PDFs, convert images, bind images into a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdfdesk",
    version,
    about = "Merge, split and compress PDFs and convert images through a pdfdesk server",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    tool: Tool,

    /// Service root URL.
    #[arg(long, env = "PDFDESK_SERVER", default_value = pdfdesk::config::DEFAULT_BASE_URL)]
    server: String,

    /// Request timeout in seconds.
    #[arg(long, env = "PDFDESK_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Verification answer. Prompted for when absent.
    #[arg(long, env = "PDFDESK_ANSWER")]
    answer: Option<String>,

    /// Save the returned files into this directory.
    #[arg(short, long, env = "PDFDESK_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Parallel downloads.
    #[arg(long, env = "PDFDESK_DOWNLOAD_CONCURRENCY", default_value_t = 4)]
    download_concurrency: usize,

    /// Print a JSON summary instead of plain links.
    #[arg(long, env = "PDFDESK_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFDESK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "PDFDESK_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Tool {
    /// Merge PDFs, in the order given.
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Split a PDF into pages or page ranges.
    Split {
        file: PathBuf,
        /// Page ranges such as "1-3, 5". Without it every page is split out.
        #[arg(long)]
        ranges: Option<String>,
    },
    /// Reduce the size of a PDF.
    Compress {
        file: PathBuf,
        /// low, medium, high or ultra_high.
        #[arg(long, default_value = "medium")]
        level: CompressionLevel,
    },
    /// Convert images to another format.
    Img2img {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// jpg, png or webp.
        #[arg(long, default_value = "jpg")]
        format: ImageFormat,
    },
    /// Bind images into one PDF, in the order given.
    Img2pdf {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

impl Tool {
    fn variant(&self) -> Variant {
        match self {
            Tool::Merge { .. } => Variant::Merge,
            Tool::Split { .. } => Variant::Split,
            Tool::Compress { .. } => Variant::Compress,
            Tool::Img2img { .. } => Variant::ImageToImage,
            Tool::Img2pdf { .. } => Variant::ImageToPdf,
        }
    }

    fn files(&self) -> Vec<PathBuf> {
        match self {
            Tool::Merge { files } | Tool::Img2img { files, .. } | Tool::Img2pdf { files } => {
                files.clone()
            }
            Tool::Split { file, .. } | Tool::Compress { file, .. } => vec![file.clone()],
        }
    }

    fn apply_options(&self, workflow: &mut Workflow) {
        match self {
            Tool::Split {
                ranges: Some(ranges),
                ..
            } => {
                workflow.set_split_mode(SplitMode::CustomRanges);
                workflow.set_page_ranges(ranges.clone());
            }
            Tool::Compress { level, .. } => workflow.set_compression_level(*level),
            Tool::Img2img { format, .. } => workflow.set_output_format(*format),
            _ => {}
        }
    }
}

#[derive(Serialize)]
struct DownloadSummary {
    url: String,
    file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_to: Option<PathBuf>,
}

#[derive(Serialize)]
struct RunSummary {
    variant: Variant,
    files: Vec<String>,
    downloads: Vec<DownloadSummary>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers INFO-level progress, so library logs drop to
    // errors while it is shown.
    let show_progress = !cli.quiet && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = ClientConfig::builder()
        .base_url(cli.server.clone())
        .request_timeout_secs(cli.timeout)
        .download_concurrency(cli.download_concurrency)
        .build()
        .context("Invalid client configuration")?;
    let transport = Arc::new(HttpTransport::new(&config).context("Failed to build HTTP client")?);
    let presenter = CliPresenter::new(show_progress, cli.quiet);

    // ── Load files ───────────────────────────────────────────────────────
    let mut files = Vec::new();
    for path in cli.tool.files() {
        let file = ManagedFile::from_path(&path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?;
        files.push(file);
    }

    let variant = cli.tool.variant();
    let mut workflow = Workflow::open(variant, transport.clone(), presenter.clone()).await;
    let report = workflow.admit_batch(files);
    if report.accepted.is_empty() {
        bail!("None of the given files can be used with {variant}");
    }
    cli.tool.apply_options(&mut workflow);

    // ── Submit, re-asking after a rejected answer ────────────────────────
    let mut answer = cli.answer.clone();
    let result = loop {
        if workflow.config().requires_challenge {
            let Some(question) = workflow.challenge().question.clone() else {
                bail!("No verification question is available; check the server and retry");
            };
            let text = match answer.take() {
                Some(text) => text,
                None => prompt_answer(&question)?,
            };
            if text.is_empty() {
                bail!("Aborted: no answer given");
            }
            workflow.set_answer(text);
        }

        match workflow.submit().await {
            SubmitOutcome::Succeeded(result) => break result,
            SubmitOutcome::Failed(failure)
                if failure.challenge_rejected() && cli.answer.is_none() =>
            {
                continue;
            }
            SubmitOutcome::Failed(failure) => bail!(failure.message),
            SubmitOutcome::Refused(reason) => bail!(reason),
            SubmitOutcome::Busy => bail!("Another submission is already running"),
        }
    };

    // ── Output ───────────────────────────────────────────────────────────
    let saved = match cli.download_dir {
        Some(ref dir) => {
            let transport: Arc<dyn Transport> = transport.clone();
            let paths = save_all(transport, &result, dir, config.download_concurrency)
                .await
                .context("Failed to save downloads")?;
            paths.into_iter().map(Some).collect()
        }
        None => vec![None; result.downloads.len()],
    };

    let mut downloads = Vec::with_capacity(result.downloads.len());
    for (reference, saved_to) in result.downloads.iter().zip(saved) {
        let url = reference
            .resolve(&config.base_url)
            .context("Server returned an unusable download link")?;
        downloads.push(DownloadSummary {
            url: url.to_string(),
            file_name: reference.file_name().to_string(),
            saved_to,
        });
    }

    if cli.json {
        let summary = RunSummary {
            variant,
            files: workflow.current_names(),
            downloads,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else {
        if !cli.quiet {
            eprintln!("{}", green(workflow.config().complete_label));
        }
        for d in &downloads {
            match d.saved_to {
                Some(ref path) => println!("{}  {}", d.url, dim(&path.display().to_string())),
                None => println!("{}", d.url),
            }
        }
    }

    Ok(())
}

/// Show the question on stderr and read one line from stdin.
fn prompt_answer(question: &str) -> Result<String> {
    tokio::task::block_in_place(|| {
        eprint!("{} {} ", bold("?"), question);
        io::stderr().flush().ok();
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read the answer")?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    })
}
