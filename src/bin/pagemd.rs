//! CLI binary for pagemd.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, resolves the API credential, and streams Markdown
//! to a file or stdout.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pagemd::{
    convert_to_writer, ConversionConfig, OpenAiTranscriber, PageImageFormat, ProgressCallback,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── CLI progress callback using indicatif ────────────────────────────────

/// Spinner with a running page tally. The page source is lazy, so the total
/// page count is unknown up front — a counter, not a bar.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {pos} pages  ⏱ {elapsed_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { spinner })
    }
}

impl ProgressCallback for CliProgress {
    fn on_page_complete(&self, pages_done: usize) {
        self.spinner.set_position(pages_done as u64);
    }

    fn on_finish(&self, pages_done: usize) {
        self.spinner
            .finish_with_message(format!("{pages_done} pages converted"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (stdout)
  pagemd document.pdf

  # Convert to a file, caching page images for re-runs
  pagemd -c document.pdf -o document.md

  # Pages 3-15 at higher resolution, four at a time
  pagemd --first-page 3 --last-page 15 --dpi 300 -n 4 paper.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY    API credential (prompted interactively when unset)

CACHING:
  With -c/--cache-pages, page images are written to a sibling directory
  named after the PDF (extension stripped), one file per page. If that
  directory already exists it is reused as-is and the PDF is not
  re-rasterised; delete it to force a fresh render.
"#;

/// Convert a PDF document to Markdown using a multimodal LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pagemd",
    version,
    about = "Convert PDF documents to Markdown using a multimodal LLM",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the input PDF file.
    pdf: PathBuf,

    /// Write Markdown to this file instead of stdout.
    #[arg(short, long, env = "PAGEMD_OUTPUT")]
    output: Option<PathBuf>,

    /// Cache and reuse intermediate page images.
    #[arg(short = 'c', long, env = "PAGEMD_CACHE_PAGES")]
    cache_pages: bool,

    /// First page to convert (1-indexed).
    #[arg(long)]
    first_page: Option<usize>,

    /// Last page to convert (1-indexed, inclusive).
    #[arg(long)]
    last_page: Option<usize>,

    /// Page image resolution in dots-per-inch (72–600).
    #[arg(long, env = "PAGEMD_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Number of pages transcribed in parallel per group.
    #[arg(short = 'n', long, env = "PAGEMD_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Page image format: png or jpeg.
    #[arg(long, env = "PAGEMD_FORMAT", value_enum, default_value = "png")]
    format: FormatArg,

    /// Model identifier sent to the chat-completions endpoint.
    #[arg(long, env = "PAGEMD_MODEL", default_value = "gpt-4.1")]
    model: String,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, env = "PAGEMD_API_BASE", default_value = "https://api.openai.com/v1")]
    api_base: String,

    /// Max model output tokens per page.
    #[arg(long, env = "PAGEMD_MAX_TOKENS", default_value_t = 16384)]
    max_tokens: usize,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAGEMD_VERBOSE")]
    verbose: bool,

    /// Suppress the progress counter and all non-error output.
    #[arg(short, long, env = "PAGEMD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FormatArg {
    Png,
    Jpeg,
}

impl From<FormatArg> for PageImageFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Png => PageImageFormat::Png,
            FormatArg::Jpeg => PageImageFormat::Jpeg,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Credential: environment, else non-echoed prompt ──────────────────
    let api_key = match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => rpassword::prompt_password("OpenAI API key: ")
            .context("Failed to read API key from terminal")?,
    };

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .concurrency(cli.concurrency)
        .cache_pages(cli.cache_pages)
        .image_format(cli.format.clone().into())
        .model(&cli.model)
        .api_base(&cli.api_base)
        .max_tokens(cli.max_tokens)
        .api_key(api_key);
    if let Some(first) = cli.first_page {
        builder = builder.first_page(first);
    }
    if let Some(last) = cli.last_page {
        builder = builder.last_page(last);
    }
    let show_progress = !cli.quiet && std::io::stderr().is_terminal();
    if show_progress {
        builder = builder.progress_callback(CliProgress::new());
    }
    let config = builder.build().context("Invalid configuration")?;

    let transcriber =
        OpenAiTranscriber::from_config(&config).context("Failed to build API client")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let pages = if let Some(ref path) = cli.output {
        let mut file = tokio::fs::File::create(path)
            .await
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        convert_to_writer(&cli.pdf, &config, &transcriber, &mut file)
            .await
            .context("Conversion failed")?
    } else {
        let mut stdout = tokio::io::stdout();
        convert_to_writer(&cli.pdf, &config, &transcriber, &mut stdout)
            .await
            .context("Conversion failed")?
    };

    if !cli.quiet && !show_progress {
        eprintln!("Converted {pages} pages");
    }

    Ok(())
}
