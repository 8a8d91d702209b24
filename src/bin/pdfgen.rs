//! CLI binary for edgequake-pdfgen.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `RenderOptions`, runs one pipeline and reports where the PDF landed.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdfgen::{
    generate_pdf_from_content, generate_pdf_from_element, GenerationProgressCallback,
    ImageRasterizer, ImageSurface, Orientation, PageFormat, PipelineKind, ProgressCallback,
    RenderOptions,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
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

// ── Run summary ──────────────────────────────────────────────────────────────

/// What `--json` prints once a run finishes.
#[derive(Debug, Default, Clone, Serialize)]
struct Summary {
    pipeline: Option<PipelineKind>,
    path: Option<PathBuf>,
    bytes: usize,
    pages: usize,
    capture_px: Option<(u32, u32)>,
    duration_ms: u64,
}

/// Records pipeline events into a [`Summary`] and, when attached, drives a
/// spinner on stderr.
struct CliProgressCallback {
    bar: Option<ProgressBar>,
    summary: Mutex<Summary>,
}

impl CliProgressCallback {
    fn new(show_progress: bool) -> Arc<Self> {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar.set_prefix("Preparing");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Arc::new(Self {
            bar,
            summary: Mutex::new(Summary::default()),
        })
    }

    fn step(&self, prefix: &'static str, msg: String) {
        if let Some(ref bar) = self.bar {
            bar.set_prefix(prefix);
            bar.set_message(msg);
        }
    }

    fn update(&self, f: impl FnOnce(&mut Summary)) {
        if let Ok(mut summary) = self.summary.lock() {
            f(&mut summary);
        }
    }

    fn summary(&self) -> Summary {
        self.summary.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, kind: PipelineKind) {
        self.update(|s| s.pipeline = Some(kind));
        let msg = match kind {
            PipelineKind::Capture => "rasterising surface…",
            PipelineKind::Content => "laying out text…",
        };
        self.step("Generating", msg.to_string());
    }

    fn on_capture_complete(&self, width: u32, height: u32) {
        self.update(|s| s.capture_px = Some((width, height)));
        self.step("Composing", format!("{width}×{height} px snapshot"));
    }

    fn on_document_composed(&self, page_count: usize) {
        self.update(|s| s.pages = page_count);
        self.step("Saving", format!("{page_count} page(s)"));
    }

    fn on_saved(&self, path: &Path, bytes: usize) {
        self.update(|s| {
            s.path = Some(path.to_path_buf());
            s.bytes = bytes;
        });
    }

    fn on_generation_failed(&self, _kind: PipelineKind, detail: &str) {
        if let Some(ref bar) = self.bar {
            bar.println(format!("  {} {}", red("✗"), red(detail)));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Capture a rendered page screenshot into terms-and-conditions.pdf
  pdfgen capture screenshot.png

  # Landscape US Letter, custom name, into ./out
  pdfgen capture --format letter --orientation landscape \
      --filename receipt.pdf --output-dir out receipt.png

  # Compose a text document from a file
  pdfgen text --title "Terms and Conditions" terms.txt

  # ...or from stdin, with a JSON summary on stdout
  cat terms.txt | pdfgen text --title Terms --json -

PAGE FORMATS:
  a4       210 × 297 mm (default)
  letter   215.9 × 279.4 mm

ENVIRONMENT VARIABLES:
  PDFGEN_FILENAME      Default for --filename
  PDFGEN_FORMAT        Default for --format
  PDFGEN_ORIENTATION   Default for --orientation
  PDFGEN_OUTPUT_DIR    Default for --output-dir
  RUST_LOG             Overrides the log filter entirely
"#;

/// Generate PDF documents from rendered surfaces or plain text.
#[derive(Parser, Debug)]
#[command(
    name = "pdfgen",
    version,
    about = "Generate PDF documents from rendered surfaces or plain text",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture an image file as the visual surface and fit it onto one page.
    Capture {
        /// PNG or JPEG image of the rendered surface.
        image: PathBuf,

        /// Pixel density multiplier (0.1–8.0).
        #[arg(long, env = "PDFGEN_SCALE", default_value_t = 2.0)]
        scale: f32,
    },

    /// Compose a titled, paginated text document.
    Text {
        /// Document title, drawn once at the top of page 1.
        #[arg(short, long)]
        title: String,

        /// Body text file, or `-` for stdin.
        #[arg(default_value = "-")]
        input: String,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Output filename (no directories). Defaults per pipeline.
    #[arg(long, global = true, env = "PDFGEN_FILENAME")]
    filename: Option<String>,

    /// Paper size.
    #[arg(long, global = true, env = "PDFGEN_FORMAT", value_enum, default_value = "a4")]
    format: FormatArg,

    /// Page orientation.
    #[arg(
        long,
        global = true,
        env = "PDFGEN_ORIENTATION",
        value_enum,
        default_value = "portrait"
    )]
    orientation: OrientationArg,

    /// Directory to write the PDF into.
    #[arg(short, long, global = true, env = "PDFGEN_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Print a JSON summary of the run on stdout.
    #[arg(long, global = true, env = "PDFGEN_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "PDFGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFGEN_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    A4,
    Letter,
}

impl From<FormatArg> for PageFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::A4 => PageFormat::A4,
            FormatArg::Letter => PageFormat::Letter,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(v: OrientationArg) -> Self {
        match v {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let common = &cli.common;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters, so library INFO logs
    // are hidden while it runs.
    let show_progress = !common.quiet && !common.no_progress && !common.json;
    let filter = if common.verbose {
        "debug"
    } else if common.quiet || show_progress {
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

    // ── Build options ────────────────────────────────────────────────────
    let callback = CliProgressCallback::new(show_progress);
    let scale = match cli.command {
        Command::Capture { scale, .. } => Some(scale),
        Command::Text { .. } => None,
    };
    let options = build_options(common, scale, callback.clone() as ProgressCallback)?;

    // ── Run pipeline ─────────────────────────────────────────────────────
    let start = Instant::now();
    let result = match cli.command {
        Command::Capture { ref image, .. } => {
            let surface = ImageSurface::open(image)
                .await
                .with_context(|| format!("Failed to load {}", image.display()));
            match surface {
                Ok(surface) => {
                    generate_pdf_from_element(&surface, &ImageRasterizer::default(), &options)
                        .await
                        .context("PDF generation failed")
                }
                Err(e) => Err(e),
            }
        }
        Command::Text {
            ref title,
            ref input,
        } => match read_body(input).await {
            Ok(body) => generate_pdf_from_content(&body, title, &options)
                .await
                .context("PDF generation failed"),
            Err(e) => Err(e),
        },
    };
    callback.finish();
    result?;

    // ── Report ───────────────────────────────────────────────────────────
    let mut summary = callback.summary();
    summary.duration_ms = start.elapsed().as_millis() as u64;

    if common.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !common.quiet {
        let path = summary
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        eprintln!(
            "{}  {} page(s)  {}  {}ms  →  {}",
            green("✔"),
            summary.pages,
            dim(&format!("{} bytes", summary.bytes)),
            summary.duration_ms,
            bold(&path),
        );
    }

    Ok(())
}

/// Map CLI args to `RenderOptions`.
fn build_options(
    common: &CommonArgs,
    scale: Option<f32>,
    progress: ProgressCallback,
) -> Result<RenderOptions> {
    let mut builder = RenderOptions::builder()
        .format(common.format.into())
        .orientation(common.orientation.into())
        .output_dir(&common.output_dir)
        .progress_callback(progress);

    if let Some(ref name) = common.filename {
        builder = builder.filename(name);
    }
    if let Some(scale) = scale {
        builder = builder.capture_scale(scale);
    }

    builder.build().context("Invalid configuration")
}

/// Read the body text from a file, or from stdin for `-`.
async fn read_body(input: &str) -> Result<String> {
    if input == "-" {
        let mut body = String::new();
        tokio::io::stdin()
            .read_to_string(&mut body)
            .await
            .context("Failed to read body from stdin")?;
        Ok(body)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read body from {input}"))
    }
}
