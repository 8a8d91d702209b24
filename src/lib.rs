//! # edgequake-pdfgen
//!
//! Produce downloadable PDF documents from two kinds of input:
//!
//! * a **visual surface** (anything a [`Rasterizer`] can turn into a bitmap),
//!   captured at 2× density and fitted onto a single page, and
//! * **plain text** with a title, laid out in Helvetica with automatic line
//!   wrapping and page breaks.
//!
//! ## Pipeline Overview
//!
//! ```text
//! element:  surface ──▶ rasterise (async) ──▶ fit on page ─┐
//!                                                          ├─▶ finish ──▶ emit
//! content:  title + body ──▶ wrap ──▶ paginate ────────────┘
//! ```
//!
//! Both pipelines fail the same way: any stage error is logged via `tracing`
//! with its full detail and surfaced to the caller as
//! [`PdfGenError::GenerationFailed`] ("Failed to generate PDF").
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfgen::{generate_pdf_from_content, PageFormat, RenderOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = RenderOptions::builder()
//!         .format(PageFormat::Letter)
//!         .output_dir("out")
//!         .build()?;
//!     generate_pdf_from_content("Lorem ipsum dolor sit amet…", "Terms", &options).await?;
//!     // → out/document.pdf
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfgen` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdfgen = { version = "0.1", default-features = false }
//! ```
//!
//! ## Page Formats
//!
//! | Format | Portrait (mm) |
//! |--------|---------------|
//! | `a4`     | 210 × 297 |
//! | `letter` | 215.9 × 279.4 |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    Orientation, PageFormat, PageGeometry, RenderOptions, RenderOptionsBuilder, Rgb,
    DEFAULT_CAPTURE_FILENAME, DEFAULT_CONTENT_FILENAME,
};
pub use document::pdf::PdfDocumentBuilder;
pub use document::recording::{RecordedDocument, RecordingBuilder};
pub use document::DocumentBuilder;
pub use error::{CaptureError, CompositionError, EmitError, PdfGenError, StageError};
pub use generate::{
    generate_pdf_from_content, generate_pdf_from_content_sync, generate_pdf_from_content_with,
    generate_pdf_from_element, generate_pdf_from_element_sync, generate_pdf_from_element_with,
};
pub use pipeline::capture::{
    CaptureOptions, ImageRasterizer, ImageSurface, RasterSnapshot, Rasterizer, VisualSurface,
};
pub use pipeline::emit::{Emitter, FileEmitter, MemoryEmitter};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, PipelineKind, ProgressCallback};
