//! Generation entry points.
//!
//! Two pipelines, both strictly sequential within one invocation:
//!
//! ```text
//! element:  surface ──▶ rasterise ──▶ image page ──▶ finish ──▶ emit
//! content:  title+body ───────────▶ text pages ──▶ finish ──▶ emit
//! ```
//!
//! Every stage failure is caught here, logged with its full detail, and
//! replaced by [`PdfGenError::GenerationFailed`]. Callers never see which
//! stage broke; the log and [`GenerationProgressCallback::on_generation_failed`]
//! do.
//!
//! [`GenerationProgressCallback::on_generation_failed`]: crate::progress::GenerationProgressCallback::on_generation_failed

use crate::config::{PageGeometry, RenderOptions, DEFAULT_CAPTURE_FILENAME, DEFAULT_CONTENT_FILENAME};
use crate::document::pdf::PdfDocumentBuilder;
use crate::document::DocumentBuilder;
use crate::error::{CompositionError, PdfGenError, StageError};
use crate::pipeline::capture::{CaptureOptions, RasterSnapshot, Rasterizer};
use crate::pipeline::emit::{Emitter, FileEmitter};
use crate::pipeline::{image_page, text_flow};
use crate::progress::PipelineKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Capture `surface` and save it as a one-page PDF.
///
/// The snapshot is fitted onto a single page of the configured format and
/// orientation and saved as `options.filename`, or
/// [`DEFAULT_CAPTURE_FILENAME`] when unset.
///
/// # Errors
/// [`PdfGenError::GenerationFailed`] if capture, composition or saving fails.
/// No file is written in that case.
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdfgen::{generate_pdf_from_element, ImageRasterizer, ImageSurface, RenderOptions};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let surface = ImageSurface::open("terms.png").await?;
/// generate_pdf_from_element(&surface, &ImageRasterizer::default(), &RenderOptions::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn generate_pdf_from_element<R: Rasterizer>(
    surface: &R::Surface,
    rasterizer: &R,
    options: &RenderOptions,
) -> Result<(), PdfGenError> {
    generate_pdf_from_element_with::<PdfDocumentBuilder, R>(surface, rasterizer, options).await
}

/// [`generate_pdf_from_element`] with a caller-chosen [`DocumentBuilder`].
pub async fn generate_pdf_from_element_with<B, R>(
    surface: &R::Surface,
    rasterizer: &R,
    options: &RenderOptions,
) -> Result<(), PdfGenError>
where
    B: DocumentBuilder + 'static,
    R: Rasterizer,
{
    let kind = PipelineKind::Capture;
    notify_start(options, kind);
    let result = run_element::<B, R>(surface, rasterizer, options).await;
    boundary(options, kind, result)
}

/// Compose `title` and `content` into a paginated PDF and save it.
///
/// Saved as `options.filename`, or [`DEFAULT_CONTENT_FILENAME`] when unset.
///
/// # Errors
/// [`PdfGenError::GenerationFailed`] if composition or saving fails.
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdfgen::{generate_pdf_from_content, RenderOptions};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let body = std::fs::read_to_string("terms.txt")?;
/// generate_pdf_from_content(&body, "Terms and Conditions", &RenderOptions::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn generate_pdf_from_content(
    content: &str,
    title: &str,
    options: &RenderOptions,
) -> Result<(), PdfGenError> {
    generate_pdf_from_content_with::<PdfDocumentBuilder>(content, title, options).await
}

/// [`generate_pdf_from_content`] with a caller-chosen [`DocumentBuilder`].
pub async fn generate_pdf_from_content_with<B>(
    content: &str,
    title: &str,
    options: &RenderOptions,
) -> Result<(), PdfGenError>
where
    B: DocumentBuilder + 'static,
{
    let kind = PipelineKind::Content;
    notify_start(options, kind);
    let result = run_content::<B>(content, title, options).await;
    boundary(options, kind, result)
}

/// Synchronous wrapper around [`generate_pdf_from_element`].
///
/// Creates a temporary tokio runtime internally; do not call from inside an
/// async context.
pub fn generate_pdf_from_element_sync<R: Rasterizer>(
    surface: &R::Surface,
    rasterizer: &R,
    options: &RenderOptions,
) -> Result<(), PdfGenError> {
    runtime(options, PipelineKind::Capture)?.block_on(generate_pdf_from_element(
        surface, rasterizer, options,
    ))
}

/// Synchronous wrapper around [`generate_pdf_from_content`].
pub fn generate_pdf_from_content_sync(
    content: &str,
    title: &str,
    options: &RenderOptions,
) -> Result<(), PdfGenError> {
    runtime(options, PipelineKind::Content)?.block_on(generate_pdf_from_content(
        content, title, options,
    ))
}

// ── Pipelines ────────────────────────────────────────────────────────────

async fn run_element<B, R>(
    surface: &R::Surface,
    rasterizer: &R,
    options: &RenderOptions,
) -> Result<(), StageError>
where
    B: DocumentBuilder + 'static,
    R: Rasterizer,
{
    let start = Instant::now();
    let filename = options.filename_or(DEFAULT_CAPTURE_FILENAME);
    info!("Generating {} from element", filename);

    // ── Step 1: Capture ──────────────────────────────────────────────────
    let capture_options = CaptureOptions::for_surface(surface, options);
    debug!(?capture_options, "Capturing surface");
    let snapshot = rasterizer.rasterize(surface, &capture_options).await?;
    info!(
        "Captured {}x{} px in {}ms",
        snapshot.width(),
        snapshot.height(),
        start.elapsed().as_millis()
    );
    if let Some(ref cb) = options.progress_callback {
        cb.on_capture_complete(snapshot.width(), snapshot.height());
    }

    // ── Step 2: Compose (CPU-bound: deflate + serialise) ─────────────────
    let geometry = options.geometry();
    let (bytes, pages) = tokio::task::spawn_blocking(move || compose_image::<B>(geometry, &snapshot))
        .await
        .map_err(|e| CompositionError::TaskPanicked(e.to_string()))??;
    if let Some(ref cb) = options.progress_callback {
        cb.on_document_composed(pages);
    }

    // ── Step 3: Emit ─────────────────────────────────────────────────────
    emit(options, filename, bytes).await?;
    info!(
        "Generated {} ({} page) in {}ms",
        filename,
        pages,
        start.elapsed().as_millis()
    );
    Ok(())
}

async fn run_content<B>(content: &str, title: &str, options: &RenderOptions) -> Result<(), StageError>
where
    B: DocumentBuilder + 'static,
{
    let start = Instant::now();
    let filename = options.filename_or(DEFAULT_CONTENT_FILENAME);
    info!(
        "Generating {} from {} chars of content",
        filename,
        content.chars().count()
    );

    // ── Step 1: Compose ──────────────────────────────────────────────────
    let geometry = options.geometry();
    let (body, heading) = (content.to_string(), title.to_string());
    let (bytes, pages) = tokio::task::spawn_blocking(move || {
        let mut doc = B::new(geometry);
        text_flow::compose_text_document(&mut doc, &heading, &body);
        let pages = doc.page_count();
        doc.finish().map(|bytes| (bytes, pages))
    })
    .await
    .map_err(|e| CompositionError::TaskPanicked(e.to_string()))??;
    if let Some(ref cb) = options.progress_callback {
        cb.on_document_composed(pages);
    }

    // ── Step 2: Emit ─────────────────────────────────────────────────────
    emit(options, filename, bytes).await?;
    info!(
        "Generated {} ({} pages) in {}ms",
        filename,
        pages,
        start.elapsed().as_millis()
    );
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn compose_image<B: DocumentBuilder>(
    geometry: PageGeometry,
    snapshot: &RasterSnapshot,
) -> Result<(Vec<u8>, usize), CompositionError> {
    let mut doc = B::new(geometry);
    let page_number = doc.page_count();
    image_page::compose_image_page(&mut doc, snapshot, page_number)?;
    let pages = doc.page_count();
    Ok((doc.finish()?, pages))
}

async fn emit(options: &RenderOptions, filename: &str, bytes: Vec<u8>) -> Result<PathBuf, StageError> {
    let emitter: Arc<dyn Emitter> = match options.emitter {
        Some(ref e) => Arc::clone(e),
        None => Arc::new(FileEmitter::new(&options.output_dir)),
    };
    let len = bytes.len();
    let path = emitter.emit(filename, bytes).await?;
    if let Some(ref cb) = options.progress_callback {
        cb.on_saved(&path, len);
    }
    Ok(path)
}

fn notify_start(options: &RenderOptions, kind: PipelineKind) {
    if let Some(ref cb) = options.progress_callback {
        cb.on_generation_start(kind);
    }
}

/// Log the stage detail and collapse any failure into the generic error.
fn boundary(
    options: &RenderOptions,
    kind: PipelineKind,
    result: Result<(), StageError>,
) -> Result<(), PdfGenError> {
    result.map_err(|e| {
        error!(stage = e.stage(), error = %e, "Error generating PDF");
        if let Some(ref cb) = options.progress_callback {
            cb.on_generation_failed(kind, &e.to_string());
        }
        PdfGenError::GenerationFailed
    })
}

fn runtime(options: &RenderOptions, kind: PipelineKind) -> Result<tokio::runtime::Runtime, PdfGenError> {
    tokio::runtime::Runtime::new().map_err(|e| {
        error!(error = %e, "Failed to create tokio runtime");
        if let Some(ref cb) = options.progress_callback {
            cb.on_generation_failed(kind, &format!("failed to create runtime: {e}"));
        }
        PdfGenError::GenerationFailed
    })
}
