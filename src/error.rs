//! Error types for the edgequake-pdfgen library.
//!
//! Two layers of error types reflect two audiences:
//!
//! * [`PdfGenError`] — **Caller-facing**: what the `generate_*` entry points
//!   return. Every pipeline failure collapses into
//!   [`PdfGenError::GenerationFailed`], so callers handle exactly one failure
//!   kind no matter which stage broke.
//!
//! * [`StageError`] — **Diagnostic**: the full failure detail of the stage
//!   that failed (capture, composition or emission). It is written to the
//!   `tracing` log at the pipeline boundary and handed to the progress
//!   callback, then dropped.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the public API of edgequake-pdfgen.
#[derive(Debug, Error)]
pub enum PdfGenError {
    /// Any capture, composition or emission failure.
    ///
    /// The stage detail is only available in the diagnostic log.
    #[error("Failed to generate PDF")]
    GenerationFailed,

    /// Builder validation failed before any pipeline ran.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failure detail of a single pipeline stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("composition failed: {0}")]
    Composition(#[from] CompositionError),

    #[error("emission failed: {0}")]
    Emission(#[from] EmitError),
}

impl StageError {
    /// Short stage label used as a structured log field.
    pub fn stage(&self) -> &'static str {
        match self {
            StageError::Capture(_) => "capture",
            StageError::Composition(_) => "composition",
            StageError::Emission(_) => "emission",
        }
    }
}

/// The rasteriser could not produce a bitmap.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The surface is not attached to anything that can be rendered.
    #[error("surface is not attached")]
    Detached,

    /// The surface (or the requested capture extent) has no pixels.
    #[error("surface has an empty extent ({width}x{height})")]
    EmptyExtent { width: u32, height: u32 },

    /// The scaled capture would not fit in a single bitmap.
    #[error("capture of {width}x{height} px exceeds the {limit} px edge limit")]
    TooLarge { width: u64, height: u64, limit: u32 },

    /// Renderer-internal failure.
    #[error("renderer error: {0}")]
    Renderer(String),

    /// Reading the surface's source failed.
    #[error("failed to load surface '{path}': {detail}")]
    Load { path: PathBuf, detail: String },
}

/// Page layout or document serialisation failed.
#[derive(Debug, Error)]
pub enum CompositionError {
    /// An embedded image could not be encoded.
    #[error("failed to encode image: {0}")]
    ImageEncoding(String),

    /// The recording builder could not serialise its operation log.
    #[error("failed to serialise document: {0}")]
    Serialisation(String),

    /// A blocking composition task died.
    #[error("composition task panicked: {0}")]
    TaskPanicked(String),
}

/// The serialised document could not be saved.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid output filename '{0}'")]
    InvalidFilename(String),

    /// The destination can no longer accept documents.
    #[error("emitter unavailable: {0}")]
    Unavailable(String),
}
