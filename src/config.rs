//! Configuration types for PDF generation.
//!
//! Everything a pipeline needs besides its input lives in [`RenderOptions`],
//! built via [`RenderOptionsBuilder`]. A built value is read-only: the
//! pipelines only ever borrow it, so one set of options can be shared by any
//! number of concurrent invocations.

use crate::error::PdfGenError;
use crate::pipeline::emit::Emitter;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default filename for the element-capture pipeline.
pub const DEFAULT_CAPTURE_FILENAME: &str = "terms-and-conditions.pdf";

/// Default filename for the text-composition pipeline.
pub const DEFAULT_CONTENT_FILENAME: &str = "document.pdf";

/// Options shared by both generation pipelines.
///
/// # Example
/// ```rust
/// use edgequake_pdfgen::{Orientation, PageFormat, RenderOptions};
///
/// let options = RenderOptions::builder()
///     .filename("report.pdf")
///     .format(PageFormat::Letter)
///     .orientation(Orientation::Landscape)
///     .build()
///     .unwrap();
/// assert!(options.geometry().width > options.geometry().height);
/// ```
#[derive(Clone)]
pub struct RenderOptions {
    /// Output filename. If None, each pipeline uses its own default
    /// ([`DEFAULT_CAPTURE_FILENAME`] or [`DEFAULT_CONTENT_FILENAME`]).
    pub filename: Option<String>,

    /// Paper size. Default: A4.
    pub format: PageFormat,

    /// Page orientation. Default: portrait.
    pub orientation: Orientation,

    /// Directory the default file emitter writes into. Default: current directory.
    pub output_dir: PathBuf,

    /// Pixel density multiplier for element capture. Range: 0.1–8.0. Default: 2.0.
    ///
    /// 2× is print quality for screen-sized content without producing
    /// unreasonably large images.
    pub capture_scale: f32,

    /// Colour substituted for transparent pixels during capture. Default: white.
    pub background: Rgb,

    /// Where the finished document goes. If None, a [`crate::FileEmitter`]
    /// rooted at `output_dir` is used.
    pub emitter: Option<Arc<dyn Emitter>>,

    /// Receives pipeline events. If None, no events are delivered.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            filename: None,
            format: PageFormat::default(),
            orientation: Orientation::default(),
            output_dir: PathBuf::from("."),
            capture_scale: 2.0,
            background: Rgb::WHITE,
            emitter: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("filename", &self.filename)
            .field("format", &self.format)
            .field("orientation", &self.orientation)
            .field("output_dir", &self.output_dir)
            .field("capture_scale", &self.capture_scale)
            .field("background", &self.background)
            .field("emitter", &self.emitter.as_ref().map(|_| "<dyn Emitter>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl RenderOptions {
    /// Create a new builder for `RenderOptions`.
    pub fn builder() -> RenderOptionsBuilder {
        RenderOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Physical page size for the configured format and orientation.
    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::new(self.format, self.orientation)
    }

    /// The configured filename, or `default` when none was set.
    pub fn filename_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.filename.as_deref().unwrap_or(default)
    }
}

/// Builder for [`RenderOptions`].
#[derive(Debug)]
pub struct RenderOptionsBuilder {
    options: RenderOptions,
}

impl RenderOptionsBuilder {
    pub fn filename(mut self, name: impl Into<String>) -> Self {
        self.options.filename = Some(name.into());
        self
    }

    pub fn format(mut self, format: PageFormat) -> Self {
        self.options.format = format;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.options.orientation = orientation;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.output_dir = dir.into();
        self
    }

    /// Pixel density for element capture. Positive values outside 0.1–8.0
    /// are clamped by [`build`](Self::build); zero, negative and NaN are rejected.
    pub fn capture_scale(mut self, scale: f32) -> Self {
        self.options.capture_scale = scale;
        self
    }

    pub fn background(mut self, rgb: Rgb) -> Self {
        self.options.background = rgb;
        self
    }

    pub fn emitter(mut self, emitter: Arc<dyn Emitter>) -> Self {
        self.options.emitter = Some(emitter);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.options.progress_callback = Some(cb);
        self
    }

    /// Build the options, validating constraints.
    pub fn build(mut self) -> Result<RenderOptions, PdfGenError> {
        if let Some(ref name) = self.options.filename {
            validate_filename(name).map_err(PdfGenError::InvalidConfig)?;
        }
        let scale = self.options.capture_scale;
        if scale.is_nan() || scale <= 0.0 {
            return Err(PdfGenError::InvalidConfig(format!(
                "Capture scale must be positive, got {scale}"
            )));
        }
        self.options.capture_scale = scale.clamp(0.1, 8.0);
        Ok(self.options)
    }
}

/// Reject names that are empty or would escape the output directory.
pub(crate) fn validate_filename(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Filename must not be empty".into());
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(format!(
            "Filename '{name}' must be a bare file name without path separators"
        ));
    }
    Ok(())
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Supported paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    /// ISO A4, 210 × 297 mm. (default)
    #[default]
    A4,
    /// US Letter, 8.5 × 11 in (215.9 × 279.4 mm).
    Letter,
}

impl PageFormat {
    /// Portrait `(width, height)` in millimetres.
    pub fn portrait_size_mm(self) -> (f32, f32) {
        match self {
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::Letter => (215.9, 279.4),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Physical page size in millimetres.
///
/// All placement arithmetic in the crate happens in this coordinate space:
/// origin at the top-left corner, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    pub fn new(format: PageFormat, orientation: Orientation) -> Self {
        let (w, h) = format.portrait_size_mm();
        match orientation {
            Orientation::Portrait => Self {
                width: w,
                height: h,
            },
            Orientation::Landscape => Self {
                width: h,
                height: w,
            },
        }
    }
}

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Components scaled to the 0.0–1.0 range PDF colour operators expect.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        ]
    }
}
