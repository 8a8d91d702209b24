//! The document-authoring seam.
//!
//! Page composition never touches PDF objects directly: it issues page, text
//! and image calls through [`DocumentBuilder`]. Two implementations ship with
//! the crate:
//!
//! * [`pdf::PdfDocumentBuilder`] — writes a real PDF via `pdf-writer`.
//! * [`recording::RecordingBuilder`] — records every call; its "serialised
//!   document" is the JSON operation log. Used to test layout without parsing
//!   PDF output.
//!
//! ## Coordinate space
//!
//! Every position is in millimetres, origin top-left, y growing downwards.
//! Text `y` is the baseline. Builders convert to their native space.

pub mod metrics;
pub mod pdf;
pub mod recording;

use crate::config::{PageGeometry, Rgb};
use crate::error::CompositionError;
use crate::pipeline::capture::RasterSnapshot;
use serde::{Deserialize, Serialize};

/// Built-in font families. Both map to PDF standard-14 fonts, so no font
/// program is embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    #[default]
    Helvetica,
    Courier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
}

/// The text state subsequent `text` calls draw with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextState {
    pub family: FontFamily,
    pub style: FontStyle,
    /// Font size in points.
    pub size: f32,
    pub color: Rgb,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            family: FontFamily::Helvetica,
            style: FontStyle::Normal,
            size: 16.0,
            color: Rgb::BLACK,
        }
    }
}

/// Where an image lands on the page, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Placement {
    /// True when the box lies entirely within `geometry`, allowing for
    /// floating-point rounding.
    pub fn fits_within(&self, geometry: PageGeometry) -> bool {
        const EPS: f32 = 1e-3;
        self.x >= -EPS
            && self.y >= -EPS
            && self.x + self.width <= geometry.width + EPS
            && self.y + self.height <= geometry.height + EPS
    }
}

/// An append-only page sequence being assembled.
///
/// A builder is created with its first page already open and every drawing
/// call targets the last page. [`DocumentBuilder::finish`] consumes the
/// builder, so nothing can be drawn after serialisation.
pub trait DocumentBuilder: Send {
    /// Create a document whose pages all share `geometry`.
    fn new(geometry: PageGeometry) -> Self
    where
        Self: Sized;

    fn geometry(&self) -> PageGeometry;

    fn page_count(&self) -> usize;

    /// Append a page and make it current.
    fn add_page(&mut self);

    fn set_font(&mut self, family: FontFamily, style: FontStyle);

    /// Font size in points.
    fn set_font_size(&mut self, size: f32);

    fn set_text_color(&mut self, color: Rgb);

    /// Draw `text` with its baseline starting at `(x, y)` on the current page.
    ///
    /// `text` is a single line; split multi-line strings before calling.
    fn text(&mut self, text: &str, x: f32, y: f32);

    /// Draw a bitmap into `placement` on the current page.
    fn add_image(
        &mut self,
        image: &RasterSnapshot,
        placement: Placement,
    ) -> Result<(), CompositionError>;

    /// Wrap `text` into lines no wider than `max_width` millimetres using the
    /// current font state.
    fn split_text_to_size(&self, text: &str, max_width: f32) -> Vec<String>;

    /// Record a document title in the output metadata, where supported.
    fn set_title(&mut self, title: &str) {
        let _ = title;
    }

    /// Serialise the document.
    fn finish(self) -> Result<Vec<u8>, CompositionError>
    where
        Self: Sized;
}
