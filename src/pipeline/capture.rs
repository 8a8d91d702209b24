//! Bitmap capture: visual surface → [`RasterSnapshot`].
//!
//! Rendering a surface is somebody else's job. This module defines the
//! contract a rasteriser must meet ([`Rasterizer`]) and the options it is
//! called with ([`CaptureOptions`]), plus one concrete implementation,
//! [`ImageRasterizer`], whose surface is an already-decoded image.
//!
//! ## Contract
//!
//! * The snapshot covers the surface's full scrollable extent, not just the
//!   visible viewport.
//! * Pixel density is `scale` × the surface's logical size (2× by default).
//! * Transparent pixels are composited over `background` (white by default),
//!   so snapshots carry no alpha channel.
//! * With `use_cors`, resources that fail to load are skipped, never fatal.
//! * Any other failure is a [`CaptureError`]. Nothing is retried.

use crate::config::{RenderOptions, Rgb};
use crate::error::CaptureError;
use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage, RgbaImage};
use std::path::Path;
use tracing::debug;

/// An opaque RGB bitmap produced by a rasteriser.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSnapshot {
    image: RgbImage,
}

impl RasterSnapshot {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// A single-colour snapshot. Handy for deterministic test rasterisers.
    pub fn solid(width: u32, height: u32, color: Rgb) -> Self {
        Self::new(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([color.0, color.1, color.2]),
        ))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Row-major RGB8 pixel data.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }
}

/// Something a [`Rasterizer`] can render.
pub trait VisualSurface: Send + Sync {
    /// Full content width in logical pixels, including overflow.
    fn scroll_width(&self) -> u32;

    /// Full content height in logical pixels, including overflow.
    fn scroll_height(&self) -> u32;

    /// False when the surface is not connected to anything renderable.
    fn is_attached(&self) -> bool {
        true
    }
}

/// Options passed to a rasteriser for one capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    /// Device-pixel multiplier. Default: 2.0.
    pub scale: f32,
    /// Substituted for transparency. Default: white.
    pub background: Rgb,
    /// Fetch cross-origin resources, skipping any that fail. Default: true.
    pub use_cors: bool,
    /// Allow resources that would taint the bitmap. Default: true.
    pub allow_taint: bool,
    /// Let the rasteriser emit its own debug output. Default: false.
    pub logging: bool,
    /// Capture width in logical pixels. None means the surface's scroll width.
    pub width: Option<u32>,
    /// Capture height in logical pixels. None means the surface's scroll height.
    pub height: Option<u32>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            background: Rgb::WHITE,
            use_cors: true,
            allow_taint: true,
            logging: false,
            width: None,
            height: None,
        }
    }
}

impl CaptureOptions {
    /// Options for capturing `surface` in full with the scale and background
    /// configured in `options`.
    pub fn for_surface<S: VisualSurface + ?Sized>(surface: &S, options: &RenderOptions) -> Self {
        Self {
            scale: options.capture_scale,
            background: options.background,
            width: Some(surface.scroll_width()),
            height: Some(surface.scroll_height()),
            ..Self::default()
        }
    }

    /// The logical extent to capture for `surface`.
    pub fn extent<S: VisualSurface + ?Sized>(&self, surface: &S) -> (u32, u32) {
        (
            self.width.unwrap_or_else(|| surface.scroll_width()),
            self.height.unwrap_or_else(|| surface.scroll_height()),
        )
    }
}

/// Renders a surface into a bitmap.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    type Surface: VisualSurface + ?Sized;

    async fn rasterize(
        &self,
        surface: &Self::Surface,
        options: &CaptureOptions,
    ) -> Result<RasterSnapshot, CaptureError>;
}

// ── Image-backed surface ─────────────────────────────────────────────────

/// A surface whose rendered appearance is an existing image.
///
/// The viewport defaults to the whole image; a smaller viewport models a
/// scrolled view, which capture ignores in favour of the full content.
#[derive(Debug, Clone)]
pub struct ImageSurface {
    content: RgbaImage,
    viewport: (u32, u32),
}

impl ImageSurface {
    pub fn new(content: RgbaImage) -> Self {
        let viewport = content.dimensions();
        Self { content, viewport }
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self::new(image.to_rgba8())
    }

    /// Decode an image file (PNG or JPEG).
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        let load_path = path.clone();
        let decoded = tokio::task::spawn_blocking(move || image::open(&load_path))
            .await
            .map_err(|e| CaptureError::Load {
                path: path.clone(),
                detail: format!("decode task panicked: {e}"),
            })?
            .map_err(|e| CaptureError::Load {
                path: path.clone(),
                detail: e.to_string(),
            })?;
        debug!(
            "Loaded surface {} ({}x{})",
            path.display(),
            decoded.width(),
            decoded.height()
        );
        Ok(Self::from_image(decoded))
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = (width, height);
        self
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn content(&self) -> &RgbaImage {
        &self.content
    }
}

impl VisualSurface for ImageSurface {
    fn scroll_width(&self) -> u32 {
        self.content.width()
    }

    fn scroll_height(&self) -> u32 {
        self.content.height()
    }
}

/// Rasterises an [`ImageSurface`] by resampling it to the requested density
/// and flattening it over the background colour.
///
/// Image surfaces reference no external resources, so `use_cors` and
/// `allow_taint` have nothing to act on.
#[derive(Debug, Clone)]
pub struct ImageRasterizer {
    /// Longest allowed snapshot edge in device pixels.
    pub max_edge: u32,
}

impl Default for ImageRasterizer {
    fn default() -> Self {
        Self { max_edge: 16_384 }
    }
}

#[async_trait]
impl Rasterizer for ImageRasterizer {
    type Surface = ImageSurface;

    async fn rasterize(
        &self,
        surface: &ImageSurface,
        options: &CaptureOptions,
    ) -> Result<RasterSnapshot, CaptureError> {
        if !surface.is_attached() {
            return Err(CaptureError::Detached);
        }
        let (width, height) = options.extent(surface);
        if width == 0 || height == 0 {
            return Err(CaptureError::EmptyExtent { width, height });
        }

        let target_w = scaled(width, options.scale);
        let target_h = scaled(height, options.scale);
        if target_w > self.max_edge as u64 || target_h > self.max_edge as u64 {
            return Err(CaptureError::TooLarge {
                width: target_w,
                height: target_h,
                limit: self.max_edge,
            });
        }

        let content = surface.content().clone();
        let scale = options.scale;
        let background = options.background;
        let logging = options.logging;

        let image = tokio::task::spawn_blocking(move || {
            render_blocking(
                &content,
                scale,
                target_w as u32,
                target_h as u32,
                background,
            )
        })
        .await
        .map_err(|e| CaptureError::Renderer(format!("rasterisation task panicked: {e}")))?;

        if logging {
            debug!(
                "Rasterised {}x{} surface at {}x → {}x{} px",
                width,
                height,
                scale,
                image.width(),
                image.height()
            );
        }

        Ok(RasterSnapshot::new(image))
    }
}

fn scaled(px: u32, scale: f32) -> u64 {
    ((px as f64 * scale as f64).round() as u64).max(1)
}

/// Resample `content` by `scale` and draw it at the origin of a
/// `width` × `height` canvas filled with `background`.
fn render_blocking(
    content: &RgbaImage,
    scale: f32,
    width: u32,
    height: u32,
    background: Rgb,
) -> RgbImage {
    let content_w = scaled(content.width(), scale) as u32;
    let content_h = scaled(content.height(), scale) as u32;
    let resampled = if (content_w, content_h) == content.dimensions() {
        content.clone()
    } else {
        imageops::resize(content, content_w, content_h, FilterType::Triangle)
    };

    let mut canvas = RgbImage::from_pixel(
        width,
        height,
        image::Rgb([background.0, background.1, background.2]),
    );
    let bg = [background.0, background.1, background.2];
    for (x, y, px) in resampled.enumerate_pixels() {
        if x >= width || y >= height {
            continue;
        }
        canvas.put_pixel(x, y, image::Rgb(flatten(px.0, bg)));
    }
    canvas
}

/// Composite one RGBA pixel over an opaque background.
pub fn flatten(rgba: [u8; 4], background: [u8; 3]) -> [u8; 3] {
    let a = rgba[3] as u32;
    let mix = |fg: u8, bg: u8| ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;
    [
        mix(rgba[0], background[0]),
        mix(rgba[1], background[1]),
        mix(rgba[2], background[2]),
    ]
}
