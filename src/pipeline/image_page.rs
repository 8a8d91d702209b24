//! Image page composition: fit a snapshot onto a page.
//!
//! The snapshot is scaled uniformly by
//! `min(page_width / image_width, page_height / image_height)` so it fits
//! without distortion, then centred, leaving equal margins on the axis with
//! slack. Pages after the first get a small "Page N" label in the
//! bottom-right corner.

use crate::config::{PageGeometry, Rgb};
use crate::document::{DocumentBuilder, FontFamily, FontStyle, Placement};
use crate::error::CompositionError;
use crate::pipeline::capture::RasterSnapshot;
use tracing::debug;

const LABEL_FONT_SIZE: f32 = 10.0;
const LABEL_COLOR: Rgb = Rgb(100, 100, 100);
const LABEL_INSET_X: f32 = 20.0;
const LABEL_INSET_Y: f32 = 10.0;

/// Computed placement of a snapshot on a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageFit {
    /// Millimetres per snapshot pixel, applied to both axes.
    pub scale: f32,
    pub placement: Placement,
}

/// Fit an `image_width` × `image_height` pixel bitmap onto `page`.
pub fn fit_image(image_width: u32, image_height: u32, page: PageGeometry) -> ImageFit {
    let (iw, ih) = (image_width as f32, image_height as f32);
    let scale = (page.width / iw).min(page.height / ih);
    let (width, height) = (iw * scale, ih * scale);
    ImageFit {
        scale,
        placement: Placement {
            x: (page.width - width) / 2.0,
            y: (page.height - height) / 2.0,
            width,
            height,
        },
    }
}

/// Draw `snapshot` onto the current page of `doc`, fitted and centred.
///
/// `page_number` is 1-based; numbers above 1 are stamped on the page.
pub fn compose_image_page<B: DocumentBuilder>(
    doc: &mut B,
    snapshot: &RasterSnapshot,
    page_number: usize,
) -> Result<ImageFit, CompositionError> {
    let page = doc.geometry();
    let fit = fit_image(snapshot.width(), snapshot.height(), page);
    debug!(
        "Fitting {}x{} px snapshot at {:.4} mm/px → {:.2}x{:.2} mm",
        snapshot.width(),
        snapshot.height(),
        fit.scale,
        fit.placement.width,
        fit.placement.height
    );

    doc.add_image(snapshot, fit.placement)?;

    if page_number > 1 {
        doc.set_font_size(LABEL_FONT_SIZE);
        doc.set_text_color(LABEL_COLOR);
        doc.set_font(FontFamily::Helvetica, FontStyle::Normal);
        doc.text(
            &format!("Page {page_number}"),
            page.width - LABEL_INSET_X,
            page.height - LABEL_INSET_Y,
        );
    }

    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Orientation, PageFormat};
    use crate::document::recording::{DrawOp, RecordingBuilder};

    fn all_geometries() -> Vec<PageGeometry> {
        let mut out = Vec::new();
        for format in [PageFormat::A4, PageFormat::Letter] {
            for orientation in [Orientation::Portrait, Orientation::Landscape] {
                out.push(PageGeometry::new(format, orientation));
            }
        }
        out
    }

    #[test]
    fn fit_is_uniform_and_within_page() {
        // 2x captures of typical surfaces: wide, tall, square.
        for (w, h) in [(2560, 1440), (1600, 9000), (1200, 1200), (3840, 600)] {
            for page in all_geometries() {
                let fit = fit_image(w, h, page);
                assert!(fit.scale <= 1.0, "{w}x{h} on {page:?}");
                let p = fit.placement;
                assert!((p.width / w as f32 - p.height / h as f32).abs() < 1e-6);
                assert!(p.fits_within(page), "{w}x{h} on {page:?}: {p:?}");
            }
        }
    }

    #[test]
    fn tall_image_is_centred_horizontally() {
        let page = PageGeometry::new(PageFormat::A4, Orientation::Portrait);
        let fit = fit_image(1000, 2970, page);
        let p = fit.placement;
        assert!(p.y.abs() < 1e-4);
        assert!((p.height - 297.0).abs() < 1e-3);
        assert!((p.x - (210.0 - p.width) / 2.0).abs() < 1e-4);
        assert!((p.x - (210.0 - p.x - p.width)).abs() < 1e-3, "equal side margins");
    }

    #[test]
    fn wide_image_is_centred_vertically() {
        let page = PageGeometry::new(PageFormat::Letter, Orientation::Landscape);
        let fit = fit_image(4000, 1000, page);
        let p = fit.placement;
        assert!(p.x.abs() < 1e-4);
        assert!((p.width - page.width).abs() < 1e-3);
        assert!((p.y - (page.height - p.y - p.height)).abs() < 1e-3);
    }

    #[test]
    fn first_page_has_no_label() {
        let page = PageGeometry::new(PageFormat::A4, Orientation::Portrait);
        let mut doc = RecordingBuilder::new(page);
        compose_image_page(&mut doc, &RasterSnapshot::solid(400, 600, Rgb::WHITE), 1).unwrap();
        let ops = &doc.document().pages[0];
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], DrawOp::Image { width_px: 400, height_px: 600, .. }));
    }

    #[test]
    fn later_pages_are_labelled_bottom_right() {
        let page = PageGeometry::new(PageFormat::A4, Orientation::Portrait);
        let mut doc = RecordingBuilder::new(page);
        compose_image_page(&mut doc, &RasterSnapshot::solid(400, 600, Rgb::WHITE), 3).unwrap();
        match &doc.document().pages[0][1] {
            DrawOp::Text { text, x, y, state } => {
                assert_eq!(text, "Page 3");
                assert_eq!((*x, *y), (190.0, 287.0));
                assert_eq!(state.size, 10.0);
                assert_eq!(state.color, Rgb(100, 100, 100));
            }
            other => panic!("expected label, got {other:?}"),
        }
    }

    #[test]
    fn fit_is_deterministic() {
        let page = PageGeometry::new(PageFormat::A4, Orientation::Landscape);
        assert_eq!(fit_image(1234, 987, page), fit_image(1234, 987, page));
    }
}
