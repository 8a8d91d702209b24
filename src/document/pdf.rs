//! `pdf-writer` backed [`DocumentBuilder`].
//!
//! Pages are buffered as content streams until [`DocumentBuilder::finish`],
//! because the page objects need the final page tree and per-page image
//! resources. Image XObjects are written as soon as they are added.
//!
//! Text uses the standard-14 Helvetica and Courier faces with
//! WinAnsiEncoding, so no font program is embedded and measurement comes from
//! [`super::metrics`].

use super::metrics::{self, PT_PER_MM};
use super::{DocumentBuilder, FontFamily, FontStyle, Placement, TextState};
use crate::config::{PageGeometry, Rgb};
use crate::error::CompositionError;
use crate::pipeline::capture::RasterSnapshot;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use std::io::Write;
use tracing::debug;

const CATALOG_ID: i32 = 1;
const PAGE_TREE_ID: i32 = 2;
const INFO_ID: i32 = 3;
const FIRST_FREE_ID: i32 = 4;

const PRODUCER: &str = concat!("edgequake-pdfgen ", env!("CARGO_PKG_VERSION"));

/// (family, style, resource name, base font)
const FONTS: [(FontFamily, FontStyle, &str, &str); 4] = [
    (FontFamily::Helvetica, FontStyle::Normal, "F1", "Helvetica"),
    (FontFamily::Helvetica, FontStyle::Bold, "F2", "Helvetica-Bold"),
    (FontFamily::Courier, FontStyle::Normal, "F3", "Courier"),
    (FontFamily::Courier, FontStyle::Bold, "F4", "Courier-Bold"),
];

struct PageBuf {
    content: Content,
    images: Vec<(String, Ref)>,
}

impl PageBuf {
    fn new() -> Self {
        Self {
            content: Content::new(),
            images: Vec::new(),
        }
    }
}

/// Writes a PDF 1.7 document with one page size throughout.
pub struct PdfDocumentBuilder {
    pdf: Pdf,
    geometry: PageGeometry,
    finished: Vec<PageBuf>,
    current: PageBuf,
    state: TextState,
    next_id: i32,
    image_count: usize,
    /// Fonts drawn with so far: index into `FONTS` and object id.
    fonts: Vec<(usize, Ref)>,
    title: Option<String>,
}

impl PdfDocumentBuilder {
    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_id);
        self.next_id += 1;
        r
    }

    /// Resource name of the current font, registering it on first use.
    fn use_font(&mut self) -> &'static str {
        let (family, style) = (self.state.family, self.state.style);
        let index = FONTS
            .iter()
            .position(|(f, s, _, _)| *f == family && *s == style)
            .unwrap_or(0);
        if !self.fonts.iter().any(|(i, _)| *i == index) {
            let id = self.alloc();
            self.fonts.push((index, id));
        }
        FONTS[index].2
    }

    /// Millimetre x → PDF points.
    fn x_pt(x: f32) -> f32 {
        x * PT_PER_MM
    }

    /// Millimetre y from the top → PDF points from the bottom.
    fn y_pt(&self, y: f32) -> f32 {
        (self.geometry.height - y) * PT_PER_MM
    }
}

impl DocumentBuilder for PdfDocumentBuilder {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            pdf: Pdf::new(),
            geometry,
            finished: Vec::new(),
            current: PageBuf::new(),
            state: TextState::default(),
            next_id: FIRST_FREE_ID,
            image_count: 0,
            fonts: Vec::new(),
            title: None,
        }
    }

    fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    fn page_count(&self) -> usize {
        self.finished.len() + 1
    }

    fn add_page(&mut self) {
        let done = std::mem::replace(&mut self.current, PageBuf::new());
        self.finished.push(done);
    }

    fn set_font(&mut self, family: FontFamily, style: FontStyle) {
        self.state.family = family;
        self.state.style = style;
    }

    fn set_font_size(&mut self, size: f32) {
        self.state.size = size;
    }

    fn set_text_color(&mut self, color: Rgb) {
        self.state.color = color;
    }

    fn text(&mut self, text: &str, x: f32, y: f32) {
        let font = self.use_font();
        let [r, g, b] = self.state.color.to_unit();
        let (x_pt, y_pt) = (Self::x_pt(x), self.y_pt(y));
        let bytes = metrics::to_winansi(text);

        let content = &mut self.current.content;
        content.begin_text();
        content.set_font(Name(font.as_bytes()), self.state.size);
        content.set_fill_rgb(r, g, b);
        content.next_line(x_pt, y_pt);
        content.show(Str(&bytes));
        content.end_text();
    }

    fn add_image(
        &mut self,
        image: &RasterSnapshot,
        placement: Placement,
    ) -> Result<(), CompositionError> {
        let width = i32::try_from(image.width())
            .map_err(|_| CompositionError::ImageEncoding("image too wide".into()))?;
        let height = i32::try_from(image.height())
            .map_err(|_| CompositionError::ImageEncoding("image too tall".into()))?;
        let data = deflate(image.pixels())?;

        let id = self.alloc();
        self.image_count += 1;
        let name = format!("Im{}", self.image_count);

        let mut xobj = self.pdf.image_xobject(id, &data);
        xobj.filter(Filter::FlateDecode);
        xobj.width(width);
        xobj.height(height);
        xobj.color_space().device_rgb();
        xobj.bits_per_component(8);
        xobj.finish();

        let w_pt = placement.width * PT_PER_MM;
        let h_pt = placement.height * PT_PER_MM;
        let x_pt = Self::x_pt(placement.x);
        let y_pt = self.y_pt(placement.y + placement.height);

        let content = &mut self.current.content;
        content.save_state();
        content.transform([w_pt, 0.0, 0.0, h_pt, x_pt, y_pt]);
        content.x_object(Name(name.as_bytes()));
        content.restore_state();

        debug!(
            "Embedded {} ({}x{} px, {} bytes deflated) at {:.2},{:.2} mm",
            name,
            width,
            height,
            data.len(),
            placement.x,
            placement.y
        );
        self.current.images.push((name, id));
        Ok(())
    }

    fn split_text_to_size(&self, text: &str, max_width: f32) -> Vec<String> {
        metrics::split_text_to_size(
            text,
            self.state.family,
            self.state.style,
            self.state.size,
            max_width,
        )
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn finish(self) -> Result<Vec<u8>, CompositionError> {
        let Self {
            mut pdf,
            geometry,
            mut finished,
            current,
            mut next_id,
            fonts,
            title,
            ..
        } = self;
        finished.push(current);
        let pages = finished;

        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };
        let ids: Vec<(Ref, Ref)> = pages.iter().map(|_| (alloc(), alloc())).collect();

        let page_tree = Ref::new(PAGE_TREE_ID);
        pdf.catalog(Ref::new(CATALOG_ID)).pages(page_tree);
        pdf.pages(page_tree)
            .kids(ids.iter().map(|(page_id, _)| *page_id))
            .count(pages.len() as i32);

        for &(index, id) in &fonts {
            pdf.type1_font(id)
                .base_font(Name(FONTS[index].3.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
        }

        let media_box = Rect::new(
            0.0,
            0.0,
            geometry.width * PT_PER_MM,
            geometry.height * PT_PER_MM,
        );

        for (page, (page_id, content_id)) in pages.into_iter().zip(ids.iter().copied()) {
            {
                let mut p = pdf.page(page_id);
                p.media_box(media_box).parent(page_tree).contents(content_id);
                let mut resources = p.resources();
                if !fonts.is_empty() {
                    let mut dict = resources.fonts();
                    for &(index, id) in &fonts {
                        dict.pair(Name(FONTS[index].2.as_bytes()), id);
                    }
                }
                if !page.images.is_empty() {
                    let mut xobjects = resources.x_objects();
                    for (name, xobj_ref) in &page.images {
                        xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                    }
                }
            }
            pdf.stream(content_id, &page.content.finish());
        }

        {
            let mut info = pdf.document_info(Ref::new(INFO_ID));
            info.producer(TextStr(PRODUCER));
            if let Some(ref t) = title {
                info.title(TextStr(t));
            }
        }

        Ok(pdf.finish())
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, CompositionError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| CompositionError::ImageEncoding(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CompositionError::ImageEncoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Orientation, PageFormat};

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    fn a4() -> PdfDocumentBuilder {
        PdfDocumentBuilder::new(PageGeometry::new(PageFormat::A4, Orientation::Portrait))
    }

    #[test]
    fn starts_with_one_page() {
        let b = a4();
        assert_eq!(b.page_count(), 1);
        let bytes = DocumentBuilder::finish(b).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, "/Count 1"));
    }

    #[test]
    fn add_page_grows_page_tree() {
        let mut b = a4();
        b.add_page();
        b.add_page();
        assert_eq!(b.page_count(), 3);
        let bytes = DocumentBuilder::finish(b).unwrap();
        assert!(contains(&bytes, "/Count 3"));
    }

    #[test]
    fn text_uses_selected_font() {
        let mut b = a4();
        b.set_font(FontFamily::Helvetica, FontStyle::Bold);
        b.set_font_size(18.0);
        b.text("Hello", 20.0, 30.0);
        let bytes = DocumentBuilder::finish(b).unwrap();
        assert!(contains(&bytes, "/F2 18 Tf"));
        assert!(contains(&bytes, "(Hello) Tj"));
        assert!(contains(&bytes, "/Helvetica-Bold"));
        assert!(contains(&bytes, "/WinAnsiEncoding"));
    }

    #[test]
    fn image_becomes_flate_xobject() {
        let mut b = a4();
        let snap = RasterSnapshot::solid(8, 4, Rgb(200, 10, 10));
        b.add_image(
            &snap,
            Placement {
                x: 0.0,
                y: 0.0,
                width: 210.0,
                height: 105.0,
            },
        )
        .unwrap();
        let bytes = DocumentBuilder::finish(b).unwrap();
        assert!(contains(&bytes, "/Im1 Do"));
        assert!(contains(&bytes, "/FlateDecode"));
        assert!(contains(&bytes, "/Width 8"));
    }

    #[test]
    fn only_used_fonts_are_written() {
        let mut b = a4();
        b.text("plain", 20.0, 30.0);
        b.text("again", 20.0, 40.0);
        let bytes = DocumentBuilder::finish(b).unwrap();
        assert!(contains(&bytes, "/Helvetica"));
        assert!(!contains(&bytes, "/Helvetica-Bold"));
        assert!(!contains(&bytes, "/Courier"));
        assert_eq!(
            bytes.windows(b"/BaseFont".len()).filter(|w| *w == b"/BaseFont").count(),
            1
        );

        let mut b = a4();
        b.set_font(FontFamily::Courier, FontStyle::Normal);
        b.text("mono", 20.0, 30.0);
        let bytes = DocumentBuilder::finish(b).unwrap();
        assert!(contains(&bytes, "/BaseFont /Courier"));
        assert!(contains(&bytes, "/F3 16 Tf"));
    }

    #[test]
    fn image_only_document_has_no_fonts() {
        let mut b = a4();
        let snap = RasterSnapshot::solid(2, 2, Rgb::WHITE);
        let placement = Placement {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        b.add_image(&snap, placement).unwrap();
        let bytes = DocumentBuilder::finish(b).unwrap();
        assert!(!contains(&bytes, "/BaseFont"));
        assert!(!contains(&bytes, "/Font"));
    }

    #[test]
    fn title_lands_in_document_info() {
        let mut b = a4();
        b.set_title("Terms");
        let bytes = DocumentBuilder::finish(b).unwrap();
        assert!(contains(&bytes, "(Terms)"));
        assert!(contains(&bytes, "edgequake-pdfgen"));
    }

    #[test]
    fn split_uses_current_font_size() {
        let mut b = a4();
        let text = "word ".repeat(40);
        b.set_font_size(10.0);
        let small = b.split_text_to_size(&text, 100.0).len();
        b.set_font_size(20.0);
        let large = b.split_text_to_size(&text, 100.0).len();
        assert!(large > small);
    }
}
