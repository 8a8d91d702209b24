//! Text page composition: title + wrapped body, paginated.
//!
//! ## Layout
//!
//! ```text
//!  ┌──────────────────────────────┐
//!  │ 20mm margin                  │
//!  │   Title (18pt bold) y = 30   │
//!  │   body line 1      y = 45    │
//!  │   body line 2      y = 52    │  line height 7mm
//!  │   …                          │
//!  │   last line while y ≤ h − 20 │
//!  └──────────────────────────────┘
//! ```
//!
//! Continuation pages restart at `y = 20` and never repeat the title. A title
//! containing newlines is drawn as several lines, 1.15 × its font size apart;
//! the body start does not move.
//! Layout is a pure function of (lines, page geometry), so identical input
//! always yields identical pages and positions.

use crate::config::{PageGeometry, Rgb};
use crate::document::metrics::PT_PER_MM;
use crate::document::{DocumentBuilder, FontFamily, FontStyle};
use serde::Serialize;
use tracing::debug;

pub const MARGIN: f32 = 20.0;
pub const LINE_HEIGHT: f32 = 7.0;
const TITLE_OFFSET: f32 = 10.0;
const BODY_OFFSET: f32 = 25.0;

const TITLE_FONT_SIZE: f32 = 18.0;
const TITLE_LINE_HEIGHT_FACTOR: f32 = 1.15;
const TITLE_COLOR: Rgb = Rgb(50, 50, 50);
const BODY_FONT_SIZE: f32 = 12.0;
const BODY_COLOR: Rgb = Rgb(70, 70, 70);

/// One body line with its final position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLine {
    /// 0-based page index.
    pub page: usize,
    pub x: f32,
    /// Baseline, millimetres from the top of the page.
    pub y: f32,
    pub text: String,
}

/// Page width minus both margins.
pub fn content_width(page: PageGeometry) -> f32 {
    page.width - MARGIN * 2.0
}

/// Assign each wrapped line a page and a baseline.
///
/// Before a line is placed, a `y` past `page.height − MARGIN` starts a new
/// page with `y` reset to the top margin.
pub fn paginate(lines: Vec<String>, page: PageGeometry) -> Vec<PlacedLine> {
    let limit = page.height - MARGIN;
    let mut placed = Vec::with_capacity(lines.len());
    let mut page_index = 0;
    let mut y = MARGIN + BODY_OFFSET;

    for text in lines {
        if y > limit {
            page_index += 1;
            y = MARGIN;
        }
        placed.push(PlacedLine {
            page: page_index,
            x: MARGIN,
            y,
            text,
        });
        y += LINE_HEIGHT;
    }

    placed
}

/// Number of body lines that fit on the first page and on each continuation page.
pub fn page_capacity(page: PageGeometry) -> (usize, usize) {
    let limit = page.height - MARGIN;
    let fit = |start: f32| ((limit - start) / LINE_HEIGHT).floor() as usize + 1;
    (fit(MARGIN + BODY_OFFSET), fit(MARGIN))
}

/// Draw `title` and the wrapped `body` into `doc`, adding pages as needed.
///
/// Returns the placed body lines.
pub fn compose_text_document<B: DocumentBuilder>(
    doc: &mut B,
    title: &str,
    body: &str,
) -> Vec<PlacedLine> {
    let page = doc.geometry();
    doc.set_title(title);

    doc.set_font_size(TITLE_FONT_SIZE);
    doc.set_font(FontFamily::Helvetica, FontStyle::Bold);
    doc.set_text_color(TITLE_COLOR);
    let title_advance = TITLE_FONT_SIZE * TITLE_LINE_HEIGHT_FACTOR / PT_PER_MM;
    for (i, line) in title.split('\n').enumerate() {
        let y = MARGIN + TITLE_OFFSET + i as f32 * title_advance;
        doc.text(line.trim_end_matches('\r'), MARGIN, y);
    }

    doc.set_font_size(BODY_FONT_SIZE);
    doc.set_font(FontFamily::Helvetica, FontStyle::Normal);
    doc.set_text_color(BODY_COLOR);

    let lines = doc.split_text_to_size(body, content_width(page));
    let placed = paginate(lines, page);

    for line in &placed {
        while doc.page_count() <= line.page {
            doc.add_page();
        }
        doc.text(&line.text, line.x, line.y);
    }

    debug!(
        "Composed {} body lines over {} pages",
        placed.len(),
        doc.page_count()
    );
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Orientation, PageFormat};
    use crate::document::recording::{DrawOp, RecordingBuilder};

    fn a4() -> PageGeometry {
        PageGeometry::new(PageFormat::A4, Orientation::Portrait)
    }

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn capacities_for_a4_and_letter() {
        assert_eq!(page_capacity(a4()), (34, 37));
        let letter = PageGeometry::new(PageFormat::Letter, Orientation::Portrait);
        assert_eq!(page_capacity(letter), (31, 35));
    }

    #[test]
    fn short_body_fits_one_page() {
        let placed = paginate(numbered(10), a4());
        assert!(placed.iter().all(|l| l.page == 0));
        assert_eq!(placed[0].y, 45.0);
        assert_eq!(placed[9].y, 45.0 + 9.0 * 7.0);
    }

    #[test]
    fn page_count_follows_capacities() {
        let (first, rest) = page_capacity(a4());
        for n in [first, first + 1, first + rest, first + rest + 1, first + 5 * rest] {
            let placed = paginate(numbered(n), a4());
            let pages = placed.last().map(|l| l.page + 1).unwrap_or(1);
            let expected = if n <= first {
                1
            } else {
                1 + (n - first).div_ceil(rest)
            };
            assert_eq!(pages, expected, "{n} lines");
        }
    }

    #[test]
    fn continuation_restarts_at_top_margin_in_order() {
        let (first, _) = page_capacity(a4());
        let placed = paginate(numbered(first + 3), a4());
        assert_eq!(placed[first - 1].page, 0);
        assert_eq!(placed[first].page, 1);
        assert_eq!(placed[first].y, MARGIN);
        let texts: Vec<_> = placed.iter().map(|l| l.text.clone()).collect();
        assert_eq!(texts, numbered(first + 3));
        assert!(placed.iter().all(|l| l.y <= a4().height - MARGIN));
    }

    #[test]
    fn title_drawn_once_then_body() {
        let mut doc = RecordingBuilder::new(a4());
        let body = "word ".repeat(2000);
        let placed = compose_text_document(&mut doc, "Terms", &body);
        let recorded = doc.document();

        assert!(recorded.page_count() >= 2);
        assert_eq!(recorded.page_count(), placed.last().unwrap().page + 1);
        assert_eq!(recorded.title.as_deref(), Some("Terms"));

        let titles: Vec<_> = recorded
            .pages
            .iter()
            .flatten()
            .filter(|op| matches!(op, DrawOp::Text { text, .. } if text == "Terms"))
            .collect();
        assert_eq!(titles.len(), 1);

        match &recorded.pages[0][0] {
            DrawOp::Text { y, state, .. } => {
                assert_eq!(*y, 30.0);
                assert_eq!(state.style, FontStyle::Bold);
                assert_eq!(state.size, 18.0);
            }
            other => panic!("unexpected first op {other:?}"),
        }
        match &recorded.pages[1][0] {
            DrawOp::Text { y, state, .. } => {
                assert_eq!(*y, MARGIN);
                assert_eq!(state.style, FontStyle::Normal);
                assert_eq!(state.color, Rgb(70, 70, 70));
            }
            other => panic!("unexpected continuation op {other:?}"),
        }
    }

    #[test]
    fn multi_line_title_is_split_on_newlines() {
        let mut doc = RecordingBuilder::new(a4());
        compose_text_document(&mut doc, "Terms\r\nand Conditions", "Body");
        let texts = doc.document().texts();

        assert_eq!(texts[0], (0, "Terms", 30.0));
        let (_, second, y) = texts[1];
        assert_eq!(second, "and Conditions");
        assert!((y - (30.0 + 18.0 * 1.15 / PT_PER_MM)).abs() < 1e-4, "got {y}");
        assert_eq!(texts[2], (0, "Body", 45.0));
    }

    #[test]
    fn body_lines_fit_content_width() {
        use crate::document::metrics::text_width;
        let mut doc = RecordingBuilder::new(a4());
        let body = "The quick brown fox jumps over the lazy dog. ".repeat(30);
        let placed = compose_text_document(&mut doc, "T", &body);
        for line in placed {
            let w = text_width(&line.text, FontFamily::Helvetica, FontStyle::Normal, 12.0);
            assert!(w <= content_width(a4()), "{:?}", line.text);
        }
    }

    #[test]
    fn composition_is_deterministic() {
        let body = "Lorem ipsum dolor sit amet ".repeat(300);
        let run = || {
            let mut doc = RecordingBuilder::new(a4());
            compose_text_document(&mut doc, "Title", &body);
            doc.document().clone()
        };
        assert_eq!(run(), run());
    }
}
