//! A [`DocumentBuilder`] that records calls instead of producing a PDF.
//!
//! `finish()` serialises the recorded pages as JSON, so the recording builder
//! runs through the normal pipelines and emitters unchanged; read the result
//! back with [`RecordedDocument::from_bytes`].

use super::{metrics, DocumentBuilder, FontFamily, FontStyle, Placement, TextState};
use crate::config::{PageGeometry, Rgb};
use crate::error::CompositionError;
use crate::pipeline::capture::RasterSnapshot;
use serde::{Deserialize, Serialize};

/// One drawing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text {
        text: String,
        x: f32,
        y: f32,
        state: TextState,
    },
    Image {
        width_px: u32,
        height_px: u32,
        placement: Placement,
    },
}

/// Everything a [`RecordingBuilder`] saw, page by page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedDocument {
    pub geometry: PageGeometry,
    pub title: Option<String>,
    pub pages: Vec<Vec<DrawOp>>,
}

impl RecordedDocument {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// `(page_index, text, y)` for every text op, in drawing order.
    pub fn texts(&self) -> Vec<(usize, &str, f32)> {
        self.pages
            .iter()
            .enumerate()
            .flat_map(|(i, ops)| {
                ops.iter().filter_map(move |op| match op {
                    DrawOp::Text { text, y, .. } => Some((i, text.as_str(), *y)),
                    DrawOp::Image { .. } => None,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct RecordingBuilder {
    doc: RecordedDocument,
    state: TextState,
}

impl RecordingBuilder {
    pub fn document(&self) -> &RecordedDocument {
        &self.doc
    }

    fn current(&mut self) -> &mut Vec<DrawOp> {
        if self.doc.pages.is_empty() {
            self.doc.pages.push(Vec::new());
        }
        let last = self.doc.pages.len() - 1;
        &mut self.doc.pages[last]
    }
}

impl DocumentBuilder for RecordingBuilder {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            doc: RecordedDocument {
                geometry,
                title: None,
                pages: vec![Vec::new()],
            },
            state: TextState::default(),
        }
    }

    fn geometry(&self) -> PageGeometry {
        self.doc.geometry
    }

    fn page_count(&self) -> usize {
        self.doc.pages.len()
    }

    fn add_page(&mut self) {
        self.doc.pages.push(Vec::new());
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
        let state = self.state;
        self.current().push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            state,
        });
    }

    fn add_image(
        &mut self,
        image: &RasterSnapshot,
        placement: Placement,
    ) -> Result<(), CompositionError> {
        let (width_px, height_px) = (image.width(), image.height());
        self.current().push(DrawOp::Image {
            width_px,
            height_px,
            placement,
        });
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
        self.doc.title = Some(title.to_string());
    }

    fn finish(self) -> Result<Vec<u8>, CompositionError> {
        serde_json::to_vec(&self.doc).map_err(|e| CompositionError::Serialisation(e.to_string()))
    }
}
