//! Pipeline stages for PDF generation.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and a backend (rasteriser, document builder, destination) can be
//! swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! capture ──▶ image_page ──┐
//!                          ├──▶ DocumentBuilder::finish ──▶ emit
//!             text_flow  ──┘
//! ```
//!
//! 1. [`capture`]    — rasterise a visual surface at 2× density; the only
//!    stage that talks to a renderer
//! 2. [`image_page`] — fit one snapshot onto one page
//! 3. [`text_flow`]  — title, wrapped body, page breaks
//! 4. [`emit`]       — hand the bytes to a file or memory sink

pub mod capture;
pub mod emit;
pub mod image_page;
pub mod text_flow;
