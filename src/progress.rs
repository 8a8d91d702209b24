//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::RenderOptionsBuilder::progress_callback`] to observe a
//! generation run: capture size, final page count, where the file landed, or
//! the full failure detail that the caller-facing error deliberately omits.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfgen::{GenerationProgressCallback, RenderOptions};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for PageCounter {
//!     fn on_document_composed(&self, page_count: usize) {
//!         self.pages.store(page_count, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(PageCounter { pages: AtomicUsize::new(0) });
//!
//! let options = RenderOptions::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Which pipeline emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    /// Visual surface → bitmap → single image page.
    Capture,
    /// Title + body → paginated text.
    Content,
}

/// Called by the generation pipelines as they progress.
///
/// Implementations must be `Send + Sync`: independent invocations may run
/// concurrently and share one callback. All methods default to no-ops.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once when a pipeline starts.
    fn on_generation_start(&self, kind: PipelineKind) {
        let _ = kind;
    }

    /// Called after the rasteriser returned a snapshot.
    ///
    /// # Arguments
    /// * `width`, `height` — snapshot size in pixels
    fn on_capture_complete(&self, width: u32, height: u32) {
        let _ = (width, height);
    }

    /// Called once composition is finished, before serialisation.
    fn on_document_composed(&self, page_count: usize) {
        let _ = page_count;
    }

    /// Called after the document was saved.
    ///
    /// # Arguments
    /// * `path`  — where the emitter stored the document
    /// * `bytes` — serialised document size
    fn on_saved(&self, path: &Path, bytes: usize) {
        let _ = (path, bytes);
    }

    /// Called when a pipeline fails, with the full stage detail.
    fn on_generation_failed(&self, kind: PipelineKind, detail: &str) {
        let _ = (kind, detail);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RenderOptions`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        pages: AtomicUsize,
        failures: Mutex<Vec<String>>,
    }

    impl GenerationProgressCallback for TrackingCallback {
        fn on_generation_start(&self, _kind: PipelineKind) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_composed(&self, page_count: usize) {
            self.pages.store(page_count, Ordering::SeqCst);
        }

        fn on_generation_failed(&self, _kind: PipelineKind, detail: &str) {
            self.failures.lock().unwrap().push(detail.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_generation_start(PipelineKind::Capture);
        cb.on_capture_complete(10, 20);
        cb.on_document_composed(1);
        cb.on_saved(Path::new("document.pdf"), 512);
        cb.on_generation_failed(PipelineKind::Content, "boom");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_generation_start(PipelineKind::Content);
        tracker.on_capture_complete(1, 1);
        tracker.on_document_composed(3);
        tracker.on_generation_failed(PipelineKind::Content, "disk full");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.pages.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.failures.lock().unwrap().as_slice(), ["disk full"]);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_generation_start(PipelineKind::Capture);
        cb.on_document_composed(1);
    }
}
