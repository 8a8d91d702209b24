//! Emission: hand the serialised document to its destination.
//!
//! [`FileEmitter`] writes atomically: bytes go to a uniquely named temp file
//! in the target directory which is then persisted over the final name. Each
//! invocation owns its temp file, so concurrent saves of the same filename
//! never see each other's partial writes; the last rename wins.
//! [`MemoryEmitter`] keeps documents in memory for embedding hosts and tests.

use crate::config::validate_filename;
use crate::error::EmitError;
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Destination for finished documents.
#[async_trait]
pub trait Emitter: Send + Sync {
    /// Store `bytes` under `filename` and return where they ended up.
    async fn emit(&self, filename: &str, bytes: Vec<u8>) -> Result<PathBuf, EmitError>;
}

/// Writes documents into a directory.
#[derive(Debug, Clone)]
pub struct FileEmitter {
    dir: PathBuf,
}

impl FileEmitter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Emitter for FileEmitter {
    async fn emit(&self, filename: &str, bytes: Vec<u8>) -> Result<PathBuf, EmitError> {
        validate_filename(filename).map_err(|_| EmitError::InvalidFilename(filename.into()))?;
        let path = self.dir.join(filename);
        let len = bytes.len();

        let (dir, target) = (self.dir.clone(), path.clone());
        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &bytes))
            .await
            .map_err(|e| EmitError::Write {
                path: path.clone(),
                source: io::Error::other(format!("write task panicked: {e}")),
            })??;

        info!("Saved {} ({} bytes)", path.display(), len);
        Ok(path)
    }
}

/// Write `bytes` to a fresh temp file in `dir`, then rename it to `path`.
///
/// The temp file is removed on every failure path when it is dropped.
fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), EmitError> {
    let write_err = |source| EmitError::Write {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".pdfgen-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Keeps every emitted document in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    /// Bytes of the most recent document saved as `filename`.
    pub fn get(&self, filename: &str) -> Option<Vec<u8>> {
        self.files.lock().ok().and_then(|f| {
            f.iter()
                .rev()
                .find(|(name, _)| name == filename)
                .map(|(_, bytes)| bytes.clone())
        })
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().map(|f| f.is_empty()).unwrap_or(true)
    }
}

#[async_trait]
impl Emitter for MemoryEmitter {
    async fn emit(&self, filename: &str, bytes: Vec<u8>) -> Result<PathBuf, EmitError> {
        validate_filename(filename).map_err(|_| EmitError::InvalidFilename(filename.into()))?;
        let mut files = self
            .files
            .lock()
            .map_err(|_| EmitError::Unavailable("in-memory store is poisoned".into()))?;
        debug!("Captured {} in memory ({} bytes)", filename, bytes.len());
        files.push((filename.to_string(), bytes));
        Ok(PathBuf::from(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_emitter_writes_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = FileEmitter::new(dir.path());
        let path = emitter.emit("document.pdf", b"%PDF-1.7".to_vec()).await.unwrap();

        assert_eq!(path, dir.path().join("document.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1, "stray files: {names:?}");
    }

    #[tokio::test]
    async fn file_emitter_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out/pdfs");
        let path = FileEmitter::new(&nested)
            .emit("a.pdf", vec![1, 2, 3])
            .await
            .unwrap();
        assert!(path.starts_with(&nested));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn file_emitter_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileEmitter::new(dir.path())
            .emit("../escape.pdf", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, EmitError::InvalidFilename(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_of_one_name_never_mix() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = std::sync::Arc::new(FileEmitter::new(dir.path()));
        let payloads: Vec<Vec<u8>> = (0..8u8).map(|i| vec![i; 256 * 1024]).collect();

        let tasks: Vec<_> = payloads
            .iter()
            .cloned()
            .map(|bytes| {
                let emitter = emitter.clone();
                tokio::spawn(async move { emitter.emit("document.pdf", bytes).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let saved = std::fs::read(dir.path().join("document.pdf")).unwrap();
        assert!(payloads.contains(&saved), "saved file mixes payloads");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("document.pdf")]);
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory occupying the target name makes the rename fail.
        let target = dir.path().join("document.pdf");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let err = FileEmitter::new(dir.path())
            .emit("document.pdf", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(err, EmitError::Write { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn poisoned_memory_emitter_reports_failure() {
        let emitter = std::sync::Arc::new(MemoryEmitter::new());
        let holder = emitter.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.files.lock().unwrap();
            panic!("poison the store");
        })
        .join();

        let err = emitter.emit("a.pdf", vec![1]).await.unwrap_err();
        assert!(matches!(err, EmitError::Unavailable(_)));
    }

    #[tokio::test]
    async fn memory_emitter_keeps_latest_by_name() {
        let emitter = MemoryEmitter::new();
        assert!(emitter.is_empty());
        emitter.emit("a.pdf", vec![1]).await.unwrap();
        emitter.emit("a.pdf", vec![2]).await.unwrap();
        assert_eq!(emitter.get("a.pdf"), Some(vec![2]));
        assert_eq!(emitter.files().len(), 2);
        assert_eq!(emitter.get("missing.pdf"), None);
    }
}
