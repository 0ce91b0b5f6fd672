//! File access behind a narrow capability interface.
//!
//! `ConfigLoader` never touches the filesystem directly; it goes through a
//! `FileReader` chosen at construction.

use async_trait::async_trait;
use camino::Utf8Path;

/// Capability for reading configuration files
#[async_trait]
pub trait FileReader: Send + Sync {
    /// Whether a file exists at `path`
    fn exists(&self, path: &Utf8Path) -> bool;

    /// Read the whole file as UTF-8
    async fn read_to_string(&self, path: &Utf8Path) -> std::io::Result<String>;
}

/// `FileReader` backed by `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileReader;

#[async_trait]
impl FileReader for TokioFileReader {
    fn exists(&self, path: &Utf8Path) -> bool {
        path.is_file()
    }

    async fn read_to_string(&self, path: &Utf8Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}
