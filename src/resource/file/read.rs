//! Reading user-supplied files.

use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::path::{file_name, normalize};

/// A file supplied by the user, keyed by its path relative to the selection.
///
/// For a folder selection the path starts with the selected folder's own
/// name (`my_robot/urdf/robot.urdf`), like a browser folder picker reports it.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    path: String,
    bytes: Arc<[u8]>,
}

impl UploadedFile {
    /// Create a file from a relative path and its content.
    pub fn new(path: impl AsRef<str>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            path: normalize(path.as_ref()),
            bytes: bytes.into(),
        }
    }

    /// Read a single file from disk, keyed by its file name.
    pub async fn read(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
        let bytes = read_disk(path).await?;
        Ok(Self::new(name, bytes))
    }

    /// Relative path of the file.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File name (last path segment).
    pub fn name(&self) -> &str {
        file_name(&self.path)
    }

    /// File content.
    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }
}

/// Read every regular file below `root`.
///
/// The whole tree, including every nested listing, is walked before this
/// returns; there is no partial result. Files are keyed
/// `<root name>/<relative path>` and returned sorted by path. Symlinks are
/// skipped.
pub async fn read_directory(root: impl AsRef<Path>) -> io::Result<Vec<UploadedFile>> {
    let root = root.as_ref();
    let prefix = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut files = Vec::new();
    walk(root, prefix, &mut files).await?;
    files.sort_by(|a, b| a.path.cmp(&b.path));
    log::debug!("read {} file(s) from {}", files.len(), root.display());
    Ok(files)
}

async fn walk(dir: &Path, relative: String, out: &mut Vec<UploadedFile>) -> io::Result<()> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let child = if relative.is_empty() {
            name
        } else {
            format!("{relative}/{name}")
        };

        if file_type.is_dir() {
            Box::pin(walk(&entry.path(), child, out)).await?;
        } else if file_type.is_file() {
            let bytes = tokio::fs::read(entry.path()).await?;
            out.push(UploadedFile::new(child, bytes));
        }
    }
    Ok(())
}

/// Read a file from disk, rejecting directories.
async fn read_disk(path: &Path) -> io::Result<Vec<u8>> {
    let meta = tokio::fs::metadata(path).await?;
    if meta.is_dir() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "is a directory"));
    }
    tokio::fs::read(path).await
}

/// Decode bytes as UTF-8, stripping BOM if present.
pub fn decode_utf8(buf: &[u8]) -> Result<&str, std::str::Utf8Error> {
    let buf = buf.strip_prefix(b"\xef\xbb\xbf").unwrap_or(buf);
    std::str::from_utf8(buf)
}
