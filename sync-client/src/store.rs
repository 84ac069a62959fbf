//! Local file store abstraction.
//!
//! The transfer engine and orchestrator only see the local filesystem
//! through [`LocalStore`]: sequential readers and writers, directory
//! enumeration and a few metadata operations. [`FsStore`] implements it on
//! `tokio::fs`, rooted at a mount point.

use async_trait::async_trait;
use fbsync_types::DirectoryEntry;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Metadata for a local path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    /// Size in bytes.
    pub size: u64,
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// Whether the path is a regular file.
    pub is_regular_file: bool,
}

/// Path-addressed byte-stream store.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Open a file for sequential reading.
    async fn open_read(&self, path: &Path) -> io::Result<Box<dyn LocalReader>>;

    /// Create or truncate a file for sequential writing.
    async fn create(&self, path: &Path) -> io::Result<Box<dyn LocalWriter>>;

    /// Entries of a directory, sorted by name. Symlinks are not followed.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirectoryEntry>>;

    /// Remove a file, or a directory with its contents.
    async fn remove(&self, path: &Path) -> io::Result<()>;

    /// Move a file or directory.
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create a directory and its missing parents.
    async fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Metadata for a path.
    async fn info(&self, path: &Path) -> io::Result<FileInfo>;
}

/// A file open for reading.
#[async_trait]
pub trait LocalReader: Send {
    /// Byte length of the file when it was opened.
    fn len(&self) -> u64;

    /// Whether the file was empty when opened.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read up to `buf.len()` bytes. `Ok(0)` is end of file.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// A file open for writing.
#[async_trait]
pub trait LocalWriter: Send {
    /// Write some of `buf`, returning how many bytes were written.
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Flush buffered data to the file.
    async fn flush(&mut self) -> io::Result<()>;
}

/// [`LocalStore`] on the real filesystem.
///
/// Relative paths resolve against the mount point; absolute paths are used
/// as given.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The mount point.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl LocalStore for FsStore {
    async fn open_read(&self, path: &Path) -> io::Result<Box<dyn LocalReader>> {
        let file = File::open(self.resolve(path)).await?;
        let len = file.metadata().await?.len();
        Ok(Box::new(FsReader { file, len }))
    }

    async fn create(&self, path: &Path) -> io::Result<Box<dyn LocalWriter>> {
        let file = File::create(self.resolve(path)).await?;
        Ok(Box::new(FsWriter { file }))
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirectoryEntry>> {
        let mut dir = fs::read_dir(self.resolve(path)).await?;
        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type().await?;
            entries.push(if file_type.is_file() {
                DirectoryEntry::file(&name)
            } else {
                DirectoryEntry::other(&name)
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        let path = self.resolve(path);
        if fs::symlink_metadata(&path).await?.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        }
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(self.resolve(from), self.resolve(to)).await
    }

    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(self.resolve(path)).await
    }

    async fn info(&self, path: &Path) -> io::Result<FileInfo> {
        let metadata = fs::symlink_metadata(self.resolve(path)).await?;
        Ok(FileInfo {
            size: metadata.len(),
            is_dir: metadata.is_dir(),
            is_regular_file: metadata.is_file(),
        })
    }
}

struct FsReader {
    file: File,
    len: u64,
}

#[async_trait]
impl LocalReader for FsReader {
    fn len(&self) -> u64 {
        self.len
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf).await
    }
}

struct FsWriter {
    file: File,
}

#[async_trait]
impl LocalWriter for FsWriter {
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.file.flush().await
    }
}
