//! Filesystem collaborators: the handful of primitives the engine needs
//! from the platform, behind object-safe traits so failure paths can be
//! driven from tests.

use futures::future::BoxFuture;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Opens file handles for tail sessions.
pub trait FileSystem: Send + Sync {
    /// Open the file at `path` for reading.
    fn open(&self, path: &Path) -> BoxFuture<'static, io::Result<Arc<dyn FileHandle>>>;
}

/// An open file usable for concurrent positional reads.
pub trait FileHandle: Send + Sync {
    /// Current size of the file, in bytes.
    fn size(&self) -> BoxFuture<'static, io::Result<u64>>;

    /// Read up to `len` bytes starting at absolute `offset`. Returns fewer
    /// bytes when the end of the file is reached first.
    fn read_at(&self, offset: u64, len: usize) -> BoxFuture<'static, io::Result<Vec<u8>>>;

    /// Release the handle.
    fn close(&self) -> BoxFuture<'static, io::Result<()>>;
}

/// Production [`FileSystem`] backed by the tokio blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFileSystem;

impl FileSystem for TokioFileSystem {
    fn open(&self, path: &Path) -> BoxFuture<'static, io::Result<Arc<dyn FileHandle>>> {
        let path = path.to_path_buf();
        Box::pin(async move {
            let file = tokio::fs::File::open(&path).await?;
            let handle = TokioFileHandle {
                file: Arc::new(file.into_std().await),
            };
            Ok(Arc::new(handle) as Arc<dyn FileHandle>)
        })
    }
}

/// Shares one descriptor across in-flight reads; every operation is a
/// positional read, so no seek position is ever contended.
struct TokioFileHandle {
    file: Arc<std::fs::File>,
}

impl FileHandle for TokioFileHandle {
    fn size(&self) -> BoxFuture<'static, io::Result<u64>> {
        let file = Arc::clone(&self.file);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || file.metadata().map(|meta| meta.len()))
                .await
                .map_err(io::Error::other)?
        })
    }

    fn read_at(&self, offset: u64, len: usize) -> BoxFuture<'static, io::Result<Vec<u8>>> {
        let file = Arc::clone(&self.file);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || fill_from(&file, offset, len))
                .await
                .map_err(io::Error::other)?
        })
    }

    fn close(&self) -> BoxFuture<'static, io::Result<()>> {
        // std exposes no fallible close; the descriptor is released when the
        // last clone of the inner file drops.
        Box::pin(async { Ok(()) })
    }
}

/// Read until `len` bytes are filled or the file ends at `offset + n`.
fn fill_from(file: &std::fs::File, offset: u64, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        let n = positional_read(file, &mut buf[filled..], offset + filled as u64)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}

#[cfg(unix)]
fn positional_read(file: &std::fs::File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn positional_read(file: &std::fs::File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::assert_ok;

    fn fixture(content: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.log");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_open_and_size() {
        let (_dir, path) = fixture(b"0123456789");
        let handle = TokioFileSystem.open(&path).await.unwrap();

        assert_eq!(handle.size().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = TokioFileSystem.open(&dir.path().join("missing.log")).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_read_at_returns_exact_range() {
        let (_dir, path) = fixture(b"0123456789");
        let handle = TokioFileSystem.open(&path).await.unwrap();

        let bytes = handle.read_at(3, 4).await.unwrap();
        assert_eq!(bytes, b"3456");
    }

    #[tokio::test]
    async fn test_read_at_is_short_at_end_of_file() {
        let (_dir, path) = fixture(b"0123456789");
        let handle = TokioFileSystem.open(&path).await.unwrap();

        let bytes = handle.read_at(8, 100).await.unwrap();
        assert_eq!(bytes, b"89");
    }

    #[test]
    fn test_read_at_past_end_of_file_is_empty() {
        tokio_test::block_on(async {
            let (_dir, path) = fixture(b"0123");
            let handle = TokioFileSystem.open(&path).await.unwrap();

            let bytes = handle.read_at(100, 10).await.unwrap();
            assert!(bytes.is_empty());
        });
    }

    #[tokio::test]
    async fn test_concurrent_positional_reads() {
        let (_dir, path) = fixture(b"abcdefghij");
        let handle = TokioFileSystem.open(&path).await.unwrap();

        let first = handle.read_at(0, 5);
        let second = handle.read_at(5, 5);
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap(), b"abcde");
        assert_eq!(second.unwrap(), b"fghij");
    }

    #[tokio::test]
    async fn test_close_succeeds() {
        let (_dir, path) = fixture(b"x");
        let handle = TokioFileSystem.open(&path).await.unwrap();

        tokio_test::assert_ok!(handle.close().await);
    }
}
