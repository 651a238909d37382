use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

const CHUNK_SIZE: usize = 64 * 1024;

/// Errors from reading, comparing or writing files.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0}: not a UTF-8 text file")]
    NotText(PathBuf),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// File access used by the comparison pipeline.
pub trait FileStore {
    /// Byte-for-byte comparison without loading whole files.
    fn is_equal(&self, a: &Path, b: &Path) -> Result<bool>;

    fn read_all(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replace the file's content. Readers never observe a half-written file.
    fn write_all(&self, path: &Path, content: &[u8]) -> Result<()>;

    /// Read a file and decode it as UTF-8.
    fn read_text(&self, path: &Path) -> Result<String> {
        let bytes = self.read_all(path)?;
        String::from_utf8(bytes).map_err(|_| StoreError::NotText(path.to_path_buf()))
    }
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FileStore for FsStore {
    fn is_equal(&self, a: &Path, b: &Path) -> Result<bool> {
        let len_a = fs::metadata(a).map_err(|e| StoreError::io(a, e))?.len();
        let len_b = fs::metadata(b).map_err(|e| StoreError::io(b, e))?.len();
        if len_a != len_b {
            return Ok(false);
        }

        let mut reader_a = BufReader::new(File::open(a).map_err(|e| StoreError::io(a, e))?);
        let mut reader_b = BufReader::new(File::open(b).map_err(|e| StoreError::io(b, e))?);
        let mut buf_a = vec![0u8; CHUNK_SIZE];
        let mut buf_b = vec![0u8; CHUNK_SIZE];

        loop {
            let read_a = fill(&mut reader_a, &mut buf_a).map_err(|e| StoreError::io(a, e))?;
            let read_b = fill(&mut reader_b, &mut buf_b).map_err(|e| StoreError::io(b, e))?;
            if read_a != read_b || buf_a[..read_a] != buf_b[..read_b] {
                return Ok(false);
            }
            if read_a == 0 {
                return Ok(true);
            }
        }
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| StoreError::io(path, e))
    }

    fn write_all(&self, path: &Path, content: &[u8]) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(path, e))?;
        temp.write_all(content)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| StoreError::io(path, e))?;

        if let Ok(metadata) = fs::metadata(path) {
            fs::set_permissions(temp.path(), metadata.permissions())
                .map_err(|e| StoreError::io(path, e))?;
        }

        temp.persist(path)
            .map_err(|e| StoreError::io(path, e.error))?;
        debug!(path = %path.display(), bytes = content.len(), "wrote file");
        Ok(())
    }
}

/// Read until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
