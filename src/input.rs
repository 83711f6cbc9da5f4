//! Reading a whole dump into memory.
//!
//! The rewrite pipeline works on one `String`, so input handling is just:
//! pick a decompressor from the file extension, optionally count bytes for a
//! progress bar, and read everything as UTF-8.

use anyhow::Context;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Compression format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("gz" | "gzip") => Compression::Gzip,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            Some("xz" | "lzma") => Compression::Xz,
            Some("zst" | "zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Wrap a reader with the matching decompressor
    pub fn wrap_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
            Compression::Xz => write!(f, "xz"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

/// Reader wrapper that reports the running count of compressed bytes read.
pub struct ProgressReader<R: Read> {
    reader: R,
    callback: Box<dyn Fn(u64)>,
    bytes_read: u64,
}

impl<R: Read> ProgressReader<R> {
    pub fn new<F>(reader: R, callback: F) -> Self
    where
        F: Fn(u64) + 'static,
    {
        Self {
            reader,
            callback: Box::new(callback),
            bytes_read: 0,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.bytes_read += n as u64;
        (self.callback)(self.bytes_read);
        Ok(n)
    }
}

/// Read the full dump at `path`, decompressing by extension.
///
/// Fails when the file is missing or unreadable, or when its (decompressed)
/// content is not valid UTF-8.
pub fn read_dump(path: &Path, progress: Option<Box<dyn Fn(u64)>>) -> anyhow::Result<String> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open input file: {}", path.display()))?;

    let raw: Box<dyn Read> = match progress {
        Some(cb) => Box::new(ProgressReader::new(file, move |bytes| cb(bytes))),
        None => Box::new(file),
    };

    let compression = Compression::from_path(path);
    let mut reader = compression
        .wrap_reader(raw)
        .with_context(|| format!("Cannot open {} stream: {}", compression, path.display()))?;

    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .with_context(|| format!("Cannot read input file as UTF-8: {}", path.display()))?;

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::cell::Cell;
    use std::io::Write;
    use std::path::PathBuf;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[test]
    fn test_compression_from_path() {
        assert_eq!(Compression::from_path(Path::new("a.sql")), Compression::None);
        assert_eq!(Compression::from_path(Path::new("a.sql.gz")), Compression::Gzip);
        assert_eq!(Compression::from_path(Path::new("a.sql.BZ2")), Compression::Bzip2);
        assert_eq!(Compression::from_path(Path::new("a.sql.xz")), Compression::Xz);
        assert_eq!(Compression::from_path(Path::new("a.sql.zst")), Compression::Zstd);
    }

    #[test]
    fn test_read_plain_dump() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.sql");
        std::fs::write(&path, "CREATE TABLE \"t\" (\"id\" INTEGER);\n").unwrap();

        let content = read_dump(&path, None).unwrap();
        assert_eq!(content, "CREATE TABLE \"t\" (\"id\" INTEGER);\n");
    }

    #[test]
    fn test_read_gzip_dump() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.sql.gz");
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"BEGIN TRANSACTION;\nCOMMIT;\n").unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let content = read_dump(&path, None).unwrap();
        assert_eq!(content, "BEGIN TRANSACTION;\nCOMMIT;\n");
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_dump(&PathBuf::from("/nonexistent/dump.sql"), None).unwrap_err();
        assert!(err.to_string().contains("Cannot open input file"));
    }

    #[test]
    fn test_read_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.sql");
        std::fs::write(&path, [0x66, 0x6f, 0xff, 0xfe]).unwrap();

        let err = read_dump(&path, None).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_progress_callback_sees_all_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.sql");
        std::fs::write(&path, "PRAGMA foreign_keys=OFF;\n").unwrap();

        let seen = Rc::new(Cell::new(0u64));
        let sink = Rc::clone(&seen);
        read_dump(&path, Some(Box::new(move |n| sink.set(n)))).unwrap();
        assert_eq!(seen.get(), 25);
    }
}
