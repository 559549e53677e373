//! Unwrapping downloads through the layers named by their extensions
//!
//! A download called `odo-linux-amd64.tar.gz` is a gzip stream around a tar
//! archive. The filename is split into its extension tokens, outermost
//! first, each registered token maps to a [`Transform`], and the transforms
//! are folded over the byte stream:
//!
//! ```text
//! odo-linux-amd64.tar.gz
//!     gz  -> Decompress   (stream -> stream)
//!     tar -> Tar          (stream -> archive entries)
//! ```
//!
//! Unwrapping stops at the first unregistered extension or after an archive
//! layer, since an archive exposes entries rather than a single stream.

use flate2::read::MultiGzDecoder;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;
use toolfetch_core::path::enclosed_entry_path;
use tracing::debug;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];
const BZIP2_MAGIC: &[u8] = b"BZh";
const MAGIC_LEN: usize = 6;

/// Unwrap error types
#[derive(Debug, Error)]
pub enum UnwrapError {
    #[error("unsupported compression format")]
    UnsupportedCompression,

    #[error("No TAR entry found")]
    NoTarEntry,

    #[error("archive entry '{name}' would be written outside the install directory")]
    UnsafeEntry { name: String },

    #[error("corrupt zip archive")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error")]
    Io(#[from] io::Error),
}

/// Archive formats that end an unwrap chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    Zip,
}

/// One layer peeled off a download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Compressed stream, format detected from its header
    Decompress,
    Archive(ArchiveFormat),
}

impl Transform {
    /// Registered transform for a filename extension (case-insensitive)
    pub fn for_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "gz" => Some(Transform::Decompress),
            "tar" => Some(Transform::Archive(ArchiveFormat::Tar)),
            "zip" => Some(Transform::Archive(ArchiveFormat::Zip)),
            _ => None,
        }
    }

    /// Archive layers yield entries and end the chain
    pub fn is_archive(self) -> bool {
        matches!(self, Transform::Archive(_))
    }
}

/// Transforms inferred from a filename, outermost first
///
/// Only the last transform can be an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwrapPlan {
    pub transforms: Vec<Transform>,
    /// Filename with the consumed extensions stripped
    pub stem: String,
}

impl UnwrapPlan {
    /// No layer to peel: the download is the payload
    pub fn is_identity(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Archive format of the innermost layer, if any
    pub fn archive(&self) -> Option<ArchiveFormat> {
        match self.transforms.last() {
            Some(Transform::Archive(format)) => Some(*format),
            _ => None,
        }
    }

    /// Number of compression layers around the payload or archive
    pub fn compression_layers(&self) -> usize {
        self.transforms.len() - usize::from(self.archive().is_some())
    }
}

/// Infers the unwrap chain of `filename` without touching any data
///
/// ```rust
/// use toolfetch_install::unwrap::{plan, ArchiveFormat, Transform};
///
/// let chain = plan("odo-linux-amd64.tar.gz");
/// assert_eq!(
///     chain.transforms,
///     vec![Transform::Decompress, Transform::Archive(ArchiveFormat::Tar)]
/// );
/// assert_eq!(chain.stem, "odo-linux-amd64");
///
/// let chain = plan("odo-windows-amd64.exe.gz");
/// assert_eq!(chain.transforms, vec![Transform::Decompress]);
/// assert_eq!(chain.stem, "odo-windows-amd64.exe");
/// ```
pub fn plan(filename: &str) -> UnwrapPlan {
    let segments: Vec<&str> = filename.split('.').collect();
    let mut transforms = Vec::new();

    for extension in segments.iter().skip(1).rev() {
        let Some(transform) = Transform::for_extension(extension) else {
            break;
        };
        transforms.push(transform);
        if transform.is_archive() {
            break;
        }
    }

    let stem = segments[..segments.len() - transforms.len()].join(".");
    UnwrapPlan { transforms, stem }
}

/// Readable and seekable input, such as the downloaded file
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Result of unwrapping a download
pub enum Unwrapped<'a> {
    /// Single payload stream, the command itself
    Stream(Box<dyn Read + 'a>),
    /// Archive with named entries
    Archive(ArchiveReader<'a>),
}

impl Unwrapped<'_> {
    pub fn is_archive(&self) -> bool {
        matches!(self, Unwrapped::Archive(_))
    }
}

/// Unwraps `reader` through every layer named by `filename`'s extensions
///
/// Compression layers are folded over the stream; a trailing archive layer
/// reads the result. A zip directly in the download is read in place, a zip
/// behind compression is spooled to a temporary file first.
pub fn unwrap<'a>(
    filename: &str,
    reader: impl Read + Seek + 'a,
) -> Result<Unwrapped<'a>, UnwrapError> {
    let plan = plan(filename);
    debug!(filename, transforms = ?plan.transforms, "unwrapping download");

    let source: Box<dyn ReadSeek + 'a> = Box::new(reader);
    if plan.compression_layers() == 0 {
        return match plan.archive() {
            Some(format) => ArchiveReader::open(format, source).map(Unwrapped::Archive),
            None => Ok(Unwrapped::Stream(Box::new(source))),
        };
    }

    let stream = (0..plan.compression_layers())
        .try_fold(Box::new(source) as Box<dyn Read + 'a>, |stream, _| decompress(stream))?;

    match plan.archive() {
        Some(format) => ArchiveReader::from_stream(format, stream).map(Unwrapped::Archive),
        None => Ok(Unwrapped::Stream(stream)),
    }
}

/// Wraps `stream` in the decompressor announced by its first bytes
fn decompress<'a>(mut stream: Box<dyn Read + 'a>) -> Result<Box<dyn Read + 'a>, UnwrapError> {
    let mut header = [0u8; MAGIC_LEN];
    let mut filled = 0;
    while filled < MAGIC_LEN {
        match stream.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let magic = &header[..filled];
    let replayed = Cursor::new(magic.to_vec()).chain(stream);

    if magic.starts_with(GZIP_MAGIC) {
        Ok(Box::new(MultiGzDecoder::new(replayed)))
    } else if magic.starts_with(XZ_MAGIC) {
        Ok(Box::new(xz2::read::XzDecoder::new_multi_decoder(replayed)))
    } else if magic.starts_with(ZSTD_MAGIC) {
        Ok(Box::new(zstd::stream::read::Decoder::new(replayed)?))
    } else if magic.starts_with(BZIP2_MAGIC) {
        Ok(Box::new(bzip2::read::MultiBzDecoder::new(replayed)))
    } else {
        Err(UnwrapError::UnsupportedCompression)
    }
}

/// Kind of an archive entry handed to the installer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Archive entry with a validated relative path
pub struct Entry<'r> {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub reader: &'r mut dyn Read,
}

/// Archive stage of an unwrap chain
pub enum ArchiveReader<'a> {
    Tar(tar::Archive<Box<dyn Read + 'a>>),
    /// Zip read through its central directory
    Zip(zip::ZipArchive<Box<dyn ReadSeek + 'a>>),
}

impl<'a> ArchiveReader<'a> {
    fn open(format: ArchiveFormat, source: Box<dyn ReadSeek + 'a>) -> Result<Self, UnwrapError> {
        match format {
            ArchiveFormat::Tar => Ok(ArchiveReader::Tar(tar::Archive::new(Box::new(source)))),
            ArchiveFormat::Zip => Ok(ArchiveReader::Zip(zip::ZipArchive::new(source)?)),
        }
    }

    fn from_stream(
        format: ArchiveFormat,
        mut stream: Box<dyn Read + 'a>,
    ) -> Result<Self, UnwrapError> {
        match format {
            ArchiveFormat::Tar => Ok(ArchiveReader::Tar(tar::Archive::new(stream))),
            ArchiveFormat::Zip => {
                let mut spool = tempfile::tempfile()?;
                io::copy(&mut stream, &mut spool)?;
                spool.rewind()?;
                Self::open(format, Box::new(spool))
            }
        }
    }

    /// Hands every file and directory entry to `visit`, returning how many
    /// were visited
    ///
    /// Entry names are validated before `visit` sees them; other entry types
    /// (links, devices) are skipped.
    ///
    /// # Errors
    ///
    /// [`UnwrapError::NoTarEntry`] for a tar layer without entries,
    /// [`UnwrapError::UnsafeEntry`] for names that escape the target
    /// directory, and any error returned by `visit`.
    pub fn for_each_entry<E, F>(self, mut visit: F) -> Result<usize, E>
    where
        E: From<UnwrapError>,
        F: FnMut(Entry<'_>) -> Result<(), E>,
    {
        match self {
            ArchiveReader::Tar(mut archive) => {
                let mut seen = 0;
                let mut visited = 0;
                for entry in archive.entries().map_err(UnwrapError::from)? {
                    let mut entry = entry.map_err(UnwrapError::from)?;
                    seen += 1;

                    let entry_type = entry.header().entry_type();
                    let kind = if entry_type.is_dir() {
                        EntryKind::Directory
                    } else if entry_type.is_file() {
                        EntryKind::File
                    } else {
                        debug!(?entry_type, "skipping tar entry");
                        continue;
                    };

                    let raw = entry.path().map_err(UnwrapError::from)?.into_owned();
                    let Some(path) = validated_path(&raw, kind)? else {
                        continue;
                    };

                    visit(Entry {
                        path,
                        kind,
                        reader: &mut entry,
                    })?;
                    visited += 1;
                }

                if seen == 0 {
                    return Err(UnwrapError::NoTarEntry.into());
                }
                Ok(visited)
            }
            ArchiveReader::Zip(mut archive) => {
                let mut visited = 0;
                for index in 0..archive.len() {
                    let mut file = archive.by_index(index).map_err(UnwrapError::from)?;
                    let kind = if file.is_dir() {
                        EntryKind::Directory
                    } else if file.is_file() {
                        EntryKind::File
                    } else {
                        debug!(name = file.name(), "skipping zip entry");
                        continue;
                    };

                    let raw = PathBuf::from(file.name());
                    let Some(path) = validated_path(&raw, kind)? else {
                        continue;
                    };

                    visit(Entry {
                        path,
                        kind,
                        reader: &mut file,
                    })?;
                    visited += 1;
                }
                Ok(visited)
            }
        }
    }
}

/// `None` for the archive root directory (`./`), which has nothing to create
fn validated_path(raw: &Path, kind: EntryKind) -> Result<Option<PathBuf>, UnwrapError> {
    if let Some(path) = enclosed_entry_path(raw) {
        return Ok(Some(path));
    }

    let is_root = kind == EntryKind::Directory
        && raw
            .components()
            .all(|c| matches!(c, std::path::Component::CurDir));
    if is_root {
        Ok(None)
    } else {
        Err(UnwrapError::UnsafeEntry {
            name: raw.display().to_string(),
        })
    }
}
