//! Fixture builders for downloads and configuration documents
//!
//! Archives are built in memory so a test can serve them from a mock HTTP
//! server or write them next to a fake install directory.

use flate2::Compression;
use flate2::write::{DeflateEncoder, GzEncoder};
use serde_json::{Map, Value, json};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

/// Builds an uncompressed tar archive
///
/// Each entry is `(name, content)`; names ending in `/` become directory
/// entries. Files are stored with mode `0o644` so tests can observe the
/// installer adding the executable bits.
pub fn tar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        if name.ends_with('/') {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_mode(0o755);
            header.set_size(0);
        } else {
            header.set_entry_type(tar::EntryType::Regular);
            header.set_mode(0o644);
            header.set_size(content.len() as u64);
        }
        header.set_path(name).unwrap();
        header.set_cksum();
        builder.append(&header, *content).unwrap();
    }

    builder.into_inner().unwrap()
}

/// Gzip-compresses `data`
pub fn gzip_bytes(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Xz-compresses `data`
pub fn xz_bytes(data: &[u8]) -> Vec<u8> {
    let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Zstd-compresses `data`
pub fn zstd_bytes(data: &[u8]) -> Vec<u8> {
    zstd::encode_all(data, 0).unwrap()
}

/// Bzip2-compresses `data`
pub fn bzip2_bytes(data: &[u8]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// `.tar.gz` archive of `entries`
pub fn tar_gz_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    gzip_bytes(&tar_bytes(entries))
}

/// `.tar.xz` archive of `entries`
pub fn tar_xz_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    xz_bytes(&tar_bytes(entries))
}

/// Zip archive of `entries` (deflate compressed)
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options: zip::write::FileOptions<'_, ()> =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in entries {
        if let Some(dir) = name.strip_suffix('/') {
            zip.add_directory(dir, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }
    }

    zip.finish().unwrap().into_inner()
}

/// Zip archive of `entries` laid out the way streaming writers produce it
///
/// Every local header sets general purpose flag bit 3 and leaves CRC and
/// sizes zero; the real values follow the data in a data descriptor and are
/// repeated in the central directory. Go's `archive/zip` writes release
/// archives this way. Files are deflated, directories (names ending in `/`)
/// are stored empty.
pub fn zip_bytes_with_data_descriptors(entries: &[(&str, &[u8])]) -> Vec<u8> {
    const DATA_DESCRIPTOR_FLAG: u16 = 0x0008;
    const STORED: u16 = 0;
    const DEFLATED: u16 = 8;
    const DOS_DATE_1980_01_01: u16 = 0x0021;

    let mut out = Vec::new();
    let mut central = Vec::new();

    for (name, content) in entries {
        let (method, compressed) = if name.ends_with('/') {
            (STORED, Vec::new())
        } else {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(content).unwrap();
            (DEFLATED, encoder.finish().unwrap())
        };
        let mut crc = flate2::Crc::new();
        crc.update(content);
        let crc = crc.sum();
        let offset = out.len() as u32;

        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&DATA_DESCRIPTOR_FLAG.to_le_bytes());
        out.extend_from_slice(&method.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&DOS_DATE_1980_01_01.to_le_bytes());
        out.extend_from_slice(&[0u8; 12]);
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&compressed);

        out.extend_from_slice(&0x0807_4b50u32.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        out.extend_from_slice(&(content.len() as u32).to_le_bytes());

        central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&DATA_DESCRIPTOR_FLAG.to_le_bytes());
        central.extend_from_slice(&method.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&DOS_DATE_1980_01_01.to_le_bytes());
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        central.extend_from_slice(&(content.len() as u32).to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        // extra length, comment length, disk, internal and external attributes
        central.extend_from_slice(&[0u8; 12]);
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let central_offset = out.len() as u32;
    out.extend_from_slice(&central);

    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&(central.len() as u32).to_le_bytes());
    out.extend_from_slice(&central_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}

/// Tools configuration document with a single tool
///
/// # Examples
///
/// ```rust
/// use toolfetch_testkit::ToolDocument;
///
/// let json = ToolDocument::new("odo", "1.0.0", "/opt/odo")
///     .version_cmd("version")
///     .extract_regexp(r"odo v(\S+)")
///     .platform("lnx", "https://example.com/odo.tar.gz", "odo", "odo.tar.gz")
///     .to_json();
/// assert!(json.contains("\"cmdFileName\": \"odo\""));
/// ```
#[derive(Debug, Clone)]
pub struct ToolDocument {
    name: String,
    tool: Map<String, Value>,
    platforms: Map<String, Value>,
}

impl ToolDocument {
    pub fn new(name: &str, version: &str, base_dir: impl AsRef<Path>) -> Self {
        let mut tool = Map::new();
        tool.insert("version".to_string(), json!(version));
        tool.insert(
            "baseDir".to_string(),
            json!(base_dir.as_ref().to_string_lossy()),
        );

        Self {
            name: name.to_string(),
            tool,
            platforms: Map::new(),
        }
    }

    pub fn version_cmd(mut self, cmd: &str) -> Self {
        self.tool.insert("versionCmd".to_string(), json!(cmd));
        self
    }

    pub fn extract_regexp(mut self, pattern: &str) -> Self {
        self.tool
            .insert("versionExtractRegExp".to_string(), json!(pattern));
        self
    }

    pub fn match_regexp(mut self, pattern: &str) -> Self {
        self.tool
            .insert("versionMatchRegExpr".to_string(), json!(pattern));
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.tool.insert("silentMode".to_string(), json!(silent));
        self
    }

    pub fn platform(
        mut self,
        key: &str,
        url: &str,
        cmd_file_name: &str,
        dl_file_name: &str,
    ) -> Self {
        self.platforms.insert(
            key.to_string(),
            json!({
                "url": url,
                "cmdFileName": cmd_file_name,
                "dlFileName": dl_file_name,
            }),
        );
        self
    }

    pub fn to_json(&self) -> String {
        let mut tool = self.tool.clone();
        tool.insert(
            "platforms".to_string(),
            Value::Object(self.platforms.clone()),
        );

        let mut tools = Map::new();
        tools.insert(self.name.clone(), Value::Object(tool));

        serde_json::to_string_pretty(&json!({ "tools": tools })).unwrap()
    }

    /// Writes the document to `dir/tools.json` and returns its path
    pub fn write_to(&self, dir: &Path) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join("tools.json");
        std::fs::write(&path, self.to_json()).unwrap();
        path
    }
}
