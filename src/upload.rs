use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{HearthError, Result};
use crate::loader::SourceFormat;

/// Known upload media types: (extension, media type, format).
const MEDIA_TYPES: &[(&str, &str, SourceFormat)] = &[
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        SourceFormat::Workbook,
    ),
    ("xlsm", "application/vnd.ms-excel.sheet.macroenabled.12", SourceFormat::Workbook),
    ("xlsb", "application/vnd.ms-excel.sheet.binary.macroenabled.12", SourceFormat::Workbook),
    ("xls", "application/vnd.ms-excel", SourceFormat::Workbook),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet", SourceFormat::Workbook),
    ("csv", "text/csv", SourceFormat::Csv),
    ("csv", "application/csv", SourceFormat::Csv),
];

/// Strip parameters (`; charset=...`) and normalize case.
fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    MEDIA_TYPES
        .iter()
        .find(|(e, _, _)| *e == ext)
        .map(|(_, media, _)| *media)
}

fn lookup(media_type: &str) -> Option<(&'static str, SourceFormat)> {
    let essence = essence(media_type);
    MEDIA_TYPES
        .iter()
        .find(|(_, media, _)| *media == essence)
        .map(|(ext, _, format)| (*ext, *format))
}

pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// One uploaded file: its raw bytes plus the declared media type.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        if bytes.is_empty() {
            return Err(HearthError::Upload(format!("{file_name} has no body")));
        }
        Ok(Self {
            file_name,
            media_type: media_type.into(),
            bytes,
        })
    }

    /// Read an upload from disk. Without a declared media type it is inferred
    /// from the file extension.
    pub fn from_path(path: &Path, media_type: Option<&str>) -> Result<Self> {
        let media_type = match media_type {
            Some(m) => m.to_string(),
            None => media_type_for_path(path)
                .ok_or_else(|| {
                    HearthError::Upload(format!(
                        "cannot tell the format of {}; pass --media-type",
                        path.display()
                    ))
                })?
                .to_string(),
        };
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Self::new(file_name, media_type, bytes)
    }

    pub fn format(&self) -> Result<SourceFormat> {
        lookup(&self.media_type)
            .map(|(_, format)| format)
            .ok_or_else(|| HearthError::Upload(format!("unsupported media type: {}", self.media_type)))
    }

    fn extension(&self) -> &'static str {
        lookup(&self.media_type).map(|(ext, _)| ext).unwrap_or("bin")
    }
}

// ---------------------------------------------------------------------------
// UploadStore
// ---------------------------------------------------------------------------

pub struct StoredUpload {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// Raw uploads on disk. Each upload lands on its own content-addressed path,
/// written to a temporary file and renamed into place, so two uploads never
/// share a file. With a limit set, only that many of the newest uploads
/// survive each `persist`.
pub struct UploadStore {
    dir: PathBuf,
    limit: usize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            limit: 0,
        }
    }

    /// Keep at most `limit` uploads; 0 means no limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("uploads"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn persist(&self, upload: &Upload) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let sum = checksum(&upload.bytes);
        let ext = upload.extension();
        let path = self.dir.join(format!("{sum}.{ext}"));
        let tmp = self
            .dir
            .join(format!(".{sum}.{}.tmp", std::process::id()));
        std::fs::write(&tmp, &upload.bytes)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        info!(
            file = %upload.file_name,
            path = %path.display(),
            bytes = upload.bytes.len(),
            "persisted upload"
        );
        self.prune(&path)?;
        Ok(path)
    }

    /// Remove the oldest uploads beyond the limit. `current` is never removed.
    fn prune(&self, current: &Path) -> Result<usize> {
        if self.limit == 0 {
            return Ok(0);
        }
        let stale: Vec<StoredUpload> = self
            .list()?
            .into_iter()
            .filter(|u| u.path != current)
            .skip(self.limit - 1)
            .collect();
        for upload in &stale {
            std::fs::remove_file(&upload.path)?;
        }
        if !stale.is_empty() {
            info!(removed = stale.len(), limit = self.limit, "pruned old uploads");
        }
        Ok(stale.len())
    }

    /// Persisted uploads, newest first.
    pub fn list(&self) -> Result<Vec<StoredUpload>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut uploads = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            uploads.push(StoredUpload {
                path: entry.path(),
                size: meta.len(),
                modified: meta.modified()?,
            });
        }
        uploads.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(uploads)
    }

    pub fn latest(&self) -> Result<Option<PathBuf>> {
        Ok(self.list()?.into_iter().next().map(|u| u.path))
    }
}
