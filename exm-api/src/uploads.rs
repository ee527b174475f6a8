//! Media file storage
//!
//! Uploaded files live under the upload root in three partitions:
//! `audio/`, `images/` and `artwork/`. Each stored file gets a generated
//! name `<stem>_<unix-millis>-<random><.ext>` so uploads never overwrite one
//! another.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Per-file size cap (50 MiB)
pub const MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Files accepted per request
pub const MAX_FILES: usize = 10;

const AUDIO_TYPES: [&str; 5] = ["audio/mpeg", "audio/wav", "audio/mp3", "audio/flac", "audio/aac"];
const ARTWORK_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];
const IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid file type: {0}")]
    InvalidType(String),

    #[error("File too large. Maximum size is 50MB.")]
    TooLarge,

    #[error("Too many files. Maximum is 10 files per request.")]
    TooMany,

    #[error("Unexpected field: {0}")]
    UnexpectedField(String),

    #[error("Invalid filename")]
    InvalidFilename,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// True when the request itself was at fault
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UploadError::Io(_))
    }
}

/// Storage partition under the upload root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Audio,
    Images,
    Artwork,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Partition::Audio, Partition::Images, Partition::Artwork];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Partition::Audio => "audio",
            Partition::Images => "images",
            Partition::Artwork => "artwork",
        }
    }

    /// `?type=` value of the listing endpoint; `all` (or anything else) is `None`
    pub fn from_type_param(raw: Option<&str>) -> Option<Partition> {
        Partition::ALL.into_iter().find(|p| Some(p.dir_name()) == raw)
    }

    /// Decide where a multipart file goes, enforcing the per-field allow-list
    ///
    /// # Examples
    /// ```
    /// use exm_api::uploads::Partition;
    ///
    /// assert_eq!(Partition::classify("audio", "audio/flac").unwrap(), Partition::Audio);
    /// assert_eq!(Partition::classify("profileImage", "image/png").unwrap(), Partition::Artwork);
    /// assert_eq!(Partition::classify("gallery", "image/gif").unwrap(), Partition::Images);
    /// assert!(Partition::classify("artwork", "image/gif").is_err());
    /// ```
    pub fn classify(field: &str, mime: &str) -> Result<Partition, UploadError> {
        let (partition, allowed): (Partition, &[&str]) = match field {
            "audio" => (Partition::Audio, &AUDIO_TYPES),
            "artwork" | "profileImage" => (Partition::Artwork, &ARTWORK_TYPES),
            _ if mime.starts_with("image/") => (Partition::Images, &IMAGE_TYPES),
            _ if mime.starts_with("audio/") => (Partition::Audio, &AUDIO_TYPES),
            _ => return Err(UploadError::InvalidType(mime.to_string())),
        };
        if allowed.contains(&mime) {
            Ok(partition)
        } else {
            Err(UploadError::InvalidType(mime.to_string()))
        }
    }
}

/// A file written by [`UploadStore::begin`] or [`UploadStore::store`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub size: u64,
    pub mimetype: String,
    #[serde(skip)]
    pub partition: Partition,
}

/// Directory listing entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedFile {
    pub filename: String,
    pub url: String,
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Listing grouped by partition; unrequested partitions stay empty
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileListing {
    pub audio: Vec<ListedFile>,
    pub images: Vec<ListedFile>,
    pub artwork: Vec<ListedFile>,
}

/// `<sanitized-stem>_<unix-millis>-<random 0..1e9><.ext>`
pub fn generate_filename(original: &str) -> String {
    let base = Path::new(original)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let path = Path::new(&base);
    let ext: String = path
        .extension()
        .map(|e| e.to_string_lossy().chars().filter(|c| c.is_ascii_alphanumeric()).collect())
        .unwrap_or_default();
    let stem: String = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    if ext.is_empty() {
        format!("{}_{}-{}", stem, millis, suffix)
    } else {
        format!("{}_{}-{}.{}", stem, millis, suffix, ext)
    }
}

/// A bare file name: no separators, no parent references
fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

fn to_utc(time: std::io::Result<SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

/// A file being written; either `finish` or `abandon` it
#[derive(Debug)]
pub struct PendingFile {
    file: tokio::fs::File,
    path: PathBuf,
    stored: StoredFile,
}

impl PendingFile {
    /// Append a chunk, failing once the file would exceed [`MAX_FILE_SIZE`]
    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        if self.stored.size as usize + chunk.len() > MAX_FILE_SIZE {
            return Err(UploadError::TooLarge);
        }
        self.file.write_all(chunk).await?;
        self.stored.size += chunk.len() as u64;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<StoredFile, UploadError> {
        self.file.flush().await?;
        info!(
            "Stored upload {}/{} ({} bytes)",
            self.stored.partition.dir_name(),
            self.stored.filename,
            self.stored.size
        );
        Ok(self.stored)
    }

    /// Close and remove the partial file
    pub async fn abandon(self) {
        drop(self.file);
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            warn!("Failed to remove partial upload {}: {}", self.path.display(), e);
        }
    }
}

/// File system store rooted at the configured upload directory
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        UploadStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition_dir(&self, partition: Partition) -> PathBuf {
        self.root.join(partition.dir_name())
    }

    /// Create the root and all partitions
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for partition in Partition::ALL {
            std::fs::create_dir_all(self.partition_dir(partition))?;
        }
        Ok(())
    }

    /// Open a new file under a generated name for chunked writing
    pub async fn begin(
        &self,
        partition: Partition,
        original_name: &str,
        mimetype: &str,
    ) -> Result<PendingFile, UploadError> {
        let dir = self.partition_dir(partition);
        tokio::fs::create_dir_all(&dir).await?;
        let filename = generate_filename(original_name);
        let path = dir.join(&filename);
        let file = tokio::fs::File::create(&path).await?;

        Ok(PendingFile {
            file,
            path,
            stored: StoredFile {
                url: format!("/uploads/{}/{}", partition.dir_name(), filename),
                filename,
                original_name: original_name.to_string(),
                size: 0,
                mimetype: mimetype.to_string(),
                partition,
            },
        })
    }

    /// Write one file in a single call
    pub async fn store(
        &self,
        partition: Partition,
        original_name: &str,
        mimetype: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, UploadError> {
        let mut pending = self.begin(partition, original_name, mimetype).await?;
        if let Err(e) = pending.write(bytes).await {
            pending.abandon().await;
            return Err(e);
        }
        pending.finish().await
    }

    /// Remove files written earlier in a failed request
    pub async fn discard(&self, files: &[StoredFile]) {
        for file in files {
            let path = self.partition_dir(file.partition).join(&file.filename);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!("Failed to remove partial upload {}: {}", path.display(), e);
            }
        }
    }

    /// Delete a file by name from whichever partition holds it
    ///
    /// Returns false when no partition has it.
    pub async fn delete(&self, filename: &str) -> Result<bool, UploadError> {
        if !is_safe_filename(filename) {
            return Err(UploadError::InvalidFilename);
        }

        for partition in [Partition::Audio, Partition::Images, Partition::Artwork] {
            let path = self.partition_dir(partition).join(filename);
            if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
                tokio::fs::remove_file(&path).await?;
                info!("Deleted upload {}/{}", partition.dir_name(), filename);
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn list_partition(&self, partition: Partition) -> Result<Vec<ListedFile>, UploadError> {
        let dir = self.partition_dir(partition);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().into_owned();
            files.push(ListedFile {
                url: format!("/uploads/{}/{}", partition.dir_name(), filename),
                filename,
                size: metadata.len(),
                created_at: to_utc(metadata.created()),
                modified_at: to_utc(metadata.modified()),
            });
        }
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }

    /// List one partition, or all when `only` is `None`
    pub async fn list(&self, only: Option<Partition>) -> Result<FileListing, UploadError> {
        let mut listing = FileListing::default();
        for partition in Partition::ALL {
            if only.is_some_and(|p| p != partition) {
                continue;
            }
            let files = self.list_partition(partition).await?;
            match partition {
                Partition::Audio => listing.audio = files,
                Partition::Images => listing.images = files,
                Partition::Artwork => listing.artwork = files,
            }
        }
        Ok(listing)
    }
}
