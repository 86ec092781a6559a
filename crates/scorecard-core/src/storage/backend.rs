//! Envelope persistence backends
//!
//! A backend stores one opaque string: the serialized envelope. Parsing lives
//! in the provided `load`/`save` methods so every backend treats corrupt
//! contents the same way.
//!
//! Storage location for the file backend: `~/.local/share/scorecard/`
//! (configurable via `Config`).

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};
use crate::config::Config;
use crate::envelope::Envelope;

/// Where the envelope lives
pub trait EnvelopeBackend: Send + Sync {
    /// Raw stored text, `None` when nothing has been written yet
    fn read(&self) -> StorageResult<Option<String>>;

    /// Replace the stored text
    fn write(&self, contents: &str) -> StorageResult<()>;

    /// Human-readable location, used in messages
    fn describe(&self) -> String;

    /// Keep a copy of unreadable contents before they are overwritten
    fn preserve_corrupt(&self, _contents: &str) -> StorageResult<()> {
        Ok(())
    }

    /// Size and presence of the stored envelope
    fn stats(&self) -> StorageStats {
        match self.read() {
            Ok(Some(raw)) => StorageStats {
                exists: true,
                size: raw.len() as u64,
            },
            _ => StorageStats::default(),
        }
    }

    /// Load and parse the envelope
    ///
    /// `Ok(None)` when nothing is stored, `InvalidFormat` when the stored text
    /// does not parse.
    fn load(&self) -> StorageResult<Option<Envelope>> {
        let Some(raw) = self.read()? else {
            return Ok(None);
        };

        Envelope::from_json(&raw)
            .map(Some)
            .map_err(|e| StorageError::InvalidFormat {
                location: self.describe(),
                details: e.to_string(),
            })
    }

    /// Serialize and store the envelope
    fn save(&self, envelope: &Envelope) -> StorageResult<()> {
        let json = envelope.to_json()?;
        self.write(&json)
    }
}

/// Presence and size of the persisted envelope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub exists: bool,
    pub size: u64,
}

impl StorageStats {
    /// Size formatted for display
    pub fn size_human(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;

        if self.size >= MB {
            format!("{:.1} MB", self.size as f64 / MB as f64)
        } else if self.size >= KB {
            format!("{:.1} KB", self.size as f64 / KB as f64)
        } else {
            format!("{} B", self.size)
        }
    }
}

/// Envelope stored as a single JSON file
///
/// Writes go to a temp file in the same directory which is then renamed over
/// the target, so an interrupted write leaves the previous envelope intact.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File backend at the configured envelope path
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.envelope_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where unreadable contents are copied before a reset
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".corrupt.backup");
        self.path.with_file_name(name)
    }
}

impl EnvelopeBackend for FileBackend {
    fn read(&self) -> StorageResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_read(e, self.path.clone())),
        }
    }

    fn write(&self, contents: &str) -> StorageResult<()> {
        atomic_write(&self.path, contents.as_bytes())?;
        debug!("Saved envelope to {:?} ({} bytes)", self.path, contents.len());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn preserve_corrupt(&self, contents: &str) -> StorageResult<()> {
        let backup = self.backup_path();
        atomic_write(&backup, contents.as_bytes())?;
        warn!("Copied unreadable envelope to {:?}", backup);
        Ok(())
    }

    fn stats(&self) -> StorageStats {
        match fs::metadata(&self.path) {
            Ok(meta) => StorageStats {
                exists: true,
                size: meta.len(),
            },
            Err(_) => StorageStats::default(),
        }
    }
}

/// Envelope held in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    contents: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with arbitrary stored text, valid or not
    pub fn with_contents(raw: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(raw.into())),
        }
    }

    /// Current stored text
    pub fn contents(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned lock still holds the last written string
        self.contents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EnvelopeBackend for MemoryBackend {
    fn read(&self) -> StorageResult<Option<String>> {
        Ok(self.lock().clone())
    }

    fn write(&self, contents: &str) -> StorageResult<()> {
        *self.lock() = Some(contents.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    // Same directory, so the rename cannot cross filesystems
    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|e| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
