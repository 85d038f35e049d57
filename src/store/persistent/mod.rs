//! Durable, file-backed model persistence.
//!
//! One file per model inside a locked directory:
//! - `DirLock` (flock / `LockFileEx`) keeps other processes out
//! - every save writes a temp file, fsyncs it, then renames it into place
//! - the document frame carries a CRC32 so torn or corrupted files are detected
//!
//! File names are the model id with every byte outside `[A-Za-z0-9._-]`
//! escaped as `~XX`, so distinct ids never share a file.

mod codec;
mod file_lock;

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::model::ModelId;

use super::traits::{ModelPersistence, StorageError};
use super::ModelDocument;

pub use file_lock::DirLock;

const EXTENSION: &str = "model";

fn io_err(context: &str, err: &std::io::Error) -> StorageError {
    StorageError::BackendError(format!("{context}: {err}"))
}

fn file_stem(id: &ModelId) -> String {
    let mut out = String::with_capacity(id.as_str().len());
    for byte in id.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("~{byte:02x}"));
        }
    }
    out
}

fn parse_stem(stem: &str) -> Option<ModelId> {
    let mut bytes = Vec::with_capacity(stem.len());
    let mut rest = stem.as_bytes();
    while let Some((&first, tail)) = rest.split_first() {
        if first == b'~' {
            let hex = std::str::from_utf8(tail.get(..2)?).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            rest = &tail[2..];
        } else {
            bytes.push(first);
            rest = tail;
        }
    }
    String::from_utf8(bytes).ok().map(ModelId::new)
}

/// Model persistence in a locked directory.
#[derive(Debug)]
pub struct FilePersistence {
    dir: PathBuf,
    _lock: DirLock,
}

impl FilePersistence {
    /// Opens (creating if needed) and locks a model directory.
    ///
    /// Stale temp files from interrupted saves are removed.
    ///
    /// # Errors
    /// - the directory cannot be created or read
    /// - another process holds the lock
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| io_err("create model directory", &e))?;
        let lock = DirLock::acquire(&dir).map_err(|e| io_err("lock model directory", &e))?;

        for entry in fs::read_dir(&dir).map_err(|e| io_err("scan model directory", &e))? {
            let path = entry.map_err(|e| io_err("scan model directory", &e))?.path();
            if path.extension().is_some_and(|e| e == "tmp") {
                if let Err(e) = fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %e, "failed to remove stale temp file");
                }
            }
        }

        Ok(Self { dir, _lock: lock })
    }

    /// Directory holding the model files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ModelId) -> PathBuf {
        self.dir.join(format!("{}.{EXTENSION}", file_stem(id)))
    }
}

impl ModelPersistence for FilePersistence {
    fn save(&self, document: &ModelDocument) -> Result<(), StorageError> {
        let final_path = self.path_for(&document.id);
        let temp_path = final_path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

        let write = || -> std::io::Result<()> {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;
            let mut writer = BufWriter::new(file);
            codec::write_header(&mut writer)?;
            writer.write_all(&codec::encode(document)?)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            fs::rename(&temp_path, &final_path)
        };

        write().map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            io_err(&format!("save model {}", document.id), &e)
        })
    }

    fn load(&self, id: &ModelId) -> Result<Option<ModelDocument>, StorageError> {
        let path = self.path_for(id);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&format!("open model {id}"), &e)),
        };
        let mut reader = BufReader::new(file);
        codec::read_header(&mut reader)
            .and_then(|_| codec::decode(&mut reader))
            .map(Some)
            .map_err(|e| StorageError::SerializationError(format!("model {id}: {e}")))
    }

    fn list_ids(&self) -> Result<Vec<ModelId>, StorageError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| io_err("scan model directory", &e))? {
            let path = entry.map_err(|e| io_err("scan model directory", &e))?.path();
            if path.extension().is_some_and(|e| e == EXTENSION) {
                if let Some(id) = path.file_stem().and_then(|s| s.to_str()).and_then(parse_stem) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
