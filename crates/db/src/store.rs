//! JSON file record store.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use benessere_core::models::LoyaltyDocument;

use crate::error::StoreError;

/// Suffix of the scratch file written before the atomic rename.
const TEMP_SUFFIX: &str = "tmp";

/// Whole-document store backed by a single JSON file.
///
/// Callers in one process share a store through [`JsonFileStore::update`],
/// which serialises load-mutate-save cycles so interleaved sessions cannot
/// lose each other's writes. The lock is in-process only: separate processes
/// writing the same file are not serialised against each other, though each
/// writes its own scratch file so a save never renames another's half-written
/// document into place.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    writer: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted document.
    ///
    /// A missing file yields an empty document. So does a file that exists
    /// but does not parse; that case is logged and never surfaced. Any other
    /// I/O failure is [`StoreError::Unavailable`].
    pub fn load(&self) -> Result<LoyaltyDocument, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No loyalty document yet, starting empty");
                return Ok(LoyaltyDocument::default());
            }
            Err(e) => return Err(self.unavailable(e)),
        };

        match serde_json::from_slice(&raw) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Loyalty document is unparseable, recovering as empty",
                );
                Ok(LoyaltyDocument::default())
            }
        }
    }

    /// Overwrite the backing file with `doc`.
    ///
    /// Creates missing parent directories, writes a sibling temp file, syncs
    /// it and renames it over the target.
    pub fn save(&self, doc: &LoyaltyDocument) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(doc)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.unavailable(e))?;
        }

        let tmp = self.temp_path();
        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(&body)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(self.unavailable(e));
        }

        tracing::debug!(
            path = %self.path.display(),
            users = doc.users.len(),
            bytes = body.len(),
            "Saved loyalty document",
        );
        Ok(())
    }

    /// Run one load-mutate-save cycle under the store's in-process writer
    /// lock.
    ///
    /// The document is saved only when `mutate` succeeds, so a rejected
    /// operation leaves the file untouched.
    pub fn update<T, E>(
        &self,
        mutate: impl FnOnce(&mut LoyaltyDocument) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut doc = self.load()?;
        let out = mutate(&mut doc)?;
        self.save(&doc)?;
        Ok(out)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "loyalty.json".into());
        name.push(format!(".{}.{TEMP_SUFFIX}", std::process::id()));
        self.path.with_file_name(name)
    }

    fn unavailable(&self, source: std::io::Error) -> StoreError {
        StoreError::Unavailable {
            path: self.path.clone(),
            source,
        }
    }
}
