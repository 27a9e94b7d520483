//! File-backed registry store

use std::io::{self, Write as _};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::Mutex;
use tracing::Instrument as _;

use crate::error::{StoreError, StoreResult};
use crate::model::{NewRegistry, Registry, RegistryFile};

/// Handle to the registry file.
///
/// Clones share the same lock and in-memory copy of the document, so a
/// single store should be opened per file and cloned into request handlers.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: Arc<Utf8PathBuf>,
    state: Arc<Mutex<RegistryFile>>,
}

impl RegistryStore {
    /// Open the registry file at `path`.
    ///
    /// A missing file is treated as an empty document and is only created on
    /// the first append.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref()))]
    pub async fn open(path: impl AsRef<Utf8Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_owned();
        let file = read_file(&path).await?;
        tracing::debug!(registries = file.list.len(), "opened registry file");

        Ok(Self {
            path: Arc::new(path),
            state: Arc::new(Mutex::new(file)),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Snapshot of the current document
    pub async fn load(&self) -> RegistryFile {
        self.state.lock().await.clone()
    }

    /// Registries in insertion order
    pub async fn list(&self) -> Vec<Registry> {
        self.state.lock().await.list.clone()
    }

    /// Look up a single registry
    pub async fn get(&self, id: u64) -> Option<Registry> {
        self.state.lock().await.get(id).cloned()
    }

    /// Assign an identifier to `entry`, append it, and rewrite the file.
    ///
    /// The in-memory document only changes once the new file is in place, so
    /// a failed write leaves both the file and the store untouched.
    ///
    /// The update runs on its own task. Dropping the returned future does not
    /// interrupt it, so the file and the in-memory document never disagree.
    #[tracing::instrument(skip_all, fields(name = %entry.name))]
    pub async fn append(&self, entry: NewRegistry) -> StoreResult<Registry> {
        let path = self.path.clone();
        let state = self.state.clone();

        let update = async move {
            let mut state = state.lock().await;

            let mut next = state.clone();
            let registry = next.push(entry);
            write_file(&path, &next).await?;
            *state = next;

            tracing::info!(id = registry.id, url = %registry.url, "added registry");
            Ok::<_, StoreError>(registry)
        };

        tokio::spawn(update.in_current_span()).await?
    }
}

async fn read_file(path: &Utf8Path) -> StoreResult<RegistryFile> {
    let contents = match tokio::fs::read(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("no registry file yet");
            return Ok(RegistryFile::default());
        }
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_owned(),
                source,
            });
        }
    };

    let mut file: RegistryFile =
        serde_json::from_slice(&contents).map_err(|source| StoreError::Corrupt {
            path: path.to_owned(),
            source,
        })?;

    if file.repair_last_id() {
        tracing::warn!(last_id = file.last_id, "lastId was behind the registry list");
    }

    Ok(file)
}

async fn write_file(path: &Utf8Path, file: &RegistryFile) -> StoreResult<()> {
    let contents = serde_json::to_vec_pretty(file).map_err(StoreError::Encode)?;
    let target = path.to_owned();

    tokio::task::spawn_blocking(move || replace(&target, &contents))
        .in_current_span()
        .await?
        .map_err(|source| StoreError::Write {
            path: path.to_owned(),
            source,
        })
}

/// Write `contents` next to `path` and rename it into place.
fn replace(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;

    Ok(())
}
