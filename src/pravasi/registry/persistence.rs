use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::pravasi::registry::error::{RegistryError, Result};
use crate::pravasi::registry::model::{AppState, seed_state};

/// Namespace key under which the registry snapshot is stored.
pub const STORAGE_KEY: &str = "pravaasi_shramik_data";

/// A durable slot holding one serialized [`AppState`].
pub trait SnapshotStore {
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<AppState>>;
    fn save(&self, state: &AppState) -> Result<()>;

    /// Moves unreadable content out of the way so the next save cannot
    /// overwrite it. Returns where it went, if anywhere.
    fn set_aside(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Stores the snapshot as `<dir>/<namespace>.json`.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{namespace}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<AppState>> {
        let source = match fs::read_to_string(&self.path) {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        decode(&source).map(Some)
    }

    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    fn save(&self, state: &AppState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Rename over the target so readers never observe a partial write.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_string_pretty(state)?)?;
        fs::rename(&staging, &self.path)?;
        debug!("snapshot written");
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    fn set_aside(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let mut target = self.path.clone().into_os_string();
        target.push(format!(".unusable-{stamp}"));
        let target = PathBuf::from(target);
        fs::rename(&self.path, &target)?;
        Ok(Some(target.display().to_string()))
    }
}

/// Keeps the serialized snapshot in memory. Used by tests and embedders that
/// manage durability themselves.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<String>>,
    unusable: Mutex<Vec<String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fills the slot with raw text, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
            unusable: Mutex::default(),
        }
    }

    pub fn raw(&self) -> Result<Option<String>> {
        Ok(self.slot()?.clone())
    }

    /// Contents previously moved aside by [`SnapshotStore::set_aside`].
    pub fn unusable(&self) -> Vec<String> {
        self.unusable
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.slot
            .lock()
            .map_err(|_| RegistryError::Persistence("snapshot slot poisoned".into()))
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<AppState>> {
        match self.raw()? {
            Some(source) => decode(&source).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, state: &AppState) -> Result<()> {
        let encoded = serde_json::to_string(state)?;
        *self.slot()? = Some(encoded);
        Ok(())
    }

    fn set_aside(&self) -> Result<Option<String>> {
        let Some(raw) = self.slot()?.take() else {
            return Ok(None);
        };
        self.unusable
            .lock()
            .map_err(|_| RegistryError::Persistence("unusable list poisoned".into()))?
            .push(raw);
        Ok(Some("memory".to_string()))
    }
}

/// Loads the persisted snapshot, falling back to the seed dataset when the slot
/// is empty or its content cannot be used. Unusable content is set aside first
/// so the seed never overwrites it. Never fails.
#[instrument(level = "info", skip_all)]
pub fn load_or_seed<P: SnapshotStore + ?Sized>(store: &P) -> AppState {
    match store.load() {
        Ok(Some(state)) => {
            info!(
                years = state.years.len(),
                workers = state.workers.len(),
                "loaded persisted snapshot"
            );
            state
        }
        Ok(None) => {
            info!("no persisted snapshot; installing seed dataset");
            seed_state()
        }
        Err(error) => {
            warn!(%error, "persisted snapshot unusable; falling back to seed dataset");
            match store.set_aside() {
                Ok(Some(location)) => warn!(%location, "unusable snapshot kept aside"),
                Ok(None) => {}
                Err(error) => error!(%error, "could not set unusable snapshot aside"),
            }
            seed_state()
        }
    }
}

fn decode(source: &str) -> Result<AppState> {
    let state: AppState = serde_json::from_str(source)
        .map_err(|e| RegistryError::Persistence(format!("failed to parse snapshot: {e}")))?;
    state.check_integrity().map_err(RegistryError::Persistence)?;
    Ok(state)
}
