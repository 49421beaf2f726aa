use crate::errors::StoreError;
use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tokio::{fs, sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

pub const PROGRESS_KEY: &str = "walk_progress";
pub const DATE_KEY: &str = "walk_date";
pub const LAST_WALK_KEY: &str = "last_walk_time";

pub const RECORD_KEYS: [&str; 3] = [PROGRESS_KEY, DATE_KEY, LAST_WALK_KEY];

/// The tracker's mirror in the key-value store.
///
/// Values stay in their stored string form except the count; the date is only
/// ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    pub count: u32,
    pub owner_date: String,
    pub last_walk_time: Option<String>,
}

impl PersistedRecord {
    /// Reads the record out of a flat map. Without both the progress and date
    /// keys there is no record at all.
    pub fn from_entries(entries: &BTreeMap<String, String>) -> Result<Option<Self>, StoreError> {
        let (Some(progress), Some(date)) = (entries.get(PROGRESS_KEY), entries.get(DATE_KEY))
        else {
            return Ok(None);
        };

        let count = progress
            .trim()
            .parse::<u32>()
            .map_err(|err| StoreError::corrupt(format!("{PROGRESS_KEY}={progress:?}: {err}")))?;

        Ok(Some(Self {
            count,
            owner_date: date.clone(),
            last_walk_time: entries.get(LAST_WALK_KEY).cloned(),
        }))
    }

    /// Every record key paired with its value. `None` marks a key to remove.
    pub fn to_entries(&self) -> [(&'static str, Option<String>); 3] {
        [
            (PROGRESS_KEY, Some(self.count.to_string())),
            (DATE_KEY, Some(self.owner_date.clone())),
            (LAST_WALK_KEY, self.last_walk_time.clone()),
        ]
    }

    /// Writes the record into `entries` as one update.
    pub fn apply_to(&self, entries: &mut BTreeMap<String, String>) {
        for (key, value) in self.to_entries() {
            match value {
                Some(value) => {
                    entries.insert(key.to_string(), value);
                }
                None => {
                    entries.remove(key);
                }
            }
        }
    }
}

/// Key-value backing for the tracker. Each `save` or `clear` is a single
/// write; implementations must not block the calling thread on disk I/O.
pub trait PersistenceAdapter: Send {
    fn load(&mut self) -> Result<Option<PersistedRecord>, StoreError>;
    fn save(&mut self, record: &PersistedRecord) -> Result<(), StoreError>;
    fn clear(&mut self, keys: &[&str]) -> Result<(), StoreError>;
}

type Snapshot = BTreeMap<String, String>;

/// Flat JSON object of string keys to string values on disk.
///
/// The file is read once in [`FileStore::open`]. Afterwards the map lives in
/// memory and every change hands a snapshot to a background writer task,
/// which writes it with `tokio::fs`. Snapshots queued while a write is in
/// flight collapse into the newest one.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Snapshot,
    load_error: Option<StoreError>,
    writer: mpsc::UnboundedSender<Snapshot>,
}

impl FileStore {
    /// Reads `path` and starts its writer. The returned handle finishes once
    /// the store is dropped and every queued snapshot is on disk.
    pub async fn open(path: impl Into<PathBuf>) -> (Self, JoinHandle<()>) {
        let path = path.into();
        let (entries, load_error) = match read_entries(&path).await {
            Ok(entries) => (entries, None),
            Err(err) => (Snapshot::new(), Some(err)),
        };

        let (writer, queue) = mpsc::unbounded_channel();
        let handle = tokio::spawn(write_loop(path.clone(), queue));

        let store = Self {
            path,
            entries,
            load_error,
            writer,
        };
        (store, handle)
    }

    fn queue_write(&self) -> Result<(), StoreError> {
        self.writer
            .send(self.entries.clone())
            .map_err(|_| StoreError::WriterClosed {
                path: self.path.clone(),
            })
    }
}

impl PersistenceAdapter for FileStore {
    fn load(&mut self) -> Result<Option<PersistedRecord>, StoreError> {
        if let Some(err) = self.load_error.take() {
            return Err(err);
        }
        PersistedRecord::from_entries(&self.entries)
    }

    fn save(&mut self, record: &PersistedRecord) -> Result<(), StoreError> {
        record.apply_to(&mut self.entries);
        self.queue_write()
    }

    fn clear(&mut self, keys: &[&str]) -> Result<(), StoreError> {
        for key in keys {
            self.entries.remove(*key);
        }
        self.queue_write()
    }
}

async fn read_entries(path: &Path) -> Result<Snapshot, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Snapshot::new()),
        Err(source) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn write_entries(path: &Path, entries: &Snapshot) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(entries)?;
    let tmp = path.with_extension("json.tmp");
    let write_err = |source: std::io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, payload).await.map_err(write_err)?;
    fs::rename(&tmp, path).await.map_err(write_err)?;
    Ok(())
}

async fn write_loop(path: PathBuf, mut queue: mpsc::UnboundedReceiver<Snapshot>) {
    while let Some(mut entries) = queue.recv().await {
        while let Ok(newer) = queue.try_recv() {
            entries = newer;
        }
        match write_entries(&path, &entries).await {
            Ok(()) => debug!(path = %path.display(), "data file written"),
            Err(err) => warn!(error = %err, "failed to write data file"),
        }
    }
    debug!(path = %path.display(), "data file writer stopped");
}

/// In-memory store. Clones share the same map, so a test can keep one handle
/// and give the other to the tracker.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: BTreeMap<String, String>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::default();
        {
            let mut inner = store.lock();
            for (key, value) in entries {
                inner.entries.insert(key.to_string(), value.to_string());
            }
        }
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    /// Successful `save` and `clear` calls so far.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(inner: &MemoryInner) -> Result<(), StoreError> {
        if inner.fail_writes {
            return Err(StoreError::Write {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::other("writes disabled"),
            });
        }
        Ok(())
    }
}

impl PersistenceAdapter for MemoryStore {
    fn load(&mut self) -> Result<Option<PersistedRecord>, StoreError> {
        PersistedRecord::from_entries(&self.lock().entries)
    }

    fn save(&mut self, record: &PersistedRecord) -> Result<(), StoreError> {
        let mut inner = self.lock();
        Self::check_writable(&inner)?;
        record.apply_to(&mut inner.entries);
        inner.writes += 1;
        Ok(())
    }

    fn clear(&mut self, keys: &[&str]) -> Result<(), StoreError> {
        let mut inner = self.lock();
        Self::check_writable(&inner)?;
        for key in keys {
            inner.entries.remove(*key);
        }
        inner.writes += 1;
        Ok(())
    }
}
