use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::loader::load_file;
use super::model::Dataset;
use crate::error::LoadError;

/// Lazily loaded, shared copy of the source dataset.
///
/// The slot lock is held for the whole load, so concurrent first callers wait
/// for a single read of the file instead of each parsing it.  Callers get an
/// `Arc` snapshot: filtering produces new datasets and never touches the
/// cached one.  A failed load leaves the slot empty and the next call retries.
#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    slot: Mutex<Option<Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            slot: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached dataset, loading it on first access.
    pub fn dataset(&self) -> Result<Arc<Dataset>, LoadError> {
        let mut slot = self.lock();
        if let Some(dataset) = slot.as_ref() {
            log::debug!("Dataset cache hit ({} rows)", dataset.len());
            return Ok(Arc::clone(dataset));
        }
        let dataset = Arc::new(load_file(&self.path)?);
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop the cached dataset; the next access re-reads the file.
    pub fn invalidate(&self) {
        self.lock().take();
        log::info!("Dataset cache invalidated");
    }

    /// Re-read the file now and swap it in.  On failure the previous snapshot
    /// stays in place.
    pub fn reload(&self) -> Result<Arc<Dataset>, LoadError> {
        let mut slot = self.lock();
        let dataset = Arc::new(load_file(&self.path)?);
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<Dataset>>> {
        // The slot is only ever replaced whole; poisoning carries no meaning here.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_csv(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn overwrite(file: &tempfile::NamedTempFile, body: &str) {
        std::fs::write(file.path(), body).unwrap();
    }

    #[test]
    fn loads_once_and_serves_snapshots() {
        let file = write_csv("locality,price\nWakad,1\n");
        let cache = DatasetCache::new(file.path());

        let first = cache.dataset().unwrap();
        overwrite(&file, "locality,price\nWakad,1\nBaner,2\n");
        let second = cache.dataset().unwrap();

        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn invalidate_and_reload_pick_up_changes() {
        let file = write_csv("locality,price\nWakad,1\n");
        let cache = DatasetCache::new(file.path());
        assert_eq!(cache.dataset().unwrap().len(), 1);

        overwrite(&file, "locality,price\nWakad,1\nBaner,2\n");
        cache.invalidate();
        assert_eq!(cache.dataset().unwrap().len(), 2);

        overwrite(&file, "locality,price\nWakad,1\nBaner,2\nAundh,3\n");
        assert_eq!(cache.reload().unwrap().len(), 3);
        assert_eq!(cache.dataset().unwrap().len(), 3);
    }

    #[test]
    fn failed_load_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let cache = DatasetCache::new(&path);

        assert!(matches!(cache.dataset(), Err(LoadError::NotFound(_))));
        std::fs::write(&path, "locality\nWakad\n").unwrap();
        assert_eq!(cache.dataset().unwrap().len(), 1);
    }

    #[test]
    fn concurrent_first_access_shares_one_load() {
        let file = write_csv("locality,price\nWakad,1\n");
        let cache = Arc::new(DatasetCache::new(file.path()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.dataset().unwrap())
            })
            .collect();
        let snapshots: Vec<Arc<Dataset>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(snapshots.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
