//! Memoized table loading keyed by file path and modification time

use crate::{LoadError, LoadResult, Table};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;
use tracing::{debug, instrument};

struct CacheEntry<T> {
    modified: SystemTime,
    table: Arc<Table<T>>,
}

/// Cache of loaded tables.
///
/// One entry per path; an entry is stale once the file's modification time
/// differs from the one recorded at load. Tables are handed out as `Arc`s,
/// so a reload never disturbs readers still holding the old table.
pub struct TableCache<T> {
    entries: RwLock<HashMap<PathBuf, CacheEntry<T>>>,
}

impl<T> Default for TableCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> TableCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, calling `load` on a miss.
    ///
    /// Concurrent misses may load the same file twice; the last writer wins
    /// and both callers get an equivalent table.
    #[instrument(skip(self, path, load), fields(path = %path.display()))]
    pub fn get_or_load<F>(&self, path: &Path, load: F) -> LoadResult<Arc<Table<T>>>
    where
        F: FnOnce(&Path) -> LoadResult<Table<T>>,
    {
        let modified = modified_time(path)?;

        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(path) {
                if entry.modified == modified {
                    debug!("cache hit");
                    return Ok(Arc::clone(&entry.table));
                }
            }
        }

        debug!("cache miss");
        let table = Arc::new(load(path)?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            path.to_path_buf(),
            CacheEntry {
                modified,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    /// Drop every cached table
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn modified_time(path: &Path) -> LoadResult<SystemTime> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|source| LoadError::DataUnavailable {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{load_daily, MalformedPolicy};
    use std::cell::Cell;
    use std::time::Duration;

    const DAILY: &str = "date,trip_count,avgTemp\n2022-01-01,10,1.5\n";

    #[test]
    fn test_hit_after_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.csv");
        fs::write(&path, DAILY).unwrap();

        let cache = TableCache::new();
        let loads = Cell::new(0);
        let load = |p: &Path| {
            loads.set(loads.get() + 1);
            load_daily(p, MalformedPolicy::Skip)
        };

        let first = cache.get_or_load(&path, load).unwrap();
        let second = cache.get_or_load(&path, load).unwrap();
        assert_eq!(loads.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_reload_when_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.csv");
        fs::write(&path, DAILY).unwrap();

        let cache = TableCache::new();
        let first = cache
            .get_or_load(&path, |p| load_daily(p, MalformedPolicy::Skip))
            .unwrap();
        assert_eq!(first.rows.len(), 1);

        fs::write(&path, format!("{DAILY}2022-01-02,20,2.5\n")).unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();

        let second = cache
            .get_or_load(&path, |p| load_daily(p, MalformedPolicy::Skip))
            .unwrap();
        assert_eq!(second.rows.len(), 2);
        assert_eq!(first.rows.len(), 1);
    }

    #[test]
    fn test_concurrent_readers_share_equal_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.csv");
        fs::write(&path, DAILY).unwrap();

        let cache = TableCache::new();
        let tables: Vec<Arc<Table<ride_core::DailySummary>>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        cache
                            .get_or_load(&path, |p| load_daily(p, MalformedPolicy::Skip))
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for table in &tables {
            assert_eq!(table.rows, tables[0].rows);
            assert_eq!(table.report, tables[0].report);
        }
        assert_eq!(cache.len(), 1);
        let settled = cache
            .get_or_load(&path, |_| panic!("entry should be cached"))
            .unwrap();
        assert_eq!(settled.rows, tables[0].rows);
    }

    #[test]
    fn test_missing_file() {
        let cache: TableCache<ride_core::DailySummary> = TableCache::new();
        let err = cache
            .get_or_load(Path::new("/nonexistent/daily.csv"), |p| {
                load_daily(p, MalformedPolicy::Skip)
            })
            .unwrap_err();
        assert!(matches!(err, LoadError::DataUnavailable { .. }));
        assert!(cache.is_empty());
    }
}
