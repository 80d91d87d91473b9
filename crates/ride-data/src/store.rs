//! Data-access object shared by request handlers

use crate::{
    load_daily, load_routes, load_trips, LoadError, LoadResult, MalformedPolicy, Table, TableCache,
};
use ride_core::{DailySummary, RouteRecord, TripRecord};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Locations of the input files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    pub trips: PathBuf,
    pub daily: PathBuf,
    pub routes: PathBuf,
    pub map: PathBuf,
}

/// The two tables every ridership view needs
#[derive(Debug, Clone)]
pub struct Dataset {
    pub trips: Arc<Table<TripRecord>>,
    pub daily: Arc<Table<DailySummary>>,
}

/// Load the trip and daily-summary tables without caching
pub fn load_dataset(
    trips: &Path,
    daily: &Path,
    policy: MalformedPolicy,
) -> LoadResult<Dataset> {
    Ok(Dataset {
        trips: Arc::new(load_trips(trips, policy)?),
        daily: Arc::new(load_daily(daily, policy)?),
    })
}

/// Read a static asset verbatim
pub fn read_asset(path: &Path) -> LoadResult<Vec<u8>> {
    fs::read(path).map_err(|source| LoadError::DataUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

/// Read-only access to the dashboard's tables.
///
/// Owns one [`TableCache`] per table kind; every accessor re-checks the
/// file's modification time and only parses on a change.
pub struct DataStore {
    sources: DataSources,
    policy: MalformedPolicy,
    trips: TableCache<TripRecord>,
    daily: TableCache<DailySummary>,
    routes: TableCache<RouteRecord>,
}

impl DataStore {
    pub fn new(sources: DataSources, policy: MalformedPolicy) -> Self {
        Self {
            sources,
            policy,
            trips: TableCache::new(),
            daily: TableCache::new(),
            routes: TableCache::new(),
        }
    }

    pub fn sources(&self) -> &DataSources {
        &self.sources
    }

    pub fn trips(&self) -> LoadResult<Arc<Table<TripRecord>>> {
        let policy = self.policy;
        self.trips
            .get_or_load(&self.sources.trips, |p| load_trips(p, policy))
    }

    pub fn daily(&self) -> LoadResult<Arc<Table<DailySummary>>> {
        let policy = self.policy;
        self.daily
            .get_or_load(&self.sources.daily, |p| load_daily(p, policy))
    }

    pub fn routes(&self) -> LoadResult<Arc<Table<RouteRecord>>> {
        let policy = self.policy;
        self.routes
            .get_or_load(&self.sources.routes, |p| load_routes(p, policy))
    }

    pub fn dataset(&self) -> LoadResult<Dataset> {
        Ok(Dataset {
            trips: self.trips()?,
            daily: self.daily()?,
        })
    }

    /// The pre-rendered route map, as raw bytes; contents are never inspected
    pub fn map_html(&self) -> LoadResult<Vec<u8>> {
        read_asset(&self.sources.map)
    }

    /// Load every table once so startup surfaces missing inputs early
    pub fn warm(&self) -> LoadResult<()> {
        let dataset = self.dataset()?;
        let routes = self.routes()?;
        info!(
            trips = dataset.trips.rows.len(),
            days = dataset.daily.rows.len(),
            routes = routes.rows.len(),
            "dataset ready"
        );
        Ok(())
    }
}
