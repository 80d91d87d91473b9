//! CSV loaders for trips, daily summaries and routes.
//!
//! # CSV Formats
//!
//! - **Trips** (has headers): `started_at`, `start_station_name`, other columns ignored
//! - **Daily summary** (has headers): `date,trip_count,avgTemp`
//! - **Routes** (has headers): `start_station_name`, `trip_count`, optional `end_station_name`
//!
//! A missing required column always fails the load. Bad rows follow the
//! [`MalformedPolicy`]: skipped and counted, or fatal.

use crate::{LoadError, LoadResult, MalformedPolicy};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use ride_core::{DailySummary, RouteRecord, TripRecord};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const COL_STARTED_AT: &str = "started_at";
pub const COL_START_STATION: &str = "start_station_name";
pub const COL_END_STATION: &str = "end_station_name";
pub const COL_DATE: &str = "date";
pub const COL_TRIP_COUNT: &str = "trip_count";
pub const COL_AVG_TEMP: &str = "avgTemp";

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Rows loaded from one file, plus what happened while loading them
#[derive(Debug, Clone)]
pub struct Table<T> {
    pub rows: Vec<T>,
    pub report: LoadReport,
}

/// Row accounting for a single load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub source: PathBuf,
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    /// Description of the first skipped row, if any
    pub first_error: Option<String>,
}

/// Why a single field failed to parse
struct FieldError {
    field: &'static str,
    reason: String,
}

impl FieldError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Parse a trip start time.
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.fff]`, the same with a `T` separator, and a
/// bare `YYYY-MM-DD` (taken as midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a calendar date, discarding any time component
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(value).map(|ts| ts.date()))
}

fn column(headers: &StringRecord, name: &str, path: &Path) -> LoadResult<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| LoadError::MalformedRecord {
            path: path.to_path_buf(),
            line: Some(1),
            field: name.to_string(),
            reason: "required column missing from header".to_string(),
        })
}

/// Raw field value; station names are kept exactly as written
fn field<'r>(record: &'r StringRecord, idx: usize, name: &'static str) -> Result<&'r str, FieldError> {
    record
        .get(idx)
        .ok_or_else(|| FieldError::new(name, "missing value"))
}

fn count_field(record: &StringRecord, idx: usize, name: &'static str) -> Result<u64, FieldError> {
    let raw = field(record, idx, name)?;
    raw.trim()
        .parse::<u64>()
        .map_err(|_| FieldError::new(name, format!("not a non-negative integer: {raw:?}")))
}

fn open(path: &Path) -> LoadResult<File> {
    File::open(path).map_err(|source| LoadError::DataUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

/// Drive a CSV reader row by row, applying the malformed-row policy.
fn collect_rows<R, T, F>(
    mut rdr: csv::Reader<R>,
    path: &Path,
    policy: MalformedPolicy,
    mut parse_row: F,
) -> LoadResult<Table<T>>
where
    R: Read,
    F: FnMut(&StringRecord) -> Result<T, FieldError>,
{
    let mut rows = Vec::new();
    let mut report = LoadReport {
        source: path.to_path_buf(),
        ..LoadReport::default()
    };

    for result in rdr.records() {
        report.rows_read += 1;
        let outcome = match result {
            Ok(record) => {
                let line = record.position().map(|p| p.line());
                parse_row(&record).map_err(|e| (line, e))
            }
            Err(e) => {
                let line = e.position().map(|p| p.line());
                Err((line, FieldError::new("record", e.to_string())))
            }
        };

        match outcome {
            Ok(row) => {
                rows.push(row);
                report.rows_loaded += 1;
            }
            Err((line, err)) => {
                let malformed = LoadError::MalformedRecord {
                    path: path.to_path_buf(),
                    line,
                    field: err.field.to_string(),
                    reason: err.reason,
                };
                if policy == MalformedPolicy::Abort {
                    return Err(malformed);
                }
                debug!(error = %malformed, "skipping malformed row");
                report.rows_skipped += 1;
                report.first_error.get_or_insert_with(|| malformed.to_string());
            }
        }
    }

    if report.rows_skipped > 0 {
        warn!(
            source = %path.display(),
            skipped = report.rows_skipped,
            loaded = report.rows_loaded,
            first_error = report.first_error.as_deref().unwrap_or_default(),
            "skipped malformed rows"
        );
    }
    info!(
        source = %path.display(),
        rows = report.rows_loaded,
        "table loaded"
    );

    Ok(Table { rows, report })
}

fn headers_of<R: Read>(reader: R) -> LoadResult<(StringRecord, csv::Reader<R>)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    Ok((headers, rdr))
}

/// Read trip records from CSV.
///
/// `path` is only used to label errors and the load report.
pub fn read_trips<R: Read>(
    reader: R,
    path: &Path,
    policy: MalformedPolicy,
) -> LoadResult<Table<TripRecord>> {
    let (headers, rdr) = headers_of(reader)?;
    let started_at = column(&headers, COL_STARTED_AT, path)?;
    let station = column(&headers, COL_START_STATION, path)?;

    collect_rows(rdr, path, policy, |record| {
        let raw = field(record, started_at, COL_STARTED_AT)?;
        let ts = parse_timestamp(raw)
            .ok_or_else(|| FieldError::new(COL_STARTED_AT, format!("bad timestamp: {raw:?}")))?;
        let name = field(record, station, COL_START_STATION)?;
        if name.is_empty() {
            return Err(FieldError::new(COL_START_STATION, "empty station name"));
        }
        TripRecord::new(ts, name).map_err(|e| FieldError::new(COL_STARTED_AT, e.to_string()))
    })
}

/// Read daily summaries from CSV, ordered by date ascending.
///
/// A date repeated from an earlier row counts as a malformed row.
pub fn read_daily<R: Read>(
    reader: R,
    path: &Path,
    policy: MalformedPolicy,
) -> LoadResult<Table<DailySummary>> {
    let (headers, rdr) = headers_of(reader)?;
    let date = column(&headers, COL_DATE, path)?;
    let trip_count = column(&headers, COL_TRIP_COUNT, path)?;
    let avg_temp = column(&headers, COL_AVG_TEMP, path)?;

    let mut seen = HashSet::new();
    let mut table = collect_rows(rdr, path, policy, |record| {
        let raw = field(record, date, COL_DATE)?;
        let day = parse_date(raw)
            .ok_or_else(|| FieldError::new(COL_DATE, format!("bad date: {raw:?}")))?;
        let count = count_field(record, trip_count, COL_TRIP_COUNT)?;
        let raw_temp = field(record, avg_temp, COL_AVG_TEMP)?;
        let temp = raw_temp
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| FieldError::new(COL_AVG_TEMP, format!("not a number: {raw_temp:?}")))?;
        if !seen.insert(day) {
            return Err(FieldError::new(COL_DATE, format!("duplicate date {day}")));
        }
        Ok(DailySummary {
            date: day,
            trip_count: count,
            avg_temp: temp,
        })
    })?;

    table.rows.sort_by_key(|d| d.date);
    Ok(table)
}

/// Read pre-aggregated routes from CSV
pub fn read_routes<R: Read>(
    reader: R,
    path: &Path,
    policy: MalformedPolicy,
) -> LoadResult<Table<RouteRecord>> {
    let (headers, rdr) = headers_of(reader)?;
    let start = column(&headers, COL_START_STATION, path)?;
    let trip_count = column(&headers, COL_TRIP_COUNT, path)?;
    let end = headers.iter().position(|h| h.trim() == COL_END_STATION);

    collect_rows(rdr, path, policy, |record| {
        let name = field(record, start, COL_START_STATION)?;
        if name.is_empty() {
            return Err(FieldError::new(COL_START_STATION, "empty station name"));
        }
        Ok(RouteRecord {
            start_station_name: name.to_string(),
            end_station_name: end
                .and_then(|i| record.get(i))
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            trip_count: count_field(record, trip_count, COL_TRIP_COUNT)?,
        })
    })
}

/// Load the trip file at `path`
pub fn load_trips(path: &Path, policy: MalformedPolicy) -> LoadResult<Table<TripRecord>> {
    read_trips(open(path)?, path, policy)
}

/// Load the daily summary file at `path`
pub fn load_daily(path: &Path, policy: MalformedPolicy) -> LoadResult<Table<DailySummary>> {
    read_daily(open(path)?, path, policy)
}

/// Load the routes file at `path`
pub fn load_routes(path: &Path, policy: MalformedPolicy) -> LoadResult<Table<RouteRecord>> {
    read_routes(open(path)?, path, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ride_core::Season;

    fn p() -> &'static Path {
        Path::new("fixture.csv")
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2022-01-05 08:15:30").is_some());
        assert!(parse_timestamp("2022-01-05 08:15:30.123").is_some());
        assert!(parse_timestamp("2022-01-05T08:15:30").is_some());
        assert_eq!(
            parse_timestamp("2022-01-05"),
            NaiveDate::from_ymd_opt(2022, 1, 5).unwrap().and_hms_opt(0, 0, 0)
        );
        assert!(parse_timestamp("05/01/2022").is_none());
        assert_eq!(
            parse_date("2022-03-01 00:00:00"),
            NaiveDate::from_ymd_opt(2022, 3, 1)
        );
    }

    #[test]
    fn test_read_trips() {
        let csv = "\
ride_id,started_at,start_station_name,member_casual
r1,2022-01-05 08:00:00,A,member
r2,2022-01-06 09:30:00.5,A,casual
r3,2022-07-01 17:45:00,B,member
";
        let table = read_trips(csv.as_bytes(), p(), MalformedPolicy::Skip).unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].start_station_name, "A");
        assert_eq!(table.rows[2].season, Season::Summer);
        assert_eq!(table.rows[2].month, 7);
        assert_eq!(table.report.rows_skipped, 0);
    }

    #[test]
    fn test_station_names_kept_verbatim() {
        let csv = "\
started_at,start_station_name
2022-01-05 08:00:00,A
2022-01-06 08:00:00, A
2022-01-07 08:00:00,A
";
        let table = read_trips(csv.as_bytes(), p(), MalformedPolicy::Skip).unwrap();
        let names: Vec<&str> = table.rows.iter().map(|r| r.start_station_name.as_str()).collect();
        assert_eq!(names, vec!["A", " A", "A"]);

        let routes = "start_station_name,trip_count\nA, 3\n A ,4\n";
        let table = read_routes(routes.as_bytes(), p(), MalformedPolicy::Abort).unwrap();
        assert_eq!(table.rows[0].trip_count, 3);
        assert_eq!(table.rows[1].start_station_name, " A ");
    }

    #[test]
    fn test_missing_station_column() {
        let csv = "started_at,end_station_name\n2022-01-05 08:00:00,A\n";
        let err = read_trips(csv.as_bytes(), p(), MalformedPolicy::Skip).unwrap_err();
        match err {
            LoadError::MalformedRecord { field, .. } => assert_eq!(field, COL_START_STATION),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_skip_policy_counts_bad_rows() {
        let csv = "\
started_at,start_station_name
2022-01-05 08:00:00,A
not-a-time,A
2022-02-01 08:00:00,
2022-07-01 08:00:00,B
";
        let table = read_trips(csv.as_bytes(), p(), MalformedPolicy::Skip).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.report.rows_read, 4);
        assert_eq!(table.report.rows_skipped, 2);
        let first = table.report.first_error.unwrap();
        assert!(first.contains("line 3"), "{first}");
        assert!(first.contains(COL_STARTED_AT), "{first}");
    }

    #[test]
    fn test_abort_policy_fails_fast() {
        let csv = "started_at,start_station_name\nyesterday,A\n";
        let err = read_trips(csv.as_bytes(), p(), MalformedPolicy::Abort).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MalformedRecord { line: Some(2), ref field, .. } if field == COL_STARTED_AT
        ));
    }

    #[test]
    fn test_read_daily_preserves_order_and_values() {
        let csv = "\
date,trip_count,avgTemp
2022-01-01,10,3.5
2022-01-02,20,-1.0
2022-01-03,15,0.25
";
        let table = read_daily(csv.as_bytes(), p(), MalformedPolicy::Skip).unwrap();
        let dates: Vec<String> = table.rows.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2022-01-01", "2022-01-02", "2022-01-03"]);
        let counts: Vec<u64> = table.rows.iter().map(|d| d.trip_count).collect();
        assert_eq!(counts, vec![10, 20, 15]);
        assert_eq!(table.rows[1].avg_temp, -1.0);
    }

    #[test]
    fn test_read_daily_sorts_and_rejects_duplicates() {
        let csv = "\
date,trip_count,avgTemp
2022-01-03,15,1.0
2022-01-01,10,2.0
2022-01-03,99,3.0
2022-01-02,abc,4.0
2022-01-04,12,warm
";
        let table = read_daily(csv.as_bytes(), p(), MalformedPolicy::Skip).unwrap();
        let counts: Vec<u64> = table.rows.iter().map(|d| d.trip_count).collect();
        assert_eq!(counts, vec![10, 15]);
        assert_eq!(table.report.rows_skipped, 3);

        let err = read_daily(csv.as_bytes(), p(), MalformedPolicy::Abort).unwrap_err();
        assert!(matches!(err, LoadError::MalformedRecord { ref field, .. } if field == COL_DATE));
    }

    #[test]
    fn test_read_daily_missing_column() {
        let csv = "date,trip_count\n2022-01-01,10\n";
        let err = read_daily(csv.as_bytes(), p(), MalformedPolicy::Skip).unwrap_err();
        assert!(err.to_string().contains(COL_AVG_TEMP));
    }

    #[test]
    fn test_read_routes() {
        let csv = "\
start_station_name,end_station_name,trip_count
A,B,12
C,,4
";
        let table = read_routes(csv.as_bytes(), p(), MalformedPolicy::Skip).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].end_station_name.as_deref(), Some("B"));
        assert_eq!(table.rows[1].end_station_name, None);
        assert_eq!(table.rows[1].trip_count, 4);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = load_trips(Path::new("/nonexistent/trips.csv"), MalformedPolicy::Skip)
            .unwrap_err();
        assert!(matches!(err, LoadError::DataUnavailable { .. }));
        assert!(err.to_string().contains("/nonexistent/trips.csv"));
    }
}
