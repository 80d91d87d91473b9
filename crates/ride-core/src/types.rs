//! Core data types for trip and ridership tables

use crate::season::{classify_season, Season, SeasonError};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One bicycle trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    /// Trip start time
    pub started_at: NaiveDateTime,

    /// Calendar date of `started_at`
    pub date: NaiveDate,

    /// Calendar month of `started_at` (1-12)
    pub month: u32,

    /// Season derived from `month`
    pub season: Season,

    /// Start station name (many trips share a station)
    pub start_station_name: String,
}

impl TripRecord {
    /// Build a trip, deriving date, month and season from the start time
    pub fn new(
        started_at: NaiveDateTime,
        start_station_name: impl Into<String>,
    ) -> Result<Self, SeasonError> {
        let date = started_at.date();
        let month = date.month();
        let season = classify_season(month)?;
        Ok(Self {
            started_at,
            date,
            month,
            season,
            start_station_name: start_station_name.into(),
        })
    }
}

/// Ridership and weather for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,

    #[serde(rename = "tripCount")]
    pub trip_count: u64,

    /// Average temperature in degrees Celsius
    #[serde(rename = "avgTemp")]
    pub avg_temp: f64,
}

/// A pre-aggregated route between two stations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    #[serde(rename = "startStation")]
    pub start_station_name: String,

    #[serde(rename = "endStation", skip_serializing_if = "Option::is_none")]
    pub end_station_name: Option<String>,

    #[serde(rename = "tripCount")]
    pub trip_count: u64,
}

/// Trips starting at one station in one season
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationAggregate {
    pub station: String,
    pub season: Season,

    #[serde(rename = "tripCount")]
    pub trip_count: u64,
}

/// One entry of a station ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationCount {
    pub station: String,

    #[serde(rename = "tripCount")]
    pub trip_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_trip_derives_calendar_fields() {
        let trip = TripRecord::new(at("2022-12-31 23:59:00"), "W 21 St & 6 Ave").unwrap();
        assert_eq!(trip.date, NaiveDate::from_ymd_opt(2022, 12, 31).unwrap());
        assert_eq!(trip.month, 12);
        assert_eq!(trip.season, Season::Winter);

        let trip = TripRecord::new(at("2022-09-01 00:00:00"), "Broadway & W 58 St").unwrap();
        assert_eq!(trip.season, Season::Fall);
    }

    #[test]
    fn test_aggregate_serde() {
        let agg = StationAggregate {
            station: "A".into(),
            season: Season::Winter,
            trip_count: 2,
        };
        let json = serde_json::to_string(&agg).unwrap();
        assert_eq!(json, r#"{"station":"A","season":"Winter","tripCount":2}"#);
    }
}
