//! Station rankings and seasonal rollups over trip records

use crate::season::{Season, SeasonSet};
use crate::types::{RouteRecord, StationAggregate, StationCount, TripRecord};
use std::collections::HashMap;

/// Per-station counter that remembers first-seen order.
///
/// Ranking is a stable sort on descending count, so ties keep the order in
/// which stations first appeared in the input.
#[derive(Debug, Default)]
struct StationTally<'a> {
    index: HashMap<&'a str, usize>,
    entries: Vec<(&'a str, u64)>,
}

impl<'a> StationTally<'a> {
    fn add(&mut self, station: &'a str, count: u64) {
        match self.index.get(station) {
            Some(&i) => {
                let total = &mut self.entries[i].1;
                *total = total.saturating_add(count);
            }
            None => {
                self.index.insert(station, self.entries.len());
                self.entries.push((station, count));
            }
        }
    }

    fn top(mut self, n: usize) -> Vec<(&'a str, u64)> {
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.entries.truncate(n);
        self.entries
    }
}

fn selected<'a>(
    records: &'a [TripRecord],
    seasons: SeasonSet,
) -> impl Iterator<Item = &'a TripRecord> + 'a {
    records.iter().filter(move |r| seasons.contains(r.season))
}

/// Number of trips falling in the selected seasons
pub fn count_in_seasons(records: &[TripRecord], seasons: SeasonSet) -> usize {
    selected(records, seasons).count()
}

/// Top `top_n` start stations by trip count within the selected seasons.
///
/// An empty selection yields an empty ranking.
pub fn top_stations(records: &[TripRecord], seasons: SeasonSet, top_n: usize) -> Vec<StationCount> {
    let mut tally = StationTally::default();
    for record in selected(records, seasons) {
        tally.add(&record.start_station_name, 1);
    }

    tally
        .top(top_n)
        .into_iter()
        .map(|(station, trip_count)| StationCount {
            station: station.to_string(),
            trip_count,
        })
        .collect()
}

/// Seasonal trip counts for the `top_n` busiest start stations.
///
/// Stations come out busiest first (ties in first-seen order); within a
/// station seasons follow display order. Station/season pairs with no trips
/// are omitted, so the counts for a station always sum to its filtered total.
pub fn aggregate(
    records: &[TripRecord],
    seasons: SeasonSet,
    top_n: usize,
) -> Vec<StationAggregate> {
    if seasons.is_empty() || top_n == 0 {
        return Vec::new();
    }

    let mut tally = StationTally::default();
    for record in selected(records, seasons) {
        tally.add(&record.start_station_name, 1);
    }
    let top = tally.top(top_n);

    let slots: HashMap<&str, usize> = top
        .iter()
        .enumerate()
        .map(|(slot, (station, _))| (*station, slot))
        .collect();
    let mut by_season = vec![[0u64; 4]; top.len()];
    for record in selected(records, seasons) {
        if let Some(&slot) = slots.get(record.start_station_name.as_str()) {
            by_season[slot][record.season.index()] += 1;
        }
    }

    top.iter()
        .zip(by_season)
        .flat_map(|((station, _), counts)| {
            Season::ALL
                .into_iter()
                .filter(move |season| counts[season.index()] > 0)
                .map(move |season| StationAggregate {
                    station: station.to_string(),
                    season,
                    trip_count: counts[season.index()],
                })
        })
        .collect()
}

/// Top `top_n` start stations by summed route trip counts
pub fn top_route_stations(routes: &[RouteRecord], top_n: usize) -> Vec<StationCount> {
    let mut tally = StationTally::default();
    for route in routes {
        tally.add(&route.start_station_name, route.trip_count);
    }

    tally
        .top(top_n)
        .into_iter()
        .map(|(station, trip_count)| StationCount {
            station: station.to_string(),
            trip_count,
        })
        .collect()
}

/// One stacked-bar series: the stations with trips in `season`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonSeries {
    pub season: Season,
    pub stations: Vec<String>,
    pub counts: Vec<u64>,
}

/// Split aggregates into one series per selected season, in display order.
///
/// Seasons with no trips among the aggregates still get an (empty) series so
/// every selected season shows up in a legend.
pub fn season_series(aggregates: &[StationAggregate], seasons: SeasonSet) -> Vec<SeasonSeries> {
    seasons
        .iter()
        .map(|season| {
            let (stations, counts) = aggregates
                .iter()
                .filter(|a| a.season == season)
                .map(|a| (a.station.clone(), a.trip_count))
                .unzip();
            SeasonSeries {
                season,
                stations,
                counts,
            }
        })
        .collect()
}
