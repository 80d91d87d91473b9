//! Plotly figures for the dashboard views

use ride_core::{DailySummary, SeasonSeries, StationCount};
use serde_json::{json, Value};

fn centered_title(text: &str) -> Value {
    json!({ "text": text, "x": 0.5, "xanchor": "center" })
}

/// Horizontal bar chart of a station ranking, most popular on top
pub fn station_ranking(ranking: &[StationCount], title: &str) -> Value {
    let counts: Vec<u64> = ranking.iter().map(|s| s.trip_count).collect();
    let names: Vec<&str> = ranking.iter().map(|s| s.station.as_str()).collect();

    json!({
        "data": [{
            "type": "bar",
            "orientation": "h",
            "x": counts,
            "y": names,
            "marker": { "color": counts, "colorscale": "Viridis" },
        }],
        "layout": {
            "title": centered_title(title),
            "xaxis": { "title": { "text": "Total Number of Trips" } },
            "yaxis": { "title": { "text": "Start Station Name" }, "autorange": "reversed" },
            "height": 700,
            "template": "plotly_dark",
        },
    })
}

/// Daily trips (left axis) against average temperature (right axis).
///
/// The x range spans the first to the last day of the table.
pub fn trips_vs_temperature(daily: &[DailySummary], title: &str) -> Value {
    let dates: Vec<String> = daily.iter().map(|d| d.date.to_string()).collect();
    let trips: Vec<u64> = daily.iter().map(|d| d.trip_count).collect();
    let temps: Vec<f64> = daily.iter().map(|d| d.avg_temp).collect();

    let mut xaxis = json!({ "type": "date", "title": { "text": "Date" } });
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        xaxis["range"] = json!([first, last]);
    }

    json!({
        "data": [
            {
                "type": "scatter",
                "mode": "lines",
                "name": "Daily Bike Trips",
                "x": dates,
                "y": trips,
                "line": { "color": "deepskyblue" },
            },
            {
                "type": "scatter",
                "mode": "lines",
                "name": "Avg. Temp (°C)",
                "x": dates,
                "y": temps,
                "yaxis": "y2",
                "line": { "color": "tomato" },
            },
        ],
        "layout": {
            "title": centered_title(title),
            "template": "plotly_dark",
            "height": 600,
            "legend": { "x": 0.02, "y": 0.98 },
            "xaxis": xaxis,
            "yaxis": { "title": { "text": "Daily Bike Trips" } },
            "yaxis2": {
                "title": { "text": "Average Temperature (°C)" },
                "overlaying": "y",
                "side": "right",
            },
        },
    })
}

/// Stacked horizontal bars, one trace per season in display order
pub fn seasonal_stacked(series: &[SeasonSeries], title: &str) -> Value {
    let traces: Vec<Value> = series
        .iter()
        .map(|s| {
            json!({
                "type": "bar",
                "orientation": "h",
                "name": s.season.label(),
                "x": s.counts,
                "y": s.stations,
            })
        })
        .collect();

    json!({
        "data": traces,
        "layout": {
            "title": centered_title(title),
            "xaxis": { "title": { "text": "Number of Trips (from sample)" } },
            "yaxis": { "title": { "text": "Start Station Name" }, "categoryorder": "total ascending" },
            "barmode": "stack",
            "height": 800,
            "legend": { "title": { "text": "Season" } },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ride_core::Season;

    fn day(d: u32, trips: u64, temp: f64) -> DailySummary {
        DailySummary {
            date: NaiveDate::from_ymd_opt(2022, 1, d).unwrap(),
            trip_count: trips,
            avg_temp: temp,
        }
    }

    #[test]
    fn time_series_keeps_order_and_values() {
        let daily = vec![day(1, 10, 0.5), day(2, 20, 1.5), day(3, 15, -2.0)];
        let fig = trips_vs_temperature(&daily, "t");
        assert_eq!(fig["data"][0]["x"], json!(["2022-01-01", "2022-01-02", "2022-01-03"]));
        assert_eq!(fig["data"][0]["y"], json!([10, 20, 15]));
        assert_eq!(fig["data"][1]["yaxis"], "y2");
        assert_eq!(fig["layout"]["xaxis"]["range"], json!(["2022-01-01", "2022-01-03"]));
    }

    #[test]
    fn empty_time_series_has_no_range() {
        let fig = trips_vs_temperature(&[], "t");
        assert!(fig["layout"]["xaxis"].get("range").is_none());
    }

    #[test]
    fn ranking_is_reversed_so_top_is_first() {
        let ranking = vec![
            StationCount { station: "A".into(), trip_count: 9 },
            StationCount { station: "B".into(), trip_count: 4 },
        ];
        let fig = station_ranking(&ranking, "t");
        assert_eq!(fig["data"][0]["y"], json!(["A", "B"]));
        assert_eq!(fig["layout"]["yaxis"]["autorange"], "reversed");
    }

    #[test]
    fn stacked_has_one_trace_per_series() {
        let series = vec![
            SeasonSeries { season: Season::Winter, stations: vec!["A".into()], counts: vec![2] },
            SeasonSeries { season: Season::Fall, stations: vec![], counts: vec![] },
        ];
        let fig = seasonal_stacked(&series, "t");
        let names: Vec<&str> = fig["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Winter", "Fall"]);
        assert_eq!(fig["layout"]["barmode"], "stack");
    }
}
