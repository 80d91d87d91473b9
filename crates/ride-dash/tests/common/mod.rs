#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use ride_dash::{AppState, DashboardSettings};
use ride_data::{DataSources, DataStore, MalformedPolicy};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TRIPS: &str = "\
ride_id,started_at,start_station_name
1,2022-01-05 08:00:00,A
2,2022-01-06 09:00:00,A
3,2022-07-01 17:30:00.250,B
4,2022-07-02 18:00:00,B
5,2022-10-10 07:45:00,A
6,2022-04-01 12:00:00,C
";

pub const DAILY: &str = "\
date,trip_count,avgTemp
2022-01-01,10,1.5
2022-01-02,20,-0.5
2022-01-03,15,2.0
";

pub const ROUTES: &str = "\
start_station_name,end_station_name,trip_count
W 21 St & 6 Ave,9 Ave & W 22 St,120
Central Park S & 6 Ave,Central Park S & 6 Ave,300
W 21 St & 6 Ave,W 18 St & 6 Ave,250
";

pub fn write_fixtures(dir: &Path) {
    fs::write(dir.join("trips.csv"), TRIPS).unwrap();
    fs::write(dir.join("daily.csv"), DAILY).unwrap();
    fs::write(dir.join("routes.csv"), ROUTES).unwrap();
    fs::write(dir.join("map.html"), "<html><body>kepler map</body></html>").unwrap();
}

pub fn settings(dir: &Path) -> DashboardSettings {
    DashboardSettings {
        title: "Test Dashboard".into(),
        top_n: 20,
        intro_image: dir.join("intro.jpg"),
        recommendation_image: dir.join("recommendation.webp"),
    }
}

/// App over fixture files in a fresh temp dir; the dir must outlive the app
pub fn app_with_fixtures() -> (TempDir, Router, Arc<AppState>) {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let (app, state) = app_in(dir.path());
    (dir, app, state)
}

pub fn app_in(dir: &Path) -> (Router, Arc<AppState>) {
    let sources = DataSources {
        trips: dir.join("trips.csv"),
        daily: dir.join("daily.csv"),
        routes: dir.join("routes.csv"),
        map: dir.join("map.html"),
    };
    let store = DataStore::new(sources, MalformedPolicy::Skip);
    ride_dash::build_app(store, settings(dir)).unwrap()
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let res = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}
