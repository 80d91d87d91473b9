//! Dashboard pages and their dispatcher

use crate::charts;
use crate::html::{self, escape, notice, NoticeKind};
use crate::AppState;
use axum::http::StatusCode;
use ride_core::{aggregate, compact_count, count_in_seasons, season_series, top_route_stations, Season, SeasonSet};
use ride_data::LoadError;
use serde::Serialize;
use tracing::{debug, warn};

/// The navigable views of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Introduction,
    StationPopularity,
    SeasonalTrends,
    GeospatialRoutes,
    Recommendations,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Introduction,
        Page::StationPopularity,
        Page::SeasonalTrends,
        Page::GeospatialRoutes,
        Page::Recommendations,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Page::Introduction => "introduction",
            Page::StationPopularity => "station-popularity",
            Page::SeasonalTrends => "seasonal-trends",
            Page::GeospatialRoutes => "geospatial-routes",
            Page::Recommendations => "recommendations",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Introduction => "1. Introduction",
            Page::StationPopularity => "2. Station Popularity Analysis",
            Page::SeasonalTrends => "3. Seasonal Ridership Trends",
            Page::GeospatialRoutes => "4. Geospatial Route Analysis",
            Page::Recommendations => "5. Recommendations",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Page> {
        Page::ALL.into_iter().find(|p| p.slug() == slug)
    }
}

/// A rendered HTML response
#[derive(Debug)]
pub struct Rendered {
    pub status: StatusCode,
    pub body: String,
}

/// Render `page` for the given season selection.
///
/// Data failures become a visible error notice with status 503.
pub fn render_page(state: &AppState, page: Page, seasons: SeasonSet) -> Rendered {
    debug!(page = page.slug(), %seasons, "rendering page");
    let (sidebar, result) = match page {
        Page::Introduction => (String::new(), Ok(introduction(state))),
        Page::StationPopularity => (season_filter(seasons), station_popularity(state, seasons)),
        Page::SeasonalTrends => (String::new(), seasonal_trends(state)),
        Page::GeospatialRoutes => (String::new(), Ok(geospatial_routes(state))),
        Page::Recommendations => (String::new(), Ok(recommendations(state))),
    };

    let (status, content) = match result {
        Ok(content) => (StatusCode::OK, content),
        Err(e) => {
            warn!(page = page.slug(), error = %e, "page data unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, notice(NoticeKind::Error, &e.to_string()))
        }
    };

    Rendered {
        status,
        body: html::shell(&state.settings.title, Some(page), &sidebar, &content),
    }
}

/// A page whose only content is one notice
pub fn render_notice(
    state: &AppState,
    page: Option<Page>,
    status: StatusCode,
    kind: NoticeKind,
    message: &str,
) -> Rendered {
    Rendered {
        status,
        body: html::shell(&state.settings.title, page, "", &notice(kind, message)),
    }
}

/// Reject a season selection that does not parse, with status 400
pub fn render_bad_selection(state: &AppState, page: Page, message: &str) -> Rendered {
    let sidebar = match page {
        Page::StationPopularity => season_filter(SeasonSet::all()),
        _ => String::new(),
    };
    Rendered {
        status: StatusCode::BAD_REQUEST,
        body: html::shell(
            &state.settings.title,
            Some(page),
            &sidebar,
            &notice(NoticeKind::Error, &format!("Invalid season selection. {message}")),
        ),
    }
}

/// The single-page overview: station ranking, ridership vs temperature, map
pub fn render_overview(state: &AppState) -> Rendered {
    let top_n = state.settings.top_n;
    let mut status = StatusCode::OK;
    let mut content = format!(
        "<h1>{}</h1>\n<p>Insights into the bike-share service to support identifying expansion \
         opportunities and managing bike distribution, focusing on station popularity and \
         seasonal demand.</p>\n",
        escape(&state.settings.title)
    );

    content.push_str("<h2>1. What are the most popular starting stations?</h2>\n");
    match state.store.routes() {
        Ok(routes) => {
            let ranking = top_route_stations(&routes.rows, top_n);
            let fig = charts::station_ranking(
                &ranking,
                &format!("Top {top_n} Most Popular Start Stations"),
            );
            content.push_str(&html::figure("chart-top-stations", &fig));
        }
        Err(e) => {
            status = StatusCode::SERVICE_UNAVAILABLE;
            content.push_str(&notice(NoticeKind::Error, &e.to_string()));
        }
    }

    content.push_str("<h2>2. How does ridership change with temperature?</h2>\n");
    match seasonal_trends(state) {
        Ok(section) => content.push_str(&section),
        Err(e) => {
            status = StatusCode::SERVICE_UNAVAILABLE;
            content.push_str(&notice(NoticeKind::Error, &e.to_string()));
        }
    }

    content.push_str("<h2>3. What are the most popular trip routes?</h2>\n");
    content.push_str(&map_section(state, 1000));

    Rendered {
        status,
        body: html::shell(&state.settings.title, None, "", &content),
    }
}

fn season_filter(selected: SeasonSet) -> String {
    let mut boxes = String::new();
    for season in Season::ALL {
        let checked = if selected.contains(season) { " checked" } else { "" };
        boxes.push_str(&format!(
            r#"<label><input type="checkbox" class="season" value="{label}"{checked}> {label}</label><br>"#,
            label = season.label()
        ));
    }
    format!(
        r#"<hr>
<form id="season-filter" method="get">
<p>Select seasons to display:</p>
{boxes}
<input type="hidden" name="seasons" id="seasons">
<button type="submit">Apply</button>
</form>
<script>
document.getElementById("season-filter").addEventListener("submit", function () {{
  const picked = Array.from(document.querySelectorAll("input.season:checked")).map(function (b) {{ return b.value; }});
  document.getElementById("seasons").value = picked.join(",");
}});
</script>"#
    )
}

fn introduction(state: &AppState) -> String {
    let mut content = format!(
        r#"<h1>{}</h1>
<h3>Project Overview</h3>
<p>A strategic analysis of the bike-share service, giving the business strategy department
actionable insight into bike shortages at popular stations and opportunities for expansion.</p>
<h3>Dashboard Contents</h3>
<ul>
<li><strong>Station Popularity:</strong> the busiest start stations and their seasonal ridership.</li>
<li><strong>Seasonal Trends:</strong> how ridership moves with temperature through the year.</li>
<li><strong>Geospatial Analysis:</strong> the city's most popular "bike highways".</li>
<li><strong>Recommendations:</strong> data-driven recommendations based on the analysis.</li>
</ul>
"#,
        escape(&state.settings.title)
    );
    if state.settings.intro_image.exists() {
        content.push_str(
            r#"<figure><img src="/assets/images/intro" alt="bike station"><figcaption>A bike-share station.</figcaption></figure>"#,
        );
    }
    content
}

fn station_popularity(state: &AppState, seasons: SeasonSet) -> Result<String, LoadError> {
    let top_n = state.settings.top_n;
    let mut content = format!(
        "<h2>Analysis of Most Frequented Start Stations by Season</h2>\n\
         <p>Ridership of the top {top_n} busiest start stations broken down by season. Some \
         stations are busy year-round, but most trips happen in Summer and Fall, which matters \
         for seasonal fleet planning.</p>\n"
    );

    if seasons.is_empty() {
        content.push_str(&notice(
            NoticeKind::Warning,
            "Please select at least one season in the sidebar.",
        ));
        return Ok(content);
    }

    let trips = state.store.trips()?;
    let total = count_in_seasons(&trips.rows, seasons);
    content.push_str(&format!(
        r#"<div class="metric-label">Total Sampled Rides in Selected Seasons</div><div class="metric">{}</div>"#,
        compact_count(total as u64)
    ));

    let aggregates = aggregate(&trips.rows, seasons, top_n);
    let series = season_series(&aggregates, seasons);
    let fig = charts::seasonal_stacked(
        &series,
        &format!("Seasonal Trip Distribution for Top {top_n} Stations"),
    );
    content.push_str(&html::figure("chart-seasonal-stations", &fig));
    Ok(content)
}

fn seasonal_trends(state: &AppState) -> Result<String, LoadError> {
    let daily = state.store.daily()?;
    let fig = charts::trips_vs_temperature(
        &daily.rows,
        "Daily Bike Trips vs. Average Temperature",
    );
    Ok(format!(
        "<h2>Analysis of Seasonal Ridership and Weather Impact</h2>\n\
         <p>Average daily temperature and the number of trips move together: ridership peaks in \
         the warmest months and drops sharply in winter, a key input for fleet sizing.</p>\n{}",
        html::figure("chart-trips-temperature", &fig)
    ))
}

fn map_section(state: &AppState, height: u32) -> String {
    let path = &state.store.sources().map;
    if path.exists() {
        format!(r#"<iframe class="map" src="/assets/map" height="{height}"></iframe>"#)
    } else {
        notice(
            NoticeKind::Error,
            &format!(
                "Map file ('{}') not found. Please ensure it is in the data directory.",
                path.display()
            ),
        )
    }
}

fn geospatial_routes(state: &AppState) -> String {
    format!(
        "<h2>Geospatial Analysis of Popular Trip Routes</h2>\n\
         <p>The top 1,000 bike routes. Arc colour and thickness show the number of trips; bright \
         red, thick lines are the busiest corridors. Use the map's own filter to find the busiest \
         'bike highways'.</p>\n{}",
        map_section(state, 600)
    )
}

fn recommendations(state: &AppState) -> String {
    let image = if state.settings.recommendation_image.exists() {
        r#"<figure><img src="/assets/images/recommendation" alt="recommendations"><figcaption>Data-driven strategies for urban mobility.</figcaption></figure>"#.to_string()
    } else {
        notice(NoticeKind::Info, "Note: A recommendation image can be added here.")
    };

    format!(
        r#"<h1>Strategic Recommendations</h1>
{image}
<h4>1. Implement dynamic, season-aware rebalancing</h4>
<p><strong>Observation:</strong> some hubs near transit are busy all year while many other top
stations drop sharply in Winter and Spring.</p>
<p><strong>Recommendation:</strong> in winter keep the handful of all-weather commuter stations
fully stocked and scale back elsewhere; in Summer and Fall extend rebalancing to the full top
station list.</p>
<h4>2. Size the fleet to seasonal demand</h4>
<p><strong>Observation:</strong> ridership falls steeply between November and March, in step with
temperature.</p>
<p><strong>Recommendation:</strong> shrink the active fleet in winter, for example by 40-50% when
the weekly average temperature falls below 5°C, to cut maintenance, charging and logistics cost.</p>
<h4>3. Treat commuter corridors and leisure hotspots differently</h4>
<p><strong>Observation:</strong> the map shows A-to-B commuter corridors, while the busiest raw
routes are round trips in recreational areas.</p>
<p><strong>Recommendation:</strong> guarantee availability on commuter corridors at rush hour, and
bike volume at leisure hotspots on weekends, possibly with hourly pricing.</p>
"#
    )
}
