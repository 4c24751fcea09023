//! Hourly summit readings from the NWS Burlington Mount Mansfield page.

use anyhow::anyhow;
use chrono::NaiveDateTime;
use log::warn;
use scraper::{ElementRef, Html, Selector};

#[cfg(feature = "api")]
use crate::http;
#[cfg(feature = "api")]
use reqwest::Client;

pub const PAGE_URL: &str = "https://www.weather.gov/btv/mansfield";

/// Table timestamps are local station time, "YYYY-MM-DD HH:MM:SS".
pub const TABLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the summit table, imperial units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummitReading {
    pub timestamp: NaiveDateTime,
    pub temperature_f: Option<i32>,
    pub direction_deg: Option<i32>,
    pub wind_mph: Option<i32>,
    pub gust_mph: Option<i32>,
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css}: {e:?}"))
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn parse_int(field: &str) -> Option<i32> {
    field.parse().ok()
}

impl SummitReading {
    fn from_cells(cells: &[String]) -> Option<SummitReading> {
        let [timestamp, temperature, direction, wind, gust] = cells else {
            return None;
        };
        let timestamp = match NaiveDateTime::parse_from_str(timestamp, TABLE_FORMAT) {
            Ok(ts) => ts,
            Err(_) => {
                if !timestamp.is_empty() {
                    warn!("skipping row with timestamp {timestamp:?}");
                }
                return None;
            }
        };
        Some(SummitReading {
            timestamp,
            temperature_f: parse_int(temperature),
            direction_deg: parse_int(direction),
            wind_mph: parse_int(wind),
            gust_mph: parse_int(gust),
        })
    }
}

/// Parse the first table body on the page, oldest reading first.
///
/// The page lists newest first and repeats the column titles as the first
/// body row; rows without a full timestamp are skipped.
pub fn parse_page(html: &str) -> anyhow::Result<Vec<SummitReading>> {
    let document = Html::parse_document(html);
    let tbody = document
        .select(&selector("tbody")?)
        .next()
        .ok_or_else(|| anyhow!("no table body on summit page"))?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("td")?;

    let mut readings: Vec<SummitReading> = tbody
        .select(&row_selector)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&cell_selector).map(cell_text).collect();
            SummitReading::from_cells(&cells)
        })
        .collect();
    readings.reverse();
    Ok(readings)
}

/// GET the summit observation page.
#[cfg(feature = "api")]
pub async fn fetch_page(client: &Client) -> anyhow::Result<String> {
    http::send_for_text(client.get(PAGE_URL)).await
}
