//! NWS Burlington hydrologic summary (HYD) text product.
//!
//! The product is a fixed-width table wrapped in `<pre class="glossaryProduct">`.
//! Column positions come from the `Station ... Snow ... Temperature` header line.

use anyhow::anyhow;
use chrono::NaiveDate;
use log::{debug, warn};
use scraper::{Html, Selector};

#[cfg(feature = "api")]
use crate::http;
#[cfg(feature = "api")]
use reqwest::Client;

pub const PRODUCT_URL: &str =
    "https://forecast.weather.gov/product.php?site=BTV&issuedby=BTV&product=HYD&format=CI&version=1";

/// Line prefix of the summit row.
pub const SUMMIT_ROW: &str = "Mount Mansfield";

const SNOW_WIDTH: usize = 4;
const TEMPERATURE_WIDTH: usize = 11;

/// Max, min and current air temperature in °F.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temperatures {
    pub max_f: i32,
    pub min_f: i32,
    pub current_f: i32,
}

/// What the summit row of one product reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydroReport {
    /// Issuance date from the product header, e.g. "1000 AM EST Sun Feb 10 2019".
    pub issued: Option<NaiveDate>,
    /// Snow depth in inches.
    pub snow_depth_in: Option<i32>,
    pub temperatures: Option<Temperatures>,
}

/// Text of the `<pre class="glossaryProduct">` block.
pub fn extract_product_text(html: &str) -> anyhow::Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("pre.glossaryProduct")
        .map_err(|e| anyhow!("invalid selector: {e:?}"))?;
    document
        .select(&selector)
        .next()
        .map(|pre| pre.text().collect::<String>())
        .ok_or_else(|| anyhow!("no glossaryProduct block in page"))
}

/// First "Mon D YYYY" run of tokens in a line.
fn find_date(line: &str) -> Option<NaiveDate> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens
        .windows(3)
        .find_map(|w| NaiveDate::parse_from_str(&w.join(" "), "%b %d %Y").ok())
}

/// Columns `[start, start + width)` of a line, clipped to its length.
fn column(line: &str, start: usize, width: usize) -> Option<&str> {
    let end = (start + width).min(line.len());
    line.get(start..end)
}

fn parse_depth(line: &str, snow_idx: usize) -> Option<i32> {
    let field = column(line, snow_idx, SNOW_WIDTH)?.trim();
    match field.parse::<i32>() {
        Ok(depth) => Some(depth),
        Err(_) => {
            warn!("unreadable snow depth {field:?}");
            None
        }
    }
}

fn parse_temperatures(line: &str, temp_idx: usize) -> Option<Temperatures> {
    let field = column(line, temp_idx, TEMPERATURE_WIDTH)?;
    let values = field
        .split_whitespace()
        .map(str::parse::<i32>)
        .collect::<Result<Vec<i32>, _>>();
    match values.as_deref() {
        Ok([max_f, min_f, current_f]) => Some(Temperatures {
            max_f: *max_f,
            min_f: *min_f,
            current_f: *current_f,
        }),
        _ => {
            warn!("unreadable temperatures {field:?}");
            None
        }
    }
}

/// Parse the product text for the summit row.
pub fn parse_product(text: &str) -> HydroReport {
    let mut report = HydroReport::default();
    let mut snow_idx: Option<usize> = None;
    let mut temp_idx: Option<usize> = None;

    for line in text.lines() {
        if report.issued.is_none() {
            if let Some(date) = find_date(line) {
                debug!("product issued {date}");
                report.issued = Some(date);
                continue;
            }
        }
        if line.starts_with("Station") && line.contains("Snow") {
            snow_idx = line.find("Snow");
            temp_idx = line.find("Temperature");
            continue;
        }
        if line.starts_with(SUMMIT_ROW) {
            if let Some(idx) = snow_idx {
                report.snow_depth_in = parse_depth(line, idx);
            }
            if let Some(idx) = temp_idx {
                report.temperatures = parse_temperatures(line, idx);
            }
        }
    }
    report
}

/// Extract and parse a product page.
pub fn parse_product_page(html: &str) -> anyhow::Result<HydroReport> {
    Ok(parse_product(&extract_product_text(html)?))
}

/// GET the latest product page.
#[cfg(feature = "api")]
pub async fn fetch_product(client: &Client) -> anyhow::Result<String> {
    http::send_for_text(client.get(PRODUCT_URL)).await
}
