//! UVM summit station snow depth plots (`gendateplot.php`, CSV mode).

use chrono::NaiveDate;
use csv::ReaderBuilder;
use mwx_utils::dates::day_label;
use std::collections::BTreeMap;

#[cfg(feature = "api")]
use crate::http;
#[cfg(feature = "api")]
use reqwest::Client;

pub const PLOT_URL: &str = "http://waw.w3.uvm.edu/empactdata/gendateplot.php";

/// URL of the CSV for the season starting in `start_year`.
pub fn season_url(start_year: i32) -> String {
    format!(
        "{PLOT_URL}?table=SummitStation&title=Mount+Mansfield+Summit+Station\
         &xskip=7&xparam=Date&yparam=Depth&year%5B%5D={start_year}&csv=1&totals=0"
    )
}

fn looks_like_date(field: &str) -> bool {
    let bytes = field.as_bytes();
    bytes.len() > 4 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-'
}

/// Parse the CSV (served inside `<pre>`) into `M/D -> depth` cells.
///
/// Only rows whose first field starts with a `YYYY-` date are data; the
/// season title row and blank lines are skipped.
pub fn parse_season(body: &str) -> anyhow::Result<BTreeMap<String, String>> {
    let content = body.replace("<pre>", "").replace("</pre>", "");
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut depths = BTreeMap::new();
    for row in rdr.records() {
        let record = row?;
        if record.len() < 2 {
            continue;
        }
        let (Some(date), Some(depth)) = (record.get(0), record.get(1)) else {
            continue;
        };
        if !looks_like_date(date) {
            continue;
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
        depths.insert(day_label(&date), depth.to_string());
    }
    Ok(depths)
}

/// GET the season CSV.
#[cfg(feature = "api")]
pub async fn fetch_season(client: &Client, start_year: i32) -> anyhow::Result<String> {
    http::send_for_text(client.get(season_url(start_year))).await
}
