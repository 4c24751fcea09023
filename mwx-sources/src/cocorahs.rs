//! CoCoRaHS daily report CSV export.

use chrono::{Datelike, NaiveDate};
use csv::ReaderBuilder;
use serde::Deserialize;

#[cfg(feature = "api")]
use crate::http;
#[cfg(feature = "api")]
use reqwest::Client;

pub const EXPORT_URL: &str = "http://data.cocorahs.org/export/exportreports.aspx";

/// One row of the daily export, as text. Columns the jobs don't read are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "StationNumber", default)]
    pub station_number: String,
    #[serde(rename = "StationName", default)]
    pub station_name: String,
    #[serde(rename = "ObservationDate", default)]
    pub observation_date: String,
    #[serde(rename = "TotalPrecipAmt", default)]
    pub total_precip_amt: String,
    #[serde(rename = "TotalSnowfall", default)]
    pub total_snowfall: String,
    #[serde(rename = "TotalSnowDepth", default)]
    pub total_snow_depth: String,
}

/// Parse the export body into rows.
pub fn parse_export(body: &str) -> anyhow::Result<Vec<ExportRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        let row: ExportRow = row?;
        rows.push(row);
    }
    Ok(rows)
}

/// Export query dates are written "M/D/YYYY" without padding.
pub fn query_date(date: &NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// GET daily reports for a state between two report dates, inclusive.
#[cfg(feature = "api")]
pub async fn fetch_export(
    client: &Client,
    state: &str,
    start: &NaiveDate,
    end: &NaiveDate,
) -> anyhow::Result<String> {
    let request = client.get(EXPORT_URL).query(&[
        ("ReportType", "Daily".to_string()),
        ("dtf", "1".to_string()),
        ("Format", "CSV".to_string()),
        ("State", state.to_string()),
        ("ReportDateType", "reportdate".to_string()),
        ("StartDate", query_date(start)),
        ("EndDate", query_date(end)),
        ("TimesInGMT", "False".to_string()),
    ]);
    http::send_for_text(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "\
ObservationDate,ObservationTime,EntryDateTime,StationNumber,StationName,Latitude,Longitude,TotalPrecipAmt,NewSnowDepth,NewSnowSWE,TotalSnowDepth,TotalSnowSWE,DateTimeStamp,TotalSnowfall
2025-01-12,7:00 AM,2025-01-12 07:41 AM,VT-WS-41,Stowe 2.2 NNW,44.49,-72.71,0.12,1.5,0.10,14.0,NA,2025-01-12 07:41 AM,1.5
2025-01-12,7:00 AM,2025-01-12 08:02 AM,VT-CH-57 ,Underhill,44.53,-72.86,T,T,NA,,NA,2025-01-12 08:02 AM,T
";

    #[test]
    fn test_parse_export() {
        let rows = parse_export(BODY).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].station_number, "VT-WS-41");
        assert_eq!(rows[0].observation_date, "2025-01-12");
        assert_eq!(rows[0].total_snow_depth, "14.0");
        assert_eq!(rows[0].total_snowfall, "1.5");
        assert_eq!(rows[1].station_number, "VT-CH-57");
        assert_eq!(rows[1].total_precip_amt, "T");
        assert_eq!(rows[1].total_snow_depth, "");
    }

    #[test]
    fn test_parse_export_missing_columns() {
        let rows = parse_export("StationNumber,ObservationDate\nVT-LM-1,2025-01-12\n").unwrap();
        assert_eq!(rows[0].station_number, "VT-LM-1");
        assert_eq!(rows[0].station_name, "");
        assert_eq!(rows[0].total_snow_depth, "");
    }

    #[test]
    fn test_query_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(query_date(&date), "1/5/2025");
    }
}
