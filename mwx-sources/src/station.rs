use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

/// Embedded CSV list of the stations the jobs collect from.
pub static CSV_OBJECT: &str = include_str!("../../fixtures/stations.csv");

/// Mount Mansfield summit station, shared by the NWS and Synoptic feeds.
pub const SUMMIT_STATION: &str = "MMNV1";

/// State filter passed to the CoCoRaHS export.
pub const COCORAHS_STATE: &str = "VT";

/// Which feed a station reports through.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Nws,
    Cocorahs,
}

/// A reporting station.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Station {
    /// Feed-specific identifier (e.g., "MMNV1" or "VT-WS-41")
    pub station_id: String,
    pub network: Network,
    /// Two-letter state code
    pub state: String,
}

impl Station {
    /// Parse a CSV string of stations.
    ///
    /// Expected CSV columns: station_id, network, state
    pub fn parse_station_csv(csv_object: &str) -> anyhow::Result<Vec<Station>> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_object.as_bytes());
        let mut station_list = Vec::new();
        for row in rdr.deserialize() {
            let station: Station = row?;
            station_list.push(station);
        }
        Ok(station_list)
    }

    /// Every station in the embedded list.
    pub fn all() -> anyhow::Result<Vec<Station>> {
        Station::parse_station_csv(CSV_OBJECT)
    }

    /// Identifiers of the embedded CoCoRaHS stations.
    pub fn cocorahs_ids() -> anyhow::Result<Vec<String>> {
        Ok(Station::all()?
            .into_iter()
            .filter(|s| s.network == Network::Cocorahs)
            .map(|s| s.station_id)
            .collect())
    }
}
