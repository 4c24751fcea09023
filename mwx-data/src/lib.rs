//! Data processing for summit observations.
//!
//! This crate turns parsed feed records into stored records, corrects the
//! Synoptic temperature series against NWS, and maintains the seasonal snow
//! depth grid.

pub mod normalize;
pub mod observation_log;
pub mod reconcile;
pub mod season_grid;

/// Unit conversions and fixed-point parsing.
pub mod units {
    use log::warn;
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    /// Text the CoCoRaHS export uses for "no number": blank, trace, not available.
    pub const ABSENT_MARKERS: [&str; 3] = ["", "T", "NA"];

    pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
        celsius * 9.0 / 5.0 + 32.0
    }

    pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
        (fahrenheit - 32.0) * 5.0 / 9.0
    }

    pub fn ms_to_kmh(ms: f64) -> f64 {
        ms * 3.6
    }

    pub fn kmh_to_mph(kmh: f64) -> f64 {
        kmh * 0.621371
    }

    pub fn mm_to_inches(mm: f64) -> f64 {
        mm * 0.0393701
    }

    /// Fixed-point value of a float, through its shortest decimal spelling.
    ///
    /// `-11.1_f64` becomes exactly `-11.1`, not the binary expansion.
    pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
        if !value.is_finite() {
            return None;
        }
        Decimal::from_str(&value.to_string()).ok()
    }

    /// Fixed-point value of a text field; absent markers yield `None`.
    pub fn decimal_from_text(field: &str) -> Option<Decimal> {
        let field = field.trim();
        if ABSENT_MARKERS.contains(&field) {
            return None;
        }
        match Decimal::from_str(field) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("dropping non-numeric value {field:?}");
                None
            }
        }
    }

    pub fn to_f64(value: &Decimal) -> Option<f64> {
        value.to_f64()
    }

    /// Round half away from zero to `places` decimals.
    pub fn round_to(value: f64, places: i32) -> f64 {
        let scale = 10f64.powi(places);
        (value * scale).round() / scale
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_conversions() {
            assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
            assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
            assert!((fahrenheit_to_celsius(50.0) - 10.0).abs() < 1e-9);
            assert!((ms_to_kmh(10.0) - 36.0).abs() < 1e-9);
            assert!((kmh_to_mph(100.0) - 62.1371).abs() < 1e-9);
            assert!((mm_to_inches(25.4) - 1.0).abs() < 1e-4);
        }

        #[test]
        fn test_decimal_from_f64() {
            assert_eq!(decimal_from_f64(-11.1), Some(Decimal::from_str("-11.1").unwrap()));
            assert_eq!(decimal_from_f64(0.0), Some(Decimal::ZERO));
            assert_eq!(decimal_from_f64(f64::NAN), None);
            assert_eq!(decimal_from_f64(f64::INFINITY), None);
        }

        #[test]
        fn test_decimal_from_text() {
            assert_eq!(decimal_from_text(" 14.0 "), Some(Decimal::from_str("14.0").unwrap()));
            assert_eq!(decimal_from_text("0"), Some(Decimal::ZERO));
            assert_eq!(decimal_from_text(""), None);
            assert_eq!(decimal_from_text("T"), None);
            assert_eq!(decimal_from_text("NA"), None);
            assert_eq!(decimal_from_text("garbage"), None);
        }

        #[test]
        fn test_round_to() {
            assert_eq!(round_to(12.345, 1), 12.3);
            assert_eq!(round_to(0.0393701, 2), 0.04);
            assert_eq!(round_to(-3.26, 1), -3.3);
        }
    }
}

/// Freezing-level summary over a recent window.
pub mod freezing {
    use mwx_sources::observation::Observation;
    use rust_decimal::Decimal;

    /// When the summit was last above 0 °C.
    ///
    /// `observations` must be newest first. If the newest reported
    /// temperature is above freezing the summit is taken to still be above
    /// freezing and the newest observation's timestamp is returned; otherwise
    /// the newest timestamp with a temperature above freezing. `None` when no
    /// observation reports a temperature, or none was ever above freezing.
    pub fn last_above_freezing(observations: &[Observation]) -> Option<String> {
        let newest = observations.first()?;
        let most_recent_temp = observations.iter().find_map(|o| o.temp_c)?;
        if most_recent_temp > Decimal::ZERO {
            return Some(newest.timestamp.clone());
        }
        observations
            .iter()
            .find(|o| o.temp_c.is_some_and(|t| t > Decimal::ZERO))
            .map(|o| o.timestamp.clone())
    }

}
