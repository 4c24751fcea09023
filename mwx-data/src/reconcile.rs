//! Temperature reconciliation of the Synoptic series against NWS.
//!
//! The NWS feed is treated as ground truth. Primary values at an NWS
//! timestamp take the NWS value; others must fall inside the NWS range
//! widened by a tolerance, or they are replaced by linear interpolation over
//! the NWS series. All values are in °F.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use mwx_sources::observation::Observation;
use mwx_utils::dates::parse_timestamp;
use std::collections::HashMap;

use crate::units::{
    celsius_to_fahrenheit, decimal_from_f64, fahrenheit_to_celsius, round_to, to_f64,
};

/// Allowed distance outside the reference range, °F.
pub const TOLERANCE_F: f64 = 10.0;

/// Static bounds used when no reference is available, °F.
pub const ABSOLUTE_MIN_F: f64 = -50.0;
pub const ABSOLUTE_MAX_F: f64 = 100.0;

/// One point of the series being corrected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

/// One point of the authoritative series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Sort by time and keep the first point of each instant.
pub fn prepare_reference(mut reference: Vec<ReferencePoint>) -> Vec<ReferencePoint> {
    reference.sort_by_key(|p| p.timestamp);
    reference.dedup_by_key(|p| p.timestamp);
    reference
}

/// Piecewise-linear value of a time-sorted reference at `at`.
///
/// Clamped to the first and last values outside the reference's time range.
pub fn interpolate(reference: &[ReferencePoint], at: DateTime<Utc>) -> Option<f64> {
    let first = reference.first()?;
    let last = reference.last()?;
    if at <= first.timestamp {
        return Some(first.value);
    }
    if at >= last.timestamp {
        return Some(last.value);
    }
    reference.windows(2).find_map(|pair| {
        let (p0, p1) = (pair[0], pair[1]);
        if p0.timestamp <= at && at <= p1.timestamp {
            let span = (p1.timestamp - p0.timestamp).num_milliseconds() as f64;
            if span <= 0.0 {
                return Some(p0.value);
            }
            let weight = (at - p0.timestamp).num_milliseconds() as f64 / span;
            Some(p0.value + weight * (p1.value - p0.value))
        } else {
            None
        }
    })
}

/// Correct `primary` against a reference series.
///
/// A reference with fewer than two points leaves the primary untouched.
pub fn reconcile(primary: &[Sample], reference: &[ReferencePoint], tolerance: f64) -> Vec<Sample> {
    if reference.len() < 2 {
        warn!(
            "{} reference points is too few to reconcile against",
            reference.len()
        );
        return primary.to_vec();
    }
    let reference = prepare_reference(reference.to_vec());
    let exact: HashMap<DateTime<Utc>, f64> =
        reference.iter().map(|p| (p.timestamp, p.value)).collect();
    let (ref_min, ref_max) = reference
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.value), hi.max(p.value))
        });
    let (low, high) = (ref_min - tolerance, ref_max + tolerance);

    primary
        .iter()
        .map(|sample| {
            if let Some(value) = exact.get(&sample.timestamp) {
                return Sample {
                    value: Some(*value),
                    ..*sample
                };
            }
            match sample.value {
                Some(v) if v < low || v > high => {
                    let corrected = interpolate(&reference, sample.timestamp);
                    debug!(
                        "corrected outlier at {}: {v:.1}°F -> {:?}",
                        sample.timestamp, corrected
                    );
                    Sample {
                        value: corrected,
                        ..*sample
                    }
                }
                _ => *sample,
            }
        })
        .collect()
}

/// Drop values outside `[min, max]`.
pub fn bounds_filter(primary: &[Sample], min: f64, max: f64) -> Vec<Sample> {
    primary
        .iter()
        .map(|sample| match sample.value {
            Some(v) if v < min || v > max => Sample {
                value: None,
                ..*sample
            },
            _ => *sample,
        })
        .collect()
}

/// Choose the correction policy from the outcome of loading the reference.
///
/// An unavailable or empty reference falls back to the absolute bounds.
pub fn correct(
    primary: &[Sample],
    reference: &anyhow::Result<Vec<ReferencePoint>>,
) -> Vec<Sample> {
    match reference {
        Ok(points) if !points.is_empty() => reconcile(primary, points, TOLERANCE_F),
        Ok(_) => {
            warn!("no reference data available, using the absolute range filter only");
            bounds_filter(primary, ABSOLUTE_MIN_F, ABSOLUTE_MAX_F)
        }
        Err(e) => {
            warn!("reference unavailable ({e:#}), using the absolute range filter only");
            bounds_filter(primary, ABSOLUTE_MIN_F, ABSOLUTE_MAX_F)
        }
    }
}

/// Apply [`correct`] to the `temp_c` field of stored observations.
///
/// Temperatures the correction leaves alone keep their exact stored value.
pub fn correct_observations(
    observations: &[Observation],
    reference: &anyhow::Result<Vec<ReferencePoint>>,
) -> Vec<Observation> {
    let indexed: Vec<(usize, Sample)> = observations
        .iter()
        .enumerate()
        .filter_map(|(i, o)| {
            let timestamp = parse_timestamp(&o.timestamp).ok()?;
            let value = o
                .temp_c
                .as_ref()
                .and_then(to_f64)
                .map(celsius_to_fahrenheit);
            Some((i, Sample { timestamp, value }))
        })
        .collect();
    let samples: Vec<Sample> = indexed.iter().map(|(_, s)| *s).collect();
    let corrected = correct(&samples, reference);

    let mut result = observations.to_vec();
    for ((i, before), after) in indexed.iter().zip(corrected) {
        if before.value == after.value {
            continue;
        }
        result[*i].temp_c = after
            .value
            .map(|f| round_to(fahrenheit_to_celsius(f), 2))
            .and_then(decimal_from_f64);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 13, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn sample(minutes: i64, value: Option<f64>) -> Sample {
        Sample {
            timestamp: t(minutes),
            value,
        }
    }

    fn point(minutes: i64, value: f64) -> ReferencePoint {
        ReferencePoint {
            timestamp: t(minutes),
            value,
        }
    }

    #[test]
    fn test_outlier_between_points_is_interpolated() {
        let reference = vec![point(0, 30.0), point(60, 40.0)];
        let primary = vec![sample(30, Some(90.0))];
        let result = reconcile(&primary, &reference, TOLERANCE_F);
        let value = result[0].value.unwrap();
        assert!((value - 35.0).abs() < 1e-9);
        assert!(value >= 30.0 && value <= 40.0);
    }

    #[test]
    fn test_exact_match_takes_reference() {
        let reference = vec![point(0, 30.0), point(60, 40.0)];
        let primary = vec![sample(0, Some(31.5)), sample(60, None)];
        let result = reconcile(&primary, &reference, TOLERANCE_F);
        assert_eq!(result[0].value, Some(30.0));
        assert_eq!(result[1].value, Some(40.0));
    }

    #[test]
    fn test_in_range_kept_absent_stays_absent() {
        let reference = vec![point(0, 30.0), point(60, 40.0)];
        let primary = vec![sample(10, Some(48.0)), sample(20, Some(21.0)), sample(40, None)];
        let result = reconcile(&primary, &reference, TOLERANCE_F);
        assert_eq!(result[0].value, Some(48.0));
        assert_eq!(result[1].value, Some(21.0));
        assert_eq!(result[2].value, None);
    }

    #[test]
    fn test_outside_reference_time_range_clamps() {
        let reference = vec![point(60, 30.0), point(0, 40.0)];
        let primary = vec![sample(-30, Some(-20.0)), sample(120, Some(99.0))];
        let result = reconcile(&primary, &reference, TOLERANCE_F);
        assert_eq!(result[0].value, Some(40.0));
        assert_eq!(result[1].value, Some(30.0));
    }

    #[test]
    fn test_short_reference_passes_through() {
        let primary = vec![sample(30, Some(90.0))];
        let result = reconcile(&primary, &[point(0, 30.0)], TOLERANCE_F);
        assert_eq!(result, primary);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let reference = vec![point(0, 28.0), point(20, 35.0), point(60, 31.0)];
        let primary = vec![
            sample(0, Some(10.0)),
            sample(10, Some(120.0)),
            sample(30, Some(-40.0)),
            sample(45, Some(33.0)),
            sample(50, None),
        ];
        let once = reconcile(&primary, &reference, TOLERANCE_F);
        let twice = reconcile(&once, &reference, TOLERANCE_F);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_bounds_filter() {
        let primary = vec![sample(0, Some(-60.0)), sample(5, Some(20.0)), sample(10, Some(101.0))];
        let result = bounds_filter(&primary, ABSOLUTE_MIN_F, ABSOLUTE_MAX_F);
        assert_eq!(result[0].value, None);
        assert_eq!(result[1].value, Some(20.0));
        assert_eq!(result[2].value, None);
    }

    #[test]
    fn test_correct_falls_back_on_error() {
        let primary = vec![sample(0, Some(150.0)), sample(5, Some(20.0))];
        let failed: anyhow::Result<Vec<ReferencePoint>> = Err(anyhow::anyhow!("timed out"));
        let result = correct(&primary, &failed);
        assert_eq!(result[0].value, None);
        assert_eq!(result[1].value, Some(20.0));

        let empty: anyhow::Result<Vec<ReferencePoint>> = Ok(Vec::new());
        assert_eq!(correct(&primary, &empty)[0].value, None);
    }

    #[test]
    fn test_interpolate_empty() {
        assert_eq!(interpolate(&[], t(0)), None);
    }

    #[test]
    fn test_correct_observations() {
        let mut kept = Observation::new("MMNV1", "2025-01-13T12:10:00Z");
        kept.temp_c = Some(Decimal::from_str("-1.23").unwrap());
        let mut outlier = Observation::new("MMNV1", "2025-01-13T12:30:00Z");
        outlier.temp_c = Some(Decimal::from_str("32.2").unwrap());
        let reference: anyhow::Result<Vec<ReferencePoint>> =
            Ok(vec![point(0, 30.0), point(60, 40.0)]);

        let result = correct_observations(&[kept.clone(), outlier], &reference);
        assert_eq!(result[0], kept);
        // 35 °F
        assert_eq!(result[1].temp_c, Some(Decimal::from_str("1.67").unwrap()));
    }
}
