//! The seasonal snow depth grid (`snowDepth.csv`).
//!
//! Header row `year,9/1,...,8/31`, then one row per season labelled
//! `YYYY-YYYY`, optionally followed by an `Average` row. The header is the
//! authority on columns: it is never regenerated, and every other row is
//! kept exactly as wide as it.

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use log::{debug, info, warn};
use mwx_utils::dates::{day_label, parse_season_label, season_day_labels, season_label};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use std::str::FromStr;

/// First header cell, and the column holding season labels.
pub const LABEL_COLUMN: &str = "year";

/// Label of the per-day mean row.
pub const AVERAGE_LABEL: &str = "Average";

/// What an update did to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridUpdate {
    /// Nothing differed; the grid was not touched.
    Unchanged,
    /// An existing season row changed.
    Updated,
    /// The season row did not exist and was created.
    SeasonCreated,
}

impl GridUpdate {
    pub fn changed(&self) -> bool {
        *self != GridUpdate::Unchanged
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonGrid {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Numbers compare numerically ("30" == "30.0"); anything else as text.
fn cells_equal(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    match (Decimal::from_str(a), Decimal::from_str(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}

fn rows_equal(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| cells_equal(x, y))
}

impl SeasonGrid {
    /// A grid with the full 366-day header and no rows.
    pub fn empty() -> Self {
        let mut header = vec![LABEL_COLUMN.to_string()];
        header.extend(season_day_labels());
        SeasonGrid {
            header,
            rows: Vec::new(),
        }
    }

    /// Parse a grid. Blank lines are skipped and short rows are padded to the
    /// header width; rows wider than the header are rejected.
    pub fn from_csv(text: &str) -> anyhow::Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let mut records = Vec::new();
        for record in rdr.records() {
            let record = record.context("reading grid csv")?;
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            records.push(cells);
        }
        let mut records = records.into_iter();
        let header = records.next().ok_or_else(|| anyhow!("grid has no header row"))?;
        if header.len() < 2 {
            bail!("grid header has no day columns");
        }
        let width = header.len();
        let mut rows = Vec::new();
        for mut row in records {
            if row.len() > width {
                bail!(
                    "row {:?} has {} cells, header has {width}",
                    row.first(),
                    row.len()
                );
            }
            row.resize(width, String::new());
            rows.push(row);
        }
        Ok(SeasonGrid { header, rows })
    }

    /// Write every field that isn't a number quoted.
    pub fn to_csv(&self) -> anyhow::Result<String> {
        let mut wtr = WriterBuilder::new()
            .quote_style(QuoteStyle::NonNumeric)
            .from_writer(Vec::new());
        wtr.write_record(&self.header)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        let bytes = wtr.into_inner().map_err(|e| anyhow!("flushing grid csv: {e}"))?;
        Ok(String::from_utf8(bytes)?)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Labels of the season rows, in grid order.
    pub fn seasons(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|r| r.first().map(String::as_str))
            .filter(|l| *l != AVERAGE_LABEL)
            .collect()
    }

    pub fn season_row(&self, label: &str) -> Option<&[String]> {
        self.row_index(label).map(|i| self.rows[i].as_slice())
    }

    /// Cell for a season and day label.
    pub fn cell(&self, label: &str, day: &str) -> Option<&str> {
        let column = self.column_index(day).ok()?;
        self.season_row(label).map(|r| r[column].as_str())
    }

    fn row_index(&self, label: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.first().map(String::as_str) == Some(label))
    }

    fn has_average(&self) -> bool {
        self.row_index(AVERAGE_LABEL).is_some()
    }

    /// Header position of a day label.
    pub fn column_index(&self, day: &str) -> anyhow::Result<usize> {
        self.header
            .iter()
            .skip(1)
            .position(|h| h == day)
            .map(|i| i + 1)
            .ok_or_else(|| anyhow!("grid header has no column {day}"))
    }

    fn blank_row(&self, label: &str) -> Vec<String> {
        let mut row = vec![String::new(); self.header.len()];
        row[0] = label.to_string();
        row
    }

    /// Insert a season row before the first later season or the average row.
    fn insert_season(&mut self, row: Vec<String>) -> usize {
        let start = parse_season_label(&row[0]);
        let at = self
            .rows
            .iter()
            .position(|r| {
                let label = r[0].as_str();
                label == AVERAGE_LABEL
                    || match (start, parse_season_label(label)) {
                        (Some(new), Some(existing)) => existing > new,
                        _ => false,
                    }
            })
            .unwrap_or(self.rows.len());
        info!("creating season row {}", row[0]);
        self.rows.insert(at, row);
        at
    }

    fn after_change(&mut self, update: GridUpdate) -> GridUpdate {
        if update.changed() && self.has_average() {
            self.recompute_average();
        }
        update
    }

    /// Set the cell for `date` in its season row.
    ///
    /// Fails when the header has no column for the day. A missing season row
    /// is created header-aligned in season order.
    pub fn upsert(&mut self, date: &NaiveDate, value: &str) -> anyhow::Result<GridUpdate> {
        let day = day_label(date);
        let label = season_label(date);
        let column = self.column_index(&day)?;
        debug!("grid cell {label} {day}");

        let update = match self.row_index(&label) {
            Some(i) => {
                if cells_equal(&self.rows[i][column], value) {
                    info!("{label} {day} already {value}");
                    GridUpdate::Unchanged
                } else {
                    info!("{label} {day}: {:?} -> {value}", self.rows[i][column]);
                    self.rows[i][column] = value.to_string();
                    GridUpdate::Updated
                }
            }
            None => {
                let mut row = self.blank_row(&label);
                row[column] = value.to_string();
                self.insert_season(row);
                GridUpdate::SeasonCreated
            }
        };
        Ok(self.after_change(update))
    }

    /// Overwrite a whole season row from `day label -> value`.
    ///
    /// Days missing from `values` become empty; keys that are not header
    /// columns are ignored.
    pub fn replace_season(&mut self, label: &str, values: &BTreeMap<String, String>) -> GridUpdate {
        let mut row = self.blank_row(label);
        for (j, day) in self.header.iter().enumerate().skip(1) {
            if let Some(value) = values.get(day) {
                row[j] = value.clone();
            }
        }
        let unknown = values
            .keys()
            .filter(|k| !self.header[1..].contains(k))
            .count();
        if unknown > 0 {
            warn!("{unknown} values for days not in the grid header");
        }

        let update = match self.row_index(label) {
            Some(i) if rows_equal(&self.rows[i], &row) => GridUpdate::Unchanged,
            Some(i) => {
                self.rows[i] = row;
                GridUpdate::Updated
            }
            None => {
                self.insert_season(row);
                GridUpdate::SeasonCreated
            }
        };
        self.after_change(update)
    }

    /// Rebuild the `Average` row as the last row.
    ///
    /// Each day is the mean of the numeric cells of every season row, one
    /// decimal place, empty when no season has a value.
    pub fn recompute_average(&mut self) {
        self.rows.retain(|r| r[0] != AVERAGE_LABEL);
        let mut average = self.blank_row(AVERAGE_LABEL);
        for (j, cell) in average.iter_mut().enumerate().skip(1) {
            let values: Vec<Decimal> = self
                .rows
                .iter()
                .filter_map(|r| Decimal::from_str(r[j].trim()).ok())
                .collect();
            if values.is_empty() {
                continue;
            }
            let sum: Decimal = values.iter().sum();
            let mean = sum / Decimal::from(values.len());
            *cell = mean
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
                .normalize()
                .to_string();
        }
        self.rows.push(average);
    }
}
