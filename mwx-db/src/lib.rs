//! SQLite-backed keyed time-series store.
//!
//! Records are keyed by station plus a time key (an observation timestamp
//! or a report date). Writes are upserts: a later write with the same key
//! replaces the earlier record in full, so there is exactly one record per
//! key and the last write wins.
//!
//! # Usage
//!
//! ```rust
//! use mwx_db::{models::SortOrder, Database};
//! use mwx_sources::observation::Observation;
//!
//! let db = Database::new().unwrap();
//! db.put_observation(&Observation::new("MMNV1", "2025-01-13T12:00:00Z")).unwrap();
//! let recent = db
//!     .observations_since("MMNV1", "2025-01-13T00:00:00Z", SortOrder::Descending)
//!     .unwrap();
//! assert_eq!(recent.len(), 1);
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the full SQL schema.

pub mod models;
mod queries;
pub mod schema;
mod store;

use anyhow::Context;
use rusqlite::Connection;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Handle to the store. Cheaply cloneable; clones share one connection.
#[derive(Clone)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
}

impl Database {
    /// Create a new in-memory database with the full schema applied.
    pub fn new() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    /// Open (or create) a database file and apply the schema.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("opening store {}", path.display()))?;
        log::info!("store: opened {}", path.display());
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
        })
    }
}
