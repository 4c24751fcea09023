//! Object storage for the published artifacts.

use anyhow::Context;
use mwx_utils::compression::gunzip_to_string;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Seasonal snow depth grid, gzip CSV.
pub const SNOW_DEPTH_KEY: &str = "snowDepth.csv";
/// Recent observation snapshot, gzip JSON.
pub const SNAPSHOT_KEY: &str = "mansfield-observations.json";
/// Summit table log, plain CSV.
pub const SUMMIT_LOG_KEY: &str = "mansfield_observations.csv";

/// Headers an object is served with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutOptions {
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub public_read: bool,
}

impl PutOptions {
    /// Gzip-encoded, world readable.
    pub fn public_gzip(content_type: Option<&str>) -> Self {
        PutOptions {
            content_type: content_type.map(str::to_string),
            content_encoding: Some("gzip".to_string()),
            public_read: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub options: PutOptions,
}

impl StoredObject {
    /// Body as text, decompressed when the object is gzip-encoded.
    pub fn text(&self) -> anyhow::Result<String> {
        if self.options.content_encoding.as_deref() == Some("gzip") {
            gunzip_to_string(&self.body)
        } else {
            Ok(String::from_utf8(self.body.clone())?)
        }
    }
}

pub trait ObjectStore {
    /// `None` when no object exists under `key`.
    fn get_object(&self, key: &str) -> anyhow::Result<Option<StoredObject>>;

    fn put_object(&self, key: &str, body: &[u8], options: &PutOptions) -> anyhow::Result<()>;
}

/// A bucket laid out on the local filesystem.
///
/// The body of `key` lives at `<root>/<key>` and its headers at
/// `<root>/<key>.meta.json`.
#[derive(Debug, Clone)]
pub struct LocalBucket {
    root: PathBuf,
}

impl LocalBucket {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalBucket { root: root.into() }
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.meta.json"))
    }
}

impl ObjectStore for LocalBucket {
    fn get_object(&self, key: &str) -> anyhow::Result<Option<StoredObject>> {
        let path = self.body_path(key);
        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let meta_path = self.meta_path(key);
        let options = match fs::read_to_string(&meta_path) {
            Ok(meta) => serde_json::from_str(&meta)
                .with_context(|| format!("parsing {}", meta_path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => PutOptions::default(),
            Err(e) => return Err(e).with_context(|| format!("reading {}", meta_path.display())),
        };
        Ok(Some(StoredObject { body, options }))
    }

    fn put_object(&self, key: &str, body: &[u8], options: &PutOptions) -> anyhow::Result<()> {
        let path = self.body_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        let meta = serde_json::to_vec_pretty(options)?;
        fs::write(self.meta_path(key), meta)
            .with_context(|| format!("writing metadata for {key}"))?;
        log::info!("put {} ({} bytes)", path.display(), body.len());
        Ok(())
    }
}
