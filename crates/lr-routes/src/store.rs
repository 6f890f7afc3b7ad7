//! JSON-backed route cache.
//!
//! The whole table is read on every call and rewritten on change. Writes go
//! through a temporary sibling file and a rename; upserts are serialized
//! across processes with an advisory lock on `<routes file>.lock`.

use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{RouteRecord, StoreError, StoreResult, UpsertOutcome};

pub struct RouteStore {
    path: PathBuf,
}

impl RouteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gateway cached for `address/prefix_len`, if any.
    pub fn lookup(&self, address: &str, prefix_len: u8) -> StoreResult<Option<String>> {
        let routes = self.load()?;
        Ok(routes
            .into_iter()
            .find(|r| r.matches(address, prefix_len))
            .map(|r| r.gateway))
    }

    /// Record `gateway` for `address/prefix_len`.
    ///
    /// A changed record is removed and re-appended, so it moves to the end
    /// of the table.
    pub fn upsert(
        &self,
        address: &str,
        prefix_len: u8,
        gateway: &str,
    ) -> StoreResult<UpsertOutcome> {
        self.ensure_parent()?;
        let _lock = self.lock()?;

        let mut routes = self.load()?;
        let outcome = match routes.iter().position(|r| r.matches(address, prefix_len)) {
            Some(idx) if routes[idx].gateway == gateway => return Ok(UpsertOutcome::Unchanged),
            Some(idx) => {
                routes.remove(idx);
                UpsertOutcome::Updated
            }
            None => UpsertOutcome::Added,
        };
        routes.push(RouteRecord::new(address, prefix_len, gateway));
        self.save(&routes)?;

        debug!(
            path = %self.path.display(),
            route = %format!("{address}/{prefix_len}"),
            gateway,
            ?outcome,
            "Route cache written"
        );
        Ok(outcome)
    }

    /// Load the full table. A missing file is an empty table.
    pub fn load(&self) -> StoreResult<Vec<RouteRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the full table, pretty-printed with 4-space indentation.
    pub fn save(&self, routes: &[RouteRecord]) -> StoreResult<()> {
        let mut content = Vec::with_capacity(routes.len() * 96);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut content, formatter);
        routes.serialize(&mut ser)?;

        let tmp_path = sibling(&self.path, ".tmp");
        fs::write(&tmp_path, &content).map_err(|e| StoreError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }

    fn ensure_parent(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        Ok(())
    }

    /// Exclusive lock held until the returned file is dropped.
    fn lock(&self) -> StoreResult<File> {
        let lock_path = sibling(&self.path, ".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StoreError::io(&lock_path, e))?;
        file.lock().map_err(|e| StoreError::io(&lock_path, e))?;
        Ok(file)
    }
}

/// `routes.json` + `.tmp` -> `routes.json.tmp`, in the same directory so the
/// rename stays on one filesystem.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
