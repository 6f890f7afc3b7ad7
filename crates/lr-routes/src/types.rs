use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A cached route for a delegated prefix.
///
/// The cache is keyed by (`address`, `prefix_len`); `address` is compared
/// as written by the DHCP server, without normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub address: String,
    pub prefix_len: u8,
    pub gateway: String,
}

impl RouteRecord {
    pub fn new(address: &str, prefix_len: u8, gateway: &str) -> Self {
        Self {
            address: address.to_string(),
            prefix_len,
            gateway: gateway.to_string(),
        }
    }

    pub fn matches(&self, address: &str, prefix_len: u8) -> bool {
        self.address == address && self.prefix_len == prefix_len
    }

    /// `address/prefix_len`
    pub fn prefix(&self) -> String {
        format!("{}/{}", self.address, self.prefix_len)
    }
}

/// What an upsert did to the route cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added,
    Updated,
    /// Same gateway already cached; nothing written.
    Unchanged,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed route file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the route file exists but cannot be decoded.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
