//! Optional on-disk preferences: non-secret hints kept across restarts.
//!
//! Only the last unlocked address and the node location are stored. Phrases
//! and keys never reach this file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// File name inside the data directory.
pub const PREFS_FILE: &str = "wallet-state.json";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_port: Option<u16>,
}

/// Preferences cached in memory and mirrored to disk when a path is set.
pub struct PrefsStore {
    path: Option<PathBuf>,
    current: Mutex<Preferences>,
}

impl PrefsStore {
    /// Open the store under `data_dir`. A missing or unreadable file starts
    /// from empty preferences.
    pub fn open(data_dir: Option<&Path>) -> Self {
        let path = data_dir.map(|d| d.join(PREFS_FILE));
        let current = match path.as_deref().map(load) {
            Some(Ok(prefs)) => prefs,
            Some(Err(e)) => {
                debug!(error = %e, "no usable preferences file");
                Preferences::default()
            }
            None => Preferences::default(),
        };
        Self {
            path,
            current: Mutex::new(current),
        }
    }

    /// Store without a backing file.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::open(None)
    }

    #[cfg(test)]
    pub fn get(&self) -> Preferences {
        self.current.lock().clone()
    }

    pub fn last_address(&self) -> Option<String> {
        self.current.lock().address.clone()
    }

    /// Remember an unlocked address and the node it talks to. The file is
    /// written on the blocking pool; failures are logged and otherwise ignored.
    pub async fn remember(&self, address: &str, rpc_host: &str, rpc_port: u16) {
        let snapshot = {
            let mut current = self.current.lock();
            current.address = Some(address.to_string());
            current.rpc_host = Some(rpc_host.to_string());
            current.rpc_port = Some(rpc_port);
            current.clone()
        };
        let Some(path) = self.path.clone() else {
            return;
        };
        let written = tokio::task::spawn_blocking(move || save(&path, &snapshot)).await;
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "could not write preferences"),
            Err(e) => warn!(error = %e, "preferences writer task failed"),
        }
    }
}

fn load(path: &Path) -> Result<Preferences> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn save(path: &Path, prefs: &Preferences) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(prefs)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}
