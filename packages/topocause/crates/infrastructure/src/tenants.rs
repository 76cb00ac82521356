use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::loader::Format;

pub const DEFAULT_NETWORK: &str = "default";
const NETWORKS_DIR: &str = "networks";

/// Directory layout `<root>/<tenant>/networks/<network>/`.
///
/// Each network directory holds a `topology.*` file and optionally the
/// current `alarms.*` feed snapshot.
#[derive(Debug, Clone)]
pub struct TenantRegistry {
    root: PathBuf,
}

impl TenantRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tenant names in lexical order; a missing root has no tenants.
    pub fn list_tenants(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            tracing::debug!(root = %self.root.display(), "tenant root does not exist");
            return Ok(Vec::new());
        }
        list_dirs(&self.root)
    }

    /// Networks of a tenant; tenants without a `networks/` directory get the
    /// single `default` network.
    pub fn list_networks(&self, tenant: &str) -> Result<Vec<String>> {
        let dir = self.root.join(tenant).join(NETWORKS_DIR);
        if !dir.is_dir() {
            return Ok(vec![DEFAULT_NETWORK.to_string()]);
        }
        let networks = list_dirs(&dir)?;
        if networks.is_empty() {
            return Ok(vec![DEFAULT_NETWORK.to_string()]);
        }
        Ok(networks)
    }

    pub fn network_dir(&self, tenant: &str, network: &str) -> PathBuf {
        self.root.join(tenant).join(NETWORKS_DIR).join(network)
    }

    pub fn topology_path(&self, tenant: &str, network: &str) -> Option<PathBuf> {
        find_document(&self.network_dir(tenant, network), "topology")
    }

    pub fn alarms_path(&self, tenant: &str, network: &str) -> Option<PathBuf> {
        find_document(&self.network_dir(tenant, network), "alarms")
    }
}

fn list_dirs(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// First existing `<stem>.<ext>` in extension preference order.
fn find_document(dir: &Path, stem: &str) -> Option<PathBuf> {
    Format::EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}
