//! Locating the OpenClaw home directory and the files inside it.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Name of the main configuration document inside the home directory.
pub const CONFIG_FILE: &str = "openclaw.json";
/// Name of a per-agent model catalog.
pub const CATALOG_FILE: &str = "models.json";

/// The OpenClaw home directory (`~/.openclaw` or `OPENCLAW_HOME`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenClawHome {
    root: PathBuf,
}

impl OpenClawHome {
    /// Use `root` as-is.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the home directory: the explicit path if given, else
    /// `OPENCLAW_HOME`, else `~/.openclaw`. `~` is expanded and the result
    /// made absolute; the directory does not have to exist.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let raw = match explicit {
            Some(path) => path.to_path_buf(),
            None => match std::env::var_os("OPENCLAW_HOME") {
                Some(home) if !home.is_empty() => PathBuf::from(home),
                _ => PathBuf::from("~/.openclaw"),
            },
        };
        let root = resolve_path(&raw)?;
        debug!(home = %root.display(), "resolved OpenClaw home");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<home>/openclaw.json`.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// `<home>/workspace` for the main agent, `<home>/workspace-<id>` for
    /// everyone else.
    pub fn workspace_dir(&self, agent_id: &str, is_main: bool) -> PathBuf {
        if is_main {
            self.root.join("workspace")
        } else {
            self.root.join(format!("workspace-{agent_id}"))
        }
    }

    /// `<home>/agents/<id>/agent`.
    pub fn agent_dir(&self, agent_id: &str) -> PathBuf {
        self.root.join("agents").join(agent_id).join("agent")
    }

    /// `<home>/agents/<id>/agent/models.json`.
    pub fn agent_catalog(&self, agent_id: &str) -> PathBuf {
        self.agent_dir(agent_id).join(CATALOG_FILE)
    }

    /// Every existing `<home>/agents/*/agent/models.json`, sorted by path.
    pub fn agent_catalogs(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.root.join("agents")) else {
            return Vec::new();
        };
        let mut catalogs: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path().join("agent").join(CATALOG_FILE))
            .filter(|path| path.is_file())
            .collect();
        catalogs.sort();
        catalogs
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs_next::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Expand `~`, then canonicalize when the path exists or make it absolute
/// when it does not.
pub fn resolve_path(path: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path);
    match expanded.canonicalize() {
        Ok(resolved) => Ok(resolved),
        Err(_) => Ok(std::path::absolute(&expanded)?),
    }
}
