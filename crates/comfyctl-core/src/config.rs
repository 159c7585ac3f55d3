//! Global options and the environment-derived container layout.

use std::collections::HashMap;
use std::env;

use anyhow::{bail, Result};
use camino::Utf8PathBuf;
use comfyctl_domain::Layout;
use serde::{Deserialize, Serialize};

/// Flags the operations themselves act on. Output and logging flags stay in
/// the binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    /// Value of `key`, treating blank values as unset.
    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) layout: Layout,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    ///
    /// # Errors
    /// Returns an error if a directory override is not an absolute path.
    pub fn from_env() -> Result<Self> {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Result<Self> {
        let mut layout = Layout::default();
        if let Some(dir) = snapshot.var("COMFYCTL_APP_DIR") {
            layout.app_dir = absolute_dir("COMFYCTL_APP_DIR", dir)?;
        }
        if let Some(dir) = snapshot.var("COMFYCTL_DATA_DIR") {
            layout.data_dir = absolute_dir("COMFYCTL_DATA_DIR", dir)?;
        }
        if let Some(user) = snapshot.var("COMFYCTL_USER") {
            layout.user = user.trim().to_string();
        }
        if let Some(python) = snapshot.var("COMFYCTL_PYTHON") {
            layout.python = python.trim().to_string();
        }
        Ok(Self { layout })
    }

    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

fn absolute_dir(key: &str, raw: &str) -> Result<Utf8PathBuf> {
    let path = Utf8PathBuf::from(raw.trim());
    if !path.is_absolute() {
        bail!("{key} must be an absolute path (got {path})");
    }
    Ok(path)
}
