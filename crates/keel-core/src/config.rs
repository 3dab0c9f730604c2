//! Kernel configuration and environment helpers.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{KernelError, Result};
use crate::kernel::Kernel;
use crate::value::{Map, Value};

/// Settings applied while the kernel bootstraps.
///
/// Every field is optional in the JSON form:
///
/// ```json
/// { "env": "dev", "debug": true, "cache": "folder=/tmp/keel", "context": { "app.name": "keel" } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub env: String,
    pub debug: bool,
    /// Defaults to the current directory.
    pub project: Option<PathBuf>,
    /// Defaults to `<project>/var`.
    pub tmp: Option<PathBuf>,
    /// Cache DSN, written to `CACHE` after the context entries.
    pub cache: Option<Value>,
    /// Initial context entries; keys may be dotted paths.
    pub context: Map,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            env: "prod".to_string(),
            debug: false,
            project: None,
            tmp: None,
            cache: None,
            context: Map::new(),
        }
    }
}

impl KernelConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| KernelError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub(crate) fn project_dir(&self) -> PathBuf {
        match &self.project {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    pub(crate) fn tmp_dir(&self, project: &Path) -> PathBuf {
        match &self.tmp {
            Some(dir) => dir.clone(),
            None => project.join("var"),
        }
    }
}

impl Kernel {
    /// Current environment name, `ENV` in the context.
    pub fn env(&self) -> String {
        self.get("ENV").as_str().unwrap_or_default().to_string()
    }

    pub fn is_env(&self, name: &str) -> bool {
        self.env().eq_ignore_ascii_case(name)
    }

    pub fn is_production(&self) -> bool {
        self.is_env("prod")
    }

    pub fn is_dev(&self) -> bool {
        self.is_env("dev")
    }

    pub fn is_test(&self) -> bool {
        self.is_env("test")
    }

    pub fn is_debug(&self) -> bool {
        self.get("DEBUG").is_truthy()
    }
}
