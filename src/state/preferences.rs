// src/state/preferences.rs
//
// User preferences.
//
// Preferences are persisted as JSON next to the host's own settings and
// are read once per session.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::VariantRequest;
use crate::error::{GafferError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Folders scanned for HDRI files.
    pub hdri_folders: Vec<PathBuf>,

    /// Where the scanned catalog is cached.
    pub catalog_path: PathBuf,

    /// Variant bound when an image is first selected.
    pub default_variant: VariantRequest,

    /// Bind the first image in the catalog when none is selected.
    pub auto_select_first: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            hdri_folders: Vec::new(),
            catalog_path: PathBuf::from("hdri_catalog.json"),
            default_variant: VariantRequest::Smallest,
            auto_select_first: true,
        }
    }
}

impl Preferences {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GafferError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Load preferences, falling back to defaults when the file is missing.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| GafferError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
