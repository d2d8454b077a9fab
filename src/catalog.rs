// src/catalog.rs
//
// HDRI catalog: logical image names mapped to their resolution variants.
//
// Each name lists relative file paths ordered smallest to biggest by on-disk
// size at scan time. Order is trusted on read and never re-validated.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{GafferError, Result};

/// File extensions picked up by `Catalog::scan`.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["hdr", "exr", "jpg", "jpeg", "png", "tif", "tiff"];

/// Which variant of an image to bind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantRequest {
    #[default]
    Smallest,
    Biggest,
    Exact(String),
}

impl FromStr for VariantRequest {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "smallest" => VariantRequest::Smallest,
            "biggest" => VariantRequest::Biggest,
            other => VariantRequest::Exact(other.to_string()),
        })
    }
}

impl fmt::Display for VariantRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantRequest::Smallest => f.write_str("smallest"),
            VariantRequest::Biggest => f.write_str("biggest"),
            VariantRequest::Exact(path) => f.write_str(path),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the variant list of an image.
    pub fn insert(&mut self, name: impl Into<String>, variants: Vec<String>) {
        self.entries.insert(name.into(), variants);
    }

    pub fn variants(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(|v| v.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve_variant(&self, name: &str, request: &VariantRequest) -> Result<String> {
        let not_found = || GafferError::VariantNotFound {
            name: name.to_string(),
            variant: request.to_string(),
        };

        let variants = self.variants(name).ok_or_else(not_found)?;
        let found = match request {
            VariantRequest::Smallest => variants.first(),
            VariantRequest::Biggest => variants.last(),
            VariantRequest::Exact(path) => variants.iter().find(|v| *v == path),
        };
        found.cloned().ok_or_else(not_found)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GafferError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog: Catalog = serde_json::from_str(&text)?;
        debug!("loaded {} catalog entries from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| GafferError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build a catalog from every image file under `root`.
    ///
    /// Files are grouped by `logical_name` and each group is ordered by file
    /// size ascending, then by path. Paths are relative to `root`.
    pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut groups = BTreeMap::new();
        collect_variants(root, None, &mut groups)?;
        let catalog = Catalog::from_groups(groups);
        info!("scanned {} images under {}", catalog.len(), root.display());
        Ok(catalog)
    }

    /// Build one catalog from several roots in a single grouping pass, so
    /// variants of the same name found under different roots are ranked
    /// together.
    ///
    /// With one root this is `scan`. With several, each path keeps its root
    /// as a prefix so it stays unambiguous.
    pub fn scan_roots(roots: &[PathBuf]) -> Result<Self> {
        if let [root] = roots {
            return Self::scan(root);
        }
        let mut groups = BTreeMap::new();
        for root in roots {
            let prefix = root.to_string_lossy().replace('\\', "/");
            collect_variants(root, Some(&prefix), &mut groups)?;
        }
        let catalog = Catalog::from_groups(groups);
        info!("scanned {} images under {} roots", catalog.len(), roots.len());
        Ok(catalog)
    }

    fn from_groups(groups: BTreeMap<String, Vec<(u64, String)>>) -> Self {
        let mut catalog = Catalog::new();
        for (name, mut variants) in groups {
            variants.sort();
            variants.dedup_by(|a, b| a.1 == b.1);
            catalog.insert(name, variants.into_iter().map(|(_, p)| p).collect());
        }
        catalog
    }

    /// Merge another catalog into this one.
    ///
    /// Variant lists of a name present in both are joined, existing entries
    /// first. Joined lists are not re-ranked; scan every root at once with
    /// `scan_roots` when size order matters.
    pub fn merge(&mut self, other: Catalog) {
        for (name, variants) in other.entries {
            let list = self.entries.entry(name).or_default();
            for v in variants {
                if !list.contains(&v) {
                    list.push(v);
                }
            }
        }
    }
}

/// Append `(size, path)` for every image under `root` to its logical-name
/// group.
fn collect_variants(
    root: &Path,
    prefix: Option<&str>,
    groups: &mut BTreeMap<String, Vec<(u64, String)>>,
) -> Result<()> {
    let mut files = Vec::new();
    collect_images(root, &mut files)?;

    for file in drop_background_companions(files) {
        let size = std::fs::metadata(&file)
            .map_err(|source| GafferError::Io {
                path: file.clone(),
                source,
            })?
            .len();
        let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let rel = relative_path(root, &file);
        let path = match prefix {
            Some(p) => format!("{}/{}", p.trim_end_matches('/'), rel),
            None => rel,
        };
        groups.entry(logical_name(stem)).or_default().push((size, path));
    }
    Ok(())
}

/// Resolve a variant path for `name`.
pub fn resolve_variant(catalog: &Catalog, name: &str, request: &VariantRequest) -> Result<String> {
    catalog.resolve_variant(name, request)
}

fn collect_images(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let io_err = |source| GafferError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_images(&path, out)?;
        } else if is_image(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_jpg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false)
}

/// Drop `<stem>.jpg` and `<stem>_dark.jpg` files that sit next to a
/// non-JPG image with the same stem. Those are background substitutes, not
/// variants.
fn drop_background_companions(files: Vec<PathBuf>) -> Vec<PathBuf> {
    let originals: HashSet<PathBuf> = files
        .iter()
        .filter(|f| !is_jpg(f))
        .map(|f| f.with_extension(""))
        .collect();

    files
        .into_iter()
        .filter(|f| {
            if !is_jpg(f) {
                return true;
            }
            let base = f.with_extension("");
            let undarkened = base
                .to_str()
                .and_then(|s| s.strip_suffix("_dark"))
                .map(PathBuf::from);
            let companion = originals.contains(&base)
                || undarkened.is_some_and(|u| originals.contains(&u));
            if companion {
                debug!("skipping background companion {}", f.display());
            }
            !companion
        })
        .collect()
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn relative_path(root: &Path, file: &Path) -> String {
    slash_path(file.strip_prefix(root).unwrap_or(file))
}

/// A path with `/` separators.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Logical image name of a file stem: lower-cased, resolution suffix removed.
///
/// `Field_4K` and `field-8k` both map to `field`.
pub fn logical_name(stem: &str) -> String {
    let lower = stem.to_ascii_lowercase();
    if let Some(pos) = lower.rfind(['_', '-']) {
        let suffix = &lower[pos + 1..];
        let digits = suffix.strip_suffix('k').unwrap_or("");
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) && pos > 0 {
            return lower[..pos].to_string();
        }
    }
    lower
}

/// Path of the JPG that substitutes an image in the background.
pub fn background_image_path(path: &str, darkened: bool) -> String {
    let p = Path::new(path);
    let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or(path);
    let file = if darkened {
        format!("{}_dark.jpg", stem)
    } else {
        format!("{}.jpg", stem)
    };
    match p.parent().and_then(|d| d.to_str()) {
        Some(dir) if !dir.is_empty() => format!("{}/{}", dir, file),
        _ => file,
    }
}

/// A catalog tied to the file it is persisted in.
#[derive(Debug)]
pub struct CatalogContext {
    path: PathBuf,
    catalog: Catalog,
}

impl CatalogContext {
    /// Load the catalog at `path`, or start empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let catalog = if path.exists() {
            Catalog::load(&path)?
        } else {
            Catalog::new()
        };
        Ok(Self { path, catalog })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the catalog with a fresh scan of `roots`.
    pub fn rescan(&mut self, roots: &[PathBuf]) -> Result<()> {
        self.catalog = Catalog::scan_roots(roots)?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.catalog.save(&self.path)
    }
}
