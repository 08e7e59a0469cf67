//! Media catalog consumed by the dome gallery.
//!
//! The catalog is supplied once when a gallery is built and is read-only from
//! then on. On disk it is a small versioned JSON document.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const CATALOG_VERSION: &str = "1.0";

const BUILTIN_CULTURE_JSON: &str = include_str!("../data/culture.json");

/// One catalog entry: an image reference, a display label and free-text detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaItem {
    pub image: String,
    pub label: String,
    #[serde(default)]
    pub detail: String,
}

impl MediaItem {
    pub fn new(
        image: impl Into<String>,
        label: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            image: image.into(),
            label: label.into(),
            detail: detail.into(),
        }
    }

    /// The empty media reference placed in slots when the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.image.is_empty() && self.label.is_empty() && self.detail.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub items: Vec<MediaItem>,
}

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    UnsupportedVersion { found: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "catalog I/O error: {err}"),
            CatalogError::Parse(err) => write!(f, "catalog parse error: {err}"),
            CatalogError::UnsupportedVersion { found } => {
                write!(f, "unsupported catalog version: {found}")
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(err) => Some(err),
            CatalogError::Parse(err) => Some(err),
            CatalogError::UnsupportedVersion { .. } => None,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Catalog {
    pub fn new(items: Vec<MediaItem>) -> Self {
        Self {
            version: CATALOG_VERSION.to_string(),
            name: None,
            items,
        }
    }

    pub fn from_json_str(payload: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(payload).map_err(CatalogError::Parse)?;
        if catalog.version != CATALOG_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                found: catalog.version,
            });
        }
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let payload = fs::read_to_string(path.as_ref()).map_err(CatalogError::Io)?;
        Self::from_json_str(&payload)
    }

    /// The culture catalog shipped with the gallery.
    pub fn builtin() -> Self {
        // The embedded document is covered by `builtin_catalog_parses`.
        Self::from_json_str(BUILTIN_CULTURE_JSON).unwrap_or_default()
    }

    pub fn to_json_pretty(&self) -> Result<String, CatalogError> {
        serde_json::to_string_pretty(self).map_err(CatalogError::Parse)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// Content identity of the item list (order-sensitive), as blake3 hex.
    ///
    /// The name and version do not participate: two catalogs with the same items
    /// produce the same layout.
    pub fn content_hash(&self) -> String {
        content_hash(&self.items)
    }
}

/// Content identity of an item list, as blake3 hex.
pub fn content_hash(items: &[MediaItem]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(items.len() as u64).to_le_bytes());
    for item in items {
        for field in [&item.image, &item.label, &item.detail] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::{CATALOG_VERSION, Catalog, CatalogError, MediaItem};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(label: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("dome_catalog_{label}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn builtin_catalog_parses() {
        let catalog = Catalog::from_json_str(super::BUILTIN_CULTURE_JSON).expect("builtin json");
        assert_eq!(catalog.len(), 14);
        assert_eq!(catalog.items[1].label, "Chhau Dance");
        assert_eq!(Catalog::builtin(), catalog);
    }

    #[test]
    fn load_round_trips_through_disk() {
        let root = temp_dir("load");
        let mut catalog = Catalog::new(vec![
            MediaItem::new("a.jpg", "A", "first"),
            MediaItem::new("b.jpg", "B", ""),
        ]);
        catalog.name = Some("Demo".to_string());

        let path = root.join("catalog.json");
        fs::write(&path, catalog.to_json_pretty().expect("serialize")).expect("write");

        let loaded = Catalog::load(&path).expect("load");
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn missing_detail_defaults_to_empty() {
        let json = r#"{"version":"1.0","items":[{"image":"x.jpg","label":"X"}]}"#;
        let catalog = Catalog::from_json_str(json).expect("parse");
        assert_eq!(catalog.items, vec![MediaItem::new("x.jpg", "X", "")]);
    }

    #[test]
    fn rejects_unsupported_version() {
        let json = r#"{"version":"2.0","items":[]}"#;
        match Catalog::from_json_str(json) {
            Err(CatalogError::UnsupportedVersion { found }) => {
                assert_eq!(found, "2.0");
                assert_ne!(found, CATALOG_VERSION);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Catalog::from_json_str("{not json").expect_err("parse error");
        assert!(matches!(err, CatalogError::Parse(_)));
        assert!(err.to_string().starts_with("catalog parse error"));
    }

    #[test]
    fn content_hash_tracks_items_not_name() {
        let a = Catalog::new(vec![MediaItem::new("a.jpg", "A", "")]);
        let mut renamed = a.clone();
        renamed.name = Some("other".to_string());
        assert_eq!(a.content_hash(), renamed.content_hash());

        let b = Catalog::new(vec![MediaItem::new("a.jpg", "A", "x")]);
        assert_ne!(a.content_hash(), b.content_hash());

        // Field boundaries matter.
        let c = Catalog::new(vec![MediaItem::new("ab", "c", "")]);
        let d = Catalog::new(vec![MediaItem::new("a", "bc", "")]);
        assert_ne!(c.content_hash(), d.content_hash());
    }

    #[test]
    fn empty_media_item() {
        assert!(MediaItem::default().is_empty());
        assert!(!MediaItem::new("", "label", "").is_empty());
    }
}
