use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::domain::GridError;

/// One entry of the dataset catalog. The shape mirrors the upstream
/// `tables.json` feed; `url` is resolved by the loader (local paths here,
/// a fetching front end would hand the engine the same list read-only).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetEntry {
    pub name: String,
    pub url: String,
    pub row_count: u64,
}

/// Load the catalog from a JSON file: a list of `{name, url, row_count}`.
pub fn load_catalog(path: &Path) -> Result<Vec<DatasetEntry>, GridError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| GridError::CatalogLoad(format!("{}: {e}", path.display())))?;
    let entries: Vec<DatasetEntry> = serde_json::from_str(&raw)?;
    info!("Loaded catalog with {} datasets", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_a_catalog_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"name": "trips", "url": "data/trips.csv", "row_count": 49999}},
                {{"name": "zones", "url": "data/zones.csv", "row_count": 265}}
            ]"#
        )
        .unwrap();

        let entries = load_catalog(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "trips");
        assert_eq!(entries[0].row_count, 49999);
        assert_eq!(entries[1].url, "data/zones.csv");
    }

    #[test]
    fn missing_file_is_a_catalog_load_failure() {
        let err = load_catalog(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, GridError::CatalogLoad(_)));
    }

    #[test]
    fn malformed_json_is_a_catalog_load_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_catalog(file.path()).unwrap_err();
        assert!(matches!(err, GridError::CatalogLoad(_)));
    }
}
