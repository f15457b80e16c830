//! Concrete catalog sources: a directory of sheet exports or the sample
//! catalog compiled into the binary.

use std::{
    fs, io,
    path::PathBuf,
    sync::Arc,
};

use crate::{
    domain::Catalog,
    infra::catalog::{CatalogError, CatalogResult, CatalogSource},
    util::{assets, config},
};

/// Reads `<dir>/<table>.json` files.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CatalogSource for DirectorySource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn read_table(&self, table: &'static str) -> CatalogResult<Option<String>> {
        let path = self.dir.join(format!("{table}.json"));
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CatalogError::Io { path, source }),
        }
    }
}

/// The sample catalog shipped inside the binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedSource;

impl CatalogSource for EmbeddedSource {
    fn describe(&self) -> String {
        "embedded sample catalog".to_string()
    }

    fn read_table(&self, table: &'static str) -> CatalogResult<Option<String>> {
        Ok(assets::catalog_sheet(table))
    }
}

/// Picks the catalog location: `CLEANUVA_CATALOG_DIR`, then the user data
/// directory if it holds a catalog, then the embedded sample.
pub fn default_source() -> Box<dyn CatalogSource> {
    if let Some(dir) = config::catalog_dir_override() {
        return Box::new(DirectorySource::new(dir));
    }
    match config::user_catalog_dir() {
        Some(dir) if dir.is_dir() => Box::new(DirectorySource::new(dir)),
        _ => Box::new(EmbeddedSource),
    }
}

/// Loads a fresh snapshot; each call yields an independent catalog.
pub fn load_snapshot(source: &dyn CatalogSource) -> CatalogResult<Arc<Catalog>> {
    source.load().map(Arc::new).map_err(|err| {
        log::error!("[catalog] Failed to load from {}: {err}", source.describe());
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::catalog::{DEVICES, SETTINGS};

    #[test]
    fn embedded_catalog_loads() {
        let catalog = EmbeddedSource.load().unwrap();
        assert!(!catalog.devices.is_empty());
        assert!(!catalog.scenarios.is_empty());
        assert!(catalog.settings.eur_to_usd() > 0.0);
    }

    #[test]
    fn directory_source_reports_missing_files_as_absent() {
        let dir = std::env::temp_dir().join(format!("cleanuva-missing-{}", uuid::Uuid::new_v4()));
        let source = DirectorySource::new(&dir);
        assert!(source.read_table(DEVICES).unwrap().is_none());
        assert!(matches!(
            source.load(),
            Err(CatalogError::MissingTable { table: DEVICES, .. })
        ));
    }

    #[test]
    fn directory_source_reads_exported_sheets() {
        let dir = std::env::temp_dir().join(format!("cleanuva-sheets-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("settings.json"), r#"[{"Parameter": "EUR_to_USD", "Value": 1.1}]"#)
            .unwrap();

        let source = DirectorySource::new(&dir);
        let raw = source.read_table(SETTINGS).unwrap().unwrap();
        assert!(raw.contains("EUR_to_USD"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
