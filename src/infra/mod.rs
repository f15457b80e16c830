//! Catalog loading from sheet exports.

pub mod catalog;
pub mod sources;

pub use catalog::{CatalogError, CatalogResult, CatalogSource};
pub use sources::{default_source, load_snapshot, DirectorySource, EmbeddedSource};
