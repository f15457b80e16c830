use std::borrow::Cow;

use rust_embed::RustEmbed;

/// Embed the sample catalog sheets into the binary.
#[derive(RustEmbed)]
#[folder = "assets/catalog"]
struct EmbeddedCatalog;

/// Returns the JSON text of an embedded sheet, e.g. `devices` for
/// `assets/catalog/devices.json`.
pub fn catalog_sheet(table: &str) -> Option<String> {
    let file = EmbeddedCatalog::get(&sheet_path(table))?;
    match file.data {
        Cow::Borrowed(bytes) => std::str::from_utf8(bytes).ok().map(str::to_string),
        Cow::Owned(bytes) => String::from_utf8(bytes).ok(),
    }
}

/// Names of all embedded sheets, without the `.json` suffix.
pub fn catalog_sheets() -> Vec<String> {
    EmbeddedCatalog::iter()
        .filter_map(|path| path.strip_suffix(".json").map(str::to_string))
        .collect()
}

fn sheet_path(table: &str) -> String {
    let trimmed = table.trim_start_matches('/');
    if trimmed.ends_with(".json") {
        trimmed.to_string()
    } else {
        format!("{trimmed}.json")
    }
}
