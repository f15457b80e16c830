//! Typed loading of the catalog sheets.
//!
//! - Each sheet arrives as a JSON array of row objects keyed by the
//!   spreadsheet column names.
//! - Rows are validated into domain entities and indexed into a [`Catalog`].

use std::{collections::BTreeMap, io, path::PathBuf};

use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use time::{macros::format_description, Date};

use crate::domain::{
    catalog::{shipping_key, Catalog, Settings, Table},
    entities::{BasePlatform, ComparisonRow, DeviceSpec, OptionSku, Scenario, ShippingRule},
};

pub const DEVICES: &str = "devices";
pub const SCENARIOS: &str = "scenarios";
pub const BASE_MODELS: &str = "base_models";
pub const SKU_LIBRARY: &str = "sku_library";
pub const SHIPPING_RULES: &str = "shipping_rules";
pub const SETTINGS: &str = "settings";
pub const OUR_PRODUCTS: &str = "our_products";
pub const COMPETITORS: &str = "competitors";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("table {table} is missing from {origin}")]
    MissingTable { table: &'static str, origin: String },
    #[error("failed to parse table {table}: {source}")]
    Parse {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate key {key:?} in table {table}")]
    DuplicateKey { table: &'static str, key: String },
    #[error("invalid row in table {table}: {message}")]
    InvalidRow { table: &'static str, message: String },
    #[error("settings table has no {0} entry")]
    MissingSetting(&'static str),
    #[error("setting {0} must be a positive number")]
    InvalidSetting(&'static str),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// A place catalog sheets can be read from.
///
/// Implementors only hand out raw sheet text; parsing and validation are
/// shared by [`CatalogSource::load`].
pub trait CatalogSource {
    /// Human-readable origin for log lines and errors.
    fn describe(&self) -> String;

    /// Raw JSON for `table`, or `None` when the source does not carry it.
    fn read_table(&self, table: &'static str) -> CatalogResult<Option<String>>;

    fn load(&self) -> CatalogResult<Catalog> {
        let catalog = build_catalog(self)?;
        log::info!(
            "[catalog] Loaded {} devices, {} project cases, {} platforms, {} options, {} shipping rules from {}",
            catalog.devices.len(),
            catalog.scenarios.len(),
            catalog.base_models.len(),
            catalog.options.len(),
            catalog.shipping.len(),
            self.describe()
        );
        Ok(catalog)
    }
}

#[derive(Debug, Deserialize)]
struct DeviceDto {
    #[serde(rename = "Device")]
    device: String,
    #[serde(rename = "Unit price")]
    unit_price: f64,
    #[serde(rename = "Capacity")]
    capacity: f64,
    #[serde(rename = "Consumable", default)]
    consumable: Option<f64>,
    #[serde(rename = "Warranty", default)]
    warranty: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ScenarioDto {
    #[serde(rename = "Client/Project")]
    client: String,
    #[serde(rename = "Scenario", default)]
    scenario: Option<String>,
    #[serde(rename = "Region", default)]
    region: Option<String>,
    #[serde(rename = "Date", default)]
    date: Option<String>,
    #[serde(rename = "Plant")]
    plant: f64,
    #[serde(rename = "Window")]
    window: f64,
    #[serde(rename = "Shifts")]
    shifts: f64,
    #[serde(rename = "Soiling")]
    soiling: f64,
    #[serde(rename = "Manual")]
    manual: f64,
    #[serde(rename = "Freq")]
    freq: f64,
    #[serde(rename = "ElecPrice")]
    elec_price: f64,
    #[serde(rename = "CapFactor", default)]
    cap_factor: Option<f64>,
    #[serde(rename = "Redundancy", default)]
    redundancy: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BaseModelDto {
    #[serde(rename = "Model_Name")]
    model_name: String,
    #[serde(rename = "Model_ID")]
    model_id: String,
    #[serde(rename = "Price_EUR")]
    price_eur: f64,
    #[serde(rename = "Standard_Includes", default)]
    standard_includes: Option<String>,
    #[serde(rename = "Warranty_Base", default)]
    warranty_base: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SkuDto {
    #[serde(rename = "SKU_ID")]
    sku_id: String,
    #[serde(rename = "Item_Name")]
    item_name: String,
    #[serde(rename = "Price_EUR")]
    price_eur: f64,
    #[serde(rename = "Applicable_To")]
    applicable_to: String,
}

#[derive(Debug, Deserialize)]
struct ShippingDto {
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "Delivery_Method")]
    delivery_method: String,
    #[serde(rename = "Cost_EUR")]
    cost_eur: f64,
}

#[derive(Debug, Deserialize)]
struct SettingDto {
    #[serde(rename = "Parameter")]
    parameter: String,
    #[serde(rename = "Value")]
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ComparisonDto {
    #[serde(rename = "Model")]
    model: String,
    #[serde(rename = "Primary Category")]
    primary_category: String,
    #[serde(rename = "Secondary Parameter")]
    secondary_parameter: String,
    #[serde(rename = "Value", default)]
    value: serde_json::Value,
}

impl From<DeviceDto> for DeviceSpec {
    fn from(value: DeviceDto) -> Self {
        Self {
            name: value.device,
            unit_price: value.unit_price,
            capacity_mw: value.capacity,
            consumable_cost: value.consumable,
            warranty_cost: value.warranty,
        }
    }
}

impl From<BaseModelDto> for BasePlatform {
    fn from(value: BaseModelDto) -> Self {
        Self {
            model_name: value.model_name,
            model_id: value.model_id,
            price_eur: value.price_eur,
            standard_includes: split_inclusions(value.standard_includes.as_deref().unwrap_or("")),
            warranty_base: value.warranty_base.unwrap_or_default(),
        }
    }
}

impl From<SkuDto> for OptionSku {
    fn from(value: SkuDto) -> Self {
        Self {
            sku_id: value.sku_id,
            item_name: value.item_name,
            price_eur: value.price_eur,
            applicable_to: value.applicable_to,
        }
    }
}

impl From<ShippingDto> for ShippingRule {
    fn from(value: ShippingDto) -> Self {
        Self {
            region: value.region,
            delivery_method: value.delivery_method,
            cost_eur: value.cost_eur,
        }
    }
}

impl TryFrom<ScenarioDto> for Scenario {
    type Error = String;

    fn try_from(value: ScenarioDto) -> Result<Self, Self::Error> {
        let analysis_date = value
            .date
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(parse_sheet_date)
            .transpose()?;

        Ok(Self {
            window_days: whole_number("Window", value.window)?,
            shifts_per_day: whole_number("Shifts", value.shifts)?,
            client: value.client,
            mode: value.scenario.unwrap_or_default(),
            region: value.region.unwrap_or_default(),
            analysis_date,
            plant_mw: value.plant,
            soiling_recovery_pct: value.soiling,
            manual_rate: value.manual,
            cleaning_frequency: value.freq,
            electricity_price: value.elec_price,
            capacity_factor_pct: value.cap_factor,
            redundancy: value.redundancy,
        })
    }
}

/// Splits the comma-separated `Standard_Includes` cell.
pub fn split_inclusions(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts `2025-03-01` as well as timestamp cells like `2025-03-01 00:00:00`.
fn parse_sheet_date(text: &str) -> Result<Date, String> {
    let day = text.get(..10).unwrap_or(text);
    Date::parse(day, format_description!("[year]-[month]-[day]"))
        .map_err(|err| format!("invalid date {text:?}: {err}"))
}

/// Sheet cells hold counts as floats; truncate like `int()` does.
fn whole_number(column: &str, value: f64) -> Result<u32, String> {
    if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
        return Err(format!("{column} must be a non-negative count, got {value}"));
    }
    Ok(value.trunc() as u32)
}

fn cell_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn parse_rows<T: DeserializeOwned>(table: &'static str, raw: &str) -> CatalogResult<Vec<T>> {
    serde_json::from_str(raw).map_err(|source| CatalogError::Parse { table, source })
}

fn required_rows<S, T>(source: &S, table: &'static str) -> CatalogResult<Vec<T>>
where
    S: CatalogSource + ?Sized,
    T: DeserializeOwned,
{
    let raw = source
        .read_table(table)?
        .ok_or_else(|| CatalogError::MissingTable {
            table,
            origin: source.describe(),
        })?;
    parse_rows(table, &raw)
}

fn keyed<T>(
    table: &'static str,
    rows: Vec<T>,
    key: impl Fn(&T) -> String,
) -> CatalogResult<Table<T>> {
    Table::from_rows(rows, key).map_err(|key| CatalogError::DuplicateKey { table, key })
}

/// Empty cells are dropped so they show up as missing in the comparison grid.
fn comparison_rows(rows: Vec<ComparisonDto>) -> Vec<ComparisonRow> {
    rows.into_iter()
        .filter_map(|row| {
            Some(ComparisonRow {
                value: cell_text(&row.value)?,
                model: row.model,
                primary_category: row.primary_category,
                secondary_parameter: row.secondary_parameter,
            })
        })
        .collect()
}

fn build_catalog<S: CatalogSource + ?Sized>(source: &S) -> CatalogResult<Catalog> {
    let devices: Vec<DeviceDto> = required_rows(source, DEVICES)?;
    let devices = keyed(
        DEVICES,
        devices.into_iter().map(DeviceSpec::from).collect(),
        |device| device.name.clone(),
    )?;

    let scenarios: Vec<ScenarioDto> = required_rows(source, SCENARIOS)?;
    let scenarios = scenarios
        .into_iter()
        .map(Scenario::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|message| CatalogError::InvalidRow {
            table: SCENARIOS,
            message,
        })?;
    let scenarios = keyed(SCENARIOS, scenarios, |scenario| scenario.client.clone())?;

    let base_models: Vec<BaseModelDto> = required_rows(source, BASE_MODELS)?;
    let base_models = keyed(
        BASE_MODELS,
        base_models.into_iter().map(BasePlatform::from).collect(),
        |platform| platform.model_name.clone(),
    )?;

    let options: Vec<SkuDto> = required_rows(source, SKU_LIBRARY)?;
    let options = keyed(
        SKU_LIBRARY,
        options.into_iter().map(OptionSku::from).collect(),
        |option| option.sku_id.clone(),
    )?;

    let shipping: Vec<ShippingDto> = required_rows(source, SHIPPING_RULES)?;
    let shipping = keyed(
        SHIPPING_RULES,
        shipping.into_iter().map(ShippingRule::from).collect(),
        |rule| shipping_key(&rule.region, &rule.delivery_method),
    )?;

    let settings: Vec<SettingDto> = required_rows(source, SETTINGS)?;
    let settings = Settings::new(
        settings
            .into_iter()
            .map(|row| (row.parameter, row.value))
            .collect::<BTreeMap<_, _>>(),
    );
    match settings.get_f64(Settings::EUR_TO_USD) {
        None if settings.get(Settings::EUR_TO_USD).is_none() => {
            return Err(CatalogError::MissingSetting(Settings::EUR_TO_USD));
        }
        Some(rate) if rate.is_finite() && rate > 0.0 => {}
        _ => return Err(CatalogError::InvalidSetting(Settings::EUR_TO_USD)),
    }

    let our_products: Vec<ComparisonDto> = required_rows(source, OUR_PRODUCTS)?;
    let competitors: Vec<ComparisonDto> = match source.read_table(COMPETITORS)? {
        Some(raw) => parse_rows(COMPETITORS, &raw)?,
        None => {
            log::warn!(
                "[catalog] No {COMPETITORS} table in {}; battlecards show own products only",
                source.describe()
            );
            Vec::new()
        }
    };

    Ok(Catalog {
        devices,
        scenarios,
        base_models,
        options,
        shipping,
        settings,
        our_products: comparison_rows(our_products),
        competitors: comparison_rows(competitors),
    })
}
