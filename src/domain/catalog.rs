//! Read-only catalog snapshot shared by every calculator in a session.
//!
//! A [`Catalog`] is built once by a loader and never mutated; a reload builds
//! a fresh snapshot and swaps the `Arc` held by the session.

use std::collections::{BTreeMap, HashMap};

use super::{
    entities::{BasePlatform, ComparisonRow, DeviceSpec, OptionSku, Scenario, ShippingRule},
    error::{CalcError, CalcResult},
};

/// Ordered rows with a unique string key per row.
#[derive(Clone, Debug)]
pub struct Table<T> {
    rows: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Table<T> {
    /// Builds a table keyed by `key`. Returns the offending key on duplicates.
    pub fn from_rows(rows: Vec<T>, key: impl Fn(&T) -> String) -> Result<Self, String> {
        let mut index = HashMap::with_capacity(rows.len());
        for (position, row) in rows.iter().enumerate() {
            let row_key = key(row);
            if index.insert(row_key.clone(), position).is_some() {
                return Err(row_key);
            }
        }
        Ok(Self { rows, index })
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&position| &self.rows[position])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn filter<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a T> + 'a
    where
        P: Fn(&T) -> bool + 'a,
    {
        self.rows.iter().filter(move |row| predicate(row))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.rows.first()
    }

    pub fn get_index(&self, position: usize) -> Option<&T> {
        self.rows.get(position)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }
}

/// Keyed parameter rows from the `Settings` sheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, serde_json::Value>,
}

impl Settings {
    pub const EUR_TO_USD: &'static str = "EUR_to_USD";

    pub fn new(values: BTreeMap<String, serde_json::Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, parameter: &str) -> Option<&serde_json::Value> {
        self.values.get(parameter)
    }

    /// Numeric view of a parameter; numeric strings such as `"1.18"` count too.
    pub fn get_f64(&self, parameter: &str) -> Option<f64> {
        match self.values.get(parameter)? {
            serde_json::Value::Number(number) => number.as_f64(),
            serde_json::Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Exchange rate from list prices (EUR) to USD.
    ///
    /// Loaders reject catalogs without a positive rate, so a snapshot always
    /// has one.
    pub fn eur_to_usd(&self) -> f64 {
        self.get_f64(Self::EUR_TO_USD).unwrap_or(1.0)
    }
}

/// Separator for composite shipping keys; never appears in sheet text.
const KEY_SEPARATOR: char = '\u{1f}';

pub fn shipping_key(region: &str, method: &str) -> String {
    format!("{region}{KEY_SEPARATOR}{method}")
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub devices: Table<DeviceSpec>,
    pub scenarios: Table<Scenario>,
    pub base_models: Table<BasePlatform>,
    pub options: Table<OptionSku>,
    pub shipping: Table<ShippingRule>,
    pub settings: Settings,
    pub our_products: Vec<ComparisonRow>,
    pub competitors: Vec<ComparisonRow>,
}

impl Catalog {
    pub fn device(&self, name: &str) -> CalcResult<&DeviceSpec> {
        self.devices
            .get(name)
            .ok_or_else(|| CalcError::UnknownDevice(name.to_string()))
    }

    pub fn scenario(&self, client: &str) -> CalcResult<&Scenario> {
        self.scenarios
            .get(client)
            .ok_or_else(|| CalcError::UnknownScenario(client.to_string()))
    }

    pub fn base_model(&self, model_name: &str) -> CalcResult<&BasePlatform> {
        self.base_models
            .get(model_name)
            .ok_or_else(|| CalcError::UnknownModel(model_name.to_string()))
    }

    /// Looks up the shipping row, telling an unknown region apart from a
    /// method the region does not offer.
    pub fn shipping_rule(&self, region: &str, method: &str) -> CalcResult<&ShippingRule> {
        if let Some(rule) = self.shipping.get(&shipping_key(region, method)) {
            return Ok(rule);
        }
        if !self.shipping.iter().any(|rule| rule.region == region) {
            return Err(CalcError::UnknownRegion(region.to_string()));
        }
        Err(CalcError::UnknownShippingMethod {
            region: region.to_string(),
            method: method.to_string(),
        })
    }

    /// Destination regions in sheet order, without repeats.
    pub fn regions(&self) -> Vec<&str> {
        let mut regions: Vec<&str> = Vec::new();
        for rule in self.shipping.iter() {
            if !regions.contains(&rule.region.as_str()) {
                regions.push(rule.region.as_str());
            }
        }
        regions
    }

    pub fn shipping_methods(&self, region: &str) -> Vec<&str> {
        self.shipping
            .iter()
            .filter(|rule| rule.region == region)
            .map(|rule| rule.delivery_method.as_str())
            .collect()
    }

    /// Options that can be added to `platform`, in price-list order.
    pub fn eligible_options<'a>(
        &'a self,
        platform: &'a BasePlatform,
        wildcard: &'a str,
    ) -> impl Iterator<Item = &'a OptionSku> + 'a {
        self.options
            .filter(move |option| option.applies_to(&platform.model_id, wildcard))
    }
}
