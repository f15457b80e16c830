use serde::{Deserialize, Serialize};
use time::Date;

/// Identifier for devices in the economic model (the `Device` column).
pub type DeviceName = String;

/// Identifier for option SKUs in the price list.
pub type SkuId = String;

/// One project case from the economic model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub client: String,
    pub mode: String,
    pub region: String,
    pub analysis_date: Option<Date>,
    /// Plant capacity in MW.
    pub plant_mw: f64,
    pub window_days: u32,
    pub shifts_per_day: u32,
    /// Expected efficiency gain from automated cleaning, in percent.
    pub soiling_recovery_pct: f64,
    /// Manual cleaning cost per MW and cleaning.
    pub manual_rate: f64,
    /// Cleanings per year.
    pub cleaning_frequency: f64,
    /// Electricity price per kWh.
    pub electricity_price: f64,
    pub capacity_factor_pct: Option<f64>,
    pub redundancy: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub name: DeviceName,
    pub unit_price: f64,
    /// MW cleaned by one unit in one shift.
    pub capacity_mw: f64,
    pub consumable_cost: Option<f64>,
    pub warranty_cost: Option<f64>,
}

/// A robot platform from the price list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasePlatform {
    pub model_name: String,
    pub model_id: String,
    pub price_eur: f64,
    pub standard_includes: Vec<String>,
    pub warranty_base: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptionSku {
    pub sku_id: SkuId,
    pub item_name: String,
    pub price_eur: f64,
    /// Either the wildcard tag or a list of model ids the option fits.
    pub applicable_to: String,
}

impl OptionSku {
    /// Returns true if this option can be added to the platform with `model_id`.
    pub fn applies_to(&self, model_id: &str, wildcard: &str) -> bool {
        self.applicable_to == wildcard || self.applicable_to.contains(model_id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShippingRule {
    pub region: String,
    pub delivery_method: String,
    pub cost_eur: f64,
}

/// One parameter cell of the product comparison sheets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub model: String,
    pub primary_category: String,
    pub secondary_parameter: String,
    pub value: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    Eur,
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Usd => "$",
        }
    }

    /// Conversion factor from list prices (EUR) into this currency.
    pub fn rate(&self, eur_to_usd: f64) -> f64 {
        match self {
            Currency::Eur => 1.0,
            Currency::Usd => eur_to_usd,
        }
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.code(), self.symbol())
    }
}
