//! Fleet sizing: suggested unit counts, cycle capacity, capex and opex.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{
    catalog::Catalog,
    defaults::EngineDefaults,
    entities::{DeviceName, DeviceSpec},
    error::{CalcError, CalcResult},
};

/// Quotients within this distance of an integer are not rounded up.
const CEIL_TOLERANCE: f64 = 1e-9;

/// Site-level inputs of the sizing formula.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SiteParameters {
    pub plant_mw: f64,
    pub window_days: u32,
    pub shifts_per_day: u32,
    pub redundancy: f64,
    /// Cleanings per year, drives consumable spend.
    pub cleaning_frequency: f64,
}

impl SiteParameters {
    fn validate(&self) -> CalcResult<()> {
        if !self.plant_mw.is_finite() || self.plant_mw < 0.0 {
            return Err(CalcError::invalid(format!(
                "plant capacity must be a non-negative number, got {}",
                self.plant_mw
            )));
        }
        if self.window_days == 0 {
            return Err(CalcError::invalid("cleaning window must be at least one day"));
        }
        if self.shifts_per_day == 0 {
            return Err(CalcError::invalid("at least one shift per day is required"));
        }
        if !self.redundancy.is_finite() || self.redundancy < 0.0 {
            return Err(CalcError::invalid(format!(
                "redundancy factor must be non-negative, got {}",
                self.redundancy
            )));
        }
        Ok(())
    }
}

/// Smallest unit count that covers `target_share_mw` within the window.
pub fn suggested_quantity(
    target_share_mw: f64,
    capacity_mw: f64,
    site: &SiteParameters,
) -> CalcResult<u32> {
    let shifts = site.shifts_per_day as f64;
    let window = site.window_days as f64;
    let per_cycle = capacity_mw * shifts * window;
    if !per_cycle.is_finite() || per_cycle <= 0.0 {
        return Err(CalcError::invalid(format!(
            "device capacity {capacity_mw} MW/shift cannot cover any area"
        )));
    }

    let raw = (target_share_mw / window) / (capacity_mw * shifts) * site.redundancy;
    let units = (raw - CEIL_TOLERANCE).ceil().max(0.0);
    Ok(units as u32)
}

/// One selected device type and the units the user wants of it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetLine {
    pub device: DeviceSpec,
    /// Quoted price per unit; a session override wins over the catalog price.
    pub unit_price: f64,
    pub quantity: u32,
    pub suggested_quantity: u32,
}

impl FleetLine {
    pub fn cycle_capacity(&self, site: &SiteParameters) -> f64 {
        self.quantity as f64
            * self.device.capacity_mw
            * site.shifts_per_day as f64
            * site.window_days as f64
    }

    pub fn capex(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }

    pub fn annual_operating_cost(&self, frequency: f64, defaults: &EngineDefaults) -> f64 {
        let consumable = self.device.consumable_cost.unwrap_or(defaults.consumable_cost);
        let warranty = self.device.warranty_cost.unwrap_or(defaults.warranty_cost);
        self.quantity as f64 * (consumable * frequency + warranty)
    }

    pub fn is_below_suggestion(&self) -> bool {
        self.quantity < self.suggested_quantity
    }
}

/// The robot mix for one site. Aggregates are summed from the lines on every
/// call, so edits through [`FleetPlan::set_quantity`] are reflected at once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetPlan {
    site: SiteParameters,
    defaults: EngineDefaults,
    lines: Vec<FleetLine>,
}

impl FleetPlan {
    pub fn site(&self) -> &SiteParameters {
        &self.site
    }

    pub fn lines(&self) -> &[FleetLine] {
        &self.lines
    }

    pub fn line(&self, device: &str) -> Option<&FleetLine> {
        self.lines.iter().find(|line| line.device.name == device)
    }

    pub fn set_quantity(&mut self, device: &str, quantity: u32) -> CalcResult<()> {
        let line = self.line_mut(device)?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn set_unit_price(&mut self, device: &str, unit_price: f64) -> CalcResult<()> {
        validate_price(device, unit_price)?;
        let line = self.line_mut(device)?;
        line.unit_price = unit_price;
        Ok(())
    }

    fn line_mut(&mut self, device: &str) -> CalcResult<&mut FleetLine> {
        self.lines
            .iter_mut()
            .find(|line| line.device.name == device)
            .ok_or_else(|| CalcError::UnknownDevice(device.to_string()))
    }

    /// MW the fleet can clean within one cleaning window.
    pub fn total_cycle_capacity(&self) -> f64 {
        self.lines
            .iter()
            .map(|line| line.cycle_capacity(&self.site))
            .sum()
    }

    pub fn is_adequate(&self) -> bool {
        self.total_cycle_capacity() >= self.site.plant_mw
    }

    pub fn capacity_shortfall(&self) -> f64 {
        (self.site.plant_mw - self.total_cycle_capacity()).max(0.0)
    }

    pub fn total_capex(&self) -> f64 {
        self.lines.iter().map(FleetLine::capex).sum()
    }

    pub fn total_units(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn annual_operating_cost(&self) -> f64 {
        self.lines
            .iter()
            .map(|line| line.annual_operating_cost(self.site.cleaning_frequency, &self.defaults))
            .sum()
    }

    pub fn status(&self) -> FleetStatus {
        FleetStatus {
            cycle_capacity_mw: self.total_cycle_capacity(),
            target_mw: self.site.plant_mw,
            adequate: self.is_adequate(),
        }
    }
}

/// Advisory capacity check; an inadequate fleet is still a valid plan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetStatus {
    pub cycle_capacity_mw: f64,
    pub target_mw: f64,
    pub adequate: bool,
}

impl FleetStatus {
    pub fn label(&self) -> &'static str {
        if self.adequate {
            "YES"
        } else {
            "NO (Add Units)"
        }
    }
}

/// Per-device user edits applied on top of catalog values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FleetOverrides {
    pub unit_prices: HashMap<DeviceName, f64>,
    pub quantities: HashMap<DeviceName, u32>,
}

fn validate_price(device: &str, unit_price: f64) -> CalcResult<()> {
    if !unit_price.is_finite() || unit_price < 0.0 {
        return Err(CalcError::invalid(format!(
            "unit price for {device} must be non-negative, got {unit_price}"
        )));
    }
    Ok(())
}

/// Fails when a device type is picked more than once.
pub fn ensure_distinct(selection: &[DeviceName]) -> CalcResult<()> {
    let mut seen = HashSet::with_capacity(selection.len());
    match selection.iter().find(|name| !seen.insert(name.as_str())) {
        Some(name) => Err(CalcError::invalid(format!("{name} is selected more than once"))),
        None => Ok(()),
    }
}

/// Sizes the selected devices for `site`.
///
/// Plant capacity is split evenly across the selected device types. Lines take
/// the suggested quantity unless `overrides` holds a count for the device.
pub fn plan_fleet(
    catalog: &Catalog,
    site: &SiteParameters,
    selection: &[DeviceName],
    overrides: &FleetOverrides,
    defaults: &EngineDefaults,
) -> CalcResult<FleetPlan> {
    if selection.is_empty() {
        return Err(CalcError::invalid("select at least one device"));
    }
    ensure_distinct(selection)?;
    site.validate()?;

    let target_share = site.plant_mw / selection.len() as f64;
    let mut lines = Vec::with_capacity(selection.len());
    for name in selection {
        let device = catalog.device(name)?;
        let suggested = suggested_quantity(target_share, device.capacity_mw, site)?;
        let unit_price = overrides
            .unit_prices
            .get(name)
            .copied()
            .unwrap_or(device.unit_price);
        validate_price(name, unit_price)?;

        lines.push(FleetLine {
            device: device.clone(),
            unit_price,
            quantity: overrides.quantities.get(name).copied().unwrap_or(suggested),
            suggested_quantity: suggested,
        });
    }

    Ok(FleetPlan {
        site: site.clone(),
        defaults: defaults.clone(),
        lines,
    })
}
