use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    catalog::Catalog,
    comparison::{available_models, default_selection, ComparisonTable},
    defaults::EngineDefaults,
    entities::{Currency, DeviceName, Scenario, SkuId},
    error::{CalcError, CalcResult},
    fleet::{ensure_distinct, plan_fleet, FleetOverrides, FleetPlan, SiteParameters},
    projection::{project, FinancialProjection, ProjectionInputs},
    quotation::{price_quote, PriceQuote, QuoteDocument, QuoteRequest},
};

/// Sidebar inputs that start from the scenario row but can be tuned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAssumptions {
    pub window_days: u32,
    pub shifts_per_day: u32,
    pub soiling_recovery_pct: f64,
}

impl TechnicalAssumptions {
    fn from_scenario(scenario: &Scenario, defaults: &EngineDefaults) -> Self {
        Self {
            window_days: scenario.window_days,
            shifts_per_day: scenario.shifts_per_day,
            soiling_recovery_pct: defaults.clamp_soiling(scenario.soiling_recovery_pct),
        }
    }
}

/// Everything one salesperson has picked during a proposal session.
///
/// The catalog is shared read-only; all user edits live in the maps owned
/// here, so two sessions on the same catalog never see each other's state.
#[derive(Clone, Debug)]
pub struct Session {
    id: Uuid,
    catalog: Arc<Catalog>,
    defaults: EngineDefaults,
    scenario: String,
    assumptions: TechnicalAssumptions,
    fleet_selection: Vec<DeviceName>,
    overrides: FleetOverrides,
    quote: QuoteRequest,
    show_competitors: bool,
    compared_models: Vec<String>,
}

impl Session {
    /// Opens a session on the first project case with the default picks.
    pub fn new(catalog: Arc<Catalog>, defaults: EngineDefaults) -> CalcResult<Self> {
        defaults.validate().map_err(CalcError::InvalidConfiguration)?;
        let scenario = catalog
            .scenarios
            .first()
            .ok_or_else(|| CalcError::invalid("catalog has no project cases"))?;
        let assumptions = TechnicalAssumptions::from_scenario(scenario, &defaults);
        let scenario = scenario.client.clone();
        let fleet_selection = default_fleet(&catalog);
        let quote = default_quote(&catalog);
        let compared_models = default_selection(&available_models(
            &catalog.our_products,
            &catalog.competitors,
            false,
        ));

        let session = Self {
            id: Uuid::new_v4(),
            catalog,
            defaults,
            scenario,
            assumptions,
            fleet_selection,
            overrides: FleetOverrides::default(),
            quote,
            show_competitors: false,
            compared_models,
        };
        log::info!("[session] {} opened on {:?}", session.id, session.scenario);
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn scenario(&self) -> CalcResult<&Scenario> {
        self.catalog.scenario(&self.scenario)
    }

    pub fn assumptions(&self) -> &TechnicalAssumptions {
        &self.assumptions
    }

    pub fn fleet_selection(&self) -> &[DeviceName] {
        &self.fleet_selection
    }

    pub fn quote_request(&self) -> &QuoteRequest {
        &self.quote
    }

    /// Switches project case; the technical assumptions reset to its values.
    pub fn select_scenario(&mut self, client: &str) -> CalcResult<()> {
        let scenario = self.catalog.scenario(client)?;
        self.assumptions = TechnicalAssumptions::from_scenario(scenario, &self.defaults);
        self.scenario = scenario.client.clone();
        Ok(())
    }

    pub fn set_window_days(&mut self, days: u32) {
        self.assumptions.window_days = days;
    }

    pub fn set_shifts_per_day(&mut self, shifts: u32) {
        self.assumptions.shifts_per_day = shifts;
    }

    pub fn set_soiling_recovery(&mut self, pct: f64) {
        self.assumptions.soiling_recovery_pct = self.defaults.clamp_soiling(pct);
    }

    pub fn select_fleet(&mut self, devices: Vec<DeviceName>) -> CalcResult<()> {
        ensure_distinct(&devices)?;
        for name in &devices {
            self.catalog.device(name)?;
        }
        self.fleet_selection = devices;
        Ok(())
    }

    /// Records a negotiated price for one device type.
    pub fn override_unit_price(&mut self, device: &str, unit_price: f64) -> CalcResult<()> {
        self.catalog.device(device)?;
        if !unit_price.is_finite() || unit_price < 0.0 {
            return Err(CalcError::invalid(format!(
                "unit price for {device} must be non-negative, got {unit_price}"
            )));
        }
        self.overrides
            .unit_prices
            .insert(device.to_string(), unit_price);
        Ok(())
    }

    /// Pins the unit count; later suggestion changes do not touch it.
    pub fn override_quantity(&mut self, device: &str, quantity: u32) -> CalcResult<()> {
        self.catalog.device(device)?;
        self.overrides.quantities.insert(device.to_string(), quantity);
        Ok(())
    }

    pub fn clear_overrides(&mut self, device: &str) {
        self.overrides.unit_prices.remove(device);
        self.overrides.quantities.remove(device);
    }

    pub fn site_parameters(&self) -> CalcResult<SiteParameters> {
        let scenario = self.scenario()?;
        Ok(SiteParameters {
            plant_mw: scenario.plant_mw,
            window_days: self.assumptions.window_days,
            shifts_per_day: self.assumptions.shifts_per_day,
            redundancy: scenario.redundancy.unwrap_or(self.defaults.redundancy),
            cleaning_frequency: scenario.cleaning_frequency,
        })
    }

    pub fn fleet_plan(&self) -> CalcResult<FleetPlan> {
        plan_fleet(
            &self.catalog,
            &self.site_parameters()?,
            &self.fleet_selection,
            &self.overrides,
            &self.defaults,
        )
    }

    pub fn projection_inputs(&self, plan: &FleetPlan) -> CalcResult<ProjectionInputs> {
        let scenario = self.scenario()?;
        Ok(ProjectionInputs {
            capex: plan.total_capex(),
            annual_operating_cost: plan.annual_operating_cost(),
            plant_mw: scenario.plant_mw,
            manual_rate: scenario.manual_rate,
            cleaning_frequency: scenario.cleaning_frequency,
            electricity_price: scenario.electricity_price,
            capacity_factor_pct: scenario
                .capacity_factor_pct
                .unwrap_or(self.defaults.capacity_factor_pct),
            soiling_recovery_pct: self.assumptions.soiling_recovery_pct,
        })
    }

    pub fn projection(&self) -> CalcResult<FinancialProjection> {
        let plan = self.fleet_plan()?;
        Ok(project(&self.projection_inputs(&plan)?, &self.defaults))
    }

    pub fn set_currency(&mut self, currency: Currency) {
        self.quote.currency = currency;
    }

    /// Picks the platform; options that do not fit it are dropped.
    pub fn select_model(&mut self, model_name: &str) -> CalcResult<()> {
        let platform = self.catalog.base_model(model_name)?;
        let wildcard = self.defaults.option_wildcard.as_str();
        self.quote.option_quantities.retain(|sku, _| {
            self.catalog
                .options
                .get(sku)
                .map(|option| option.applies_to(&platform.model_id, wildcard))
                .unwrap_or(false)
        });
        self.quote.model_name = platform.model_name.clone();
        Ok(())
    }

    /// Picks the destination; the first method offered there becomes current.
    pub fn select_region(&mut self, region: &str) -> CalcResult<()> {
        let method = self
            .catalog
            .shipping_methods(region)
            .first()
            .map(|method| method.to_string())
            .ok_or_else(|| CalcError::UnknownRegion(region.to_string()))?;
        self.quote.region = region.to_string();
        self.quote.delivery_method = method;
        Ok(())
    }

    pub fn select_delivery_method(&mut self, method: &str) -> CalcResult<()> {
        self.catalog.shipping_rule(&self.quote.region, method)?;
        self.quote.delivery_method = method.to_string();
        Ok(())
    }

    pub fn set_option_quantity(&mut self, sku: &str, quantity: u32) -> CalcResult<()> {
        let platform = self.catalog.base_model(&self.quote.model_name)?;
        let fits = self
            .catalog
            .options
            .get(sku)
            .map(|option| option.applies_to(&platform.model_id, &self.defaults.option_wildcard))
            .unwrap_or(false);
        if !fits {
            return Err(CalcError::UnknownOption {
                sku: sku.to_string(),
                model: platform.model_name.clone(),
            });
        }
        if quantity == 0 {
            self.quote.option_quantities.remove(sku);
        } else {
            self.quote.option_quantities.insert(sku.to_string(), quantity);
        }
        Ok(())
    }

    pub fn option_quantities(&self) -> &HashMap<SkuId, u32> {
        &self.quote.option_quantities
    }

    pub fn price_quote(&self) -> CalcResult<PriceQuote> {
        price_quote(&self.catalog, &self.quote, &self.defaults.option_wildcard)
    }

    pub fn quote_document(&self, issued_at: OffsetDateTime) -> CalcResult<Option<QuoteDocument>> {
        QuoteDocument::from_quote(&self.price_quote()?, issued_at)
    }

    pub fn set_show_competitors(&mut self, show: bool) {
        self.show_competitors = show;
        if !show {
            let visible = self.comparable_models();
            self.compared_models.retain(|model| visible.contains(model));
        }
    }

    pub fn comparable_models(&self) -> Vec<String> {
        available_models(
            &self.catalog.our_products,
            &self.catalog.competitors,
            self.show_competitors,
        )
    }

    pub fn compare_models(&mut self, models: Vec<String>) -> CalcResult<()> {
        let visible = self.comparable_models();
        if let Some(unknown) = models.iter().find(|model| !visible.contains(model)) {
            return Err(CalcError::UnknownModel(unknown.clone()));
        }
        self.compared_models = models;
        Ok(())
    }

    pub fn comparison(&self) -> ComparisonTable {
        let rows = self.catalog.our_products.iter();
        if self.show_competitors {
            let rows = rows.chain(self.catalog.competitors.iter());
            ComparisonTable::build(rows, &self.compared_models)
        } else {
            ComparisonTable::build(rows, &self.compared_models)
        }
    }

    /// Swaps in a freshly loaded catalog, keeping the picks that still resolve.
    pub fn reload(&mut self, catalog: Arc<Catalog>) {
        let previous = std::mem::replace(&mut self.catalog, catalog);

        match self.catalog.scenario(&self.scenario) {
            Ok(scenario) => {
                if previous.scenario(&self.scenario).ok() != Some(scenario) {
                    self.assumptions =
                        TechnicalAssumptions::from_scenario(scenario, &self.defaults);
                }
            }
            Err(_) => {
                if let Some(first) = self.catalog.scenarios.first() {
                    self.assumptions = TechnicalAssumptions::from_scenario(first, &self.defaults);
                    self.scenario = first.client.clone();
                }
            }
        }

        let catalog = Arc::clone(&self.catalog);
        self.fleet_selection.retain(|name| catalog.devices.contains(name));
        if self.fleet_selection.is_empty() {
            self.fleet_selection = default_fleet(&catalog);
        }
        self.overrides
            .unit_prices
            .retain(|name, _| catalog.devices.contains(name));
        self.overrides
            .quantities
            .retain(|name, _| catalog.devices.contains(name));

        if catalog.base_model(&self.quote.model_name).is_err()
            || catalog
                .shipping_rule(&self.quote.region, &self.quote.delivery_method)
                .is_err()
        {
            let currency = self.quote.currency;
            self.quote = default_quote(&catalog);
            self.quote.currency = currency;
        } else {
            let model = self.quote.model_name.clone();
            // Model resolves, so this only prunes options that no longer fit.
            let _ = self.select_model(&model);
        }

        let visible = self.comparable_models();
        self.compared_models.retain(|model| visible.contains(model));
        log::info!("[session] {} reloaded catalog", self.id);
    }
}

/// The second device when there are several, the first otherwise.
fn default_fleet(catalog: &Catalog) -> Vec<DeviceName> {
    catalog
        .devices
        .get_index(1)
        .or_else(|| catalog.devices.first())
        .map(|device| vec![device.name.clone()])
        .unwrap_or_default()
}

fn default_quote(catalog: &Catalog) -> QuoteRequest {
    let region = catalog.regions().first().map(|r| r.to_string()).unwrap_or_default();
    let delivery_method = catalog
        .shipping_methods(&region)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_default();
    QuoteRequest {
        model_name: catalog
            .base_models
            .first()
            .map(|platform| platform.model_name.clone())
            .unwrap_or_default(),
        currency: Currency::default(),
        region,
        delivery_method,
        option_quantities: HashMap::new(),
    }
}
