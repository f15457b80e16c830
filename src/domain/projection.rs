//! Financial outlook: savings, generation gain, payback and cash flow.

use serde::{Deserialize, Serialize};

use super::defaults::EngineDefaults;

const KW_PER_MW: f64 = 1000.0;

/// Years covered by the cash flow curve and the ROI figure.
pub const PROJECTION_YEARS: u32 = 5;

/// Inputs of the financial model, gathered from the scenario and fleet plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInputs {
    pub capex: f64,
    pub annual_operating_cost: f64,
    pub plant_mw: f64,
    pub manual_rate: f64,
    pub cleaning_frequency: f64,
    /// Price per kWh.
    pub electricity_price: f64,
    pub capacity_factor_pct: f64,
    pub soiling_recovery_pct: f64,
}

/// One point of the cumulative cash flow curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CashFlowPoint {
    pub year: u32,
    pub label: String,
    pub cumulative: f64,
}

/// Yearly comparison of revenue lost without cleaning against robot upkeep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecoveryYear {
    pub year: u32,
    pub potential_revenue_loss: f64,
    pub robot_operation_cost: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinancialProjection {
    pub capex: f64,
    pub annual_operating_cost: f64,
    pub annual_manual_saving: f64,
    pub annual_generation_gain: f64,
    pub net_annual_benefit: f64,
    /// Years to break even, or the configured sentinel when never reached.
    pub payback_years: f64,
    pub payback_reachable: bool,
    pub cash_flow: Vec<CashFlowPoint>,
    pub total_benefit: f64,
    /// Benefit over the projection horizon relative to capex, in percent.
    pub roi_pct: f64,
}

impl FinancialProjection {
    pub fn has_investment(&self) -> bool {
        self.capex > 0.0
    }

    /// Payback as shown on the dashboard, e.g. `2.00 years`.
    pub fn payback_label(&self) -> String {
        if self.payback_reachable {
            format!("{:.2} years", self.payback_years)
        } else {
            "not reached".to_string()
        }
    }

    pub fn cumulative_series(&self) -> Vec<f64> {
        self.cash_flow.iter().map(|point| point.cumulative).collect()
    }

    pub fn horizon_years(&self) -> u32 {
        self.cash_flow.last().map(|point| point.year).unwrap_or(0)
    }

    pub fn recovery_table(&self) -> Vec<RecoveryYear> {
        (1..=self.horizon_years())
            .map(|year| RecoveryYear {
                year,
                potential_revenue_loss: self.annual_generation_gain,
                robot_operation_cost: self.annual_operating_cost,
            })
            .collect()
    }
}

/// Manual cleaning spend avoided, net of the fleet's own running costs.
/// Negative when the robots cost more to run than manual crews.
pub fn annual_manual_saving(inputs: &ProjectionInputs) -> f64 {
    inputs.plant_mw * inputs.manual_rate * inputs.cleaning_frequency - inputs.annual_operating_cost
}

/// Extra energy revenue from keeping the panels clean.
pub fn annual_generation_gain(inputs: &ProjectionInputs, hours_per_year: f64) -> f64 {
    inputs.plant_mw
        * KW_PER_MW
        * hours_per_year
        * (inputs.capacity_factor_pct / 100.0)
        * (inputs.soiling_recovery_pct / 100.0)
        * inputs.electricity_price
}

/// `capex / net_benefit`, saturating to `sentinel` when the benefit is not positive.
pub fn payback_years(capex: f64, net_benefit: f64, sentinel: f64) -> f64 {
    if net_benefit > 0.0 {
        capex / net_benefit
    } else {
        sentinel
    }
}

/// Cumulative position for years `0..=years`; year 0 is the investment.
pub fn cumulative_cash_flow(capex: f64, net_benefit: f64, years: u32) -> Vec<CashFlowPoint> {
    (0..=years)
        .map(|year| CashFlowPoint {
            year,
            label: if year == 0 {
                "Year 0 (Inv.)".to_string()
            } else {
                format!("Year {year}")
            },
            cumulative: net_benefit * year as f64 - capex,
        })
        .collect()
}

pub fn project(inputs: &ProjectionInputs, defaults: &EngineDefaults) -> FinancialProjection {
    let annual_manual_saving = annual_manual_saving(inputs);
    let annual_generation_gain = annual_generation_gain(inputs, defaults.hours_per_year);
    let net_annual_benefit = annual_manual_saving + annual_generation_gain;
    let years = PROJECTION_YEARS;
    let total_benefit = net_annual_benefit * years as f64;

    let roi_pct = if inputs.capex > 0.0 {
        total_benefit / inputs.capex * 100.0
    } else {
        0.0
    };

    FinancialProjection {
        capex: inputs.capex,
        annual_operating_cost: inputs.annual_operating_cost,
        annual_manual_saving,
        annual_generation_gain,
        net_annual_benefit,
        payback_years: payback_years(
            inputs.capex,
            net_annual_benefit,
            defaults.payback_sentinel_years,
        ),
        payback_reachable: net_annual_benefit > 0.0,
        cash_flow: cumulative_cash_flow(inputs.capex, net_annual_benefit, years),
        total_benefit,
        roi_pct,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn inputs() -> ProjectionInputs {
        ProjectionInputs {
            capex: 300_000.0,
            annual_operating_cost: 20_000.0,
            plant_mw: 10.0,
            manual_rate: 500.0,
            cleaning_frequency: 12.0,
            electricity_price: 0.08,
            capacity_factor_pct: 17.0,
            soiling_recovery_pct: 3.0,
        }
    }

    #[test]
    fn payback_divides_capex_by_benefit() {
        assert_relative_eq!(payback_years(300_000.0, 150_000.0, 99.0), 2.0);
    }

    #[test]
    fn payback_label_shows_two_decimals() {
        let mut inputs = inputs();
        inputs.annual_operating_cost = 0.0;
        inputs.manual_rate = 0.0;
        inputs.soiling_recovery_pct = 0.0;
        inputs.capex = 0.0;
        let mut projection = project(&inputs, &EngineDefaults::default());
        assert_eq!(projection.payback_label(), "not reached");

        projection.payback_years = payback_years(300_000.0, 150_000.0, 99.0);
        projection.payback_reachable = true;
        assert_eq!(projection.payback_label(), "2.00 years");
    }

    #[test]
    fn payback_saturates_without_benefit() {
        assert_eq!(payback_years(300_000.0, 0.0, 99.0), 99.0);
        assert_eq!(payback_years(300_000.0, -5_000.0, 99.0), 99.0);
    }

    #[test]
    fn cash_flow_reaches_breakeven_in_year_two() {
        let series: Vec<f64> = cumulative_cash_flow(300_000.0, 150_000.0, 5)
            .iter()
            .map(|point| point.cumulative)
            .collect();
        assert_eq!(
            series,
            [-300_000.0, -150_000.0, 0.0, 150_000.0, 300_000.0, 450_000.0]
        );
    }

    #[test]
    fn cash_flow_labels_the_investment_year() {
        let points = cumulative_cash_flow(0.0, 10.0, 5);
        assert_eq!(points.len(), 6);
        assert_eq!(points[0].label, "Year 0 (Inv.)");
        assert_eq!(points[5].label, "Year 5");
        assert_eq!(points[0].cumulative, 0.0);
    }

    #[test]
    fn projection_combines_saving_and_generation_gain() {
        let projection = project(&inputs(), &EngineDefaults::default());

        // 10 * 500 * 12 - 20 000
        assert_relative_eq!(projection.annual_manual_saving, 40_000.0);
        // 10 * 1000 * 8760 * 0.17 * 0.03 * 0.08
        assert_relative_eq!(projection.annual_generation_gain, 35_740.8, epsilon = 1e-6);
        assert_relative_eq!(projection.net_annual_benefit, 75_740.8, epsilon = 1e-6);
        assert_relative_eq!(projection.payback_years, 300_000.0 / 75_740.8, epsilon = 1e-9);
        assert!(projection.payback_reachable);
        assert_relative_eq!(projection.total_benefit, 378_704.0, epsilon = 1e-6);
        assert_relative_eq!(projection.roi_pct, 378_704.0 / 300_000.0 * 100.0, epsilon = 1e-6);
        assert_eq!(projection.cash_flow[0].cumulative, -300_000.0);
    }

    #[test]
    fn horizon_is_fixed_at_five_years() {
        let defaults: EngineDefaults =
            serde_json::from_str(r#"{ "projection_years": 10 }"#).unwrap();
        let projection = project(&inputs(), &defaults);
        assert_eq!(projection.cash_flow.len(), 6);
        assert_eq!(projection.horizon_years(), 5);
        assert_relative_eq!(
            projection.total_benefit,
            projection.net_annual_benefit * 5.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn expensive_fleet_never_pays_back() {
        let mut inputs = inputs();
        inputs.annual_operating_cost = 500_000.0;
        inputs.soiling_recovery_pct = 0.0;
        let projection = project(&inputs, &EngineDefaults::default());

        assert!(projection.net_annual_benefit < 0.0);
        assert_eq!(projection.payback_years, 99.0);
        assert!(!projection.payback_reachable);
        let series = projection.cumulative_series();
        assert!(series.windows(2).all(|pair| pair[1] < pair[0]));
    }

    #[test]
    fn roi_is_zero_without_investment() {
        let mut inputs = inputs();
        inputs.capex = 0.0;
        let projection = project(&inputs, &EngineDefaults::default());
        assert_eq!(projection.roi_pct, 0.0);
        assert!(!projection.has_investment());
        assert_eq!(projection.payback_years, 0.0);
    }

    #[test]
    fn recovery_table_repeats_yearly_figures() {
        let projection = project(&inputs(), &EngineDefaults::default());
        let table = projection.recovery_table();
        assert_eq!(table.len(), 5);
        assert_eq!(table[0].year, 1);
        assert_eq!(table[4].year, 5);
        assert!(table
            .iter()
            .all(|row| row.robot_operation_cost == 20_000.0
                && row.potential_revenue_loss == projection.annual_generation_gain));
    }
}
