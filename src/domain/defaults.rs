use serde::{Deserialize, Serialize};

/// Fallback values for catalog cells that are optional, plus the tuning
/// constants of the projection.
///
/// Every field can be overridden from `defaults.json`; missing keys keep the
/// built-in value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineDefaults {
    /// Used when a scenario has no `CapFactor`.
    pub capacity_factor_pct: f64,
    /// Used when a scenario has no `Redundancy`.
    pub redundancy: f64,
    /// Per-cleaning consumable cost when a device has no `Consumable`.
    pub consumable_cost: f64,
    /// Yearly warranty cost when a device has no `Warranty`.
    pub warranty_cost: f64,
    /// Reported payback when the fleet never pays for itself.
    pub payback_sentinel_years: f64,
    pub hours_per_year: f64,
    /// `Applicable_To` value marking an option as universal.
    pub option_wildcard: String,
    pub soiling_min_pct: f64,
    pub soiling_max_pct: f64,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            capacity_factor_pct: 17.0,
            redundancy: 1.1,
            consumable_cost: 500.0,
            warranty_cost: 390.0,
            payback_sentinel_years: 99.0,
            hours_per_year: 8760.0,
            option_wildcard: "ALL".to_string(),
            soiling_min_pct: 0.5,
            soiling_max_pct: 6.0,
        }
    }
}

impl EngineDefaults {
    pub fn clamp_soiling(&self, pct: f64) -> f64 {
        pct.max(self.soiling_min_pct).min(self.soiling_max_pct)
    }

    /// Rejects values the calculators cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        let non_negative = [
            ("capacity_factor_pct", self.capacity_factor_pct),
            ("consumable_cost", self.consumable_cost),
            ("warranty_cost", self.warranty_cost),
            ("payback_sentinel_years", self.payback_sentinel_years),
            ("soiling_min_pct", self.soiling_min_pct),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a non-negative number, got {value}"));
            }
        }
        for (name, value) in [("redundancy", self.redundancy), ("hours_per_year", self.hours_per_year)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be positive, got {value}"));
            }
        }
        if !self.soiling_max_pct.is_finite() || self.soiling_min_pct > self.soiling_max_pct {
            return Err(format!(
                "soiling range {}..{} is empty",
                self.soiling_min_pct, self.soiling_max_pct
            ));
        }
        if self.option_wildcard.trim().is_empty() {
            return Err("option_wildcard must not be blank".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_builtin_values() {
        let defaults: EngineDefaults =
            serde_json::from_str(r#"{ "capacity_factor_pct": 21.5 }"#).unwrap();
        assert_eq!(defaults.capacity_factor_pct, 21.5);
        assert_eq!(defaults.redundancy, 1.1);
        assert_eq!(defaults.option_wildcard, "ALL");
    }

    #[test]
    fn builtin_values_are_valid() {
        assert_eq!(EngineDefaults::default().validate(), Ok(()));
    }

    #[test]
    fn inverted_soiling_range_is_invalid() {
        let defaults: EngineDefaults =
            serde_json::from_str(r#"{ "soiling_min_pct": 7.0 }"#).unwrap();
        assert!(defaults.validate().unwrap_err().contains("soiling"));
        // Still no panic if an unchecked value slips through.
        assert_eq!(defaults.clamp_soiling(3.0), 6.0);
    }

    #[test]
    fn non_positive_factors_are_invalid() {
        let mut defaults = EngineDefaults::default();
        defaults.redundancy = 0.0;
        assert!(defaults.validate().is_err());

        let mut defaults = EngineDefaults::default();
        defaults.hours_per_year = -1.0;
        assert!(defaults.validate().is_err());

        let mut defaults = EngineDefaults::default();
        defaults.warranty_cost = f64::NAN;
        assert!(defaults.validate().is_err());
    }

    #[test]
    fn soiling_is_clamped_to_slider_range() {
        let defaults = EngineDefaults::default();
        assert_eq!(defaults.clamp_soiling(12.0), 6.0);
        assert_eq!(defaults.clamp_soiling(0.1), 0.5);
        assert_eq!(defaults.clamp_soiling(3.2), 3.2);
    }
}
