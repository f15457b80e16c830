//! Sizing, projection and pricing rules for Cleanuva proposals.

pub mod catalog;
pub mod comparison;
pub mod defaults;
pub mod entities;
pub mod error;
pub mod fleet;
pub mod projection;
pub mod quotation;
pub mod session;

pub use catalog::{Catalog, Settings, Table};
pub use comparison::{ComparisonLine, ComparisonSection, ComparisonTable};
pub use defaults::EngineDefaults;
pub use entities::{
    BasePlatform, ComparisonRow, Currency, DeviceName, DeviceSpec, OptionSku, Scenario,
    ShippingRule, SkuId,
};
pub use error::{CalcError, CalcResult};
pub use fleet::{plan_fleet, FleetLine, FleetOverrides, FleetPlan, FleetStatus, SiteParameters};
pub use projection::{
    project, CashFlowPoint, FinancialProjection, ProjectionInputs, RecoveryYear,
};
pub use quotation::{
    price_quote, DocumentLine, PriceQuote, QuoteDocument, QuoteLine, QuoteRequest,
};
pub use session::{Session, TechnicalAssumptions};
