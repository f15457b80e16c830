use thiserror::Error;

/// Failures raised by the sizing and pricing calculators.
///
/// Financial projections never fail; they saturate to sentinel values instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalcError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("unknown device: {0}")]
    UnknownDevice(String),
    #[error("unknown base model: {0}")]
    UnknownModel(String),
    #[error("unknown destination region: {0}")]
    UnknownRegion(String),
    #[error("no shipping method {method:?} for region {region:?}")]
    UnknownShippingMethod { region: String, method: String },
    #[error("option {sku} is not available for model {model}")]
    UnknownOption { sku: String, model: String },
    #[error("unknown project case: {0}")]
    UnknownScenario(String),
    #[error("cannot format quote document: {0}")]
    Document(String),
}

impl CalcError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

pub type CalcResult<T> = Result<T, CalcError>;
