use thiserror::Error;

/// Errors raised by the engine when a caller passes out-of-contract input.
///
/// Inputs are never coerced: a negative rate is a caller bug and is reported,
/// not clamped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A rate, probability, count or config value is negative, non-finite,
    /// zero where positivity is required, or otherwise out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Bookmaker decimal odds at or below 1.0 (no payout above stake).
    #[error("invalid odds {0}: decimal odds must be greater than 1.0")]
    InvalidOdds(f64),
}

impl EngineError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Reject negative, NaN and infinite goal rates.
pub(crate) fn check_rate(name: &'static str, rate: f64) -> Result<()> {
    if !rate.is_finite() {
        return Err(EngineError::invalid(name, format!("rate must be finite, got {rate}")));
    }
    if rate < 0.0 {
        return Err(EngineError::invalid(
            name,
            format!("rate must be non-negative, got {rate}"),
        ));
    }
    Ok(())
}

/// Decimal odds must be finite and strictly above 1.0.
pub(crate) fn check_odds(odds: f64) -> Result<()> {
    if !odds.is_finite() || odds <= 1.0 {
        return Err(EngineError::InvalidOdds(odds));
    }
    Ok(())
}
