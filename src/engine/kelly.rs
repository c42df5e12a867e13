//! Kelly Criterion staking for decimal bookmaker odds.
//!
//! Full Kelly is the bankroll share that maximises long-run log growth when
//! the model probability is exact. A negative value means the price offers no
//! value and the stake is zero.
//!
//! For decimal odds `o` (stake returned included) and model probability `p`:
//!   edge = p·o − 1
//!   f*   = (p·o − 1) / (o − 1)
//!
//! The recommended stake is full Kelly scaled by [`StakingConfig::kelly_multiplier`]
//! (quarter Kelly unless configured).

use serde::{Deserialize, Serialize};

use crate::error::{check_odds, EngineError, Result};
use crate::models::{Confidence, ValueAssessment};

pub const DEFAULT_KELLY_MULTIPLIER: f64 = 0.25;
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.12;
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 0.06;

/// Staking knobs: fractional Kelly multiplier and confidence thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StakingConfig {
    pub kelly_multiplier: f64,
    /// Edge at or above this is "high" confidence
    pub high_threshold: f64,
    /// Edge at or above this is "medium" confidence
    pub medium_threshold: f64,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            kelly_multiplier: DEFAULT_KELLY_MULTIPLIER,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            medium_threshold: DEFAULT_MEDIUM_THRESHOLD,
        }
    }
}

impl StakingConfig {
    pub fn validate(&self) -> Result<()> {
        let m = self.kelly_multiplier;
        if !m.is_finite() || m <= 0.0 || m > 1.0 {
            return Err(EngineError::invalid(
                "kelly_multiplier",
                format!("must be in (0, 1], got {m}"),
            ));
        }
        if !self.high_threshold.is_finite() {
            return Err(EngineError::invalid("high_threshold", "must be finite"));
        }
        if !self.medium_threshold.is_finite() {
            return Err(EngineError::invalid("medium_threshold", "must be finite"));
        }
        if self.medium_threshold > self.high_threshold {
            return Err(EngineError::invalid(
                "medium_threshold",
                format!(
                    "must not exceed high_threshold ({} > {})",
                    self.medium_threshold, self.high_threshold
                ),
            ));
        }
        Ok(())
    }

    /// Step function of edge: high ≥ high_threshold, medium ≥ medium_threshold.
    pub fn classify(&self, edge: f64) -> Confidence {
        if edge >= self.high_threshold {
            Confidence::High
        } else if edge >= self.medium_threshold {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

fn check_model_prob(model_prob: f64) -> Result<()> {
    if !model_prob.is_finite() || model_prob <= 0.0 || model_prob >= 1.0 {
        return Err(EngineError::invalid(
            "model_prob",
            format!("must be in the open interval (0, 1), got {model_prob}"),
        ));
    }
    Ok(())
}

/// Expected return per unit staked: model_prob × odds − 1.
///
/// Positive edge means the bookmaker is underpricing the outcome.
pub fn edge(model_prob: f64, book_odds: f64) -> Result<f64> {
    check_model_prob(model_prob)?;
    check_odds(book_odds)?;
    Ok(model_prob * book_odds - 1.0)
}

/// Full-Kelly fraction of bankroll. Negative when the bet has no edge.
pub fn raw_kelly(model_prob: f64, book_odds: f64) -> Result<f64> {
    let e = edge(model_prob, book_odds)?;
    Ok(e / (book_odds - 1.0))
}

/// Evaluate one (probability, price) pair.
///
/// A non-positive edge is a normal outcome: the stake is clamped to `0.0`.
pub fn evaluate_value_bet(
    model_prob: f64,
    book_odds: f64,
    config: &StakingConfig,
) -> Result<ValueAssessment> {
    config.validate()?;
    let edge = edge(model_prob, book_odds)?;
    let raw_kelly = edge / (book_odds - 1.0);
    let kelly_fraction = if raw_kelly <= 0.0 {
        0.0
    } else {
        raw_kelly * config.kelly_multiplier
    };
    Ok(ValueAssessment {
        edge,
        raw_kelly,
        kelly_fraction,
        confidence: config.classify(edge),
    })
}

/// Bookmaker-implied probability of a decimal price (margin included).
pub fn implied_probability(book_odds: f64) -> Result<f64> {
    check_odds(book_odds)?;
    Ok(1.0 / book_odds)
}

/// Bookmaker margin across a complete market: Σ 1/odds − 1.
pub fn overround(odds: &[f64]) -> Result<f64> {
    if odds.is_empty() {
        return Err(EngineError::invalid("odds", "market has no prices"));
    }
    let mut book = 0.0;
    for &o in odds {
        book += implied_probability(o)?;
    }
    Ok(book - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn eval(p: f64, o: f64) -> ValueAssessment {
        evaluate_value_bet(p, o, &StakingConfig::default()).unwrap()
    }

    #[test]
    fn test_fair_odds_break_even() {
        let v = eval(0.5, 2.0);
        assert_relative_eq!(v.edge, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.raw_kelly, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.kelly_fraction, 0.0, epsilon = 1e-12);
        assert_eq!(v.confidence, Confidence::Low);
    }

    #[test]
    fn test_positive_edge_quarter_kelly() {
        let v = eval(0.6, 2.0);
        assert_relative_eq!(v.edge, 0.2, epsilon = 1e-12);
        assert_relative_eq!(v.raw_kelly, 0.2, epsilon = 1e-12);
        assert_relative_eq!(v.kelly_fraction, 0.05, epsilon = 1e-12);
        assert_eq!(v.confidence, Confidence::High);
    }

    #[test]
    fn test_negative_edge_not_staked() {
        let v = eval(0.3, 2.0);
        assert_relative_eq!(v.edge, -0.4, epsilon = 1e-12);
        assert!(v.raw_kelly < 0.0);
        assert_eq!(v.kelly_fraction, 0.0);
        assert_eq!(v.confidence, Confidence::Low);
    }

    #[test]
    fn test_full_kelly_multiplier() {
        let config = StakingConfig {
            kelly_multiplier: 1.0,
            ..Default::default()
        };
        let v = evaluate_value_bet(0.6, 2.0, &config).unwrap();
        assert_relative_eq!(v.kelly_fraction, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_kelly_matches_b_p_q_form() {
        // f* = (b·p − q) / b with b = o − 1
        let (p, o) = (0.62, 1.85);
        let b = o - 1.0;
        let want = (b * p - (1.0 - p)) / b;
        assert_relative_eq!(raw_kelly(p, o).unwrap(), want, epsilon = 1e-12);
    }

    #[test]
    fn test_confidence_tiers() {
        // 0.32 × 3.40 − 1 = 0.088 → medium
        assert_eq!(eval(0.32, 3.40).confidence, Confidence::Medium);
        // 0.68 × 1.72 − 1 = 0.1696 → high
        assert_eq!(eval(0.68, 1.72).confidence, Confidence::High);
        // 0.41 × 2.50 − 1 = 0.025 → low
        assert_eq!(eval(0.41, 2.50).confidence, Confidence::Low);
    }

    #[test]
    fn test_custom_thresholds() {
        let config = StakingConfig {
            high_threshold: 0.30,
            medium_threshold: 0.10,
            ..Default::default()
        };
        let v = evaluate_value_bet(0.6, 2.0, &config).unwrap();
        assert_eq!(v.confidence, Confidence::Medium);
    }

    #[test]
    fn test_odds_at_or_below_one_rejected() {
        let c = StakingConfig::default();
        assert_eq!(
            evaluate_value_bet(0.5, 1.0, &c),
            Err(EngineError::InvalidOdds(1.0))
        );
        assert!(matches!(
            evaluate_value_bet(0.5, 0.8, &c),
            Err(EngineError::InvalidOdds(_))
        ));
    }

    #[test]
    fn test_probability_outside_open_interval_rejected() {
        let c = StakingConfig::default();
        for p in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            assert!(matches!(
                evaluate_value_bet(p, 2.0, &c),
                Err(EngineError::InvalidParameter { name: "model_prob", .. })
            ));
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad_multiplier = StakingConfig {
            kelly_multiplier: 0.0,
            ..Default::default()
        };
        assert!(evaluate_value_bet(0.6, 2.0, &bad_multiplier).is_err());

        let inverted = StakingConfig {
            high_threshold: 0.05,
            medium_threshold: 0.10,
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(EngineError::InvalidParameter { name: "medium_threshold", .. })
        ));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        assert_eq!(eval(0.55, 2.05), eval(0.55, 2.05));
    }

    #[test]
    fn test_implied_probability_and_overround() {
        assert_relative_eq!(implied_probability(2.0).unwrap(), 0.5, epsilon = 1e-12);
        // 1/2.10 + 1/3.50 + 1/3.20 − 1
        let o = overround(&[2.10, 3.50, 3.20]).unwrap();
        assert_relative_eq!(o, 1.0 / 2.10 + 1.0 / 3.50 + 1.0 / 3.20 - 1.0, epsilon = 1e-12);
        assert!(o > 0.0);
        assert!(overround(&[]).is_err());
        assert!(overround(&[2.0, 1.0]).is_err());
    }
}
