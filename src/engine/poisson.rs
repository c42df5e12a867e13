//! Independent-Poisson scoreline model.
//!
//! Each side's goal count is Poisson(λ) and the two counts are independent,
//! so P(h, a) = PMF(h; λ_home) · PMF(a; λ_away). Market probabilities are
//! plain reductions over a bounded grid of those cells.
//!
//! The PMF is evaluated in log space, ln PMF(k) = k·ln λ − λ − ln k!, with
//! ln k! accumulated as a running sum. No factorial is ever materialised, and
//! e^(−λ) is never formed on its own, so rates past ~745 (where e^(−λ)
//! underflows to zero) still give the right small non-zero cells.

use tracing::debug;

use crate::error::{check_rate, EngineError, Result};
use crate::models::{MarketProbabilities, ScorelineGrid};

/// Default grid bound: goals 0..=5 per side, 36 cells.
pub const DEFAULT_MAX_GOALS: u32 = 5;

/// Largest goal count accepted. 170! is the last factorial representable in
/// f64.
pub const MAX_GOALS_CAP: u32 = 170;

fn check_goals(name: &'static str, goals: u32) -> Result<()> {
    if goals > MAX_GOALS_CAP {
        return Err(EngineError::invalid(
            name,
            format!("goal count {goals} exceeds cap {MAX_GOALS_CAP}"),
        ));
    }
    Ok(())
}

/// Poisson PMF for k = 0..=max_k.
fn pmf_table(rate: f64, max_k: u32) -> Vec<f64> {
    let mut out = Vec::with_capacity(max_k as usize + 1);
    if rate == 0.0 {
        // Point mass at zero; ln 0 would poison the sum below.
        out.push(1.0);
        out.resize(max_k as usize + 1, 0.0);
        return out;
    }
    let ln_rate = rate.ln();
    let mut ln_fact = 0.0f64;
    for k in 0..=max_k {
        if k > 0 {
            ln_fact += (k as f64).ln();
        }
        out.push((k as f64 * ln_rate - rate - ln_fact).exp());
    }
    out
}

/// P(X = k) for X ~ Poisson(rate).
pub fn poisson_pmf(rate: f64, k: u32) -> Result<f64> {
    check_rate("rate", rate)?;
    check_goals("k", k)?;
    Ok(pmf_table(rate, k)[k as usize])
}

/// Probability of the exact scoreline `home_goals`-`away_goals`.
pub fn scoreline_probability(
    home_rate: f64,
    away_rate: f64,
    home_goals: u32,
    away_goals: u32,
) -> Result<f64> {
    check_rate("home_rate", home_rate)?;
    check_rate("away_rate", away_rate)?;
    check_goals("home_goals", home_goals)?;
    check_goals("away_goals", away_goals)?;
    Ok(poisson_pmf(home_rate, home_goals)? * poisson_pmf(away_rate, away_goals)?)
}

/// Full (max_goals + 1)² scoreline grid.
pub fn compute_scoreline_grid(home_rate: f64, away_rate: f64, max_goals: u32) -> Result<ScorelineGrid> {
    check_rate("home_rate", home_rate)?;
    check_rate("away_rate", away_rate)?;
    check_goals("max_goals", max_goals)?;

    let home = pmf_table(home_rate, max_goals);
    let away = pmf_table(away_rate, max_goals);
    let cells = home
        .iter()
        .map(|ph| away.iter().map(|pa| ph * pa).collect())
        .collect();

    let grid = ScorelineGrid { max_goals, cells };
    debug!(
        home_rate,
        away_rate,
        max_goals,
        mass = grid.total(),
        "Built scoreline grid"
    );
    Ok(grid)
}

/// Sum grid cells into 1X2, Over/Under 2.5 and BTTS probabilities.
///
/// Nothing is renormalised: the three 1X2 values add up to the grid mass, not
/// to 1.0.
pub fn compute_market_probabilities(grid: &ScorelineGrid) -> MarketProbabilities {
    let mut m = MarketProbabilities {
        home_win: 0.0,
        draw: 0.0,
        away_win: 0.0,
        over25: 0.0,
        under25: 0.0,
        btts: 0.0,
        btts_no: 0.0,
        total: 0.0,
    };

    for (h, a, p) in grid.iter() {
        if h > a {
            m.home_win += p;
        } else if h == a {
            m.draw += p;
        } else {
            m.away_win += p;
        }

        if h + a > 2 {
            m.over25 += p;
        } else {
            m.under25 += p;
        }

        if h >= 1 && a >= 1 {
            m.btts += p;
        } else {
            m.btts_no += p;
        }

        m.total += p;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Multiplicative recurrence, exact enough for small rates.
    fn reference_pmf(rate: f64, k: u32) -> f64 {
        let mut p = (-rate).exp();
        for i in 1..=k {
            p *= rate / i as f64;
        }
        p
    }

    #[test]
    fn pmf_known_values() {
        // Poisson(1.5): P(0) = e^-1.5, P(2) = 1.125 e^-1.5
        assert_relative_eq!(poisson_pmf(1.5, 0).unwrap(), (-1.5f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(
            poisson_pmf(1.5, 2).unwrap(),
            1.125 * (-1.5f64).exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn pmf_matches_reference_up_to_rate_10_and_k_20() {
        for rate in [0.1, 0.5, 1.0, 2.7, 5.0, 7.5, 10.0] {
            for k in 0..=20 {
                let got = poisson_pmf(rate, k).unwrap();
                let want = reference_pmf(rate, k);
                assert_relative_eq!(got, want, max_relative = 1e-6);
            }
        }
    }

    #[test]
    fn pmf_zero_rate_is_point_mass() {
        assert_eq!(poisson_pmf(0.0, 0).unwrap(), 1.0);
        assert_eq!(poisson_pmf(0.0, 3).unwrap(), 0.0);
    }

    #[test]
    fn pmf_large_k_stays_finite() {
        let p = poisson_pmf(10.0, MAX_GOALS_CAP).unwrap();
        assert!(p.is_finite());
        assert!(p >= 0.0);
    }

    #[test]
    fn pmf_survives_rates_where_exp_underflows() {
        // e^-800 is 0.0 in f64, but P(X = 170) for λ = 800 is about 1e-161.
        assert_eq!((-800.0f64).exp(), 0.0);
        let p170 = poisson_pmf(800.0, 170).unwrap();
        let p169 = poisson_pmf(800.0, 169).unwrap();
        assert!(p170 > 0.0 && p170.is_finite());
        assert_relative_eq!(p170 / p169, 800.0 / 170.0, max_relative = 1e-9);

        let g = compute_scoreline_grid(800.0, 1.0, MAX_GOALS_CAP).unwrap();
        assert!(g.get(MAX_GOALS_CAP, 0).unwrap() > 0.0);
    }

    #[test]
    fn goal_count_above_cap_rejected() {
        assert!(matches!(
            poisson_pmf(1.0, MAX_GOALS_CAP + 1),
            Err(EngineError::InvalidParameter { name: "k", .. })
        ));
        assert!(compute_scoreline_grid(1.0, 1.0, MAX_GOALS_CAP + 1).is_err());
    }

    #[test]
    fn scoreline_probability_is_product_of_marginals() {
        let p = scoreline_probability(1.8, 1.2, 2, 1).unwrap();
        let want = poisson_pmf(1.8, 2).unwrap() * poisson_pmf(1.2, 1).unwrap();
        assert_relative_eq!(p, want, epsilon = 1e-15);
    }

    #[test]
    fn scoreline_probability_symmetric_under_swap() {
        for (lh, la) in [(1.5, 1.2), (0.3, 2.9), (4.0, 0.7)] {
            for h in 0..6 {
                for a in 0..6 {
                    let p = scoreline_probability(lh, la, h, a).unwrap();
                    let q = scoreline_probability(la, lh, a, h).unwrap();
                    assert_relative_eq!(p, q, epsilon = 1e-15);
                }
            }
        }
    }

    #[test]
    fn scoreline_probability_rejects_bad_rates() {
        assert!(matches!(
            scoreline_probability(-1.0, 1.0, 0, 0),
            Err(EngineError::InvalidParameter { name: "home_rate", .. })
        ));
        assert!(matches!(
            scoreline_probability(1.0, f64::NAN, 0, 0),
            Err(EngineError::InvalidParameter { name: "away_rate", .. })
        ));
    }

    #[test]
    fn default_grid_has_36_cells() {
        let g = compute_scoreline_grid(1.82, 1.35, DEFAULT_MAX_GOALS).unwrap();
        assert_eq!(g.cells.len(), 6);
        assert!(g.cells.iter().all(|row| row.len() == 6));
        assert_relative_eq!(
            g.get(1, 1).unwrap(),
            scoreline_probability(1.82, 1.35, 1, 1).unwrap(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn truncated_grid_mass_is_below_one() {
        let g = compute_scoreline_grid(1.5, 1.2, 5).unwrap();
        let mass = g.total();
        assert!(mass < 1.0);
        assert!(mass > 0.98, "mass {mass:.5}");
        // A wider grid recovers most of the missing mass.
        let wide = compute_scoreline_grid(1.5, 1.2, 20).unwrap();
        assert_relative_eq!(wide.total(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn one_x_two_sums_to_grid_mass_across_rates() {
        let rates = [0.1, 0.4, 0.9, 1.3, 1.8, 2.5, 3.2, 4.1, 5.0];
        for &lh in &rates {
            for &la in &rates {
                let g = compute_scoreline_grid(lh, la, DEFAULT_MAX_GOALS).unwrap();
                let m = compute_market_probabilities(&g);
                let mass = g.total();
                assert_relative_eq!(m.home_win + m.draw + m.away_win, mass, epsilon = 1e-9);
                assert_relative_eq!(m.total, mass, epsilon = 1e-9);
                assert!(mass <= 1.0);
            }
        }
    }

    #[test]
    fn complementary_markets_partition_the_grid() {
        let g = compute_scoreline_grid(1.65, 1.58, DEFAULT_MAX_GOALS).unwrap();
        let m = compute_market_probabilities(&g);
        assert_relative_eq!(m.over25 + m.under25, m.total, epsilon = 1e-12);
        assert_relative_eq!(m.btts + m.btts_no, m.total, epsilon = 1e-12);
    }

    #[test]
    fn market_probabilities_known_case() {
        // Equal rates: home and away win are identical.
        let g = compute_scoreline_grid(1.4, 1.4, DEFAULT_MAX_GOALS).unwrap();
        let m = compute_market_probabilities(&g);
        assert_relative_eq!(m.home_win, m.away_win, epsilon = 1e-12);

        // Draw = sum of diagonal.
        let diag: f64 = (0..=5).map(|k| g.get(k, k).unwrap()).sum();
        assert_relative_eq!(m.draw, diag, epsilon = 1e-12);

        // Under 2.5 = cells (0,0) (1,0) (0,1) (2,0) (1,1) (0,2).
        let under: f64 = [(0, 0), (1, 0), (0, 1), (2, 0), (1, 1), (0, 2)]
            .iter()
            .map(|&(h, a)| g.get(h, a).unwrap())
            .sum();
        assert_relative_eq!(m.under25, under, epsilon = 1e-12);
    }

    #[test]
    fn zero_away_rate_gives_no_away_wins() {
        let g = compute_scoreline_grid(1.5, 0.0, DEFAULT_MAX_GOALS).unwrap();
        let m = compute_market_probabilities(&g);
        assert_eq!(m.away_win, 0.0);
        assert_eq!(m.btts, 0.0);
    }

    #[test]
    fn market_probabilities_are_reproducible() {
        let a = compute_market_probabilities(&compute_scoreline_grid(2.1, 0.95, 5).unwrap());
        let b = compute_market_probabilities(&compute_scoreline_grid(2.1, 0.95, 5).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn most_likely_scoreline_for_favourite() {
        let g = compute_scoreline_grid(2.1, 0.95, DEFAULT_MAX_GOALS).unwrap();
        let best = g.most_likely().unwrap();
        // Modes of Poisson(2.1) and Poisson(0.95) are 2 and 0.
        assert_eq!((best.home_goals, best.away_goals), (2, 0));
    }
}
