use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::kelly::{overround, StakingConfig};
use crate::engine::poisson::{compute_market_probabilities, compute_scoreline_grid};
use crate::engine::simulation::run_simulation_sharded;
use crate::engine::value::scan_value_bets;
use crate::error::Result;
use crate::models::{EmpiricalStats, MarketOdds, MarketProbabilities, ScoreCell, ScorelineGrid, ValueBet};

/// Everything the engine needs to know about one fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInput {
    pub label: String,
    pub home_rate: f64,
    pub away_rate: f64,
    #[serde(default)]
    pub odds: MarketOdds,
}

/// Engine settings shared by every report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportSettings {
    pub max_goals: u32,
    pub num_sims: usize,
    /// Parallel simulation workers. Does not change the simulated draws.
    pub shards: usize,
    pub staking: StakingConfig,
    pub min_edge: f64,
}

/// Per-match output consumed by dashboards: closed-form grid and markets,
/// the simulation cross-check and any value bets against the supplied book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub label: String,
    pub generated_at: DateTime<Utc>,
    pub home_rate: f64,
    pub away_rate: f64,
    pub max_goals: u32,
    pub grid: ScorelineGrid,
    pub markets: MarketProbabilities,
    pub most_likely: Option<ScoreCell>,
    pub num_sims: usize,
    pub simulation: EmpiricalStats,
    /// Bookmaker margin on the 1X2 market, when all three prices are given
    pub overround_1x2: Option<f64>,
    pub value_bets: Vec<ValueBet>,
}

/// Build the full report for one fixture. The simulation is seeded with
/// `seed`, so equal seeds give equal reports whatever `settings.shards` is.
pub fn build_report(input: &MatchInput, settings: &ReportSettings, seed: u64) -> Result<MatchReport> {
    let grid = compute_scoreline_grid(input.home_rate, input.away_rate, settings.max_goals)?;
    let markets = compute_market_probabilities(&grid);
    let most_likely = grid.most_likely();

    let run = run_simulation_sharded(
        input.home_rate,
        input.away_rate,
        settings.num_sims,
        settings.shards,
        seed,
    )?;

    let overround_1x2 = input.odds.one_x_two().map(|o| overround(&o)).transpose()?;
    let value_bets = scan_value_bets(
        &input.label,
        &markets,
        &input.odds,
        &settings.staking,
        settings.min_edge,
    )?;

    info!(
        "{}: model 1X2 {:.1}/{:.1}/{:.1}%, simulated {:.1}/{:.1}/{:.1}% over {} runs",
        input.label,
        markets.home_win * 100.0,
        markets.draw * 100.0,
        markets.away_win * 100.0,
        run.stats.home_win_pct,
        run.stats.draw_pct,
        run.stats.away_win_pct,
        settings.num_sims
    );

    Ok(MatchReport {
        label: input.label.clone(),
        generated_at: Utc::now(),
        home_rate: input.home_rate,
        away_rate: input.away_rate,
        max_goals: settings.max_goals,
        grid,
        markets,
        most_likely,
        num_sims: settings.num_sims,
        simulation: run.stats,
        overround_1x2,
        value_bets,
    })
}
