use clap::{Args, Parser, Subcommand};

use crate::engine::kelly::StakingConfig;
use crate::engine::poisson::MAX_GOALS_CAP;
use crate::models::MarketOdds;
use crate::report::ReportSettings;

/// Poisson scoreline model, Monte Carlo cross-check and fractional-Kelly
/// value-bet calculator
#[derive(Parser, Debug, Clone)]
#[command(name = "scoreline-engine", version, about)]
pub struct Config {
    /// Fractional Kelly multiplier applied to the full-Kelly stake (0.0–1.0)
    #[arg(long, env = "KELLY_FRACTION", default_value = "0.25", global = true)]
    pub kelly_fraction: f64,

    /// Minimum edge for "high" confidence (e.g. 0.12 = 12%)
    #[arg(long, env = "HIGH_EDGE_THRESHOLD", default_value = "0.12", global = true)]
    pub high_threshold: f64,

    /// Minimum edge for "medium" confidence
    #[arg(long, env = "MEDIUM_EDGE_THRESHOLD", default_value = "0.06", global = true)]
    pub medium_threshold: f64,

    /// Only report value bets whose edge is strictly above this
    #[arg(long, env = "MIN_EDGE", default_value = "0.0", global = true)]
    pub min_edge: f64,

    /// Scoreline grid covers 0..=max_goals goals per side
    #[arg(long, env = "MAX_GOALS", default_value = "5", global = true)]
    pub max_goals: u32,

    /// Number of Monte Carlo draws
    #[arg(long, env = "NUM_SIMS", default_value = "10000", global = true)]
    pub sims: usize,

    /// Seed for the simulation RNG (OS entropy when absent)
    #[arg(long, env = "SIM_SEED", global = true)]
    pub seed: Option<u64>,

    /// Parallel simulation shards for `simulate` and `report` (1 = single-threaded)
    #[arg(long, env = "SIM_SHARDS", default_value = "1", global = true)]
    pub shards: usize,

    /// Print JSON instead of a text summary
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Closed-form scoreline grid and market probabilities
    Grid(Rates),
    /// Monte Carlo simulation of the match
    Simulate(Rates),
    /// Edge, Kelly stake and confidence for one price
    Value {
        /// Model probability of the selection, in (0, 1)
        #[arg(long, allow_hyphen_values = true)]
        prob: f64,
        /// Bookmaker decimal odds, > 1.0
        #[arg(long, allow_hyphen_values = true)]
        odds: f64,
    },
    /// Full match report: grid, markets, simulation and value scan
    Report {
        #[command(flatten)]
        rates: Rates,
        /// Fixture label used in value-bet rows
        #[arg(long, default_value = "Home vs Away")]
        label: String,
        #[command(flatten)]
        odds: OddsArgs,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct Rates {
    /// Expected home goals (λ_home)
    #[arg(long, allow_hyphen_values = true)]
    pub home_rate: f64,
    /// Expected away goals (λ_away)
    #[arg(long, allow_hyphen_values = true)]
    pub away_rate: f64,
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OddsArgs {
    #[arg(long)]
    pub home_odds: Option<f64>,
    #[arg(long)]
    pub draw_odds: Option<f64>,
    #[arg(long)]
    pub away_odds: Option<f64>,
    /// Over 2.5 goals
    #[arg(long)]
    pub over_odds: Option<f64>,
    /// Under 2.5 goals
    #[arg(long)]
    pub under_odds: Option<f64>,
    #[arg(long)]
    pub btts_yes_odds: Option<f64>,
    #[arg(long)]
    pub btts_no_odds: Option<f64>,
}

impl From<OddsArgs> for MarketOdds {
    fn from(a: OddsArgs) -> Self {
        MarketOdds {
            home_win: a.home_odds,
            draw: a.draw_odds,
            away_win: a.away_odds,
            over25: a.over_odds,
            under25: a.under_odds,
            btts_yes: a.btts_yes_odds,
            btts_no: a.btts_no_odds,
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.kelly_fraction > 0.0 && self.kelly_fraction <= 1.0) {
            anyhow::bail!("kelly_fraction must be in (0.0, 1.0]");
        }
        if !self.high_threshold.is_finite() || !self.medium_threshold.is_finite() {
            anyhow::bail!("confidence thresholds must be finite");
        }
        if self.medium_threshold > self.high_threshold {
            anyhow::bail!("medium_threshold must not exceed high_threshold");
        }
        if !self.min_edge.is_finite() {
            anyhow::bail!("min_edge must be finite");
        }
        if self.max_goals > MAX_GOALS_CAP {
            anyhow::bail!("max_goals must be at most {}", MAX_GOALS_CAP);
        }
        if self.sims == 0 {
            anyhow::bail!("sims must be positive");
        }
        if self.shards == 0 {
            anyhow::bail!("shards must be at least 1");
        }
        Ok(())
    }

    pub fn staking(&self) -> StakingConfig {
        StakingConfig {
            kelly_multiplier: self.kelly_fraction,
            high_threshold: self.high_threshold,
            medium_threshold: self.medium_threshold,
        }
    }

    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            max_goals: self.max_goals,
            num_sims: self.sims,
            shards: self.shards,
            staking: self.staking(),
            min_edge: self.min_edge,
        }
    }
}
