//! Monte Carlo simulation of match scorelines.
//!
//! Goals for each side are drawn independently from Poisson(λ) with Knuth's
//! multiplication method. The random source is always passed in by the caller,
//! so a seeded `StdRng` reproduces a run exactly.
//!
//! All aggregates are order-independent reductions held in a
//! [`SimulationTally`], which lets a run be split into shards and merged back.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{check_rate, EngineError, Result};
use crate::models::{EmpiricalStats, ScoreFrequency, SimulatedScore, SimulationRun};

pub const DEFAULT_NUM_SIMS: usize = 10_000;

/// Per-side goal histogram covers 0..MAX_TRACKED_GOALS. Higher counts are
/// left out of the histogram only.
pub const MAX_TRACKED_GOALS: usize = 8;

/// Number of scorelines kept in `score_dist`.
pub const TOP_SCORELINES: usize = 15;

/// Draw one Poisson(rate) variate.
///
/// L = e^(−λ); multiply uniforms in [0, 1) until the product drops to L or
/// below; the number of multiplications minus one is the sample. Cost is
/// linear in λ, which is fine for football goal rates.
pub fn sample_poisson<R: Rng + ?Sized>(rng: &mut R, rate: f64) -> u32 {
    let l = (-rate).exp();
    let mut k = 0u32;
    let mut p = 1.0f64;
    loop {
        k += 1;
        p *= rng.gen::<f64>();
        if p <= l {
            return k - 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScoreCount {
    count: u64,
    /// Global draw index of the first occurrence, for stable tie-breaks
    first_seen: usize,
}

/// Running counters for a simulation run or one shard of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationTally {
    trials: u64,
    home_wins: u64,
    draws: u64,
    away_wins: u64,
    over25: u64,
    btts: u64,
    total_home_goals: u64,
    total_away_goals: u64,
    home_hist: [u64; MAX_TRACKED_GOALS],
    away_hist: [u64; MAX_TRACKED_GOALS],
    scores: HashMap<(u32, u32), ScoreCount>,
}

impl SimulationTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    /// Count one draw. `index` is the draw's position in the full run.
    pub fn record(&mut self, index: usize, home: u32, away: u32) {
        self.trials += 1;

        if home > away {
            self.home_wins += 1;
        } else if home == away {
            self.draws += 1;
        } else {
            self.away_wins += 1;
        }
        if home + away > 2 {
            self.over25 += 1;
        }
        if home > 0 && away > 0 {
            self.btts += 1;
        }

        self.total_home_goals += u64::from(home);
        self.total_away_goals += u64::from(away);

        if (home as usize) < MAX_TRACKED_GOALS {
            self.home_hist[home as usize] += 1;
        }
        if (away as usize) < MAX_TRACKED_GOALS {
            self.away_hist[away as usize] += 1;
        }

        self.scores
            .entry((home, away))
            .and_modify(|s| {
                s.count += 1;
                s.first_seen = s.first_seen.min(index);
            })
            .or_insert(ScoreCount {
                count: 1,
                first_seen: index,
            });
    }

    /// Fold another tally into this one. Order of merging does not matter.
    pub fn merge(&mut self, other: SimulationTally) {
        self.trials += other.trials;
        self.home_wins += other.home_wins;
        self.draws += other.draws;
        self.away_wins += other.away_wins;
        self.over25 += other.over25;
        self.btts += other.btts;
        self.total_home_goals += other.total_home_goals;
        self.total_away_goals += other.total_away_goals;
        for i in 0..MAX_TRACKED_GOALS {
            self.home_hist[i] += other.home_hist[i];
            self.away_hist[i] += other.away_hist[i];
        }
        for (key, theirs) in other.scores {
            self.scores
                .entry(key)
                .and_modify(|s| {
                    s.count += theirs.count;
                    s.first_seen = s.first_seen.min(theirs.first_seen);
                })
                .or_insert(theirs);
        }
    }

    /// Convert counters to percentages of the trial count and keep the top
    /// scorelines. Scorelines past the cut are dropped, not pooled.
    pub fn finish(&self) -> EmpiricalStats {
        let n = self.trials as f64;
        let pct = |c: u64| {
            if self.trials == 0 {
                0.0
            } else {
                (c as f64 / n) * 100.0
            }
        };
        let avg = |total: u64| {
            if self.trials == 0 {
                0.0
            } else {
                total as f64 / n
            }
        };

        let mut ranked: Vec<(&(u32, u32), &ScoreCount)> = self.scores.iter().collect();
        ranked.sort_by(|a, b| {
            b.1.count
                .cmp(&a.1.count)
                .then(a.1.first_seen.cmp(&b.1.first_seen))
        });
        let score_dist = ranked
            .into_iter()
            .take(TOP_SCORELINES)
            .map(|(&(h, a), s)| ScoreFrequency {
                score: format!("{h}-{a}"),
                pct: pct(s.count),
            })
            .collect();

        EmpiricalStats {
            home_win_pct: pct(self.home_wins),
            draw_pct: pct(self.draws),
            away_win_pct: pct(self.away_wins),
            over25_pct: pct(self.over25),
            btts_pct: pct(self.btts),
            avg_home_goals: avg(self.total_home_goals),
            avg_away_goals: avg(self.total_away_goals),
            home_goal_dist: self.home_hist.iter().map(|&c| pct(c)).collect(),
            away_goal_dist: self.away_hist.iter().map(|&c| pct(c)).collect(),
            score_dist,
        }
    }
}

fn check_sim_inputs(home_rate: f64, away_rate: f64, num_sims: usize) -> Result<()> {
    check_rate("home_rate", home_rate)?;
    check_rate("away_rate", away_rate)?;
    if num_sims == 0 {
        return Err(EngineError::invalid("num_sims", "must be a positive integer"));
    }
    Ok(())
}

/// Draws for indices `start..start + count`, appended to `out`.
fn simulate_range<R: Rng + ?Sized>(
    rng: &mut R,
    home_rate: f64,
    away_rate: f64,
    start: usize,
    count: usize,
    out: &mut Vec<SimulatedScore>,
) -> SimulationTally {
    let mut tally = SimulationTally::new();
    for i in start..start + count {
        let home_goals = sample_poisson(rng, home_rate);
        let away_goals = sample_poisson(rng, away_rate);
        out.push(SimulatedScore {
            home_goals,
            away_goals,
        });
        tally.record(i, home_goals, away_goals);
    }
    tally
}

/// Simulate `num_sims` independent matches on a single thread.
pub fn run_simulation<R: Rng + ?Sized>(
    home_rate: f64,
    away_rate: f64,
    num_sims: usize,
    rng: &mut R,
) -> Result<SimulationRun> {
    check_sim_inputs(home_rate, away_rate, num_sims)?;

    let mut simulations = Vec::with_capacity(num_sims);
    let tally = simulate_range(rng, home_rate, away_rate, 0, num_sims, &mut simulations);
    let stats = tally.finish();

    debug!(
        home_rate,
        away_rate,
        num_sims,
        home_win_pct = stats.home_win_pct,
        draw_pct = stats.draw_pct,
        away_win_pct = stats.away_win_pct,
        "Simulation finished"
    );
    Ok(SimulationRun { simulations, stats })
}

/// Draws per independently seeded block in a sharded run.
pub const SIM_BLOCK_SIZE: usize = 1024;

/// Seed of block `block` in a run seeded with `seed`. Block 0 uses `seed`.
fn block_seed(seed: u64, block: usize) -> u64 {
    seed ^ (block as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Simulate across `shards` parallel workers.
///
/// Draws are cut into blocks of [`SIM_BLOCK_SIZE`], each with its own
/// `StdRng` derived from `seed` and the block index. Shards take contiguous
/// runs of blocks, so the draw sequence (and every statistic) depends only on
/// `(seed, num_sims)`, never on the shard count.
pub fn run_simulation_sharded(
    home_rate: f64,
    away_rate: f64,
    num_sims: usize,
    shards: usize,
    seed: u64,
) -> Result<SimulationRun> {
    check_sim_inputs(home_rate, away_rate, num_sims)?;
    if shards == 0 {
        return Err(EngineError::invalid("shards", "must be at least 1"));
    }

    let blocks = num_sims.div_ceil(SIM_BLOCK_SIZE);
    let base = blocks / shards;
    let rem = blocks % shards;
    let mut plan = Vec::with_capacity(shards);
    let mut first_block = 0usize;
    for i in 0..shards {
        let count = base + usize::from(i < rem);
        plan.push(first_block..first_block + count);
        first_block += count;
    }

    let parts: Vec<(Vec<SimulatedScore>, SimulationTally)> = plan
        .into_par_iter()
        .map(|block_range| {
            let mut draws = Vec::new();
            let mut tally = SimulationTally::new();
            for block in block_range {
                let start = block * SIM_BLOCK_SIZE;
                let count = SIM_BLOCK_SIZE.min(num_sims - start);
                let mut rng = StdRng::seed_from_u64(block_seed(seed, block));
                tally.merge(simulate_range(
                    &mut rng, home_rate, away_rate, start, count, &mut draws,
                ));
            }
            (draws, tally)
        })
        .collect();

    let mut simulations = Vec::with_capacity(num_sims);
    let mut tally = SimulationTally::new();
    for (draws, part) in parts {
        simulations.extend(draws);
        tally.merge(part);
    }
    let stats = tally.finish();

    debug!(
        home_rate,
        away_rate,
        num_sims,
        shards,
        home_win_pct = stats.home_win_pct,
        "Sharded simulation finished"
    );
    Ok(SimulationRun { simulations, stats })
}
