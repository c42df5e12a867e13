use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tracing::info;

use scoreline_engine::config::{Command, Config};
use scoreline_engine::engine::{
    compute_market_probabilities, compute_scoreline_grid, evaluate_value_bet, run_simulation_sharded,
};
use scoreline_engine::models::{EmpiricalStats, MarketProbabilities, ScorelineGrid};
use scoreline_engine::report::{build_report, MatchInput, MatchReport};

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    let seed = config.seed.unwrap_or_else(rand::random);
    if config.seed.is_none() {
        info!("No --seed given, using random seed {}", seed);
    }

    match &config.command {
        Command::Grid(rates) => {
            let grid = compute_scoreline_grid(rates.home_rate, rates.away_rate, config.max_goals)?;
            let markets = compute_market_probabilities(&grid);
            if config.json {
                #[derive(Serialize)]
                struct GridOutput<'a> {
                    grid: &'a ScorelineGrid,
                    markets: &'a MarketProbabilities,
                }
                print_json(&GridOutput {
                    grid: &grid,
                    markets: &markets,
                })?;
            } else {
                print_grid(&grid);
                print_markets(&markets);
            }
        }
        Command::Simulate(rates) => {
            let run = run_simulation_sharded(
                rates.home_rate,
                rates.away_rate,
                config.sims,
                config.shards,
                seed,
            )?;
            info!("Simulated {} matches", run.simulations.len());
            if config.json {
                print_json(&run.stats)?;
            } else {
                print_stats(&run.stats);
            }
        }
        Command::Value { prob, odds } => {
            let v = evaluate_value_bet(*prob, *odds, &config.staking())?;
            if config.json {
                print_json(&v)?;
            } else {
                println!(
                    "edge {:+.2}%  full Kelly {:.2}%  stake {:.2}%  confidence {}",
                    v.edge * 100.0,
                    v.raw_kelly * 100.0,
                    v.kelly_fraction * 100.0,
                    v.confidence
                );
            }
        }
        Command::Report { rates, label, odds } => {
            let input = MatchInput {
                label: label.clone(),
                home_rate: rates.home_rate,
                away_rate: rates.away_rate,
                odds: (*odds).into(),
            };
            let report = build_report(&input, &config.report_settings(), seed)?;
            if config.json {
                print_json(&report)?;
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_grid(grid: &ScorelineGrid) {
    print!("  H\\A");
    for a in 0..=grid.max_goals {
        print!("{:>7}", a);
    }
    println!();
    for (h, row) in grid.cells.iter().enumerate() {
        print!("{:>5}", h);
        for p in row {
            print!("{:>6.1}%", p * 100.0);
        }
        println!();
    }
    println!("grid mass {:.4}", grid.total());
}

fn print_markets(m: &MarketProbabilities) {
    println!(
        "1X2 {:.1}% / {:.1}% / {:.1}%   O2.5 {:.1}%  U2.5 {:.1}%   BTTS {:.1}%",
        m.home_win * 100.0,
        m.draw * 100.0,
        m.away_win * 100.0,
        m.over25 * 100.0,
        m.under25 * 100.0,
        m.btts * 100.0
    );
}

fn print_stats(s: &EmpiricalStats) {
    println!(
        "1X2 {:.1}% / {:.1}% / {:.1}%   O2.5 {:.1}%   BTTS {:.1}%   avg goals {:.2}-{:.2}",
        s.home_win_pct,
        s.draw_pct,
        s.away_win_pct,
        s.over25_pct,
        s.btts_pct,
        s.avg_home_goals,
        s.avg_away_goals
    );
    let fmt_dist = |d: &[f64]| {
        d.iter()
            .enumerate()
            .map(|(g, p)| format!("{g}:{p:.1}"))
            .collect::<Vec<_>>()
            .join(" ")
    };
    println!("home goals  {}", fmt_dist(&s.home_goal_dist[..]));
    println!("away goals  {}", fmt_dist(&s.away_goal_dist[..]));
    for f in &s.score_dist {
        println!("  {:>5}  {:>5.2}%", f.score, f.pct);
    }
}

fn print_report(r: &MatchReport) {
    println!("{}  (λ {:.2} - {:.2})", r.label, r.home_rate, r.away_rate);
    print_grid(&r.grid);
    print_markets(&r.markets);
    if let Some(c) = r.most_likely {
        println!(
            "most likely {}-{} ({:.1}%)",
            c.home_goals,
            c.away_goals,
            c.probability * 100.0
        );
    }
    println!("simulation over {} matches:", r.num_sims);
    print_stats(&r.simulation);
    if let Some(o) = r.overround_1x2 {
        println!("1X2 overround {:.2}%", o * 100.0);
    }
    if r.value_bets.is_empty() {
        println!("no value bets");
    }
    for b in &r.value_bets {
        println!(
            "{:<15} {:<6} prob {:.1}%  odds {:.2}  edge {:+.1}%  stake {:.1}%  {}",
            b.market,
            b.selection.label(),
            b.model_prob * 100.0,
            b.book_odds,
            b.edge * 100.0,
            b.kelly_stake * 100.0,
            b.confidence
        );
    }
}
