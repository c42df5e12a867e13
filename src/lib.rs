//! Football match probability engine.
//!
//! - [`engine::poisson`]: independent-Poisson scoreline grid and market
//!   probabilities (1X2, Over/Under 2.5, BTTS).
//! - [`engine::simulation`]: seeded Monte Carlo simulator used to cross-check
//!   the closed form and feed goal-distribution charts.
//! - [`engine::kelly`] and [`engine::value`]: edge, fractional-Kelly stake
//!   and confidence against bookmaker decimal odds.
//!
//! Goal rates come from upstream xG estimates; the engine never fetches or
//! stores anything.

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod report;

pub use error::{EngineError, Result};
