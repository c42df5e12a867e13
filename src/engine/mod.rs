pub mod kelly;
pub mod poisson;
pub mod simulation;
pub mod value;

pub use kelly::{evaluate_value_bet, StakingConfig};
pub use poisson::{compute_market_probabilities, compute_scoreline_grid, scoreline_probability};
pub use simulation::{run_simulation, run_simulation_sharded};
pub use value::scan_value_bets;
