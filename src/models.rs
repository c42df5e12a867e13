use serde::{Deserialize, Serialize};

/// Probability of every exact scoreline (h, a) with 0 <= h, a <= max_goals.
///
/// The grid is a truncation of an infinite Poisson product, so `total()` is
/// slightly below 1.0. The missing mass is never renormalised away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorelineGrid {
    pub max_goals: u32,
    /// `cells[h][a]` = P(home scores h, away scores a)
    pub cells: Vec<Vec<f64>>,
}

impl ScorelineGrid {
    /// Probability of an exact scoreline, or `None` outside the grid.
    pub fn get(&self, home_goals: u32, away_goals: u32) -> Option<f64> {
        self.cells
            .get(home_goals as usize)
            .and_then(|row| row.get(away_goals as usize))
            .copied()
    }

    /// Iterate `(home_goals, away_goals, probability)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
        self.cells.iter().enumerate().flat_map(|(h, row)| {
            row.iter()
                .enumerate()
                .map(move |(a, p)| (h as u32, a as u32, *p))
        })
    }

    /// Total probability mass held by the grid.
    pub fn total(&self) -> f64 {
        self.iter().map(|(_, _, p)| p).sum()
    }

    /// Highest-probability cell. Ties keep the first cell in row-major order.
    pub fn most_likely(&self) -> Option<ScoreCell> {
        let mut best: Option<ScoreCell> = None;
        for (h, a, p) in self.iter() {
            if best.map_or(true, |b| p > b.probability) {
                best = Some(ScoreCell {
                    home_goals: h,
                    away_goals: a,
                    probability: p,
                });
            }
        }
        best
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCell {
    pub home_goals: u32,
    pub away_goals: u32,
    pub probability: f64,
}

/// Aggregate market probabilities summed over a scoreline grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketProbabilities {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
    /// Total goals > 2.5
    pub over25: f64,
    /// Total goals <= 2
    pub under25: f64,
    /// Both teams score
    pub btts: f64,
    pub btts_no: f64,
    /// Grid mass the aggregates were summed from
    pub total: f64,
}

impl MarketProbabilities {
    pub fn probability(&self, selection: Selection) -> f64 {
        match selection {
            Selection::HomeWin => self.home_win,
            Selection::Draw => self.draw,
            Selection::AwayWin => self.away_win,
            Selection::Over25 => self.over25,
            Selection::Under25 => self.under25,
            Selection::BttsYes => self.btts,
            Selection::BttsNo => self.btts_no,
        }
    }
}

/// A priceable outcome in one of the supported markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    HomeWin,
    Draw,
    AwayWin,
    Over25,
    Under25,
    BttsYes,
    BttsNo,
}

impl Selection {
    pub const ALL: [Selection; 7] = [
        Selection::HomeWin,
        Selection::Draw,
        Selection::AwayWin,
        Selection::Over25,
        Selection::Under25,
        Selection::BttsYes,
        Selection::BttsNo,
    ];

    /// Market group name as shown in value-bet tables.
    pub fn market(&self) -> &'static str {
        match self {
            Selection::HomeWin | Selection::Draw | Selection::AwayWin => "1X2",
            Selection::Over25 | Selection::Under25 => "Over/Under 2.5",
            Selection::BttsYes | Selection::BttsNo => "BTTS",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Selection::HomeWin => "Home",
            Selection::Draw => "Draw",
            Selection::AwayWin => "Away",
            Selection::Over25 => "Over",
            Selection::Under25 => "Under",
            Selection::BttsYes => "Yes",
            Selection::BttsNo => "No",
        }
    }
}

/// Bookmaker decimal prices for one match. Unpriced selections are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketOdds {
    pub home_win: Option<f64>,
    pub draw: Option<f64>,
    pub away_win: Option<f64>,
    pub over25: Option<f64>,
    pub under25: Option<f64>,
    pub btts_yes: Option<f64>,
    pub btts_no: Option<f64>,
}

impl MarketOdds {
    pub fn price(&self, selection: Selection) -> Option<f64> {
        match selection {
            Selection::HomeWin => self.home_win,
            Selection::Draw => self.draw,
            Selection::AwayWin => self.away_win,
            Selection::Over25 => self.over25,
            Selection::Under25 => self.under25,
            Selection::BttsYes => self.btts_yes,
            Selection::BttsNo => self.btts_no,
        }
    }

    /// All three 1X2 prices, if the book quotes the full market.
    pub fn one_x_two(&self) -> Option<[f64; 3]> {
        Some([self.home_win?, self.draw?, self.away_win?])
    }
}

/// One sampled match result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedScore {
    pub home_goals: u32,
    pub away_goals: u32,
}

/// Frequency of one exact scoreline across a simulation run (percent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFrequency {
    /// "home-away", e.g. "1-0"
    pub score: String,
    pub pct: f64,
}

/// Empirical statistics tabulated from a simulation run. Percentages are of
/// the total number of draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmpiricalStats {
    pub home_win_pct: f64,
    pub draw_pct: f64,
    pub away_win_pct: f64,
    pub over25_pct: f64,
    pub btts_pct: f64,
    pub avg_home_goals: f64,
    pub avg_away_goals: f64,
    /// index = goals (0..8), value = frequency %. Draws with 8+ goals for the
    /// side are left out of this histogram but counted everywhere else.
    pub home_goal_dist: Vec<f64>,
    pub away_goal_dist: Vec<f64>,
    /// Top 15 scorelines by descending frequency
    pub score_dist: Vec<ScoreFrequency>,
}

/// Draw sequence plus its tabulated statistics. Held for one report only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub simulations: Vec<SimulatedScore>,
    pub stats: EmpiricalStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        f.write_str(s)
    }
}

/// Edge and stake for one (probability, price) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueAssessment {
    /// model_prob × odds − 1
    pub edge: f64,
    /// Full-Kelly fraction, may be negative
    pub raw_kelly: f64,
    /// Fractional Kelly stake actually recommended, never negative
    pub kelly_fraction: f64,
    pub confidence: Confidence,
}

/// A priced selection the model rates as value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBet {
    #[serde(rename = "match")]
    pub match_label: String,
    pub market: String,
    pub selection: Selection,
    pub model_prob: f64,
    pub book_odds: f64,
    pub edge: f64,
    pub kelly_stake: f64,
    pub confidence: Confidence,
}
