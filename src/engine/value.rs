use tracing::{debug, info};

use crate::error::{check_odds, Result};
use crate::models::{MarketOdds, MarketProbabilities, Selection, ValueBet};

use super::kelly::{evaluate_value_bet, StakingConfig};

/// Compare model probabilities against a book of prices and return every
/// selection whose edge is strictly above `min_edge`, best edge first.
///
/// Unpriced selections are ignored. Every quoted price is validated first, so
/// bad odds in the book are an error even on a selection that is then skipped.
/// A selection whose model probability is 0 or 1 (e.g. away win when the away
/// rate is zero) cannot be staked and is skipped.
pub fn scan_value_bets(
    match_label: &str,
    probs: &MarketProbabilities,
    odds: &MarketOdds,
    staking: &StakingConfig,
    min_edge: f64,
) -> Result<Vec<ValueBet>> {
    staking.validate()?;

    let mut bets = Vec::new();
    for selection in Selection::ALL {
        let Some(book_odds) = odds.price(selection) else {
            continue;
        };
        check_odds(book_odds)?;
        let model_prob = probs.probability(selection);
        if model_prob <= 0.0 || model_prob >= 1.0 {
            debug!(
                ?selection,
                model_prob, "Skipping selection with degenerate model probability"
            );
            continue;
        }

        let v = evaluate_value_bet(model_prob, book_odds, staking)?;
        if v.edge <= min_edge {
            continue;
        }
        bets.push(ValueBet {
            match_label: match_label.to_string(),
            market: selection.market().to_string(),
            selection,
            model_prob,
            book_odds,
            edge: v.edge,
            kelly_stake: v.kelly_fraction,
            confidence: v.confidence,
        });
    }

    bets.sort_by(|a, b| b.edge.total_cmp(&a.edge));

    if !bets.is_empty() {
        info!("{}: {} value bet(s) found", match_label, bets.len());
    }
    Ok(bets)
}
