//! Timing market on when a consequence resolves.
//!
//! Two independent rules govern a bet. The multiplier is fixed at placement
//! from the predicted chapter's distance to the expected window. Win or loss
//! is decided at settlement by the predicted chapter's distance to the
//! actual resolution chapter, with a tolerance of one chapter. A far-off bet
//! at 1.5x can still win, and an in-window bet at 8x still needs to land
//! within one chapter.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consequence::{BetId, BetStatus, ConsequenceBet, ConsequenceId, MarketState};
use crate::error::{NclError, NclResult};
use crate::ledger::ConsequenceLedger;

/// Multiplier for an exact-chapter option.
pub const EXACT_CHAPTER_MULTIPLIER: f64 = 8.0;
/// Multiplier for the "resolves within the window" option.
pub const WITHIN_WINDOW_MULTIPLIER: f64 = 1.5;
/// Multiplier for the "resolves before the window" option.
pub const BEFORE_WINDOW_MULTIPLIER: f64 = 2.0;
/// Multiplier for the "escalates instead of resolving" option.
pub const ESCALATES_MULTIPLIER: f64 = 8.0;
/// A bet wins when it lands this many chapters from the actual resolution, or closer.
pub const WIN_TOLERANCE: u32 = 1;

/// One wagering option offered by a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarketOption {
    /// Resolves in exactly this chapter.
    ExactChapter {
        /// The chapter.
        chapter: u32,
    },
    /// Resolves somewhere inside the expected window.
    WithinWindow {
        /// First chapter of the window.
        min_chapter: u32,
        /// Last chapter of the window.
        max_chapter: u32,
    },
    /// Resolves before the window opens.
    BeforeWindow {
        /// First chapter of the window.
        min_chapter: u32,
    },
    /// Escalates instead of resolving.
    EscalatesInstead,
}

impl fmt::Display for MarketOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactChapter { chapter } => write!(f, "resolves in chapter {chapter}"),
            Self::WithinWindow {
                min_chapter,
                max_chapter,
            } => write!(f, "resolves within chapters {min_chapter}-{max_chapter}"),
            Self::BeforeWindow { min_chapter } => {
                write!(f, "resolves before chapter {min_chapter}")
            }
            Self::EscalatesInstead => write!(f, "escalates instead of resolving"),
        }
    }
}

/// An option with its payout multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketWindow {
    /// What the option pays out on.
    pub option: MarketOption,
    /// Payout multiplier.
    pub multiplier: f64,
}

/// The options offered for one consequence.
///
/// Bets are always placed on a chapter and priced by [`multiplier_for`], so
/// only the `ExactChapter` entries can be wagered on. `WithinWindow`,
/// `BeforeWindow` and `EscalatesInstead` are informational odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketListing {
    /// The consequence the market is on.
    pub consequence_id: ConsequenceId,
    /// Offered options.
    pub windows: Vec<MarketWindow>,
}

/// Outcome of settling a consequence's bets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Bets that won.
    pub won: Vec<BetId>,
    /// Bets that lost.
    pub lost: Vec<BetId>,
    /// Sum of winning payouts.
    pub total_payout: f64,
}

/// Multiplier for a bet predicting a chapter this many chapters outside the expected window.
pub fn multiplier_for(distance_outside_window: u32) -> f64 {
    match distance_outside_window {
        0 => 8.0,
        1 => 4.0,
        2 => 2.0,
        _ => 1.5,
    }
}

/// Whether a bet on `predicted` wins when the consequence resolved in `actual`.
pub fn bet_wins(predicted: u32, actual: u32) -> bool {
    predicted.abs_diff(actual) <= WIN_TOLERANCE
}

/// Opens markets, takes bets, and settles them. All state lives in the ledger.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsequenceBetMarket;

impl ConsequenceBetMarket {
    /// Open (or re-list) the market for an unresolved consequence.
    pub fn open_market(
        &self,
        ledger: &mut ConsequenceLedger,
        id: ConsequenceId,
    ) -> NclResult<MarketListing> {
        let c = ledger.get_mut(id)?;
        if c.is_resolved() {
            return Err(NclError::AlreadyResolved(id));
        }
        c.market = MarketState::Open;

        let w = c.window;
        let mut windows: Vec<MarketWindow> = (w.min_chapter..=w.max_chapter)
            .map(|chapter| MarketWindow {
                option: MarketOption::ExactChapter { chapter },
                multiplier: EXACT_CHAPTER_MULTIPLIER,
            })
            .collect();
        windows.push(MarketWindow {
            option: MarketOption::WithinWindow {
                min_chapter: w.min_chapter,
                max_chapter: w.max_chapter,
            },
            multiplier: WITHIN_WINDOW_MULTIPLIER,
        });
        windows.push(MarketWindow {
            option: MarketOption::BeforeWindow {
                min_chapter: w.min_chapter,
            },
            multiplier: BEFORE_WINDOW_MULTIPLIER,
        });
        windows.push(MarketWindow {
            option: MarketOption::EscalatesInstead,
            multiplier: ESCALATES_MULTIPLIER,
        });

        tracing::debug!(consequence = %id, options = windows.len(), "opened market");
        Ok(MarketListing {
            consequence_id: id,
            windows,
        })
    }

    /// Place a bet predicting the chapter `id` resolves in.
    pub fn place_bet(
        &self,
        ledger: &mut ConsequenceLedger,
        id: ConsequenceId,
        bettor: &str,
        predicted_chapter: u32,
        amount: f64,
    ) -> NclResult<ConsequenceBet> {
        let bettor = bettor.trim();
        if bettor.is_empty() {
            return Err(NclError::InvalidInput("bettor must not be empty".to_string()));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(NclError::InvalidInput(format!(
                "stake must be a positive amount, got {amount}"
            )));
        }

        let c = ledger.get_mut(id)?;
        if c.is_resolved() {
            return Err(NclError::AlreadyResolved(id));
        }
        if c.market != MarketState::Open {
            return Err(NclError::MarketNotOpen(id));
        }
        if predicted_chapter <= c.chapter_origin {
            return Err(NclError::InvalidInput(format!(
                "predicted chapter {predicted_chapter} is not after origin chapter {}",
                c.chapter_origin
            )));
        }

        let multiplier = multiplier_for(c.window.distance_outside(predicted_chapter));
        let bet = ConsequenceBet::new(bettor, predicted_chapter, amount, multiplier);
        c.bets.push(bet.clone());
        tracing::debug!(
            consequence = %id,
            bet = %bet.id,
            predicted_chapter,
            amount,
            multiplier,
            "placed bet"
        );
        Ok(bet)
    }

    /// Settle every open bet on a resolved consequence.
    ///
    /// Only open bets are touched, so running this again after a partial
    /// failure settles what is left and pays nothing twice.
    pub fn settle_bets(
        &self,
        ledger: &mut ConsequenceLedger,
        id: ConsequenceId,
        actual_chapter: u32,
    ) -> NclResult<Settlement> {
        let c = ledger.get_mut(id)?;
        let Some(resolved_in) = c.actual_resolution_chapter.filter(|_| c.is_resolved()) else {
            return Err(NclError::InvalidState(format!(
                "consequence {id} must be resolved before its bets settle"
            )));
        };
        if resolved_in != actual_chapter {
            return Err(NclError::InvalidInput(format!(
                "consequence {id} resolved in chapter {resolved_in}, not {actual_chapter}"
            )));
        }

        let mut settlement = Settlement::default();
        for bet in c.bets.iter_mut().filter(|b| b.status == BetStatus::Open) {
            if bet_wins(bet.predicted_chapter, actual_chapter) {
                let payout = bet.amount * bet.multiplier;
                bet.status = BetStatus::Won;
                bet.payout = Some(payout);
                settlement.won.push(bet.id);
                settlement.total_payout += payout;
            } else {
                bet.status = BetStatus::Lost;
                bet.payout = Some(0.0);
                settlement.lost.push(bet.id);
            }
        }
        c.market = MarketState::Settled;

        tracing::info!(
            consequence = %id,
            won = settlement.won.len(),
            lost = settlement.lost.len(),
            total_payout = settlement.total_payout,
            "settled bets"
        );
        Ok(settlement)
    }
}
