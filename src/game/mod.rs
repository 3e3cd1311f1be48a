//! Game rules: cards, the action catalogue, and the betting transition.

pub mod betting;
pub mod card;
pub mod ladder;

pub use betting::{apply_bet, turn_outcome, Phase, PlayerState, TurnOutcome};
pub use card::{deck_from_ranks, kuhn_deck, leduc_deck, Card};
pub use ladder::{Action, ActionLadder, BetSizing};
