//! The action ladder: the universal catalogue of wager actions.
//!
//! Every decision point draws its legal actions from this fixed, ordered
//! catalogue. Value `0` is the pass/check/fold-equivalent; positive values
//! are bet sizes, interpreted per [`BetSizing`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cfr::error::SolverError;

/// How positive action values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetSizing {
    /// The value is the number of chips added this turn.
    Relative,
    /// The value is the total number of chips committed this betting round.
    Absolute,
}

/// A wager action: a display name plus an integer discriminator.
///
/// Value `0` is always the pass action. The catalogue order is the order
/// nodes store their per-action accumulators in, so it never changes once
/// a ladder is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Short display name, e.g. `k` or `r3`.
    pub name: String,
    /// The discriminator: `0` = pass, positive = bet size.
    pub value: u32,
}

impl Action {
    fn pass() -> Self {
        Action {
            name: "k".to_string(),
            value: 0,
        }
    }

    fn raise(value: u32) -> Self {
        Action {
            name: format!("r{}", value),
            value,
        }
    }

    /// Whether this is the pass/check/fold-equivalent action.
    pub fn is_pass(&self) -> bool {
        self.value == 0
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The ordered, fixed catalogue of actions the abstraction permits.
///
/// Built once from the chip configuration; the betting transition filters
/// legal subsets out of it per decision point.
#[derive(Debug, Clone)]
pub struct ActionLadder {
    actions: Vec<Action>,
    total_chips: u32,
    big_blind: u32,
    sizing: BetSizing,
}

impl ActionLadder {
    /// Build the catalogue for a stack of `total_chips` and the given sizing.
    ///
    /// Relative sizing yields `{0}` plus every increment in
    /// `big_blind ..= total_chips - 1`; absolute sizing yields `{0}` plus
    /// every round total in `2 * big_blind ..= total_chips`, where
    /// `total_chips` is the all-in total.
    ///
    /// When the blinds differ, the small blind's first decision is a call
    /// smaller than any bet the ranges above contain (`big_blind -
    /// small_blind` relative, the `big_blind` total absolute). That value is
    /// added to the catalogue so the exact call is always offerable; the
    /// legality rules never admit it as a raise.
    pub fn new(
        total_chips: u32,
        small_blind: u32,
        big_blind: u32,
        sizing: BetSizing,
    ) -> Result<Self, SolverError> {
        if small_blind == 0 || small_blind > big_blind {
            return Err(SolverError::Config(format!(
                "blinds must satisfy 0 < small ({}) <= big ({})",
                small_blind, big_blind
            )));
        }
        if total_chips <= big_blind {
            return Err(SolverError::Config(format!(
                "total chips ({}) must exceed the big blind ({})",
                total_chips, big_blind
            )));
        }

        let mut actions = vec![Action::pass()];
        match sizing {
            BetSizing::Relative => {
                if small_blind < big_blind {
                    actions.push(Action::raise(big_blind - small_blind));
                }
                actions.extend((big_blind..total_chips).map(Action::raise));
            }
            BetSizing::Absolute => {
                if small_blind < big_blind {
                    actions.push(Action::raise(big_blind));
                }
                actions.extend((2 * big_blind..=total_chips).map(Action::raise));
            }
        }

        Ok(Self {
            actions,
            total_chips,
            big_blind,
            sizing,
        })
    }

    /// The full ordered catalogue.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Look up a catalogue action by its value.
    pub fn action_by_value(&self, value: u32) -> Option<&Action> {
        self.actions.iter().find(|a| a.value == value)
    }

    /// The all-in stack size the ladder was built for.
    pub fn total_chips(&self) -> u32 {
        self.total_chips
    }

    /// The big blind used for minimum bet/raise rules.
    pub fn big_blind(&self) -> u32 {
        self.big_blind
    }

    /// How positive values are interpreted.
    pub fn sizing(&self) -> BetSizing {
        self.sizing
    }
}
