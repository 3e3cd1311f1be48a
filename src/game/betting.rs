//! The betting-state transition function.
//!
//! [`turn_outcome`] is the single source of truth for terminal detection:
//! it either returns the acting player's signed payoff, or the legal action
//! subset filtered from the ladder, plus a flag telling the caller the
//! current betting phase just closed.

use crate::cfr::error::SolverError;
use crate::game::card::Card;
use crate::game::ladder::{Action, ActionLadder, BetSizing};

/// A betting phase of the hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// First betting round, private cards only.
    Preflop,
    /// Second betting round, after the public card is revealed.
    Flop,
}

/// Per-player committed-chip state, threaded by value through the traversal.
///
/// Transitions never mutate in place: [`apply_bet`] returns a fresh pair, so
/// the recursion stays side-effect-free with respect to betting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerState {
    /// Chips still behind. Never negative; going below zero is a fatal bug.
    pub chips: i64,
    /// Chips added by this player's most recent action.
    pub turn_bet: i64,
    /// Total chips this player has committed this hand.
    pub round_bet: i64,
    /// Whether the player has acted in the current phase.
    pub played_current_phase: bool,
}

impl PlayerState {
    /// A player seated with `total_chips` who has just posted `blind`.
    pub fn at_blind(total_chips: u32, blind: u32) -> Self {
        Self {
            chips: i64::from(total_chips) - i64::from(blind),
            turn_bet: i64::from(blind),
            round_bet: i64::from(blind),
            played_current_phase: false,
        }
    }
}

/// What the acting player faces at this decision point.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The hand is over; the acting player receives this signed payoff.
    Terminal(i64),
    /// The hand continues with this legal action subset.
    Decision {
        /// Legal actions, in ladder order.
        actions: Vec<Action>,
        /// True when this action closes the preflop and opens the flop.
        closes_phase: bool,
    },
}

fn half(value: i64) -> i64 {
    value / 2
}

/// Showdown sign for the acting player: a public-card pair beats any
/// non-paired hand, otherwise plain rank comparison, tie pays nothing.
fn showdown_sign(cards: &[Card], player: usize, opponent: usize, public: Option<Card>) -> i64 {
    if let Some(board) = public {
        if cards[player] == board {
            return 1;
        }
        if cards[opponent] == board {
            return -1;
        }
    }
    match cards[player].cmp(&cards[opponent]) {
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
    }
}

fn is_action_legal(
    action: &Action,
    relative_bet: i64,
    my_chips: i64,
    my_previous_bets: i64,
    ladder: &ActionLadder,
) -> bool {
    assert!(relative_bet >= 0, "call amount must be non-negative");
    let value = i64::from(action.value);
    let big_blind = i64::from(ladder.big_blind());
    let all_in_total = i64::from(ladder.total_chips());
    let is_pass_or_all_in = value == 0 || value == all_in_total;

    if my_chips == 0 {
        return value == 0;
    }

    match ladder.sizing() {
        BetSizing::Relative => {
            value == 0
                || value == relative_bet
                || value == my_chips
                || (value >= big_blind.max(2 * relative_bet) && value <= my_chips)
        }
        BetSizing::Absolute => {
            if relative_bet == 0 {
                is_pass_or_all_in || value >= big_blind + my_previous_bets
            } else {
                let call_total = my_previous_bets + relative_bet;
                assert!(call_total >= big_blind + my_previous_bets);
                is_pass_or_all_in
                    || value == call_total
                    || value >= my_previous_bets + 2 * relative_bet
            }
        }
    }
}

fn legal_actions(
    relative_bet: i64,
    my_chips: i64,
    my_previous_bets: i64,
    ladder: &ActionLadder,
) -> Vec<Action> {
    ladder
        .actions()
        .iter()
        .filter(|a| is_action_legal(a, relative_bet, my_chips, my_previous_bets, ladder))
        .cloned()
        .collect()
}

/// Resolve the acting player's decision point.
///
/// Returns the terminal payoff if the hand is over (fold or showdown),
/// otherwise the legal action subset and whether the phase just closed.
/// `rounds` is 1 for Kuhn-style play and 2 for Leduc-style play with a
/// public card (`cards[2]`).
pub fn turn_outcome(
    cards: &[Card],
    player: usize,
    opponent: usize,
    players: &[PlayerState; 2],
    phase: Phase,
    rounds: u8,
    ladder: &ActionLadder,
    history: &str,
) -> Result<TurnOutcome, SolverError> {
    let me = players[player];
    let opp = players[opponent];
    let to_continue = opp.round_bet - me.round_bet;

    if to_continue < 0 {
        // The opponent's last action left them short: they folded. The pot
        // built before the fold goes to the acting player.
        let pot = me.round_bet + opp.round_bet + to_continue;
        return Ok(TurnOutcome::Terminal(half(pot)));
    }

    let decide = |actions: Vec<Action>, closes_phase: bool| {
        if actions.is_empty() {
            Err(SolverError::NoLegalActions {
                history: history.to_string(),
            })
        } else {
            Ok(TurnOutcome::Decision {
                actions,
                closes_phase,
            })
        }
    };

    if !me.played_current_phase && to_continue == 0 {
        return decide(legal_actions(0, me.chips, me.round_bet, ladder), false);
    }

    if me.played_current_phase && to_continue == 0 {
        let final_round = phase == Phase::Flop || rounds == 1;
        if final_round {
            // Showdown.
            assert_eq!(
                me.round_bet, opp.round_bet,
                "pot mismatch at showdown, history {:?}",
                history
            );
            let pot = me.round_bet + opp.round_bet;
            let public = if rounds == 2 { Some(cards[2]) } else { None };
            let sign = showdown_sign(cards, player, opponent, public);
            return Ok(TurnOutcome::Terminal(half(pot) * sign));
        }
        if player == 1 {
            // If player 1 closed the preflop, player 0 would not open the
            // flop. Force a filler pass so the parity works out.
            return decide(legal_actions(0, 0, me.round_bet, ladder), false);
        }
        assert_eq!(me.round_bet, opp.round_bet);
        return decide(legal_actions(0, me.chips, me.round_bet, ladder), true);
    }

    // to_continue > 0: facing a bet.
    decide(legal_actions(to_continue, me.chips, me.round_bet, ladder), false)
}

/// Commit a wager: returns the updated state pair and the history label for
/// the action (`-` filler, `f` fold, `k` check, `c` call, `r<n>` raise).
pub fn apply_bet(
    player: usize,
    players: &[PlayerState; 2],
    action_value: u32,
    closes_phase: bool,
    sizing: BetSizing,
    num_legal_actions: usize,
) -> ([PlayerState; 2], String) {
    let opponent = 1 - player;
    let mut me = players[player];
    let mut opp = players[opponent];
    let value = i64::from(action_value);

    let is_filler = num_legal_actions == 1;
    if is_filler {
        assert_eq!(value, 0, "a lone legal action must be the pass");
    }

    match sizing {
        BetSizing::Relative => {
            me.chips -= value;
            me.turn_bet = value;
            me.round_bet += value;
        }
        BetSizing::Absolute => {
            let target = if value == 0 { me.round_bet } else { value };
            me.chips -= target - me.round_bet;
            me.turn_bet = target - me.round_bet;
            me.round_bet = target;
        }
    }

    me.played_current_phase = true;
    if closes_phase {
        // The next phase's first-to-act player gets a fresh turn.
        opp.played_current_phase = false;
    }
    assert!(me.chips >= 0, "player {} chip count went negative", player);

    let is_fold = value == 0 && me.round_bet < opp.round_bet;
    let is_call = value > 0 && me.round_bet == opp.round_bet;
    let label = if is_filler {
        "-".to_string()
    } else if is_fold {
        "f".to_string()
    } else if value == 0 {
        "k".to_string()
    } else if is_call {
        "c".to_string()
    } else {
        format!("r{}", action_value)
    };

    let mut next = *players;
    next[player] = me;
    next[opponent] = opp;
    (next, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::{kuhn_deck, leduc_deck};

    fn kuhn_ladder() -> ActionLadder {
        ActionLadder::new(2, 1, 1, BetSizing::Relative).unwrap()
    }

    fn players_at_blind() -> [PlayerState; 2] {
        [PlayerState::at_blind(2, 1), PlayerState::at_blind(2, 1)]
    }

    #[test]
    fn test_opening_actions() {
        let ladder = kuhn_ladder();
        let cards = kuhn_deck();
        let players = players_at_blind();

        let outcome =
            turn_outcome(&cards, 0, 1, &players, Phase::Preflop, 1, &ladder, "").unwrap();
        match outcome {
            TurnOutcome::Decision {
                actions,
                closes_phase,
            } => {
                let values: Vec<u32> = actions.iter().map(|a| a.value).collect();
                assert_eq!(values, vec![0, 1]);
                assert!(!closes_phase);
            }
            other => panic!("expected a decision, got {:?}", other),
        }
    }

    #[test]
    fn test_fold_pays_the_pot_built_before_the_fold() {
        // Player 0 checked, player 1 bet 1, player 0 passed (folded).
        // Player 1's next turn must see a terminal +1.
        let ladder = kuhn_ladder();
        let cards = vec![Card(2), Card(3), Card(1)];
        let mut players = players_at_blind();

        let (next, label) = apply_bet(0, &players, 0, false, BetSizing::Relative, 2);
        players = next;
        assert_eq!(label, "k");

        let (next, label) = apply_bet(1, &players, 1, false, BetSizing::Relative, 2);
        players = next;
        assert_eq!(label, "r1");

        let (next, label) = apply_bet(0, &players, 0, false, BetSizing::Relative, 2);
        players = next;
        assert_eq!(label, "f");

        let outcome =
            turn_outcome(&cards, 1, 0, &players, Phase::Preflop, 1, &ladder, "kr1f").unwrap();
        assert_eq!(outcome, TurnOutcome::Terminal(1));
    }

    #[test]
    fn test_fold_reward_ignores_card_ranks() {
        // Same line, but the folder held the stronger card.
        let ladder = kuhn_ladder();
        let cards = vec![Card(3), Card(1), Card(2)];
        let mut players = players_at_blind();
        players = apply_bet(0, &players, 0, false, BetSizing::Relative, 2).0;
        players = apply_bet(1, &players, 1, false, BetSizing::Relative, 2).0;
        players = apply_bet(0, &players, 0, false, BetSizing::Relative, 2).0;

        let outcome =
            turn_outcome(&cards, 1, 0, &players, Phase::Preflop, 1, &ladder, "kr1f").unwrap();
        assert_eq!(outcome, TurnOutcome::Terminal(1));
    }

    #[test]
    fn test_showdown_is_zero_sum() {
        let ladder = kuhn_ladder();
        let cards = vec![Card(2), Card(3), Card(1)];
        let mut players = players_at_blind();
        // Check, check: showdown with a pot of 2.
        players = apply_bet(0, &players, 0, false, BetSizing::Relative, 2).0;
        players = apply_bet(1, &players, 0, false, BetSizing::Relative, 2).0;

        let from_p0 =
            turn_outcome(&cards, 0, 1, &players, Phase::Preflop, 1, &ladder, "kk").unwrap();
        let from_p1 =
            turn_outcome(&cards, 1, 0, &players, Phase::Preflop, 1, &ladder, "kk").unwrap();
        assert_eq!(from_p0, TurnOutcome::Terminal(-1));
        assert_eq!(from_p1, TurnOutcome::Terminal(1));
    }

    #[test]
    fn test_public_pair_beats_higher_rank() {
        // Leduc showdown where the lower-ranked hole card pairs the board.
        let ladder = ActionLadder::new(4, 1, 1, BetSizing::Relative).unwrap();
        let cards = vec![Card(1), Card(3), Card(1)];
        let mut players = [PlayerState::at_blind(4, 1), PlayerState::at_blind(4, 1)];

        // Preflop check-check, flop check-check.
        players = apply_bet(0, &players, 0, false, BetSizing::Relative, 4).0;
        players = apply_bet(1, &players, 0, false, BetSizing::Relative, 4).0;
        players = apply_bet(0, &players, 0, true, BetSizing::Relative, 4).0;
        players = apply_bet(1, &players, 0, false, BetSizing::Relative, 4).0;

        let outcome =
            turn_outcome(&cards, 0, 1, &players, Phase::Flop, 2, &ladder, "kk/kk").unwrap();
        match outcome {
            TurnOutcome::Terminal(reward) => assert!(reward > 0, "pair must win, got {}", reward),
            other => panic!("expected showdown, got {:?}", other),
        }

        let mirrored =
            turn_outcome(&cards, 1, 0, &players, Phase::Flop, 2, &ladder, "kk/kk").unwrap();
        match mirrored {
            TurnOutcome::Terminal(reward) => assert!(reward < 0),
            other => panic!("expected showdown, got {:?}", other),
        }
    }

    #[test]
    fn test_showdown_tie_pays_nothing() {
        let ladder = ActionLadder::new(4, 1, 1, BetSizing::Relative).unwrap();
        let cards = vec![Card(2), Card(2), Card(3)];
        let mut players = [PlayerState::at_blind(4, 1), PlayerState::at_blind(4, 1)];
        players = apply_bet(0, &players, 0, false, BetSizing::Relative, 4).0;
        players = apply_bet(1, &players, 0, false, BetSizing::Relative, 4).0;
        players = apply_bet(0, &players, 0, true, BetSizing::Relative, 4).0;
        players = apply_bet(1, &players, 0, false, BetSizing::Relative, 4).0;

        let outcome =
            turn_outcome(&cards, 0, 1, &players, Phase::Flop, 2, &ladder, "kk/kk").unwrap();
        assert_eq!(outcome, TurnOutcome::Terminal(0));
    }

    #[test]
    fn test_phase_close_only_for_player_zero() {
        // Two-round game, preflop. Player 0 checks, player 1 checks: player 1
        // has acted and the bets are level, but player 1 must not close the
        // phase; they get only the filler pass.
        let ladder = ActionLadder::new(4, 1, 1, BetSizing::Relative).unwrap();
        let cards = leduc_deck();
        let mut players = [PlayerState::at_blind(4, 1), PlayerState::at_blind(4, 1)];
        players = apply_bet(0, &players, 0, false, BetSizing::Relative, 4).0;

        let p1_turn =
            turn_outcome(&cards, 1, 0, &players, Phase::Preflop, 2, &ladder, "k").unwrap();
        let (actions, closes) = match p1_turn {
            TurnOutcome::Decision {
                actions,
                closes_phase,
            } => (actions, closes_phase),
            other => panic!("expected a decision, got {:?}", other),
        };
        assert!(!closes);
        assert!(actions.iter().any(|a| a.value > 0));

        players = apply_bet(1, &players, 0, false, BetSizing::Relative, actions.len()).0;

        // Now player 0, already acted with level bets: this closes the phase.
        let p0_turn =
            turn_outcome(&cards, 0, 1, &players, Phase::Preflop, 2, &ladder, "kk").unwrap();
        match p0_turn {
            TurnOutcome::Decision { closes_phase, .. } => assert!(closes_phase),
            other => panic!("expected a decision, got {:?}", other),
        }
    }

    #[test]
    fn test_all_in_player_gets_filler_pass_only() {
        let ladder = ActionLadder::new(4, 1, 1, BetSizing::Relative).unwrap();
        let cards = leduc_deck();
        let players = [
            PlayerState {
                chips: 0,
                turn_bet: 3,
                round_bet: 4,
                played_current_phase: false,
            },
            PlayerState {
                chips: 0,
                turn_bet: 3,
                round_bet: 4,
                played_current_phase: true,
            },
        ];

        let outcome =
            turn_outcome(&cards, 0, 1, &players, Phase::Preflop, 2, &ladder, "r3c").unwrap();
        match outcome {
            TurnOutcome::Decision { actions, .. } => {
                assert_eq!(actions.len(), 1);
                assert!(actions[0].is_pass());
            }
            other => panic!("expected a filler decision, got {:?}", other),
        }
    }

    #[test]
    fn test_small_blind_can_exactly_call_unequal_blinds() {
        // sb 1 vs bb 2: player 0 opens facing a 1-chip deficit and must be
        // offered pass, the exact call, the min-raise, and the all-in.
        let ladder = ActionLadder::new(4, 1, 2, BetSizing::Relative).unwrap();
        let cards = leduc_deck();
        let players = [PlayerState::at_blind(4, 1), PlayerState::at_blind(4, 2)];

        let outcome =
            turn_outcome(&cards, 0, 1, &players, Phase::Preflop, 2, &ladder, "").unwrap();
        let values: Vec<u32> = match outcome {
            TurnOutcome::Decision { actions, .. } => actions.iter().map(|a| a.value).collect(),
            other => panic!("expected a decision, got {:?}", other),
        };
        assert!(values.contains(&1), "exact call missing from {:?}", values);
        assert!(values.contains(&0));
        assert!(values.contains(&2)); // min raise: max(bb, 2 * deficit)
        assert!(values.contains(&3)); // all-in
    }

    #[test]
    fn test_absolute_sizing_legality() {
        // 12-chip absolute game: facing a raise to 2 (a bet of 1 over the
        // blind), the caller may pass, call to 2, re-raise to >= 3, or shove.
        let ladder = ActionLadder::new(12, 1, 1, BetSizing::Absolute).unwrap();
        let cards = leduc_deck();
        let players = [
            PlayerState {
                chips: 11,
                turn_bet: 1,
                round_bet: 1,
                played_current_phase: false,
            },
            PlayerState {
                chips: 10,
                turn_bet: 1,
                round_bet: 2,
                played_current_phase: true,
            },
        ];

        let outcome =
            turn_outcome(&cards, 0, 1, &players, Phase::Preflop, 2, &ladder, "r2").unwrap();
        let values: Vec<u32> = match outcome {
            TurnOutcome::Decision { actions, .. } => actions.iter().map(|a| a.value).collect(),
            other => panic!("expected a decision, got {:?}", other),
        };
        assert!(values.contains(&0));
        assert!(values.contains(&2)); // exact call
        assert!(values.contains(&12)); // all-in total
        assert!(values.contains(&3)); // min re-raise: previous 1 + 2 * increment 1
        assert!(!values.is_empty());
    }

    #[test]
    fn test_apply_bet_absolute_call() {
        let players = [
            PlayerState {
                chips: 11,
                turn_bet: 1,
                round_bet: 1,
                played_current_phase: false,
            },
            PlayerState {
                chips: 10,
                turn_bet: 1,
                round_bet: 2,
                played_current_phase: true,
            },
        ];
        let (next, label) = apply_bet(0, &players, 2, false, BetSizing::Absolute, 4);
        assert_eq!(label, "c");
        assert_eq!(next[0].round_bet, 2);
        assert_eq!(next[0].chips, 10);
        assert_eq!(next[0].turn_bet, 1);
    }

    #[test]
    fn test_apply_bet_resets_opponent_on_phase_close() {
        let players = [PlayerState::at_blind(4, 1), PlayerState::at_blind(4, 1)];
        let (next, _) = apply_bet(0, &players, 0, true, BetSizing::Relative, 4);
        assert!(next[0].played_current_phase);
        assert!(!next[1].played_current_phase);
    }
}
