//! The training driver and the recursive tree-traversal engine.
//!
//! One recursive utility computation serves both algorithms: full CFR
//! explores every action and returns the strategy-weighted expectation,
//! while outcome-sampling MCCFR samples one trajectory, gives the sibling
//! actions a single-ply lookahead, and returns the sampled utility. The
//! driver owns the node table and threads it through the recursion
//! explicitly; betting state is immutable and passed by value, so a hand's
//! traversal has no side effects beyond the node accumulators.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::FxHashMap;

use crate::cfr::blueprint::Blueprint;
use crate::cfr::config::{
    Algorithm, ExplorationMode, IterationStats, TrainerConfig, TrainerReport,
};
use crate::cfr::error::SolverError;
use crate::cfr::node::{self, InfoSetNode};
use crate::game::betting::{apply_bet, turn_outcome, Phase, PlayerState, TurnOutcome};
use crate::game::card::{deck_from_ranks, Card};
use crate::game::ladder::{Action, ActionLadder};

/// Seat labels for the two models. Model A is seat 0's model on the first
/// seat assignment; when a fixed opponent is configured the driver runs the
/// loop once per assignment so each model's value is measured acting first.
const MODEL_A: usize = 0;
/// See [`MODEL_A`].
const MODEL_B: usize = 1;

/// The self-play trainer: node table, frozen opponents, and the traversal.
pub struct Trainer {
    config: TrainerConfig,
    ladder: ActionLadder,
    deck: Vec<Card>,
    /// The shared learning table, keyed by information-set key.
    nodes: FxHashMap<String, InfoSetNode>,
    /// Frozen tables per model, present when that seat plays a fixed
    /// blueprint. Entries are immutable; unseen keys get uniform fillers.
    frozen: [Option<FxHashMap<String, InfoSetNode>>; 2],
    rng: StdRng,
    total_iteration: u64,
    /// Running sum of every regret update, for the average-regret diagnostic.
    total_regret: f64,
    /// Realized-reward sums per model, each measured while acting first.
    sum_of_rewards: [f64; 2],
}

impl Trainer {
    /// Build a trainer from a validated configuration, loading any fixed
    /// opponent blueprints.
    pub fn new(config: TrainerConfig) -> Result<Self, SolverError> {
        config.validate()?;
        let ladder = ActionLadder::new(
            config.total_chips,
            config.small_blind,
            config.big_blind,
            config.sizing,
        )?;
        let deck = deck_from_ranks(&config.deck);

        let load = |path: &Option<PathBuf>| -> Result<Option<FxHashMap<String, InfoSetNode>>, SolverError> {
            match path {
                Some(p) => Ok(Some(Blueprint::load(p)?.to_frozen_nodes(&ladder)?)),
                None => Ok(None),
            }
        };
        let frozen = [load(&config.fixed_strategy_a)?, load(&config.fixed_strategy_b)?];

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            ladder,
            deck,
            nodes: FxHashMap::default(),
            frozen,
            rng,
            total_iteration: 0,
            total_regret: 0.0,
            sum_of_rewards: [0.0; 2],
        })
    }

    /// The training configuration.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Number of information sets in the learning table.
    pub fn num_info_sets(&self) -> usize {
        self.nodes.len()
    }

    /// Iterations completed across all seat assignments.
    pub fn iteration(&self) -> u64 {
        self.total_iteration
    }

    /// Look up a learning-table node by information-set key.
    pub fn node(&self, key: &str) -> Option<&InfoSetNode> {
        self.nodes.get(key)
    }

    /// The averaged strategy for a key, if it was ever visited.
    pub fn average_strategy(&self, key: &str) -> Option<Vec<f64>> {
        self.nodes.get(key).map(|n| n.average_strategy())
    }

    /// Snapshot the learning table as a blueprint.
    pub fn blueprint(&self) -> Blueprint {
        Blueprint::from_nodes(self.nodes.values())
    }

    /// A frozen table's node, for inspecting fixed-opponent play.
    pub fn frozen_node(&self, model: usize, key: &str) -> Option<&InfoSetNode> {
        self.frozen[model].as_ref().and_then(|t| t.get(key))
    }

    fn has_learning_model(&self) -> bool {
        self.frozen[MODEL_A].is_none() || self.frozen[MODEL_B].is_none()
    }

    /// Run the configured number of iterations and persist the results.
    pub fn run(&mut self) -> Result<TrainerReport, SolverError> {
        self.run_with_callback(|_| {})
    }

    /// Run training, invoking `callback` every `log_interval` iterations.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<TrainerReport, SolverError>
    where
        F: FnMut(&IterationStats),
    {
        let start = Instant::now();
        let model_name = self.config.model_name();
        let exploring_iterations = self.config.exploring_iterations();
        info!("training {}", model_name);

        let mut progress_log = if self.config.log_interval > 0 {
            Some(ConvergenceLog::create(
                self.config.output_dir.join(format!("{}.log", model_name)),
            )?)
        } else {
            None
        };

        // With a fixed opponent the loop runs once per seat assignment so
        // both models are measured while acting first.
        let seat_runs = if self.frozen[MODEL_A].is_none() && self.frozen[MODEL_B].is_none() {
            1
        } else {
            2
        };

        for seat_run in 0..seat_runs {
            let model_a_is_p0 = seat_run == 0;
            debug!(
                "seat assignment {}: model {} acts first",
                seat_run,
                if model_a_is_p0 { "A" } else { "B" }
            );

            for i in 0..self.config.iterations {
                self.total_iteration += 1;
                let exploring = i < exploring_iterations;
                let reward = self.play_hand(exploring, model_a_is_p0)?;
                if !exploring {
                    let seat = if model_a_is_p0 { MODEL_A } else { MODEL_B };
                    self.sum_of_rewards[seat] += reward;
                }

                let iteration = i + 1;
                if self.config.log_interval > 0 && iteration % self.config.log_interval == 0 {
                    let stats = IterationStats {
                        iteration,
                        total_iteration: self.total_iteration,
                        info_sets: self.nodes.len(),
                        running_reward: self.sum_of_rewards[if model_a_is_p0 {
                            MODEL_A
                        } else {
                            MODEL_B
                        }],
                        avg_regret: self.avg_regret(),
                    };
                    if let Some(log) = progress_log.as_mut() {
                        log.record(&stats)?;
                    }
                    callback(&stats);
                }

                if self.config.checkpoint_interval > 0
                    && iteration % self.config.checkpoint_interval == 0
                    && self.has_learning_model()
                {
                    let path = self
                        .config
                        .output_dir
                        .join(format!("{}-it{}.json", model_name, iteration));
                    self.blueprint().save(&path)?;
                    info!("checkpoint written to {}", path.display());
                }
            }
        }

        let effective = self.config.iterations as f64 * (1.0 - self.config.exploring_phase);
        let avg_game_value = if effective > 0.0 {
            [
                self.sum_of_rewards[MODEL_A] / effective,
                self.sum_of_rewards[MODEL_B] / effective,
            ]
        } else {
            [0.0; 2]
        };

        let blueprint_path = if self.has_learning_model() {
            let path = self.config.output_dir.join(format!("{}.json", model_name));
            self.blueprint().save(&path)?;
            info!("blueprint written to {}", path.display());
            Some(path)
        } else {
            None
        };

        Ok(TrainerReport {
            iterations: self.total_iteration,
            info_sets: self.nodes.len(),
            avg_game_value,
            avg_regret: self.avg_regret(),
            elapsed_seconds: start.elapsed().as_secs_f64(),
            blueprint_path,
        })
    }

    /// Play one self-play hand: shuffle, seat both players at their blinds,
    /// and traverse from the empty history. Returns player 0's realized
    /// utility. Public for benchmarks and targeted tests; `run` is the
    /// normal entry point.
    pub fn play_hand(
        &mut self,
        exploring: bool,
        model_a_is_p0: bool,
    ) -> Result<f64, SolverError> {
        self.deck.shuffle(&mut self.rng);
        let cards = self.deck.clone();
        let players = [
            PlayerState::at_blind(self.config.total_chips, self.config.small_blind),
            PlayerState::at_blind(self.config.total_chips, self.config.big_blind),
        ];
        self.traverse(
            &cards,
            "",
            1.0,
            1.0,
            players,
            Phase::Preflop,
            exploring,
            model_a_is_p0,
            None,
        )
    }

    fn avg_regret(&self) -> f64 {
        let denominator = (self.nodes.len().max(1) as u64 * self.total_iteration.max(1)) as f64;
        self.total_regret / denominator
    }

    /// Fetch (or lazily create) the node for `key` and derive its strategy.
    ///
    /// Also enforces the abstraction guarantee that the key alone determines
    /// the legal-action set: any disagreement between a node's stored list
    /// and the live legal set is fatal, whether the node is a stale frozen
    /// blueprint entry or a live node reached through an inconsistent path.
    fn node_strategy(
        &mut self,
        key: &str,
        model: usize,
        is_fixed: bool,
        possible_actions: &[Action],
        reach_weight: f64,
        exploring: bool,
    ) -> Result<Vec<f64>, SolverError> {
        let num_actions = possible_actions.len();
        let min_reality_weight = self.config.min_reality_weight;
        let decay_initial = self.config.decay_initial_strategies;

        let node = if is_fixed {
            let table = self.frozen[model]
                .as_mut()
                .expect("fixed model without a frozen table");
            table.entry(key.to_string()).or_insert_with(|| {
                // A key the blueprint never saw: fall back to uniform play
                // rather than crash, mirroring the runtime contract.
                InfoSetNode::frozen(
                    key,
                    possible_actions.to_vec(),
                    vec![1.0 / num_actions as f64; num_actions],
                )
            })
        } else {
            self.nodes
                .entry(key.to_string())
                .or_insert_with(|| InfoSetNode::new(key, possible_actions.to_vec()))
        };

        let legal: Vec<u32> = possible_actions.iter().map(|a| a.value).collect();
        let stored = node.action_values();
        if stored != legal {
            return Err(SolverError::StaleActionSet {
                key: key.to_string(),
                stored,
                legal,
            });
        }

        if exploring && !is_fixed {
            // Warm-up plays uniformly and must not touch the strategy
            // average.
            return Ok(vec![1.0 / num_actions as f64; num_actions]);
        }
        Ok(node.strategy(reach_weight, min_reality_weight, decay_initial))
    }

    /// The recursive solver. Returns the acting player's utility at this
    /// decision point; callers negate it when crossing to the other player.
    #[allow(clippy::too_many_arguments)]
    fn traverse(
        &mut self,
        cards: &[Card],
        history: &str,
        p0: f64,
        p1: f64,
        players: [PlayerState; 2],
        phase: Phase,
        exploring: bool,
        model_a_is_p0: bool,
        alternative_play: Option<usize>,
    ) -> Result<f64, SolverError> {
        // Turn order is the parity of plays so far; raise amounts and the
        // phase separator are not plays.
        let plays = history
            .chars()
            .filter(|c| !c.is_ascii_digit() && *c != '/')
            .count();
        let player = plays % 2;
        let opponent = 1 - player;
        let model = if (player == 1) == model_a_is_p0 {
            MODEL_B
        } else {
            MODEL_A
        };
        let is_fixed = self.frozen[model].is_some();

        let rounds = self.config.rounds;
        let (possible_actions, closes_phase) = match turn_outcome(
            cards,
            player,
            opponent,
            &players,
            phase,
            rounds,
            &self.ladder,
            history,
        )? {
            TurnOutcome::Terminal(reward) => return Ok(reward as f64),
            TurnOutcome::Decision {
                actions,
                closes_phase,
            } => (actions, closes_phase),
        };

        let next_phase = if closes_phase { Phase::Flop } else { phase };
        let history_now = if closes_phase {
            assert_eq!(player, 0, "player 0 must open the second betting round");
            format!("{}/", history)
        } else {
            history.to_string()
        };

        let public = if rounds == 2 && next_phase == Phase::Flop {
            format!("/{}", cards[2])
        } else {
            String::new()
        };
        let key = format!("{}:|{}{}", history_now, cards[player], public);

        let reach_weight = if player == 0 { p0 } else { p1 };
        let strategy = self.node_strategy(
            &key,
            model,
            is_fixed,
            &possible_actions,
            reach_weight,
            exploring,
        )?;

        let num_actions = possible_actions.len();
        let mut utilities = vec![0.0; num_actions];
        let explore_with_cfr =
            exploring && self.config.exploration_mode == ExplorationMode::WithCfr;
        let sample_this_node =
            (self.config.algorithm == Algorithm::Mccfr && !explore_with_cfr) || is_fixed;

        if sample_this_node {
            let chosen = node::sample_index(&strategy, &mut self.rng).map_err(|failure| {
                SolverError::SamplingFailed {
                    key: key.clone(),
                    draw: failure.draw,
                    cumulative: failure.cumulative,
                }
            })?;

            // Sibling lookahead is single-ply: alternates are marked with the
            // acting player so the opponent's subtrees below them do not
            // branch again.
            let make_alternative_plays = !is_fixed && alternative_play != Some(opponent);
            let indices: Vec<usize> = if make_alternative_plays {
                (0..num_actions).collect()
            } else {
                vec![chosen]
            };

            for i in indices {
                let action = &possible_actions[i];
                let (next_players, label) = apply_bet(
                    player,
                    &players,
                    action.value,
                    closes_phase,
                    self.ladder.sizing(),
                    num_actions,
                );
                let next_history = format!("{}{}", history_now, label);
                let next_alternative = if i == chosen {
                    alternative_play
                } else {
                    Some(player)
                };
                let (next_p0, next_p1) = if player == 0 {
                    (p0 * strategy[i], p1)
                } else {
                    (p0, p1 * strategy[i])
                };
                // Utilities alternate sign between the players.
                utilities[i] = -self.traverse(
                    cards,
                    &next_history,
                    next_p0,
                    next_p1,
                    next_players,
                    next_phase,
                    exploring,
                    model_a_is_p0,
                    next_alternative,
                )?;
            }

            if make_alternative_plays {
                let opponent_reach = if player == 0 { p1 } else { p0 };
                let node = self
                    .nodes
                    .get_mut(&key)
                    .expect("learning node vanished mid-traversal");
                for i in 0..num_actions {
                    let regret = utilities[i] - utilities[chosen];
                    let update = opponent_reach * regret;
                    node.add_regret(i, update);
                    self.total_regret += update;
                }
            }

            // Outcome sampling returns the sampled trajectory's utility, not
            // the expectation.
            Ok(utilities[chosen])
        } else {
            let mut node_utility = 0.0;
            for (i, action) in possible_actions.iter().enumerate() {
                let (next_players, label) = apply_bet(
                    player,
                    &players,
                    action.value,
                    closes_phase,
                    self.ladder.sizing(),
                    num_actions,
                );
                let next_history = format!("{}{}", history_now, label);
                let (next_p0, next_p1) = if player == 0 {
                    (p0 * strategy[i], p1)
                } else {
                    (p0, p1 * strategy[i])
                };
                utilities[i] = -self.traverse(
                    cards,
                    &next_history,
                    next_p0,
                    next_p1,
                    next_players,
                    next_phase,
                    exploring,
                    model_a_is_p0,
                    None,
                )?;
                node_utility += strategy[i] * utilities[i];
            }

            if !is_fixed {
                let opponent_reach = if player == 0 { p1 } else { p0 };
                let node = self
                    .nodes
                    .get_mut(&key)
                    .expect("learning node vanished mid-traversal");
                for i in 0..num_actions {
                    let update = opponent_reach * (utilities[i] - node_utility);
                    node.add_regret(i, update);
                    self.total_regret += update;
                }
            }

            Ok(node_utility)
        }
    }
}

/// Line-oriented progress log for offline convergence plotting.
struct ConvergenceLog {
    writer: BufWriter<File>,
}

impl ConvergenceLog {
    fn create(path: impl AsRef<Path>) -> Result<Self, SolverError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "iteration\tavg_game_value\tavg_regret")?;
        Ok(Self { writer })
    }

    fn record(&mut self, stats: &IterationStats) -> Result<(), SolverError> {
        writeln!(
            self.writer,
            "{}\t{}\t{}",
            stats.iteration,
            stats.running_reward / stats.iteration as f64,
            stats.avg_regret
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn kuhn_config(dir: &Path) -> TrainerConfig {
        TrainerConfig {
            log_interval: 0,
            output_dir: dir.to_path_buf(),
            ..TrainerConfig::kuhn()
        }
    }

    #[test]
    fn test_kuhn_full_cfr_converges_to_known_equilibrium() {
        let dir = tempfile::tempdir().unwrap();
        let config = kuhn_config(dir.path())
            .with_seed(42)
            .with_iterations(100_000);
        let mut trainer = Trainer::new(config).unwrap();
        let report = trainer.run().unwrap();

        // 12 decision points: 3 cards x 4 reachable histories.
        assert_eq!(report.info_sets, 12);

        // Known first-actor game value of Kuhn poker.
        assert_abs_diff_eq!(report.avg_game_value[0], -1.0 / 18.0, epsilon = 0.02);

        // Opening with the lowest card: bluff around 1/3 of the time.
        let low = trainer.average_strategy(":|1").unwrap();
        assert!(
            low[1] > 0.15 && low[1] < 0.5,
            "card-1 opening bet probability {} should be near 1/3",
            low[1]
        );

        // Middle card opens with a check almost always.
        let middle = trainer.average_strategy(":|2").unwrap();
        assert!(middle[0] > 0.85, "card-2 check probability {}", middle[0]);

        // Facing a bet: the lowest card folds, the highest calls.
        let fold = trainer.average_strategy("r1:|1").unwrap();
        assert!(fold[0] > 0.85, "card-1 fold probability {}", fold[0]);
        let call = trainer.average_strategy("r1:|3").unwrap();
        assert!(call[1] > 0.85, "card-3 call probability {}", call[1]);

        // Every averaged strategy is a distribution.
        for key in [":|1", ":|2", ":|3", "k:|1", "r1:|2", "kr1:|3"] {
            let strategy = trainer.average_strategy(key).unwrap();
            assert_abs_diff_eq!(strategy.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_leduc_mccfr_smoke() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainerConfig {
            iterations: 20_000,
            checkpoint_interval: 0,
            log_interval: 0,
            output_dir: dir.path().to_path_buf(),
            ..TrainerConfig::leduc()
        }
        .with_seed(7);
        let mut trainer = Trainer::new(config).unwrap();
        let report = trainer.run().unwrap();

        assert!(report.info_sets > 20);
        assert!(report.avg_game_value[0].is_finite());
        assert!(report.blueprint_path.is_some());

        // Flop keys carry the public card after the phase separator.
        assert!(
            trainer.blueprint().entries.keys().any(|k| k.contains("/")),
            "two-round play must produce post-flop information sets"
        );

        for node in trainer.blueprint().entries.values() {
            let (values, strategy) = node;
            assert_eq!(values.len(), strategy.len());
            assert_abs_diff_eq!(strategy.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_exploring_iterations_leave_strategy_average_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainerConfig {
            algorithm: Algorithm::Mccfr,
            exploration_mode: ExplorationMode::Uniform,
            ..kuhn_config(dir.path())
        }
        .with_seed(11);
        let mut trainer = Trainer::new(config).unwrap();

        for _ in 0..500 {
            trainer.play_hand(false, true).unwrap();
        }
        let before: Vec<(String, Vec<f64>)> = trainer
            .nodes
            .iter()
            .map(|(k, n)| (k.clone(), n.strategy_sum().to_vec()))
            .collect();
        assert!(before.iter().any(|(_, sums)| sums.iter().any(|&s| s > 0.0)));

        for _ in 0..500 {
            trainer.play_hand(true, true).unwrap();
        }
        for (key, sums) in &before {
            assert_eq!(
                trainer.node(key).unwrap().strategy_sum(),
                sums.as_slice(),
                "exploration polluted the strategy average at {}",
                key
            );
        }
    }

    #[test]
    fn test_fixed_opponent_plays_frozen_and_never_learns() {
        let dir = tempfile::tempdir().unwrap();

        // An empty blueprint: every key the fixed seat reaches becomes a
        // uniform filler node.
        let empty = Blueprint::default();
        let blueprint_path = dir.path().join("opponent.json");
        empty.save(&blueprint_path).unwrap();

        let config = TrainerConfig {
            iterations: 2_000,
            algorithm: Algorithm::Mccfr,
            fixed_strategy_b: Some(blueprint_path),
            ..kuhn_config(dir.path())
        }
        .with_seed(3);
        let mut trainer = Trainer::new(config).unwrap();
        let report = trainer.run().unwrap();

        // Both seat assignments ran.
        assert_eq!(report.iterations, 4_000);
        assert!(trainer.num_info_sets() > 0);

        // The frozen table gained uniform filler entries for the root keys
        // (reached once the fixed model acted first), and none of them
        // learned.
        for card in 1..=3 {
            let key = format!(":|{}", card);
            let node = trainer.frozen_node(MODEL_B, &key).unwrap();
            assert!(node.is_frozen());
            assert_eq!(node.average_strategy(), vec![0.5, 0.5]);
            assert!(node.strategy_sum().iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn test_stale_blueprint_action_list_is_fatal() {
        let dir = tempfile::tempdir().unwrap();

        // The live abstraction offers pass and bet at the root; this
        // blueprint claims pass only.
        let mut stale = Blueprint::default();
        for card in 1..=3 {
            stale
                .entries
                .insert(format!(":|{}", card), (vec![0], vec![1.0]));
        }
        let blueprint_path = dir.path().join("stale.json");
        stale.save(&blueprint_path).unwrap();

        let config = TrainerConfig {
            iterations: 100,
            fixed_strategy_a: Some(blueprint_path),
            ..kuhn_config(dir.path())
        }
        .with_seed(5);
        let mut trainer = Trainer::new(config).unwrap();

        let mut outcome = Ok(0.0);
        for _ in 0..20 {
            outcome = trainer.play_hand(false, true);
            if outcome.is_err() {
                break;
            }
        }
        assert!(
            matches!(outcome, Err(SolverError::StaleActionSet { .. })),
            "a stale frozen action list must fail fast, got {:?}",
            outcome
        );
    }

    #[test]
    fn test_full_cfr_rewards_stay_within_pot_bounds() {
        // The zero-sum property itself is checked at the transition level;
        // here we pin down that root utilities stay inside the pot bounds.
        let dir = tempfile::tempdir().unwrap();
        let config = kuhn_config(dir.path()).with_seed(9).with_iterations(200);
        let mut trainer = Trainer::new(config).unwrap();
        for _ in 0..200 {
            let reward = trainer.play_hand(false, true).unwrap();
            assert!((-2.0..=2.0).contains(&reward), "reward {} out of bounds", reward);
        }
    }
}
