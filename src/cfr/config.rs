//! Training configuration and run statistics.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cfr::error::SolverError;
use crate::game::ladder::BetSizing;

/// Which regret-attribution algorithm the traversal uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Full counterfactual regret minimization: every action is explored and
    /// the node returns its strategy-weighted expected utility.
    Cfr,
    /// Outcome-sampling Monte-Carlo CFR: one action is sampled per node,
    /// siblings get a single-ply lookahead, and the sampled utility is
    /// returned upward.
    Mccfr,
}

impl Algorithm {
    fn label(&self) -> &'static str {
        match self {
            Algorithm::Cfr => "cfr",
            Algorithm::Mccfr => "mccfr",
        }
    }
}

/// What happens during the exploration warm-up fraction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplorationMode {
    /// Play uniformly at random; the configured algorithm still attributes
    /// regret from those trajectories.
    Uniform,
    /// Run vanilla full CFR during the warm-up regardless of the configured
    /// algorithm.
    WithCfr,
}

impl ExplorationMode {
    fn label(&self) -> &'static str {
        match self {
            ExplorationMode::Uniform => "uni",
            ExplorationMode::WithCfr => "cfr",
        }
    }
}

/// Full configuration surface for a training run.
///
/// Plain values only: nothing here is environment-coupled, and the whole
/// struct round-trips through JSON so runs are reproducible from a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Self-play iterations per seat assignment.
    pub iterations: u64,
    /// Traversal algorithm.
    pub algorithm: Algorithm,
    /// Deck as a list of ranks, one card per entry. The third card of each
    /// shuffle is the public card in two-round play.
    pub deck: Vec<u8>,
    /// Betting rounds: 1 for Kuhn-style play, 2 for Leduc-style play with a
    /// public card.
    pub rounds: u8,
    /// Fraction of iterations spent in the exploration warm-up.
    pub exploring_phase: f64,
    /// Policy for the warm-up iterations.
    pub exploration_mode: ExplorationMode,
    /// Floor applied to reach weights when accumulating the average
    /// strategy; keeps long runs from drowning rare branches. Zero disables.
    pub min_reality_weight: f64,
    /// Down-weight the uniform cold-start strategy in the average.
    pub decay_initial_strategies: bool,
    /// Chips per player at the start of every hand; also the all-in cap.
    pub total_chips: u32,
    /// Blind posted by player 0.
    pub small_blind: u32,
    /// Blind posted by player 1; also the minimum bet unit.
    pub big_blind: u32,
    /// Whether ladder values are per-turn increments or round totals.
    pub sizing: BetSizing,
    /// Iterations between blueprint checkpoints. Zero disables checkpoints
    /// (the final blueprint is still written).
    pub checkpoint_interval: u64,
    /// Iterations between progress-log samples.
    pub log_interval: u64,
    /// Directory for blueprints and the convergence log.
    pub output_dir: PathBuf,
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Blueprint path freezing seat A's model, if playing against a fixed
    /// opponent.
    pub fixed_strategy_a: Option<PathBuf>,
    /// Blueprint path freezing seat B's model.
    pub fixed_strategy_b: Option<PathBuf>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self::leduc()
    }
}

impl TrainerConfig {
    /// Leduc-style default: 6-card paired deck, two rounds, 4-chip stacks.
    pub fn leduc() -> Self {
        Self {
            iterations: 1_000_000,
            algorithm: Algorithm::Mccfr,
            deck: vec![1, 1, 2, 2, 3, 3],
            rounds: 2,
            exploring_phase: 0.0,
            exploration_mode: ExplorationMode::WithCfr,
            min_reality_weight: 0.0,
            decay_initial_strategies: false,
            total_chips: 4,
            small_blind: 1,
            big_blind: 1,
            sizing: BetSizing::Relative,
            checkpoint_interval: 400_000,
            log_interval: 1_000,
            output_dir: PathBuf::from("blueprints"),
            seed: None,
            fixed_strategy_a: None,
            fixed_strategy_b: None,
        }
    }

    /// Kuhn-poker setup: 3 ranks, one round, pass/bet only. Used as the
    /// convergence benchmark (known game value -1/18 for the first actor).
    pub fn kuhn() -> Self {
        Self {
            algorithm: Algorithm::Cfr,
            deck: vec![1, 2, 3],
            rounds: 1,
            total_chips: 2,
            checkpoint_interval: 0,
            ..Self::leduc()
        }
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SolverError> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method: set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder method: set the iteration count.
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.iterations == 0 {
            return Err(SolverError::Config("iterations must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.exploring_phase) {
            return Err(SolverError::Config(format!(
                "exploring_phase {} is out of range [0, 1]",
                self.exploring_phase
            )));
        }
        if self.min_reality_weight < 0.0 {
            return Err(SolverError::Config(
                "min_reality_weight must be non-negative".into(),
            ));
        }
        if !(1..=2).contains(&self.rounds) {
            return Err(SolverError::Config(format!(
                "rounds must be 1 or 2, got {}",
                self.rounds
            )));
        }
        let min_deck = if self.rounds == 2 { 3 } else { 2 };
        if self.deck.len() < min_deck {
            return Err(SolverError::Config(format!(
                "deck needs at least {} cards for {} round(s)",
                min_deck, self.rounds
            )));
        }
        if self.small_blind == 0 || self.small_blind > self.big_blind {
            return Err(SolverError::Config(format!(
                "blinds must satisfy 0 < small ({}) <= big ({})",
                self.small_blind, self.big_blind
            )));
        }
        if self.total_chips <= self.big_blind {
            return Err(SolverError::Config(format!(
                "total_chips ({}) must exceed the big blind ({})",
                self.total_chips, self.big_blind
            )));
        }
        Ok(())
    }

    /// Derived run identifier, used for blueprint and log file names.
    pub fn model_name(&self) -> String {
        format!(
            "{}-{}cards-{}maxbet-EP{}{}-mRW{}-iter{}",
            self.algorithm.label(),
            self.deck.len(),
            self.max_bet(),
            self.exploration_mode.label(),
            float_tag(self.exploring_phase),
            float_tag(self.min_reality_weight),
            self.iterations
        )
    }

    /// The largest single wager value the ladder will contain.
    pub fn max_bet(&self) -> u32 {
        match self.sizing {
            BetSizing::Relative => self.total_chips - 1,
            BetSizing::Absolute => self.total_chips,
        }
    }

    /// Iterations spent exploring at the head of each seat's run.
    pub fn exploring_iterations(&self) -> u64 {
        (self.exploring_phase * self.iterations as f64) as u64
    }
}

/// File-name-safe rendering of a float (`0.25` becomes `0_25`).
fn float_tag(value: f64) -> String {
    value.to_string().replace('.', "_")
}

/// Sampled progress, emitted every `log_interval` iterations.
#[derive(Debug, Clone)]
pub struct IterationStats {
    /// One-based iteration index within the current seat assignment.
    pub iteration: u64,
    /// Iterations across all seat assignments so far.
    pub total_iteration: u64,
    /// Live information sets in the learning table.
    pub info_sets: usize,
    /// Running sum of realized rewards for the seat acting first.
    pub running_reward: f64,
    /// Running average regret magnitude across all live nodes.
    pub avg_regret: f64,
}

/// Final results of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerReport {
    /// Total iterations across all seat assignments.
    pub iterations: u64,
    /// Information sets discovered by the learning model.
    pub info_sets: usize,
    /// Average game value per seat, each measured while acting first.
    pub avg_game_value: [f64; 2],
    /// Final average regret diagnostic.
    pub avg_regret: f64,
    /// Wall-clock training time.
    pub elapsed_seconds: f64,
    /// Where the final blueprint was written, if a model was learning.
    pub blueprint_path: Option<PathBuf>,
}
