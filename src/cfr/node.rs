//! Per-information-set state: regret and strategy accumulators.
//!
//! A node owns three parallel per-action vectors. `regret_sum` drives the
//! current strategy through regret matching, `strategy` caches the last
//! strategy served, and `strategy_sum` is the reach-weighted running total
//! whose normalization is the strategy that actually converges. Frozen
//! nodes short-circuit all of it and serve a fixed distribution forever.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::ladder::Action;

/// Why sampling an action from a strategy failed.
///
/// Carries the raw numbers; the traversal wraps them with the node key.
#[derive(Debug, Clone, Copy)]
pub struct SamplingFailure {
    /// The uniform draw in `[0, 1)`.
    pub draw: f64,
    /// Total mass accumulated before the action list ran out.
    pub cumulative: f64,
}

/// Sample an action index from `strategy` by inverse CDF.
///
/// A well-formed strategy sums to ~1.0 and always covers the draw. Running
/// off the end means the distribution lost mass, and the caller must treat
/// that as fatal rather than pick an arbitrary action.
pub fn sample_index<R: Rng>(strategy: &[f64], rng: &mut R) -> Result<usize, SamplingFailure> {
    let draw: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (i, probability) in strategy.iter().enumerate() {
        cumulative += probability;
        if draw < cumulative {
            return Ok(i);
        }
    }
    Err(SamplingFailure { draw, cumulative })
}

/// Accumulators for one information set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoSetNode {
    key: String,
    actions: Vec<Action>,
    regret_sum: Vec<f64>,
    strategy: Vec<f64>,
    strategy_sum: Vec<f64>,
    frozen: bool,
}

impl InfoSetNode {
    /// A fresh learning node with a uniform starting strategy.
    pub fn new(key: impl Into<String>, actions: Vec<Action>) -> Self {
        let n = actions.len();
        Self {
            key: key.into(),
            strategy: vec![1.0 / n as f64; n],
            regret_sum: vec![0.0; n],
            strategy_sum: vec![0.0; n],
            actions,
            frozen: false,
        }
    }

    /// An immutable node serving `strategy` forever. Used for blueprint
    /// entries and for uniform fillers at keys a blueprint never saw.
    pub fn frozen(key: impl Into<String>, actions: Vec<Action>, strategy: Vec<f64>) -> Self {
        let n = actions.len();
        debug_assert_eq!(n, strategy.len());
        Self {
            key: key.into(),
            regret_sum: vec![0.0; n],
            strategy_sum: vec![0.0; n],
            strategy,
            actions,
            frozen: true,
        }
    }

    /// The information-set key this node belongs to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The legal actions, in accumulator order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// The legal action values, in accumulator order.
    pub fn action_values(&self) -> Vec<u32> {
        self.actions.iter().map(|a| a.value).collect()
    }

    /// Whether this node is an immutable blueprint entry.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// The raw reach-weighted strategy accumulator.
    pub fn strategy_sum(&self) -> &[f64] {
        &self.strategy_sum
    }

    /// Compute the current strategy and fold it into the running average.
    ///
    /// Regret matching: each action's probability is proportional to its
    /// positive cumulative regret, uniform when no action has any. The
    /// average accumulates `max(reach_weight, min_reality_weight)` times
    /// each probability; with `decay_initial` set, visits that still carry
    /// zero positive regret contribute `min_reality_weight` per action
    /// instead, keeping the uniform cold-start phase from dominating the
    /// average on rarely-reached nodes.
    ///
    /// Frozen nodes ignore every argument and return the stored strategy.
    pub fn strategy(
        &mut self,
        reach_weight: f64,
        min_reality_weight: f64,
        decay_initial: bool,
    ) -> Vec<f64> {
        if self.frozen {
            return self.strategy.clone();
        }

        let n = self.actions.len();
        let mut normalizing = 0.0;
        for (slot, &regret) in self.strategy.iter_mut().zip(&self.regret_sum) {
            let positive = regret.max(0.0);
            *slot = positive;
            normalizing += positive;
        }
        if normalizing > 0.0 {
            for slot in &mut self.strategy {
                *slot /= normalizing;
            }
        } else {
            for slot in &mut self.strategy {
                *slot = 1.0 / n as f64;
            }
        }

        let weight = reach_weight.max(min_reality_weight);
        let cold_start = normalizing <= 0.0;
        for (sum, &probability) in self.strategy_sum.iter_mut().zip(&self.strategy) {
            let contribution = if cold_start && decay_initial {
                min_reality_weight
            } else {
                probability
            };
            *sum += weight * contribution;
        }

        self.strategy.clone()
    }

    /// Add a counterfactual-regret update for one action.
    pub fn add_regret(&mut self, action_index: usize, amount: f64) {
        debug_assert!(!self.frozen, "frozen nodes never accumulate regret");
        self.regret_sum[action_index] += amount;
    }

    /// The time-averaged strategy: normalized `strategy_sum`, uniform while
    /// the node is unvisited. Frozen nodes return their stored strategy.
    pub fn average_strategy(&self) -> Vec<f64> {
        if self.frozen {
            return self.strategy.clone();
        }
        let total: f64 = self.strategy_sum.iter().sum();
        if total > 0.0 {
            self.strategy_sum.iter().map(|s| s / total).collect()
        } else {
            vec![1.0 / self.actions.len() as f64; self.actions.len()]
        }
    }
}
