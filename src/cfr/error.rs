//! Solver error types.
//!
//! Everything here is fatal by design: a training run that silently plays
//! on after a corrupted node or a stale blueprint produces a strategy table
//! that looks fine and is quietly wrong.

use std::io;

use thiserror::Error;

/// Errors surfaced by configuration, training, and persistence.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The inverse-CDF sampler walked past the end of a strategy whose mass
    /// does not cover the drawn quantile. Indicates a corrupted node.
    #[error(
        "sampling failed at {key}: drew {draw} but the strategy mass reaches only {cumulative}"
    )]
    SamplingFailed {
        /// Information-set key of the offending node.
        key: String,
        /// The uniform draw in `[0, 1)`.
        draw: f64,
        /// Total strategy mass accumulated before running out of actions.
        cumulative: f64,
    },

    /// A node's stored action list disagrees with the live legal-action set
    /// for its key. The abstraction guarantees the key determines the set,
    /// so this means the node (typically a loaded blueprint entry) was
    /// built under different betting rules.
    #[error("stale action set at {key}: stored {stored:?}, legal {legal:?}")]
    StaleActionSet {
        /// Information-set key of the offending node.
        key: String,
        /// Action values the node was created with.
        stored: Vec<u32>,
        /// Action values legal at this decision point now.
        legal: Vec<u32>,
    },

    /// The betting transition produced a decision point with no legal
    /// actions, which the rules should make impossible.
    #[error("no legal actions at history {history:?}")]
    NoLegalActions {
        /// Betting history that reached the dead end.
        history: String,
    },

    /// A blueprint references an action value the live ladder does not
    /// contain.
    #[error("blueprint entry {key} references unknown action value {value}")]
    UnknownActionValue {
        /// Information-set key of the offending entry.
        key: String,
        /// The unresolvable action value.
        value: u32,
    },

    /// A blueprint entry is internally inconsistent.
    #[error("malformed blueprint entry {key}: {reason}")]
    MalformedBlueprint {
        /// Information-set key of the offending entry.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Filesystem failure while reading or writing artifacts.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
