//! Blueprint persistence: the deployable strategy table.
//!
//! A blueprint maps each information-set key to its legal action values and
//! its time-averaged strategy. The table is what the live runtime samples
//! from, and what the trainer loads to instantiate a frozen opponent. The
//! format must round-trip exactly: resuming or benchmarking against a
//! blueprint that drifted from what was trained is worse than failing.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfr::error::SolverError;
use crate::cfr::node::InfoSetNode;
use crate::game::ladder::ActionLadder;

/// One persisted information set: legal action values and the averaged
/// strategy over them, same length, strategy summing to ~1.0.
pub type BlueprintEntry = (Vec<u32>, Vec<f64>);

/// The persisted strategy table.
///
/// Keys are ordered so serialized output is deterministic and diffable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blueprint {
    /// Information-set key to `(action values, averaged strategy)`.
    pub entries: BTreeMap<String, BlueprintEntry>,
}

impl Blueprint {
    /// Snapshot the averaged strategies of a node table.
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a InfoSetNode>) -> Self {
        let entries = nodes
            .into_iter()
            .map(|node| {
                (
                    node.key().to_string(),
                    (node.action_values(), node.average_strategy()),
                )
            })
            .collect();
        Self { entries }
    }

    /// Write the table as JSON, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SolverError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load a table from JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SolverError> {
        let file = File::open(path)?;
        let blueprint: Self = serde_json::from_reader(BufReader::new(file))?;
        Ok(blueprint)
    }

    /// Number of persisted information sets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reconstruct the table as frozen nodes against the live ladder.
    ///
    /// Each entry's action values are resolved to ladder actions, keeping
    /// the persisted order. A value the ladder no longer contains, or a
    /// strategy whose length disagrees with its action list, means the
    /// blueprint was trained under a different abstraction: fatal.
    pub fn to_frozen_nodes(
        &self,
        ladder: &ActionLadder,
    ) -> Result<FxHashMap<String, InfoSetNode>, SolverError> {
        let mut nodes = FxHashMap::default();
        for (key, (values, strategy)) in &self.entries {
            if values.len() != strategy.len() {
                return Err(SolverError::MalformedBlueprint {
                    key: key.clone(),
                    reason: format!(
                        "{} action values but {} strategy weights",
                        values.len(),
                        strategy.len()
                    ),
                });
            }
            let mut actions = Vec::with_capacity(values.len());
            for &value in values {
                let action =
                    ladder
                        .action_by_value(value)
                        .ok_or(SolverError::UnknownActionValue {
                            key: key.clone(),
                            value,
                        })?;
                actions.push(action.clone());
            }
            nodes.insert(
                key.clone(),
                InfoSetNode::frozen(key.clone(), actions, strategy.clone()),
            );
        }
        Ok(nodes)
    }
}
