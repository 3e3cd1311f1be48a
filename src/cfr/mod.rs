//! The regret-minimization engine: nodes, traversal, configuration, and
//! blueprint persistence.

pub mod blueprint;
pub mod config;
pub mod error;
pub mod node;
pub mod trainer;

pub use blueprint::{Blueprint, BlueprintEntry};
pub use config::{
    Algorithm, ExplorationMode, IterationStats, TrainerConfig, TrainerReport,
};
pub use error::SolverError;
pub use node::InfoSetNode;
pub use trainer::Trainer;
