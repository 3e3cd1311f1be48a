//! # Leduc Solver
//!
//! A counterfactual-regret-minimization (CFR) trainer for two-player,
//! blind-posted poker abstractions in the Kuhn/Leduc family.
//!
//! ## Features
//!
//! - **Two algorithms**: full CFR and outcome-sampling MCCFR with a
//!   single-ply sibling lookahead
//! - **Configurable abstraction**: deck, rounds (1 or 2), stack depth, and
//!   relative or absolute bet sizing from one config struct
//! - **Frozen opponents**: train or evaluate against fixed blueprints
//! - **Blueprints**: deterministic JSON strategy tables with checkpointing
//!
//! ## Quick Start
//!
//! ```ignore
//! use leduc_solver::cfr::{Trainer, TrainerConfig};
//!
//! let config = TrainerConfig::kuhn().with_seed(42).with_iterations(100_000);
//! let mut trainer = Trainer::new(config)?;
//! let report = trainer.run()?;
//! println!("game value: {:.4}", report.avg_game_value[0]);
//! ```
//!
//! ## Modules
//!
//! - [`cfr`]: nodes, the traversal engine, configuration, and blueprints
//! - [`game`]: cards, the action ladder, and the betting transition

#![warn(missing_docs)]

pub mod cfr;
pub mod game;

pub use cfr::{Blueprint, SolverError, Trainer, TrainerConfig, TrainerReport};
pub use game::{ActionLadder, BetSizing, Card};
