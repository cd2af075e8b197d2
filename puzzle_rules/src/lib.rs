//! # Puzzle Rules
//!
//! The "Puzzle Bible" crate - owns everything that decides what a round looks like:
//! the element model, the hidden rules, the deceptive affordances, the temporal
//! challenges and the generator that composes them into one playable round.
//! This crate holds no player modeling; it only consumes tuning values.

pub mod config;
pub mod deception;
pub mod domains;
pub mod elements;
pub mod generator;
pub mod rules;
pub mod temporal;

pub use config::*;
pub use deception::*;
pub use domains::*;
pub use elements::*;
pub use generator::*;
pub use rules::*;
pub use temporal::*;
