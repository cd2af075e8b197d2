//! # Mind Core (The Cortex)
//!
//! The player-facing half of the engine. This crate consumes `puzzle_rules`,
//! models the player across rounds and sessions, paces difficulty and decides
//! when a session should end.
//!
//! ## Core Components
//!
//! - **adaptive**: Cognitive fingerprint, emotional-state detection and tuning parameters
//! - **session_flow**: Wave phases, the cognitive-stage ladder and session-end checks
//! - **archetype**: Play-style classification and evolution breakthroughs
//! - **session**: `GameSession`, the facade that owns every engine and the round timer
//!
//! ## Design Philosophy
//!
//! - **Explicit context**: Every engine is a plain value owned by the session, never a global
//! - **Deterministic time**: Time only moves through `advance(delta_ms)`
//! - **Silent recovery**: Degenerate inputs fall back to safe defaults instead of failing

pub mod adaptive;
pub mod archetype;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod session_flow;

pub use adaptive::*;
pub use archetype::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use session::*;
pub use session_flow::*;
