//! Outcome resolution engine
//!
//! One resolver per game family:
//! - `threshold`: single draw against a bias-shifted cutoff (over/under)
//! - `target`: target-multiplier games over an inverse power-law CDF
//! - `table`: match-count games paying from a discrete 2-D table
//! - `path`: stepwise walk games with center-biased movement
//! - `hand`: card-hand evaluation with soft/hard values and naturals
//!
//! Every resolver is deterministic given its draws, so each is testable
//! without a live random source.

pub mod hand;
pub mod path;
pub mod table;
pub mod target;
pub mod threshold;

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::GameEdges;
use crate::rigging::RiggingController;

/// Uniform draw source feeding the resolvers.
///
/// `draw` yields a uniform value in `[0, 1)`; `draw_index` yields a uniform
/// integer below `n`. Production uses the thread RNG; tests use seeded
/// ChaCha streams.
pub trait DrawSource: Send {
    fn draw(&mut self) -> f64;

    fn draw_index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        let ix = (self.draw() * n as f64) as usize;
        ix.min(n - 1)
    }
}

/// Thread-RNG backed draw source for production paths
#[derive(Default)]
pub struct ThreadDraws;

impl DrawSource for ThreadDraws {
    fn draw(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Seeded deterministic draw source for tests and replays
pub struct SeededDraws {
    rng: ChaCha8Rng,
}

impl SeededDraws {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl DrawSource for SeededDraws {
    fn draw(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Effective edge band; rigging can push the modifier well outside sane
/// territory, the engine clamps before any math sees it.
pub const EDGE_MIN: f64 = -0.45;
pub const EDGE_MAX: f64 = 0.45;

/// Per-game house edge combined with the process-wide rigging modifier
pub struct OutcomeEngine {
    edges: GameEdges,
    rigging: Arc<RiggingController>,
}

impl OutcomeEngine {
    pub fn new(edges: GameEdges, rigging: Arc<RiggingController>) -> Self {
        Self { edges, rigging }
    }

    pub fn edges(&self) -> &GameEdges {
        &self.edges
    }

    /// Base edge for a game plus the shared rigging modifier, clamped.
    pub fn effective_edge(&self, base: f64) -> f64 {
        (base + self.rigging.modifier()).clamp(EDGE_MIN, EDGE_MAX)
    }

    pub fn resolve_threshold(&self, draws: &mut dyn DrawSource) -> threshold::ThresholdOutcome {
        threshold::resolve(draws.draw(), self.effective_edge(self.edges.threshold))
    }

    pub fn resolve_target(
        &self,
        draws: &mut dyn DrawSource,
        target: f64,
    ) -> crate::error::Result<target::TargetOutcome> {
        let edge = self.effective_edge(self.edges.target);
        target::validate_target(target, edge)?;
        Ok(target::resolve(draws.draw(), target, edge))
    }

    pub fn resolve_table(
        &self,
        draws: &mut dyn DrawSource,
        picks: &[u8],
    ) -> crate::error::Result<table::TableOutcome> {
        table::resolve(draws, picks)
    }

    pub fn resolve_path(&self, draws: &mut dyn DrawSource) -> path::PathOutcome {
        path::resolve(draws, self.effective_edge(self.edges.path))
    }

    pub fn resolve_hand(&self, draws: &mut dyn DrawSource) -> hand::HandOutcome {
        hand::resolve(draws)
    }
}
