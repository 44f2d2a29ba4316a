//! Process-wide house-edge rigging state
//!
//! One shared signed modifier is folded additively into every player's
//! effective edge at resolution time. Administrative primitives mutate it;
//! a diagnostic decoder reconstructs a plausible primitive sequence for
//! display. The decoder is flavor only and never sits on a settlement path.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Administrative primitives over the modifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RigOp {
    Toggle,
    Reset,
    NudgeUp,
    NudgeDown,
    Set(f64),
}

/// Shared rigging state, read-mostly and cheap to sample
pub struct RiggingController {
    modifier: RwLock<f64>,
    /// Value the toggle primitive flips against zero
    toggle_value: f64,
    /// Step applied by a nudge
    nudge_step: f64,
}

impl RiggingController {
    pub fn new(toggle_value: f64, nudge_step: f64) -> Self {
        Self {
            modifier: RwLock::new(0.0),
            toggle_value,
            nudge_step,
        }
    }

    /// Current modifier, sampled at every resolution
    pub fn modifier(&self) -> f64 {
        *self.modifier.read()
    }

    /// Flip between zero and the configured toggle value
    pub fn toggle(&self) -> f64 {
        let mut m = self.modifier.write();
        *m = if *m == 0.0 { self.toggle_value } else { 0.0 };
        info!(modifier = *m, "rigging toggled");
        *m
    }

    pub fn reset(&self) {
        *self.modifier.write() = 0.0;
        info!("rigging reset");
    }

    pub fn nudge_up(&self) -> f64 {
        let mut m = self.modifier.write();
        *m += self.nudge_step;
        *m
    }

    pub fn nudge_down(&self) -> f64 {
        let mut m = self.modifier.write();
        *m -= self.nudge_step;
        *m
    }

    pub fn set(&self, value: f64) {
        *self.modifier.write() = value;
        info!(modifier = value, "rigging set directly");
    }

    /// Reconstruct a primitive sequence that would produce the current
    /// modifier from zero. Works backward greedily: at each step, undo
    /// whichever primitive leaves the remainder closest to zero; when no
    /// primitive makes progress, a single direct set explains the rest.
    pub fn decode(&self) -> Vec<RigOp> {
        const EPS: f64 = 1e-9;
        const MAX_STEPS: usize = 64;

        let mut remainder = self.modifier();
        let mut ops = Vec::new();

        for _ in 0..MAX_STEPS {
            if remainder.abs() < EPS {
                break;
            }
            let candidates = [
                (RigOp::NudgeUp, remainder - self.nudge_step),
                (RigOp::NudgeDown, remainder + self.nudge_step),
                (RigOp::Toggle, remainder - self.toggle_value),
            ];
            let (op, next) = candidates
                .iter()
                .copied()
                .min_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
                .unwrap_or((RigOp::Reset, remainder));
            if next.abs() >= remainder.abs() - EPS {
                ops.push(RigOp::Set(remainder));
                remainder = 0.0;
                break;
            }
            ops.push(op);
            remainder = next;
        }
        if remainder.abs() >= EPS {
            ops.push(RigOp::Set(remainder));
        }

        ops.reverse();
        ops
    }
}
