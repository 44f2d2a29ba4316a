//! Render-string construction and chat-surface synchronization
//!
//! The core emits text; the chat collaborator owns delivery. The contract
//! is narrow: at most one in-flight message per session, editable in place
//! via its handle. Terminal-reveal animations run as supervised background
//! tasks that start only after settlement is durably committed and can be
//! cancelled without touching the ledger.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::Result;
use crate::session::SessionRecord;
use crate::token::PlayerId;

/// Handle to an already-rendered chat message, kept in the session record
/// so progress edits the same message instead of re-sending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHandle {
    pub channel: String,
    pub message: String,
}

/// Outbound text surface. Implementations live with the chat transport;
/// the engine only needs send-or-edit semantics.
#[async_trait]
pub trait RenderSink: Send + Sync {
    async fn send(&self, channel: &str, text: &str) -> Result<MessageHandle>;
    async fn edit(&self, handle: &MessageHandle, text: &str) -> Result<()>;
}

/// Sink that drops everything; useful when no chat surface is attached.
pub struct NullSink;

#[async_trait]
impl RenderSink for NullSink {
    async fn send(&self, channel: &str, _text: &str) -> Result<MessageHandle> {
        Ok(MessageHandle {
            channel: channel.to_string(),
            message: "0".to_string(),
        })
    }

    async fn edit(&self, _handle: &MessageHandle, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Sink that records every emission, for tests and replay checks.
#[derive(Default)]
pub struct CapturingSink {
    messages: Mutex<Vec<String>>,
    counter: Mutex<u64>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl RenderSink for CapturingSink {
    async fn send(&self, channel: &str, text: &str) -> Result<MessageHandle> {
        self.messages.lock().push(text.to_string());
        let mut counter = self.counter.lock();
        *counter += 1;
        Ok(MessageHandle {
            channel: channel.to_string(),
            message: counter.to_string(),
        })
    }

    async fn edit(&self, _handle: &MessageHandle, text: &str) -> Result<()> {
        self.messages.lock().push(text.to_string());
        Ok(())
    }
}

/// Glyphs for the hazard grid
const GLYPH_HIDDEN: char = '⬜';
const GLYPH_REVEALED: char = '🟩';
const GLYPH_HAZARD: char = '💣';
const GLYPH_HIT: char = '💥';

/// Render the grid as the player sees it mid-session: revealed cells and
/// hidden everything else. Hazards are never exposed while active.
pub fn render_active(record: &SessionRecord, multiplier: f64) -> String {
    let grid = render_grid(record, None, false);
    format!(
        "Hazard board — wager {} — cash-out at {:.2}x\n{}",
        record.wager, multiplier, grid
    )
}

/// Terminal render after a bust: full board exposed, the fatal cell marked.
pub fn render_busted(record: &SessionRecord, hit: u16) -> String {
    let grid = render_grid(record, Some(hit), true);
    format!("BOOM — wager {} lost\n{}", record.wager, grid)
}

/// Terminal render after a cash-out: full board exposed.
pub fn render_cashed_out(record: &SessionRecord, multiplier: f64, payout: crate::token::Chips) -> String {
    let grid = render_grid(record, None, true);
    format!(
        "Cashed out at {:.2}x for {}\n{}",
        multiplier, payout, grid
    )
}

fn render_grid(record: &SessionRecord, hit: Option<u16>, expose: bool) -> String {
    let width = record.board.width() as usize;
    let mut out = String::with_capacity(record.board.cell_count() * 4 + record.board.height() as usize);
    for ix in 0..record.board.cell_count() as u16 {
        let glyph = if Some(ix) == hit {
            GLYPH_HIT
        } else if record.revealed.contains(&ix) {
            GLYPH_REVEALED
        } else if expose && record.board.is_hazard(ix) {
            GLYPH_HAZARD
        } else if expose {
            GLYPH_REVEALED
        } else {
            GLYPH_HIDDEN
        };
        out.push(glyph);
        if (ix as usize + 1) % width == 0 {
            out.push('\n');
        }
    }
    out
}

/// Frames of the bust animation, coarse on purpose: the chat surface
/// rate-limits edits anyway.
const BUST_FRAMES: [&str; 3] = ["· · ·", "✦ ✦ ✦", "💥"];
const FRAME_DELAY: Duration = Duration::from_millis(600);

/// Supervisor for fire-and-forget terminal animations, keyed by player.
///
/// Settlement must already be durable when `spawn` is called; aborting an
/// animation therefore never leaves the ledger in doubt.
#[derive(Default)]
pub struct AnimationSupervisor {
    tasks: DashMap<PlayerId, JoinHandle<()>>,
}

impl AnimationSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the bust animation for a player, replacing (and aborting) any
    /// previous one, then leave the final board in place.
    pub fn spawn(
        &self,
        player: PlayerId,
        sink: Arc<dyn RenderSink>,
        handle: MessageHandle,
        final_text: String,
    ) {
        let task = tokio::spawn(async move {
            for frame in BUST_FRAMES {
                if sink.edit(&handle, frame).await.is_err() {
                    break;
                }
                tokio::time::sleep(FRAME_DELAY).await;
            }
            let _ = sink.edit(&handle, &final_text).await;
        });
        if let Some(previous) = self.tasks.insert(player, task) {
            previous.abort();
        }
        debug!(player = %player, "bust animation started");
    }

    /// Cancel every in-flight animation (shutdown path).
    pub fn abort_all(&self) {
        for entry in self.tasks.iter() {
            entry.value().abort();
        }
        self.tasks.clear();
    }
}
