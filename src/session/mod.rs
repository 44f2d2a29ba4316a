//! Persistent multi-step hazard-board sessions
//!
//! This module implements:
//! - Session lifecycle: `NoSession -> Active -> {Busted, CashedOut}`
//! - Incremental reveal with per-cell validation and clamping
//! - The rigging mutation that relocates a hazard mid-game
//! - Cash-out settlement at the hypergeometric product multiplier
//! - Idle-session reaping
//!
//! Every mutating step round-trips wholesale through the durable store, so
//! a crashed process resumes from the last persisted state. Reveal steps
//! for one session are strictly sequential: a per-player lock serializes
//! concurrent requests, because each step's rigging decision depends on
//! the board state the previous step left behind.

pub mod board;
pub mod reaper;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::HazardPolicy;
use crate::engine::DrawSource;
use crate::error::{Error, Result};
use crate::ledger::{Ledger, SettlementSummary};
use crate::presentation::{
    self, AnimationSupervisor, MessageHandle, RenderSink,
};
use crate::rigging::RiggingController;
use crate::storage::SessionRepository;
use crate::token::{Chips, PlayerId};

use board::Board;

/// Bump when the persisted record shape changes; deserialization of
/// in-flight sessions checks this before trusting the payload.
pub const SCHEMA_VERSION: u32 = 1;

/// The persisted session record, overwritten wholesale on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub version: u32,
    pub owner: PlayerId,
    pub wager: Chips,
    pub board: Board,
    /// Reveal order matters: the cash-out multiplier is a product over it.
    pub revealed: Vec<u16>,
    pub last_render: Option<MessageHandle>,
    pub last_activity: u64,
}

impl SessionRecord {
    /// Closed-form cash-out multiplier after `revealed` safe reveals:
    /// the product of `unrevealed / safe-remaining` at each step, i.e. the
    /// inverse of the hypergeometric survival probability of the run.
    pub fn cash_out_multiplier(&self) -> f64 {
        let n = self.board.cell_count() as f64;
        let safe = self.board.safe_count() as f64;
        let mut multiplier = 1.0;
        for i in 0..self.revealed.len() {
            multiplier *= (n - i as f64) / (safe - i as f64);
        }
        multiplier
    }

    pub fn remaining_safe(&self) -> usize {
        self.board.safe_count() - self.revealed.len()
    }
}

/// Where a reveal left the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Continuing,
    Busted,
    CashedOut,
}

/// Result of a reveal or cash-out step
#[derive(Debug, Clone)]
pub struct RevealReport {
    pub outcome: SessionOutcome,
    pub render: String,
    /// Present on terminal outcomes
    pub settlement: Option<SettlementSummary>,
    /// Cells rejected per-cell, with reasons; valid cells still processed
    pub skipped: Vec<(u16, String)>,
}

/// The session state machine over a durable store and the ledger.
pub struct SessionManager {
    store: Arc<dyn SessionRepository>,
    ledger: Arc<Ledger>,
    rigging: Arc<RiggingController>,
    sink: Arc<dyn RenderSink>,
    animations: AnimationSupervisor,
    locks: DashMap<PlayerId, Arc<Mutex<()>>>,
    policy: HazardPolicy,
    /// Base rig-roll probability before the rigging modifier
    hazard_edge: f64,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionRepository>,
        ledger: Arc<Ledger>,
        rigging: Arc<RiggingController>,
        sink: Arc<dyn RenderSink>,
        policy: HazardPolicy,
        hazard_edge: f64,
    ) -> Self {
        Self {
            store,
            ledger,
            rigging,
            sink,
            animations: AnimationSupervisor::new(),
            locks: DashMap::new(),
            policy,
            hazard_edge,
        }
    }

    /// Per-player single-writer discipline: every mutating operation takes
    /// this lock for the whole read-modify-persist cycle. Entries are never
    /// removed: a waiter already holding a cloned `Arc` and a newcomer
    /// minting a fresh entry would otherwise hold different mutexes and run
    /// concurrently. The table is bounded by the player population.
    fn lock_for(&self, player: PlayerId) -> Arc<Mutex<()>> {
        self.locks
            .entry(player)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Start a session. Fails with `SessionConflict` if one is active and
    /// `InvalidWager` if the wager is non-positive or exceeds the balance.
    pub async fn create(
        &self,
        player: PlayerId,
        wager: Chips,
        width: u8,
        height: u8,
        hazard_count: u16,
        channel: &str,
        draws: &mut dyn DrawSource,
    ) -> Result<(SessionRecord, String)> {
        let lock = self.lock_for(player);
        let _guard = lock.lock().await;

        if self.store.load(player).await?.is_some() {
            return Err(Error::SessionConflict);
        }
        if !wager.is_positive() {
            return Err(Error::InvalidWager("wager must be positive".to_string()));
        }
        let balance = self.ledger.balance(player).await?;
        if balance < wager {
            return Err(Error::InvalidWager(format!(
                "wager {} exceeds balance {}",
                wager, balance
            )));
        }
        if width > self.policy.max_width || height > self.policy.max_height {
            return Err(Error::InvalidInput(format!(
                "board exceeds {}x{} limit",
                self.policy.max_width, self.policy.max_height
            )));
        }

        let board = Board::generate(draws, width, height, hazard_count)?;
        let mut record = SessionRecord {
            version: SCHEMA_VERSION,
            owner: player,
            wager,
            board,
            revealed: Vec::new(),
            last_render: None,
            last_activity: unix_now(),
        };

        // Persist before presenting: a chat message must never reference a
        // session the store does not hold.
        self.store.store(&record).await?;

        let render = presentation::render_active(&record, record.cash_out_multiplier());
        let handle = match self.sink.send(channel, &render).await {
            Ok(handle) => handle,
            Err(err) => {
                // The player never saw the board; drop the unseen session
                // rather than leave it waiting for the reaper.
                let _ = self.store.delete(player).await;
                return Err(err);
            }
        };
        record.last_render = Some(handle);
        self.store.store(&record).await?;

        info!(player = %player, wager = %wager, "hazard session created");
        Ok((record, render))
    }

    /// Reveal cells sequentially. Invalid cells are skipped per-cell; a
    /// request for more cells than remain safe is clamped and forces an
    /// auto-cash-out; any hazard (or rigged hazard) busts the session.
    pub async fn reveal(
        &self,
        player: PlayerId,
        cells: &[u16],
        cash_out_after: bool,
        draws: &mut dyn DrawSource,
    ) -> Result<RevealReport> {
        let lock = self.lock_for(player);
        let _guard = lock.lock().await;

        let mut record = self
            .store
            .load(player)
            .await?
            .ok_or(Error::SessionNotFound)?;

        let mut valid = Vec::with_capacity(cells.len());
        let mut skipped = Vec::new();
        for (i, &cell) in cells.iter().enumerate() {
            if !record.board.contains(cell) {
                skipped.push((cell, "off the board".to_string()));
            } else if record.revealed.contains(&cell) {
                skipped.push((cell, "already revealed".to_string()));
            } else if cells[..i].contains(&cell) {
                skipped.push((cell, "duplicated in request".to_string()));
            } else {
                valid.push(cell);
            }
        }

        // Clamp to the remaining safe cells; revealing them all is a full
        // clear, so the cash-out is forced regardless of the flag.
        let remaining = record.remaining_safe();
        let mut forced = false;
        if valid.len() > remaining {
            valid.truncate(remaining);
            forced = true;
        }

        let rig_threshold = self.rig_threshold();
        for cell in valid {
            if record.board.is_hazard(cell) {
                return self.bust(record, cell, skipped).await;
            }

            // The rigged path: a should-have-been-safe reveal is forced to
            // fail by relocating an existing hazard under it first. The
            // board's hazard count never changes.
            if draws.draw() < rig_threshold {
                let moved = record.board.relocate_hazard(draws, cell)?;
                self.store.store(&record).await?;
                warn!(player = %player, cell, moved, "hazard relocated onto reveal");
                return self.bust(record, cell, skipped).await;
            }

            record.revealed.push(cell);
            record.last_activity = unix_now();
            self.store.store(&record).await?;
        }

        if record.remaining_safe() == 0 || forced || cash_out_after {
            return self.cash_out_inner(record, skipped).await;
        }

        let render = presentation::render_active(&record, record.cash_out_multiplier());
        self.emit(&mut record, &render).await?;
        self.store.store(&record).await?;

        Ok(RevealReport {
            outcome: SessionOutcome::Continuing,
            render,
            settlement: None,
            skipped,
        })
    }

    /// Voluntary cash-out of the active session.
    pub async fn cash_out(&self, player: PlayerId) -> Result<RevealReport> {
        let lock = self.lock_for(player);
        let _guard = lock.lock().await;
        let record = self
            .store
            .load(player)
            .await?
            .ok_or(Error::SessionNotFound)?;
        self.cash_out_inner(record, Vec::new()).await
    }

    /// Forfeit sessions idle past the policy window. Returns the number
    /// reaped. Called from the background loop in `reaper`.
    pub async fn reap_idle(&self, now: u64) -> Result<usize> {
        let mut reaped = 0;
        for stale in self.store.all().await? {
            if now.saturating_sub(stale.last_activity) <= self.policy.idle_timeout_secs {
                continue;
            }
            let player = stale.owner;
            let lock = self.lock_for(player);
            let _guard = lock.lock().await;
            // Reload under the lock; the session may have just settled.
            let Some(record) = self.store.load(player).await? else {
                continue;
            };
            if now.saturating_sub(record.last_activity) <= self.policy.idle_timeout_secs {
                continue;
            }
            let settlement = self
                .ledger
                .settle(player, record.wager, record.wager.neg())
                .await?;
            self.store.delete(player).await?;
            info!(
                player = %player,
                balance = %settlement.new_balance,
                "idle hazard session forfeited"
            );
            reaped += 1;
        }
        Ok(reaped)
    }

    /// Cancel in-flight animations (shutdown path). Settlement for each is
    /// already durable, so this forfeits nothing.
    pub fn shutdown(&self) {
        self.animations.abort_all();
    }

    /// Rig roll threshold: the hazard-game edge plus the shared modifier.
    fn rig_threshold(&self) -> f64 {
        (self.hazard_edge + self.rigging.modifier()).clamp(0.0, 0.95)
    }

    async fn bust(
        &self,
        record: SessionRecord,
        hit: u16,
        skipped: Vec<(u16, String)>,
    ) -> Result<RevealReport> {
        let player = record.owner;
        // Settlement first: the debit must be durably visible before any
        // animation renders, so a cancelled animation never leaves the
        // ledger in doubt.
        let settlement = self
            .ledger
            .settle(player, record.wager, record.wager.neg())
            .await?;
        self.store.delete(player).await?;

        let render = presentation::render_busted(&record, hit);
        if let Some(handle) = record.last_render.clone() {
            self.animations
                .spawn(player, self.sink.clone(), handle, render.clone());
        }
        info!(player = %player, balance = %settlement.new_balance, "session busted");

        Ok(RevealReport {
            outcome: SessionOutcome::Busted,
            render,
            settlement: Some(settlement),
            skipped,
        })
    }

    async fn cash_out_inner(
        &self,
        record: SessionRecord,
        skipped: Vec<(u16, String)>,
    ) -> Result<RevealReport> {
        let player = record.owner;
        let multiplier = record.cash_out_multiplier();
        let payout = record.wager.scaled(multiplier);
        let net = payout.checked_sub(record.wager)?;

        let settlement = self.ledger.settle(player, record.wager, net).await?;
        self.store.delete(player).await?;

        let render = presentation::render_cashed_out(&record, multiplier, payout);
        if let Some(handle) = &record.last_render {
            // The settlement is already durable; a lost edit is only a
            // stale message, not a correctness problem.
            if let Err(err) = self.sink.edit(handle, &render).await {
                warn!(player = %player, %err, "terminal render edit failed");
            }
        }
        info!(
            player = %player,
            multiplier,
            balance = %settlement.new_balance,
            "session cashed out"
        );

        Ok(RevealReport {
            outcome: SessionOutcome::CashedOut,
            render,
            settlement: Some(settlement),
            skipped,
        })
    }

    async fn emit(&self, record: &mut SessionRecord, text: &str) -> Result<()> {
        match &record.last_render {
            Some(handle) => self.sink.edit(handle, text).await?,
            None => {
                let handle = self.sink.send("", text).await?;
                record.last_render = Some(handle);
            }
        }
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
