//! Command surface consumed by the chat-command collaborator
//!
//! This is the narrow seam between chat parsing (out of scope) and the
//! engine: place a wager, drive a hazard session, read a balance. Every
//! operation returns a render string plus a settlement summary where one
//! applies.

use std::sync::Arc;

use tracing::debug;

use crate::config::CasinoConfig;
use crate::engine::{DrawSource, OutcomeEngine};
use crate::error::{Error, Result};
use crate::ledger::{AccountRepository, Ledger, SettlementSummary, TierProgress, VipSchedule};
use crate::presentation::RenderSink;
use crate::rigging::RiggingController;
use crate::session::{RevealReport, SessionManager};
use crate::storage::SessionRepository;
use crate::token::{Chips, PlayerId};

/// Game families exposed on the wager command
#[derive(Debug, Clone, PartialEq)]
pub enum GameKind {
    /// Over/under against a shifted cutoff
    Threshold,
    /// Target-multiplier crash run
    Target { multiplier: f64 },
    /// Match-count table game over picked markers
    Table { picks: Vec<u8> },
    /// Center-biased walk
    Path,
    /// Card-hand showdown
    Hand,
}

/// One resolved wager as returned to chat
#[derive(Debug, Clone)]
pub struct WagerResult {
    pub render: String,
    pub settlement: SettlementSummary,
}

/// Facade wiring the ledger, engine, rigging and session store together.
pub struct CasinoService {
    ledger: Arc<Ledger>,
    engine: OutcomeEngine,
    rigging: Arc<RiggingController>,
    sessions: Arc<SessionManager>,
}

impl CasinoService {
    pub fn new(
        config: CasinoConfig,
        accounts: Arc<dyn AccountRepository>,
        sessions_repo: Arc<dyn SessionRepository>,
        sink: Arc<dyn RenderSink>,
    ) -> Result<Self> {
        config.validate()?;
        let rigging = Arc::new(RiggingController::new(
            config.rigging.toggle_value,
            config.rigging.nudge_step,
        ));
        let ledger = Arc::new(Ledger::new(accounts, config.vip.clone()));
        let engine = OutcomeEngine::new(config.edges, rigging.clone());
        let sessions = Arc::new(SessionManager::new(
            sessions_repo,
            ledger.clone(),
            rigging.clone(),
            sink,
            config.hazard,
            config.edges.hazard,
        ));
        Ok(Self {
            ledger,
            engine,
            rigging,
            sessions,
        })
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn rigging(&self) -> &Arc<RiggingController> {
        &self.rigging
    }

    pub fn vip(&self) -> &VipSchedule {
        self.ledger.vip()
    }

    /// Resolve a single-shot wager and settle it.
    ///
    /// The wager is validated before any draw: non-positive amounts and
    /// amounts above the balance never reach the engine.
    pub async fn wager(
        &self,
        player: PlayerId,
        game: GameKind,
        amount: Chips,
        draws: &mut dyn DrawSource,
    ) -> Result<WagerResult> {
        self.validate_wager(player, amount).await?;

        let (multiplier, push, line) = match game {
            GameKind::Threshold => {
                let o = self.engine.resolve_threshold(draws);
                let line = if o.win {
                    format!("Rolled {:.3} — over! Even money.", o.draw)
                } else {
                    format!("Rolled {:.3} — under.", o.draw)
                };
                (o.multiplier, false, line)
            }
            GameKind::Target { multiplier } => {
                let o = self.engine.resolve_target(draws, multiplier)?;
                let line = if o.win {
                    format!("Crashed at {:.2}x — target {:.2}x paid.", o.crash, o.target)
                } else {
                    format!("Crashed at {:.2}x — short of {:.2}x.", o.crash, o.target)
                };
                (o.multiplier, false, line)
            }
            GameKind::Table { picks } => {
                let o = self.engine.resolve_table(draws, &picks)?;
                let line = format!(
                    "Matched {} of {} picks — {}x.",
                    o.matches,
                    picks.len(),
                    o.multiplier
                );
                (o.multiplier, false, line)
            }
            GameKind::Path => {
                let o = self.engine.resolve_path(draws);
                let line = format!("Landed in slot {} — {}x.", o.column, o.multiplier);
                (o.multiplier, false, line)
            }
            GameKind::Hand => {
                let o = self.engine.resolve_hand(draws);
                let line = if o.push {
                    "Push — stake returned.".to_string()
                } else if o.natural {
                    "Natural 21! Premium payout.".to_string()
                } else if o.win {
                    "You beat the dealer.".to_string()
                } else {
                    "Dealer wins.".to_string()
                };
                (o.multiplier, o.push, line)
            }
        };

        let payout = amount.scaled(multiplier);
        let net = payout.checked_sub(amount)?;
        let settlement = self.ledger.settle(player, amount, net).await?;
        debug!(player = %player, multiplier, push, "wager resolved");

        let render = format!(
            "{} Net {} — balance {}.",
            line, settlement.net_change, settlement.new_balance
        );
        Ok(WagerResult { render, settlement })
    }

    /// Start a hazard-board session.
    pub async fn start(
        &self,
        player: PlayerId,
        wager: Chips,
        width: u8,
        height: u8,
        hazard_count: u16,
        channel: &str,
        draws: &mut dyn DrawSource,
    ) -> Result<String> {
        let (_, render) = self
            .sessions
            .create(player, wager, width, height, hazard_count, channel, draws)
            .await?;
        Ok(render)
    }

    /// Reveal cells in the active session.
    pub async fn reveal(
        &self,
        player: PlayerId,
        cells: &[u16],
        cash_out_after: bool,
        draws: &mut dyn DrawSource,
    ) -> Result<RevealReport> {
        self.sessions.reveal(player, cells, cash_out_after, draws).await
    }

    /// Cash out the active session.
    pub async fn cash_out(&self, player: PlayerId) -> Result<RevealReport> {
        self.sessions.cash_out(player).await
    }

    pub async fn balance(&self, player: PlayerId) -> Result<Chips> {
        self.ledger.balance(player).await
    }

    pub async fn deposit(&self, player: PlayerId, amount: Chips) -> Result<Chips> {
        self.ledger.deposit(player, amount).await
    }

    pub async fn tier_progress(&self, player: PlayerId) -> Result<TierProgress> {
        self.ledger.tier_progress(player).await
    }

    async fn validate_wager(&self, player: PlayerId, amount: Chips) -> Result<()> {
        if !amount.is_positive() {
            return Err(Error::InvalidWager("amount must be positive".to_string()));
        }
        let balance = self.ledger.balance(player).await?;
        if balance < amount {
            return Err(Error::InvalidWager(format!(
                "amount {} exceeds balance {}",
                amount, balance
            )));
        }
        Ok(())
    }
}
