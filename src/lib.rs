//! Wager settlement and outcome-resolution engine for a chat-bot casino
//!
//! The crate is organized as a set of districts:
//! - token: the chip currency and player identity
//! - ledger: atomic balance mutation and VIP progression
//! - engine: the outcome resolvers, one per game family
//! - session: the persistent multi-step hazard-board game
//! - rigging: process-wide house-edge modifier state
//! - storage: durable repositories (sqlite) plus in-memory test backends
//! - presentation: render strings and chat-surface synchronization
//! - commands: the narrow facade the chat collaborator consumes
//!
//! Chat transport, command parsing and notification integrations live
//! outside this crate and consume it only through `commands`.

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod presentation;
pub mod rigging;
pub mod session;
pub mod storage;
pub mod token;

pub use commands::{CasinoService, GameKind, WagerResult};
pub use config::{CasinoConfig, GameEdges, HazardPolicy, RiggingPolicy};
pub use engine::{DrawSource, OutcomeEngine, SeededDraws, ThreadDraws};
pub use error::{Error, Result};
pub use ledger::{
    Account, AccountRepository, Ledger, SettlementSummary, TierProgress, Transaction,
    TransactionCategory, VipLevel, VipSchedule,
};
pub use presentation::{AnimationSupervisor, CapturingSink, MessageHandle, NullSink, RenderSink};
pub use rigging::{RigOp, RiggingController};
pub use session::{RevealReport, SessionManager, SessionOutcome, SessionRecord};
pub use storage::{MemoryStore, SessionRepository, SqliteStore};
pub use token::{Chips, PlayerId};
