//! Balance ledger and wager settlement
//!
//! This module implements:
//! - Append-only transaction records over a repository interface
//! - Atomic wager settlement (debit wager, credit wager + net effect)
//! - Deposits, withdrawals, transfers, bonuses and sponsorships
//! - VIP tier progression over lifetime wagered totals
//!
//! Authoritative state lives behind `AccountRepository`; the ledger never
//! holds balances only in a process-wide map.

pub mod vip;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{Error, Result};
use crate::token::{Chips, PlayerId};

pub use vip::{TierProgress, VipLevel, VipSchedule};

/// Transaction categories, immutable once written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionCategory {
    Wager,
    Payout,
    Deposit,
    Withdrawal,
    Bonus,
    Transfer,
    Sponsorship,
}

impl TransactionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wager => "wager",
            Self::Payout => "payout",
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Bonus => "bonus",
            Self::Transfer => "transfer",
            Self::Sponsorship => "sponsorship",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "wager" => Ok(Self::Wager),
            "payout" => Ok(Self::Payout),
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "bonus" => Ok(Self::Bonus),
            "transfer" => Ok(Self::Transfer),
            "sponsorship" => Ok(Self::Sponsorship),
            other => Err(Error::Storage(format!("unknown category '{}'", other))),
        }
    }
}

/// Append-only transaction record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: [u8; 32],
    pub player: PlayerId,
    /// Signed amount: negative debits, positive credits
    pub amount: Chips,
    pub category: TransactionCategory,
    pub timestamp: u64,
    pub counterparty: Option<PlayerId>,
}

/// Cached account state; derivable from the transaction log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub player: PlayerId,
    pub balance: Chips,
    pub lifetime_wagered: Chips,
    pub transaction_count: u64,
}

impl Account {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            balance: Chips::ZERO,
            lifetime_wagered: Chips::ZERO,
            transaction_count: 0,
        }
    }
}

/// Repository interface over the durable store.
///
/// `commit` persists the cached accounts and their new transactions in one
/// atomic write; a failure leaves none of it visible. Multi-account commits
/// exist for transfers, where a half-applied write would destroy chips.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn load(&self, player: PlayerId) -> Result<Option<Account>>;
    async fn commit(&self, accounts: &[Account], transactions: &[Transaction]) -> Result<()>;
    async fn transactions(&self, player: PlayerId) -> Result<Vec<Transaction>>;
}

/// Result of a settlement, returned to the command surface for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettlementSummary {
    pub net_change: Chips,
    pub new_balance: Chips,
    /// Display multiplier; only computed for strictly winning settlements
    pub multiplier: Option<f64>,
}

/// Wager settlement and balance mutation over a repository
pub struct Ledger {
    repo: Arc<dyn AccountRepository>,
    vip: VipSchedule,
}

impl Ledger {
    pub fn new(repo: Arc<dyn AccountRepository>, vip: VipSchedule) -> Self {
        Self { repo, vip }
    }

    pub fn vip(&self) -> &VipSchedule {
        &self.vip
    }

    /// Current balance; unknown players read as zero.
    pub async fn balance(&self, player: PlayerId) -> Result<Chips> {
        Ok(self
            .repo
            .load(player)
            .await?
            .map(|a| a.balance)
            .unwrap_or(Chips::ZERO))
    }

    pub async fn account(&self, player: PlayerId) -> Result<Account> {
        Ok(self
            .repo
            .load(player)
            .await?
            .unwrap_or_else(|| Account::new(player)))
    }

    /// Settle a resolved wager: debit `wager`, credit `wager + net`.
    ///
    /// `net` is negative for a loss, positive for a win. Refuses without
    /// mutation unless `wager > 0`. The display multiplier
    /// `(wager + net) / wager` is only computed when the settlement is a
    /// strict win, so the division is avoided by construction.
    pub async fn settle(
        &self,
        player: PlayerId,
        wager: Chips,
        net: Chips,
    ) -> Result<SettlementSummary> {
        if !wager.is_positive() {
            return Err(Error::InvalidWager(format!(
                "wager must be positive, got {}",
                wager
            )));
        }

        let mut account = self.account(player).await?;
        let mut transactions = Vec::with_capacity(2);
        transactions.push(self.transaction(player, wager.neg(), TransactionCategory::Wager, None));

        let credit = wager.checked_add(net)?;
        if credit.is_positive() {
            transactions.push(self.transaction(player, credit, TransactionCategory::Payout, None));
        }

        account.balance = account.balance.checked_add(net)?;
        account.lifetime_wagered = account.lifetime_wagered.checked_add(wager)?;
        account.transaction_count += transactions.len() as u64;

        let multiplier = if net.is_positive() && credit.is_positive() {
            Some(credit.amount() as f64 / wager.amount() as f64)
        } else {
            None
        };

        self.repo
            .commit(std::slice::from_ref(&account), &transactions)
            .await?;
        info!(
            player = %player,
            wager = %wager,
            net = %net,
            balance = %account.balance,
            "settled wager"
        );

        Ok(SettlementSummary {
            net_change: net,
            new_balance: account.balance,
            multiplier,
        })
    }

    /// Credit an external deposit
    pub async fn deposit(&self, player: PlayerId, amount: Chips) -> Result<Chips> {
        self.single_credit(player, amount, TransactionCategory::Deposit, None)
            .await
    }

    /// Credit a bonus (tier rewards, promotions)
    pub async fn bonus(&self, player: PlayerId, amount: Chips) -> Result<Chips> {
        self.single_credit(player, amount, TransactionCategory::Bonus, None)
            .await
    }

    /// Credit a sponsorship grant
    pub async fn sponsorship(&self, player: PlayerId, amount: Chips) -> Result<Chips> {
        self.single_credit(player, amount, TransactionCategory::Sponsorship, None)
            .await
    }

    /// Debit a withdrawal; refuses if it would overdraw the account.
    pub async fn withdraw(&self, player: PlayerId, amount: Chips) -> Result<Chips> {
        if !amount.is_positive() {
            return Err(Error::InvalidInput("withdrawal must be positive".to_string()));
        }
        let mut account = self.account(player).await?;
        if account.balance < amount {
            return Err(Error::InsufficientBalance(format!(
                "balance {} below withdrawal {}",
                account.balance, amount
            )));
        }
        let tx = self.transaction(player, amount.neg(), TransactionCategory::Withdrawal, None);
        account.balance = account.balance.checked_sub(amount)?;
        account.transaction_count += 1;
        self.repo
            .commit(std::slice::from_ref(&account), &[tx])
            .await?;
        Ok(account.balance)
    }

    /// Move chips between two players in paired transfer transactions.
    /// Both sides commit in one repository write; a store failure leaves
    /// neither the debit nor the credit visible.
    pub async fn transfer(&self, from: PlayerId, to: PlayerId, amount: Chips) -> Result<()> {
        if !amount.is_positive() {
            return Err(Error::InvalidInput("transfer must be positive".to_string()));
        }
        if from == to {
            return Err(Error::InvalidInput("cannot transfer to self".to_string()));
        }
        let mut sender = self.account(from).await?;
        if sender.balance < amount {
            return Err(Error::InsufficientBalance(format!(
                "balance {} below transfer {}",
                sender.balance, amount
            )));
        }
        let mut receiver = self.account(to).await?;

        let debit = self.transaction(from, amount.neg(), TransactionCategory::Transfer, Some(to));
        let credit = self.transaction(to, amount, TransactionCategory::Transfer, Some(from));
        sender.balance = sender.balance.checked_sub(amount)?;
        sender.transaction_count += 1;
        receiver.balance = receiver.balance.checked_add(amount)?;
        receiver.transaction_count += 1;

        self.repo
            .commit(&[sender, receiver], &[debit, credit])
            .await?;

        info!(from = %from, to = %to, amount = %amount, "transfer complete");
        Ok(())
    }

    /// VIP progression for a player's lifetime wagered total
    pub async fn tier_progress(&self, player: PlayerId) -> Result<TierProgress> {
        let account = self.account(player).await?;
        Ok(self.vip.tier_progress(account.lifetime_wagered))
    }

    /// Verify the cached balance against the transaction log.
    pub async fn audit(&self, player: PlayerId) -> Result<bool> {
        let account = self.account(player).await?;
        let mut sum = Chips::ZERO;
        for tx in self.repo.transactions(player).await? {
            sum = sum.checked_add(tx.amount)?;
        }
        Ok(sum == account.balance)
    }

    async fn single_credit(
        &self,
        player: PlayerId,
        amount: Chips,
        category: TransactionCategory,
        counterparty: Option<PlayerId>,
    ) -> Result<Chips> {
        if !amount.is_positive() {
            return Err(Error::InvalidInput(format!(
                "{} must be positive",
                category.as_str()
            )));
        }
        let mut account = self.account(player).await?;
        let tx = self.transaction(player, amount, category, counterparty);
        account.balance = account.balance.checked_add(amount)?;
        account.transaction_count += 1;
        self.repo
            .commit(std::slice::from_ref(&account), &[tx])
            .await?;
        Ok(account.balance)
    }

    fn transaction(
        &self,
        player: PlayerId,
        amount: Chips,
        category: TransactionCategory,
        counterparty: Option<PlayerId>,
    ) -> Transaction {
        Transaction {
            id: generate_transaction_id(),
            player,
            amount,
            category,
            timestamp: unix_now(),
            counterparty,
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Unique transaction id from wall clock nanos plus random salt
fn generate_transaction_id() -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
            .to_be_bytes(),
    );
    hasher.update(rand::random::<[u8; 16]>());
    let result = hasher.finalize();
    let mut id = [0u8; 32];
    id.copy_from_slice(&result);
    id
}
