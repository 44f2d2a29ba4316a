//! Durable storage backends
//!
//! Two repository interfaces sit between the engine and its state:
//! `AccountRepository` (ledger) and `SessionRepository` (hazard sessions).
//! `SqliteStore` is the production backend; `MemoryStore` backs tests and
//! ephemeral deployments. Session records are stored as versioned JSON
//! blobs and overwritten wholesale on every mutating step; a failure
//! during a step aborts that step with no partial commit.

use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ledger::{Account, AccountRepository, Transaction, TransactionCategory};
use crate::session::{SessionRecord, SCHEMA_VERSION};
use crate::token::{Chips, PlayerId};

/// Session persistence: one record per player under a stable key.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn load(&self, player: PlayerId) -> Result<Option<SessionRecord>>;
    /// Wholesale overwrite; no partial patches.
    async fn store(&self, record: &SessionRecord) -> Result<()>;
    async fn delete(&self, player: PlayerId) -> Result<()>;
    /// Every live session, for the reaper sweep.
    async fn all(&self) -> Result<Vec<SessionRecord>>;
}

/// In-memory backend for tests and throwaway deployments.
#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<PlayerId, Account>,
    transactions: DashMap<PlayerId, Vec<Transaction>>,
    sessions: DashMap<PlayerId, SessionRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn load(&self, player: PlayerId) -> Result<Option<Account>> {
        Ok(self.accounts.get(&player).map(|a| a.clone()))
    }

    async fn commit(&self, accounts: &[Account], transactions: &[Transaction]) -> Result<()> {
        for account in accounts {
            self.accounts.insert(account.player, account.clone());
        }
        for record in transactions {
            self.transactions
                .entry(record.player)
                .or_default()
                .push(record.clone());
        }
        Ok(())
    }

    async fn transactions(&self, player: PlayerId) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions
            .get(&player)
            .map(|t| t.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn load(&self, player: PlayerId) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.get(&player).map(|s| s.clone()))
    }

    async fn store(&self, record: &SessionRecord) -> Result<()> {
        self.sessions.insert(record.owner, record.clone());
        Ok(())
    }

    async fn delete(&self, player: PlayerId) -> Result<()> {
        self.sessions.remove(&player);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.sessions.iter().map(|e| e.value().clone()).collect())
    }
}

/// Sqlite-backed durable store. One connection guarded by an async mutex;
/// every commit runs inside a sqlite transaction.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS accounts (
                player TEXT PRIMARY KEY,
                balance INTEGER NOT NULL,
                lifetime_wagered INTEGER NOT NULL,
                transaction_count INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS transactions (
                id BLOB PRIMARY KEY,
                player TEXT NOT NULL,
                amount INTEGER NOT NULL,
                category TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                counterparty TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_transactions_player
                ON transactions(player);
            CREATE TABLE IF NOT EXISTS sessions (
                player TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                record TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for SqliteStore {
    async fn load(&self, player: PlayerId) -> Result<Option<Account>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT balance, lifetime_wagered, transaction_count
             FROM accounts WHERE player = ?1",
        )?;
        let mut rows = stmt.query(params![player.to_hex()])?;
        match rows.next()? {
            Some(row) => Ok(Some(Account {
                player,
                balance: Chips::new(row.get(0)?),
                lifetime_wagered: Chips::new(row.get(1)?),
                transaction_count: row.get::<_, i64>(2)? as u64,
            })),
            None => Ok(None),
        }
    }

    async fn commit(&self, accounts: &[Account], transactions: &[Transaction]) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        for account in accounts {
            tx.execute(
                "INSERT INTO accounts (player, balance, lifetime_wagered, transaction_count)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(player) DO UPDATE SET
                    balance = ?2, lifetime_wagered = ?3, transaction_count = ?4",
                params![
                    account.player.to_hex(),
                    account.balance.amount(),
                    account.lifetime_wagered.amount(),
                    account.transaction_count as i64,
                ],
            )?;
        }
        for record in transactions {
            tx.execute(
                "INSERT INTO transactions (id, player, amount, category, timestamp, counterparty)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id.as_slice(),
                    record.player.to_hex(),
                    record.amount.amount(),
                    record.category.as_str(),
                    record.timestamp as i64,
                    record.counterparty.map(|p| p.to_hex()),
                ],
            )?;
        }
        tx.commit()?;
        debug!(
            accounts = accounts.len(),
            appended = transactions.len(),
            "ledger state committed"
        );
        Ok(())
    }

    async fn transactions(&self, player: PlayerId) -> Result<Vec<Transaction>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, amount, category, timestamp, counterparty
             FROM transactions WHERE player = ?1 ORDER BY timestamp, id",
        )?;
        let rows = stmt.query_map(params![player.to_hex()], |row| {
            Ok((
                row.get::<_, Vec<u8>>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id_bytes, amount, category, timestamp, counterparty) = row?;
            let mut id = [0u8; 32];
            if id_bytes.len() != 32 {
                return Err(Error::Storage("malformed transaction id".to_string()));
            }
            id.copy_from_slice(&id_bytes);
            out.push(Transaction {
                id,
                player,
                amount: Chips::new(amount),
                category: TransactionCategory::from_str(&category)?,
                timestamp: timestamp as u64,
                counterparty: counterparty
                    .map(|hex| PlayerId::from_hex(&hex))
                    .transpose()?,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SessionRepository for SqliteStore {
    async fn load(&self, player: PlayerId) -> Result<Option<SessionRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare("SELECT version, record FROM sessions WHERE player = ?1")?;
        let mut rows = stmt.query(params![player.to_hex()])?;
        match rows.next()? {
            Some(row) => {
                let version: i64 = row.get(0)?;
                if version != SCHEMA_VERSION as i64 {
                    return Err(Error::Storage(format!(
                        "session record schema {} unsupported (expected {})",
                        version, SCHEMA_VERSION
                    )));
                }
                let blob: String = row.get(1)?;
                Ok(Some(serde_json::from_str(&blob)?))
            }
            None => Ok(None),
        }
    }

    async fn store(&self, record: &SessionRecord) -> Result<()> {
        let blob = serde_json::to_string(record)?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO sessions (player, version, record) VALUES (?1, ?2, ?3)
             ON CONFLICT(player) DO UPDATE SET version = ?2, record = ?3",
            params![record.owner.to_hex(), record.version as i64, blob],
        )?;
        Ok(())
    }

    async fn delete(&self, player: PlayerId) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "DELETE FROM sessions WHERE player = ?1",
            params![player.to_hex()],
        )?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<SessionRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT record FROM sessions")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for blob in rows {
            out.push(serde_json::from_str(&blob?)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SeededDraws;
    use crate::session::board::Board;

    fn sample_session(player: PlayerId) -> SessionRecord {
        let mut draws = SeededDraws::new(21);
        SessionRecord {
            version: SCHEMA_VERSION,
            owner: player,
            wager: Chips::from_chips(25),
            board: Board::generate(&mut draws, 5, 5, 4).unwrap(),
            revealed: vec![2, 7, 11],
            last_render: None,
            last_activity: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_sqlite_account_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let player = PlayerId::random();
        let account = Account {
            player,
            balance: Chips::from_chips(42),
            lifetime_wagered: Chips::from_chips(500),
            transaction_count: 7,
        };
        AccountRepository::commit(&store, std::slice::from_ref(&account), &[])
            .await
            .unwrap();
        let loaded = AccountRepository::load(&store, player).await.unwrap().unwrap();
        assert_eq!(loaded.balance, account.balance);
        assert_eq!(loaded.lifetime_wagered, account.lifetime_wagered);
        assert_eq!(loaded.transaction_count, 7);
    }

    #[tokio::test]
    async fn test_sqlite_commits_multiple_accounts_in_one_write() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = PlayerId::random();
        let b = PlayerId::random();
        let sender = Account {
            player: a,
            balance: Chips::from_chips(30),
            lifetime_wagered: Chips::ZERO,
            transaction_count: 1,
        };
        let receiver = Account {
            player: b,
            balance: Chips::from_chips(20),
            lifetime_wagered: Chips::ZERO,
            transaction_count: 1,
        };
        let txs = [
            Transaction {
                id: [1u8; 32],
                player: a,
                amount: Chips::from_chips(-20),
                category: TransactionCategory::Transfer,
                timestamp: 1,
                counterparty: Some(b),
            },
            Transaction {
                id: [2u8; 32],
                player: b,
                amount: Chips::from_chips(20),
                category: TransactionCategory::Transfer,
                timestamp: 1,
                counterparty: Some(a),
            },
        ];
        AccountRepository::commit(&store, &[sender, receiver], &txs)
            .await
            .unwrap();

        let loaded_a = AccountRepository::load(&store, a).await.unwrap().unwrap();
        let loaded_b = AccountRepository::load(&store, b).await.unwrap().unwrap();
        assert_eq!(loaded_a.balance, Chips::from_chips(30));
        assert_eq!(loaded_b.balance, Chips::from_chips(20));
        assert_eq!(
            AccountRepository::transactions(&store, a).await.unwrap().len(),
            1
        );
        assert_eq!(
            AccountRepository::transactions(&store, b).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_sqlite_session_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let player = PlayerId::random();
        let record = sample_session(player);
        SessionRepository::store(&store, &record).await.unwrap();
        let loaded = SessionRepository::load(&store, player).await.unwrap().unwrap();
        assert_eq!(loaded, record);

        SessionRepository::delete(&store, player).await.unwrap();
        assert!(SessionRepository::load(&store, player)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_sqlite_store_is_wholesale_overwrite() {
        let store = SqliteStore::open_in_memory().unwrap();
        let player = PlayerId::random();
        let mut record = sample_session(player);
        SessionRepository::store(&store, &record).await.unwrap();
        record.revealed.push(19);
        SessionRepository::store(&store, &record).await.unwrap();
        let loaded = SessionRepository::load(&store, player).await.unwrap().unwrap();
        assert_eq!(loaded.revealed, vec![2, 7, 11, 19]);
        assert_eq!(SessionRepository::all(&store).await.unwrap().len(), 1);
    }
}
