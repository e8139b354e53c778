//! SQLite trade ledger adapter.

use crate::domain::error::TradefuseError;
use crate::domain::trade::{ExecutionStatus, StoredTrade, Trade, TradeAction};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use chrono::NaiveDateTime;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SqliteLedger {
    pool: Pool<SqliteConnectionManager>,
}

fn ledger_err(reason: String) -> TradefuseError {
    TradefuseError::Ledger { reason }
}

impl SqliteLedger {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradefuseError> {
        let db_path =
            config
                .get_string("ledger", "path")
                .ok_or_else(|| TradefuseError::ConfigMissing {
                    section: "ledger".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("ledger", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| ledger_err(e.to_string()))?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, TradefuseError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| ledger_err(e.to_string()))?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), TradefuseError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| ledger_err(e.to_string()))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                symbol TEXT NOT NULL,
                action TEXT NOT NULL,
                amount REAL NOT NULL,
                action_string TEXT NOT NULL,
                reason TEXT NOT NULL,
                execution_quote REAL,
                execution_base REAL,
                status TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_trades_symbol ON trades(symbol);
            CREATE INDEX IF NOT EXISTS idx_trades_timestamp ON trades(timestamp);",
        )
        .map_err(|e: rusqlite::Error| ledger_err(e.to_string()))?;

        Ok(())
    }
}

impl LedgerPort for SqliteLedger {
    fn insert_trade(&self, trade: &Trade) -> Result<i64, TradefuseError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| ledger_err(e.to_string()))?;

        conn.execute(
            "INSERT INTO trades (timestamp, symbol, action, amount, action_string,
                                 reason, execution_quote, execution_base, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                trade.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                trade.symbol,
                trade.action.to_string(),
                trade.amount,
                trade.action_string,
                trade.reason,
                trade.execution_quote,
                trade.execution_base,
                trade.status.to_string(),
            ],
        )
        .map_err(|e: rusqlite::Error| ledger_err(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    fn recent_trades(&self, symbol: &str, limit: usize) -> Result<Vec<StoredTrade>, TradefuseError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| ledger_err(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, timestamp, symbol, action, amount, action_string,
                        reason, execution_quote, execution_base, status
                 FROM trades
                 WHERE symbol = ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )
            .map_err(|e: rusqlite::Error| ledger_err(e.to_string()))?;

        let rows = stmt
            .query_map(params![symbol, limit as i64], |row| {
                let timestamp: String = row.get(1)?;
                let action: String = row.get(3)?;
                let status: String = row.get(9)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    timestamp,
                    row.get::<_, String>(2)?,
                    action,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<f64>>(7)?,
                    row.get::<_, Option<f64>>(8)?,
                    status,
                ))
            })
            .map_err(|e: rusqlite::Error| ledger_err(e.to_string()))?;

        let mut trades = Vec::new();
        for row in rows {
            let (id, timestamp, symbol, action, amount, action_string, reason, quote, base, status) =
                row.map_err(|e: rusqlite::Error| ledger_err(e.to_string()))?;

            let timestamp = NaiveDateTime::parse_from_str(&timestamp, TIMESTAMP_FORMAT)
                .map_err(|e| ledger_err(format!("corrupt timestamp in ledger: {}", e)))?;
            let action = TradeAction::parse(&action)
                .ok_or_else(|| ledger_err(format!("corrupt action in ledger: {}", action)))?;
            let status = ExecutionStatus::parse(&status)
                .ok_or_else(|| ledger_err(format!("corrupt status in ledger: {}", status)))?;

            trades.push(StoredTrade {
                id,
                trade: Trade {
                    timestamp,
                    symbol,
                    action,
                    amount,
                    action_string,
                    reason,
                    execution_quote: quote,
                    execution_base: base,
                    status,
                },
            });
        }
        Ok(trades)
    }
}
