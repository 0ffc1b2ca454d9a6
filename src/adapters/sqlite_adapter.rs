//! SQLite plan store adapter.

use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::{debug, info};

use crate::domain::disabled_rules::DisabledRules;
use crate::domain::error::BitageError;
use crate::domain::plan::{AccumulationPlan, Plan, PlanId, PlanKind, SingleEntryPlan};
use crate::domain::plan_validation::DATE_FORMAT;
use crate::ports::config_port::ConfigPort;
use crate::ports::plan_store_port::PlanStorePort;

const ACCUMULATION_TABLE: &str = "accumulation_plans";
const SINGLE_ENTRY_TABLE: &str = "single_entry_plans";
const DISABLED_COLUMN: &str = "disabled_sell_rules";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> BitageError {
    BitageError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn table_for(kind: PlanKind) -> &'static str {
    match kind {
        PlanKind::Accumulation => ACCUMULATION_TABLE,
        PlanKind::SingleEntry => SINGLE_ENTRY_TABLE,
    }
}

fn conversion_err(column: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BitageError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| BitageError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4);
        if pool_size < 1 {
            return Err(BitageError::ConfigInvalid {
                section: "sqlite".into(),
                key: "pool_size".into(),
                reason: "pool_size must be at least 1".into(),
            });
        }

        debug!(path = %db_path, pool_size, "opening plan store");
        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size as u32)
            .build(manager)
            .map_err(|e: r2d2::Error| BitageError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, BitageError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| BitageError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, BitageError> {
        self.pool.get().map_err(|e: r2d2::Error| BitageError::Database {
            reason: e.to_string(),
        })
    }

    /// Create both plan tables and add the disabled-rule column to
    /// databases created before it existed.
    pub fn initialize_schema(&self) -> Result<(), BitageError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS accumulation_plans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                ticker TEXT NOT NULL,
                ath_value REAL NOT NULL,
                ath_date TEXT NOT NULL,
                buy_rules TEXT NOT NULL DEFAULT '',
                sell_rules TEXT NOT NULL DEFAULT '',
                disabled_sell_rules TEXT NOT NULL DEFAULT ''
            );
            CREATE TABLE IF NOT EXISTS single_entry_plans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                ticker TEXT NOT NULL,
                purchase_price REAL NOT NULL,
                sell_rules TEXT NOT NULL DEFAULT '',
                disabled_sell_rules TEXT NOT NULL DEFAULT ''
            );",
        )
        .map_err(query_err)?;

        for table in [ACCUMULATION_TABLE, SINGLE_ENTRY_TABLE] {
            if !Self::has_column(&conn, table, DISABLED_COLUMN)? {
                info!(table, "adding {} column", DISABLED_COLUMN);
                conn.execute_batch(&format!(
                    "ALTER TABLE {table} ADD COLUMN {DISABLED_COLUMN} TEXT NOT NULL DEFAULT ''"
                ))
                .map_err(query_err)?;
            }
        }

        Ok(())
    }

    fn has_column(
        conn: &rusqlite::Connection,
        table: &str,
        column: &str,
    ) -> Result<bool, BitageError> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .map_err(query_err)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(query_err)?;
        for name in names {
            if name.map_err(query_err)? == column {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn upsert_accumulation(&self, plan: &AccumulationPlan) -> Result<PlanId, BitageError> {
        let conn = self.conn()?;
        let ath_date = plan.ath_date.format(DATE_FORMAT).to_string();
        let disabled = plan.disabled_sell.encode();

        match plan.id {
            Some(id) => {
                let changed = conn
                    .execute(
                        "UPDATE accumulation_plans
                         SET name = ?1, ticker = ?2, ath_value = ?3, ath_date = ?4,
                             buy_rules = ?5, sell_rules = ?6, disabled_sell_rules = ?7
                         WHERE id = ?8",
                        params![
                            plan.name,
                            plan.ticker,
                            plan.ath_value,
                            ath_date,
                            plan.buy_rules,
                            plan.sell_rules,
                            disabled,
                            id
                        ],
                    )
                    .map_err(query_err)?;
                if changed == 0 {
                    return Err(BitageError::PlanNotFound {
                        kind: PlanKind::Accumulation,
                        id,
                    });
                }
                Ok(id)
            }
            None => {
                conn.execute(
                    "INSERT INTO accumulation_plans
                     (name, ticker, ath_value, ath_date, buy_rules, sell_rules, disabled_sell_rules)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        plan.name,
                        plan.ticker,
                        plan.ath_value,
                        ath_date,
                        plan.buy_rules,
                        plan.sell_rules,
                        disabled
                    ],
                )
                .map_err(query_err)?;
                Ok(conn.last_insert_rowid())
            }
        }
    }

    fn upsert_single_entry(&self, plan: &SingleEntryPlan) -> Result<PlanId, BitageError> {
        let conn = self.conn()?;
        let disabled = plan.disabled_sell.encode();

        match plan.id {
            Some(id) => {
                let changed = conn
                    .execute(
                        "UPDATE single_entry_plans
                         SET name = ?1, ticker = ?2, purchase_price = ?3,
                             sell_rules = ?4, disabled_sell_rules = ?5
                         WHERE id = ?6",
                        params![
                            plan.name,
                            plan.ticker,
                            plan.purchase_price,
                            plan.sell_rules,
                            disabled,
                            id
                        ],
                    )
                    .map_err(query_err)?;
                if changed == 0 {
                    return Err(BitageError::PlanNotFound {
                        kind: PlanKind::SingleEntry,
                        id,
                    });
                }
                Ok(id)
            }
            None => {
                conn.execute(
                    "INSERT INTO single_entry_plans
                     (name, ticker, purchase_price, sell_rules, disabled_sell_rules)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        plan.name,
                        plan.ticker,
                        plan.purchase_price,
                        plan.sell_rules,
                        disabled
                    ],
                )
                .map_err(query_err)?;
                Ok(conn.last_insert_rowid())
            }
        }
    }
}

impl PlanStorePort for SqliteAdapter {
    fn list_accumulation_plans(&self) -> Result<Vec<AccumulationPlan>, BitageError> {
        let conn = self.conn()?;

        let query = "SELECT id, name, ticker, ath_value, ath_date, buy_rules, sell_rules,
                            disabled_sell_rules
                     FROM accumulation_plans
                     ORDER BY id ASC";

        let mut stmt = conn.prepare(query).map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                let date_str: String = row.get(4)?;
                let ath_date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
                    .map_err(|e| conversion_err(4, e))?;
                let disabled_str: String = row.get(7)?;
                let disabled_sell =
                    DisabledRules::decode(&disabled_str).map_err(|e| conversion_err(7, e))?;
                Ok(AccumulationPlan {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                    ticker: row.get(2)?,
                    ath_value: row.get(3)?,
                    ath_date,
                    buy_rules: row.get(5)?,
                    sell_rules: row.get(6)?,
                    disabled_sell,
                })
            })
            .map_err(query_err)?;

        let mut plans = Vec::new();
        for row in rows {
            plans.push(row.map_err(query_err)?);
        }

        Ok(plans)
    }

    fn list_single_entry_plans(&self) -> Result<Vec<SingleEntryPlan>, BitageError> {
        let conn = self.conn()?;

        let query = "SELECT id, name, ticker, purchase_price, sell_rules, disabled_sell_rules
                     FROM single_entry_plans
                     ORDER BY id ASC";

        let mut stmt = conn.prepare(query).map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                let disabled_str: String = row.get(5)?;
                let disabled_sell =
                    DisabledRules::decode(&disabled_str).map_err(|e| conversion_err(5, e))?;
                Ok(SingleEntryPlan {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                    ticker: row.get(2)?,
                    purchase_price: row.get(3)?,
                    sell_rules: row.get(4)?,
                    disabled_sell,
                })
            })
            .map_err(query_err)?;

        let mut plans = Vec::new();
        for row in rows {
            plans.push(row.map_err(query_err)?);
        }

        Ok(plans)
    }

    fn upsert_plan(&self, plan: &Plan) -> Result<PlanId, BitageError> {
        let id = match plan {
            Plan::Accumulation(p) => self.upsert_accumulation(p)?,
            Plan::SingleEntry(p) => self.upsert_single_entry(p)?,
        };
        debug!(kind = %plan.kind(), id, "plan stored");
        Ok(id)
    }

    fn delete_plan(&self, kind: PlanKind, id: PlanId) -> Result<(), BitageError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                &format!("DELETE FROM {} WHERE id = ?1", table_for(kind)),
                params![id],
            )
            .map_err(query_err)?;
        if changed == 0 {
            return Err(BitageError::PlanNotFound { kind, id });
        }
        debug!(%kind, id, "plan deleted");
        Ok(())
    }

    fn set_disabled_sell_indices(
        &self,
        kind: PlanKind,
        id: PlanId,
        indices: &DisabledRules,
    ) -> Result<(), BitageError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                &format!(
                    "UPDATE {} SET {DISABLED_COLUMN} = ?1 WHERE id = ?2",
                    table_for(kind)
                ),
                params![indices.encode(), id],
            )
            .map_err(query_err)?;
        if changed == 0 {
            return Err(BitageError::PlanNotFound { kind, id });
        }
        debug!(%kind, id, disabled = %indices, "disabled sell rules updated");
        Ok(())
    }
}
