//! SQLite-backed quota ledger implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use super::{AdmissionDecision, PlanTier, QuotaConfig, QuotaError, QuotaLedger, UsageReport};

/// SQLite-backed quota ledger.
///
/// The connection mutex is held across the check and the increment, and the
/// increment itself is a conditional UPDATE guarded on the limit, so two
/// callers racing for the last slot of a month see exactly one admission.
pub struct SqliteQuotaLedger {
    conn: Mutex<Connection>,
    config: QuotaConfig,
}

impl SqliteQuotaLedger {
    /// Create a new SQLite quota ledger, creating the database file and tables if needed.
    pub fn new(path: &Path, config: QuotaConfig) -> Result<Self, QuotaError> {
        let conn = Connection::open(path).map_err(|e| QuotaError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            config,
        })
    }

    /// Create an in-memory SQLite quota ledger (useful for testing).
    pub fn in_memory(config: QuotaConfig) -> Result<Self, QuotaError> {
        let conn = Connection::open_in_memory().map_err(|e| QuotaError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            config,
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), QuotaError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS usage_counters (
                user_id TEXT NOT NULL,
                month TEXT NOT NULL,
                count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, month)
            );

            CREATE TABLE IF NOT EXISTS user_plans (
                user_id TEXT PRIMARY KEY,
                tier TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| QuotaError::Database(e.to_string()))?;

        Ok(())
    }

    fn plan_for(conn: &Connection, user_id: &str) -> Result<PlanTier, QuotaError> {
        let result = conn.query_row(
            "SELECT tier FROM user_plans WHERE user_id = ?",
            params![user_id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(tier) if tier == "premium" => Ok(PlanTier::Premium),
            Ok(_) => Ok(PlanTier::Standard),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(PlanTier::Standard),
            Err(e) => Err(QuotaError::Database(e.to_string())),
        }
    }

    fn limit_for(&self, tier: PlanTier) -> u32 {
        match tier {
            PlanTier::Standard => self.config.monthly_limit,
            PlanTier::Premium => self.config.premium_monthly_limit,
        }
    }

    /// Admission check against an explicit month key.
    pub fn admit_in_month(
        &self,
        user_id: &str,
        month: &str,
    ) -> Result<AdmissionDecision, QuotaError> {
        let conn = self.conn.lock().unwrap();

        let tier = Self::plan_for(&conn, user_id)?;
        let limit = self.limit_for(tier);

        conn.execute(
            "INSERT OR IGNORE INTO usage_counters (user_id, month, count) VALUES (?, ?, 0)",
            params![user_id, month],
        )
        .map_err(|e| QuotaError::Database(e.to_string()))?;

        // Rows affected tells us whether the slot was actually taken.
        let admitted = conn
            .execute(
                "UPDATE usage_counters SET count = count + 1 WHERE user_id = ? AND month = ? AND count < ?",
                params![user_id, month, limit],
            )
            .map_err(|e| QuotaError::Database(e.to_string()))?;

        let used: u32 = conn
            .query_row(
                "SELECT count FROM usage_counters WHERE user_id = ? AND month = ?",
                params![user_id, month],
                |row| row.get(0),
            )
            .map_err(|e| QuotaError::Database(e.to_string()))?;

        Ok(AdmissionDecision {
            allowed: admitted > 0,
            used,
            limit,
            is_premium: tier == PlanTier::Premium,
        })
    }

    /// Usage report against an explicit month key.
    pub fn usage_in_month(&self, user_id: &str, month: &str) -> Result<UsageReport, QuotaError> {
        let conn = self.conn.lock().unwrap();

        let tier = Self::plan_for(&conn, user_id)?;
        let limit = self.limit_for(tier);

        let used = match conn.query_row(
            "SELECT count FROM usage_counters WHERE user_id = ? AND month = ?",
            params![user_id, month],
            |row| row.get::<_, u32>(0),
        ) {
            Ok(count) => count,
            Err(rusqlite::Error::QueryReturnedNoRows) => 0,
            Err(e) => return Err(QuotaError::Database(e.to_string())),
        };

        Ok(UsageReport {
            current_usage: used,
            monthly_limit: limit,
            remaining: limit.saturating_sub(used),
            can_process: used < limit,
            is_premium: tier == PlanTier::Premium,
            month: month.to_string(),
        })
    }
}

fn current_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}

impl QuotaLedger for SqliteQuotaLedger {
    fn check_and_admit(&self, user_id: &str) -> Result<AdmissionDecision, QuotaError> {
        self.admit_in_month(user_id, &current_month())
    }

    fn usage(&self, user_id: &str) -> Result<UsageReport, QuotaError> {
        self.usage_in_month(user_id, &current_month())
    }

    fn set_plan(&self, user_id: &str, tier: PlanTier) -> Result<(), QuotaError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT OR REPLACE INTO user_plans (user_id, tier) VALUES (?, ?)",
            params![user_id, tier.as_str()],
        )
        .map_err(|e| QuotaError::Database(e.to_string()))?;

        Ok(())
    }
}
