//! Database queries for the Suguard grant store.

use std::collections::HashSet;

use suguard_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::models::{Decision, GrantRecord};

impl Database {
    /// Fetch all grant records.
    pub async fn list_grants(&self) -> Result<Vec<GrantRecord>, DatabaseError> {
        let grants = sqlx::query_as::<_, GrantRecord>("SELECT * FROM grants ORDER BY uid ASC")
            .fetch_all(self.pool())
            .await?;

        Ok(grants)
    }

    /// Fetch the grant record for a uid, if one exists.
    pub async fn get_grant(&self, uid: i64) -> Result<Option<GrantRecord>, DatabaseError> {
        let grant = sqlx::query_as::<_, GrantRecord>("SELECT * FROM grants WHERE uid = ?")
            .bind(uid)
            .fetch_optional(self.pool())
            .await?;

        Ok(grant)
    }

    /// Insert or replace the grant record for a uid.
    pub async fn upsert_grant(
        &self,
        uid: i64,
        decision: Decision,
        notify: bool,
        logging: bool,
    ) -> Result<(), DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT OR REPLACE INTO grants (uid, decision, notify, logging, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uid)
        .bind(decision.as_raw())
        .bind(i64::from(notify))
        .bind(i64::from(logging))
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Delete the grant record for a uid. Returns whether a row existed.
    pub async fn delete_grant(&self, uid: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM grants WHERE uid = ?")
            .bind(uid)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every grant record. Returns the number of deleted records.
    pub async fn delete_all_grants(&self) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM grants").execute(self.pool()).await?;

        Ok(result.rows_affected())
    }

    /// Delete every grant record whose uid is absent from the given set.
    /// Returns the number of deleted records.
    pub async fn delete_stale_grants(&self, known: &HashSet<i64>) -> Result<u64, DatabaseError> {
        if known.is_empty() {
            return self.delete_all_grants().await;
        }

        let placeholders = vec!["?"; known.len()].join(", ");
        let sql = format!("DELETE FROM grants WHERE uid NOT IN ({placeholders})");

        let mut query = sqlx::query(&sql);
        for uid in known {
            query = query.bind(*uid);
        }

        let result = query.execute(self.pool()).await?;

        Ok(result.rows_affected())
    }
}
