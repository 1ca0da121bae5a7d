//! Bulk operations for test isolation and migration tooling.
//!
//! `import_reference_data` is a trusted-input-only path: it bypasses the
//! per-row validation of the public create operations for throughput and
//! keeps rows' original ids. Referential integrity is still enforced by the
//! engine's foreign-key constraints, so a dataset whose transactions name
//! absent categories is rejected wholesale.

use crate::db::Database;
use crate::errors::{Error, Result};
use crate::models::{MigrationStats, ReferenceDataset};
use rusqlite::{params, Connection};
use tracing::{info, instrument};

fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    // Table names come from the fixed list below, never from input.
    let mut stmt = conn.prepare(&format!("SELECT COUNT(*) FROM {table}"))?;
    let count: i64 = stmt.query_row([], |row| row.get(0))?;
    Ok(count)
}

impl Database {
    /// Removes every row from all four entity tables, keeping the schema
    /// and the `system_state` metadata. Because the seed guard survives, a
    /// later `initialize` will not re-seed the default categories.
    #[instrument(skip(self))]
    pub async fn clear_all_data(&self) -> Result<()> {
        let mut guard = self.lock()?;
        let conn = guard.as_mut().ok_or(Error::NotConnected)?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(format!("Failed to start clear transaction: {e}")))?;

        // Children before parents so the foreign keys never complain.
        tx.execute("DELETE FROM transactions", [])?;
        tx.execute("DELETE FROM budgets", [])?;
        tx.execute("DELETE FROM goals", [])?;
        tx.execute("DELETE FROM categories", [])?;

        tx.commit()
            .map_err(|e| Error::Database(format!("Failed to commit clear: {e}")))?;
        info!("Cleared all rows from all entity tables.");
        Ok(())
    }

    /// Bulk-loads a dataset in one transaction, preserving original ids.
    /// Trusted input only; see the module docs.
    #[instrument(skip(self, dataset))]
    pub async fn import_reference_data(&self, dataset: &ReferenceDataset) -> Result<()> {
        let mut guard = self.lock()?;
        let conn = guard.as_mut().ok_or(Error::NotConnected)?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(format!("Failed to start import transaction: {e}")))?;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO categories (id, name, color, icon, is_default, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for category in &dataset.categories {
                stmt.execute(params![
                    category.id,
                    category.name,
                    category.color,
                    category.icon,
                    category.is_default,
                    category.created_at,
                ])?;
            }

            let mut stmt = tx.prepare_cached(
                "INSERT INTO transactions (id, amount, description, category_id, transaction_type, date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for transaction in &dataset.transactions {
                stmt.execute(params![
                    transaction.id,
                    transaction.amount,
                    transaction.description,
                    transaction.category_id,
                    transaction.transaction_type,
                    transaction.date,
                    transaction.created_at,
                    transaction.updated_at,
                ])?;
            }

            let mut stmt = tx.prepare_cached(
                "INSERT INTO budgets (id, category_id, amount, period_start, period_end)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for budget in &dataset.budgets {
                stmt.execute(params![
                    budget.id,
                    budget.category_id,
                    budget.amount,
                    budget.period_start,
                    budget.period_end,
                ])?;
            }

            let mut stmt = tx.prepare_cached(
                "INSERT INTO goals (id, name, target_amount, current_amount, description, target_date, is_completed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for goal in &dataset.goals {
                stmt.execute(params![
                    goal.id,
                    goal.name,
                    goal.target_amount,
                    goal.current_amount,
                    goal.description,
                    goal.target_date,
                    goal.is_completed,
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| Error::Database(format!("Failed to commit import: {e}")))?;
        info!(
            "Imported reference data: {} categories, {} transactions, {} budgets, {} goals.",
            dataset.categories.len(),
            dataset.transactions.len(),
            dataset.budgets.len(),
            dataset.goals.len()
        );
        Ok(())
    }

    /// Row counts per entity kind, for verifying import completeness.
    #[instrument(skip(self))]
    pub async fn get_migration_stats(&self) -> Result<MigrationStats> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        Ok(MigrationStats {
            categories: count_rows(conn, "categories")?,
            transactions: count_rows(conn, "transactions")?,
            budgets: count_rows(conn, "budgets")?,
            goals: count_rows(conn, "goals")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{init_test_tracing, setup_test_db};
    use crate::models::{Budget, Category, Goal, Transaction, TransactionType};
    use chrono::{NaiveDate, Utc};

    fn sample_dataset() -> ReferenceDataset {
        let now = Utc::now();
        ReferenceDataset {
            categories: vec![
                Category {
                    id: 101,
                    name: "Imported A".to_string(),
                    color: "#101010".to_string(),
                    icon: "a".to_string(),
                    is_default: false,
                    created_at: now,
                },
                Category {
                    id: 102,
                    name: "Imported B".to_string(),
                    color: "#202020".to_string(),
                    icon: "b".to_string(),
                    is_default: false,
                    created_at: now,
                },
            ],
            transactions: vec![Transaction {
                id: 501,
                amount: 1999,
                description: "imported".to_string(),
                category_id: 101,
                transaction_type: TransactionType::Expense,
                date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
                created_at: now,
                updated_at: now,
            }],
            budgets: vec![Budget {
                id: 301,
                category_id: 102,
                amount: 40_000,
                period_start: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                period_end: NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            }],
            goals: vec![Goal {
                id: 401,
                name: "Imported Goal".to_string(),
                target_amount: 50_000,
                current_amount: 12_500,
                description: "partway there".to_string(),
                target_date: None,
                is_completed: false,
            }],
        }
    }

    #[tokio::test]
    async fn clear_all_data_empties_every_table() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        // Seeded categories are present before the clear.
        let stats = db.get_migration_stats().await?;
        assert!(stats.categories > 0);

        db.clear_all_data().await?;

        let stats = db.get_migration_stats().await?;
        assert_eq!(
            stats,
            MigrationStats {
                categories: 0,
                transactions: 0,
                budgets: 0,
                goals: 0
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn clear_then_reinitialize_does_not_reseed() -> Result<()> {
        init_test_tracing();
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("seed-guard.sqlite");
        let path = path.to_str().expect("utf-8 temp path");

        let db = Database::new();
        db.initialize(path).await?;
        assert!(db.get_migration_stats().await?.categories > 0);

        db.clear_all_data().await?;
        db.close().await?;

        // The system_state guard row survived the clear, so this is not a
        // first run and no defaults come back.
        db.initialize(path).await?;
        let stats = db.get_migration_stats().await?;
        assert_eq!(stats.categories, 0);
        Ok(())
    }

    #[tokio::test]
    async fn import_preserves_ids_and_counts() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        db.clear_all_data().await?;

        db.import_reference_data(&sample_dataset()).await?;

        let stats = db.get_migration_stats().await?;
        assert_eq!(
            stats,
            MigrationStats {
                categories: 2,
                transactions: 1,
                budgets: 1,
                goals: 1
            }
        );

        let imported = db.get_transaction_by_id(501).await?.expect("kept its id");
        assert_eq!(imported.category_id, 101);

        // Imported progress fields are taken as-is, unlike create_goal.
        let goals = db.get_goals().await?;
        assert_eq!(goals[0].current_amount, 12_500);
        Ok(())
    }

    #[tokio::test]
    async fn import_with_dangling_reference_is_rejected_wholesale() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        db.clear_all_data().await?;

        let mut dataset = sample_dataset();
        dataset.transactions[0].category_id = 999; // not in the dataset

        let err = db.import_reference_data(&dataset).await.unwrap_err();
        assert!(matches!(err, Error::Referential(_)), "got {err:?}");

        // Nothing from the dataset landed, categories included.
        let stats = db.get_migration_stats().await?;
        assert_eq!(stats.categories, 0);
        assert_eq!(stats.transactions, 0);
        Ok(())
    }
}
