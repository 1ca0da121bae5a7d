use crate::db::Database;
use crate::errors::{Error, Result};
use crate::models::{Budget, NewBudget};
use crate::validate;
use rusqlite::{params, Connection};
use tracing::{debug, info, instrument};

#[cfg(feature = "symmetric-mutations")]
use crate::models::BudgetPatch;

/// Validated insert, shared by `create_budget` and the unit-of-work path.
pub(crate) fn insert_budget(conn: &Connection, req: &NewBudget) -> Result<Budget> {
    validate::amount(req.amount)?;
    validate::budget_period(req.period_start, req.period_end)?;

    let mut stmt = conn.prepare_cached(
        "INSERT INTO budgets (category_id, amount, period_start, period_end)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    let id = stmt.insert(params![
        req.category_id,
        req.amount,
        req.period_start,
        req.period_end
    ])?;

    Ok(Budget {
        id,
        category_id: req.category_id,
        amount: req.amount,
        period_start: req.period_start,
        period_end: req.period_end,
    })
}

fn map_budget_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: row.get(0)?,
        category_id: row.get(1)?,
        amount: row.get(2)?,
        period_start: row.get(3)?,
        period_end: row.get(4)?,
    })
}

pub(crate) fn fetch_budgets(conn: &Connection) -> Result<Vec<Budget>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, category_id, amount, period_start, period_end FROM budgets ORDER BY id",
    )?;
    let rows = stmt.query_map([], map_budget_row)?;
    let mut budgets = Vec::new();
    for row in rows {
        budgets.push(row.map_err(Error::from)?);
    }
    debug!("Fetched {} budgets.", budgets.len());
    Ok(budgets)
}

#[cfg(feature = "symmetric-mutations")]
pub(crate) fn fetch_budget_by_id(conn: &Connection, id: i64) -> Result<Option<Budget>> {
    use rusqlite::OptionalExtension;

    let mut stmt = conn.prepare_cached(
        "SELECT id, category_id, amount, period_start, period_end FROM budgets WHERE id = ?1",
    )?;
    let budget = stmt.query_row(params![id], map_budget_row).optional()?;
    Ok(budget)
}

impl Database {
    /// Creates a budget. `period_end` must be strictly after
    /// `period_start`; a dangling `category_id` surfaces as
    /// [`Error::Referential`].
    #[instrument(skip(self, req))]
    pub async fn create_budget(&self, req: &NewBudget) -> Result<Budget> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        let budget = insert_budget(conn, req)?;
        info!(
            "Created budget {} for category {} ({}..{}).",
            budget.id, budget.category_id, budget.period_start, budget.period_end
        );
        Ok(budget)
    }

    /// Returns all budgets.
    #[instrument(skip(self))]
    pub async fn get_budgets(&self) -> Result<Vec<Budget>> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        fetch_budgets(conn)
    }

    /// Applies the supplied fields to an existing budget, re-validating the
    /// effective period ordering. Fails with [`Error::Validation`] if `id`
    /// does not exist.
    #[cfg(feature = "symmetric-mutations")]
    #[instrument(skip(self, patch))]
    pub async fn update_budget(&self, id: i64, patch: &BudgetPatch) -> Result<Budget> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;

        let current = fetch_budget_by_id(conn, id)?.ok_or_else(|| Error::Validation {
            field: "id",
            message: format!("budget {id} does not exist"),
        })?;

        if let Some(amount) = patch.amount {
            validate::amount(amount)?;
        }
        let category_id = patch.category_id.unwrap_or(current.category_id);
        let amount = patch.amount.unwrap_or(current.amount);
        let period_start = patch.period_start.unwrap_or(current.period_start);
        let period_end = patch.period_end.unwrap_or(current.period_end);
        // The period invariant holds for the effective values, whichever
        // side the patch supplied.
        validate::budget_period(period_start, period_end)?;

        conn.execute(
            "UPDATE budgets SET category_id = ?1, amount = ?2, period_start = ?3, period_end = ?4
             WHERE id = ?5",
            params![category_id, amount, period_start, period_end, id],
        )?;

        fetch_budget_by_id(conn, id)?
            .ok_or_else(|| Error::Database(format!("budget {id} vanished during update")))
    }

    /// Hard-deletes a budget. Returns `false` when no such row exists.
    #[cfg(feature = "symmetric-mutations")]
    #[instrument(skip(self))]
    pub async fn delete_budget(&self, id: i64) -> Result<bool> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        let rows = conn.execute("DELETE FROM budgets WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{init_test_tracing, setup_test_db};
    use crate::models::NewCategory;
    use chrono::NaiveDate;

    async fn fixture_category(db: &Database) -> Result<i64> {
        let created = db
            .create_category(&NewCategory {
                name: "Budgeted".to_string(),
                color: "#224466".to_string(),
                icon: "wallet".to_string(),
                is_default: false,
            })
            .await?;
        Ok(created.id)
    }

    fn january(category_id: i64) -> NewBudget {
        NewBudget {
            category_id,
            amount: 50_000,
            period_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        }
    }

    #[tokio::test]
    async fn create_and_list_budgets() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let category_id = fixture_category(&db).await?;

        let created = db.create_budget(&january(category_id)).await?;
        assert!(created.id > 0);

        let budgets = db.get_budgets().await?;
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].amount, 50_000);
        assert_eq!(budgets[0].category_id, category_id);
        Ok(())
    }

    #[tokio::test]
    async fn inverted_period_is_rejected() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let category_id = fixture_category(&db).await?;

        let req = NewBudget {
            category_id,
            amount: 10_000,
            period_start: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let err = db.create_budget(&req).await.unwrap_err();
        assert!(
            matches!(err, Error::Validation { field: "period_end", .. }),
            "got {err:?}"
        );
        assert!(db.get_budgets().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn dangling_category_is_referential_error() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let err = db.create_budget(&january(777_777)).await.unwrap_err();
        assert!(matches!(err, Error::Referential(_)), "got {err:?}");
        Ok(())
    }

    #[cfg(feature = "symmetric-mutations")]
    #[tokio::test]
    async fn update_and_delete_budget_follow_transaction_pattern() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let category_id = fixture_category(&db).await?;
        let created = db.create_budget(&january(category_id)).await?;

        let updated = db
            .update_budget(
                created.id,
                &BudgetPatch {
                    amount: Some(75_000),
                    ..BudgetPatch::default()
                },
            )
            .await?;
        assert_eq!(updated.amount, 75_000);
        assert_eq!(updated.period_start, created.period_start);

        // Patching one period endpoint past the other trips the invariant.
        let err = db
            .update_budget(
                created.id,
                &BudgetPatch {
                    period_end: Some(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()),
                    ..BudgetPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { field: "period_end", .. }));

        assert!(db.delete_budget(created.id).await?);
        assert!(!db.delete_budget(created.id).await?);
        Ok(())
    }
}
