//! Caller-defined units of work with all-or-nothing semantics.
//!
//! A unit of work is a sequence of validated write operations submitted as
//! one closure. Either every operation in the unit is durably applied, or
//! none are: any failure rolls the whole unit back and surfaces as
//! [`Error::Aborted`] with the underlying cause preserved. Operations apply
//! in submission order, and because the unit runs on the open SQLite
//! transaction, reads issued through the handle observe the unit's own
//! prior writes.

use crate::db::{budgets, categories, goals, transactions, Database};
use crate::errors::{Error, Result};
use crate::models::{
    Budget, Category, Goal, NewBudget, NewCategory, NewGoal, NewTransaction, Transaction,
    TransactionPatch,
};
use tracing::{debug, instrument, warn};

/// Handle passed to the closure given to [`Database::execute_unit`]. Every
/// operation runs against the unit's open transaction and applies the same
/// validation rules as its single-row counterpart.
pub struct UnitOfWork<'conn> {
    tx: rusqlite::Transaction<'conn>,
}

impl UnitOfWork<'_> {
    pub fn create_category(&self, req: &NewCategory) -> Result<Category> {
        categories::insert_category(&self.tx, req)
    }

    pub fn create_transaction(&self, req: &NewTransaction) -> Result<Transaction> {
        transactions::insert_transaction(&self.tx, req)
    }

    pub fn update_transaction(&self, id: i64, patch: &TransactionPatch) -> Result<Transaction> {
        transactions::update_transaction_row(&self.tx, id, patch)
    }

    pub fn delete_transaction(&self, id: i64) -> Result<bool> {
        transactions::delete_transaction_row(&self.tx, id)
    }

    pub fn create_budget(&self, req: &NewBudget) -> Result<Budget> {
        budgets::insert_budget(&self.tx, req)
    }

    pub fn create_goal(&self, req: &NewGoal) -> Result<Goal> {
        goals::insert_goal(&self.tx, req)
    }

    /// Reads the unit's own uncommitted writes.
    pub fn get_transaction_by_id(&self, id: i64) -> Result<Option<Transaction>> {
        transactions::fetch_transaction_by_id(&self.tx, id)
    }

    /// Reads the unit's own uncommitted writes.
    pub fn get_category_by_id(&self, id: i64) -> Result<Option<Category>> {
        categories::fetch_category_by_id(&self.tx, id)
    }
}

impl Database {
    /// Runs `work` as one all-or-nothing unit.
    ///
    /// The connection lock is held for the whole unit, so no other caller
    /// observes a partially-applied state. On success the unit is
    /// committed and the closure's value returned; on failure the
    /// transaction is rolled back and the error comes back wrapped in
    /// [`Error::Aborted`].
    #[instrument(skip(self, work))]
    pub async fn execute_unit<T>(
        &self,
        work: impl FnOnce(&UnitOfWork<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.lock()?;
        let conn = guard.as_mut().ok_or(Error::NotConnected)?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(format!("Failed to start unit of work: {e}")))?;
        let unit = UnitOfWork { tx };

        match work(&unit) {
            Ok(value) => {
                unit.tx
                    .commit()
                    .map_err(|e| Error::Database(format!("Failed to commit unit of work: {e}")))?;
                debug!("Unit of work committed.");
                Ok(value)
            }
            Err(cause) => {
                // Dropping the transaction rolls it back.
                drop(unit);
                warn!("Unit of work aborted: {}", cause);
                Err(Error::aborted(cause))
            }
        }
    }
}
