use crate::db::Database;
use crate::errors::{Error, Result};
use crate::models::{NewTransaction, Transaction, TransactionFilter, TransactionPatch,
    TransactionWithCategory};
use crate::validate;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, ToSql};
use tracing::{debug, info, instrument};

/// Validated insert, shared by `create_transaction` and the unit-of-work
/// path. The date defaults to today when the request omits it; a dangling
/// `category_id` is caught by the foreign-key constraint and surfaces as
/// [`Error::Referential`].
pub(crate) fn insert_transaction(conn: &Connection, req: &NewTransaction) -> Result<Transaction> {
    validate::amount(req.amount)?;
    validate::description(&req.description)?;

    let date = req.date.unwrap_or_else(|| Utc::now().date_naive());
    let now = Utc::now();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO transactions (amount, description, category_id, transaction_type, date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let id = stmt.insert(params![
        req.amount,
        req.description,
        req.category_id,
        req.transaction_type,
        date,
        now,
        now,
    ])?;

    Ok(Transaction {
        id,
        amount: req.amount,
        description: req.description.clone(),
        category_id: req.category_id,
        transaction_type: req.transaction_type,
        date,
        created_at: now,
        updated_at: now,
    })
}

fn map_transaction_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        description: row.get(2)?,
        category_id: row.get(3)?,
        transaction_type: row.get(4)?,
        date: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const TRANSACTION_COLUMNS: &str =
    "id, amount, description, category_id, transaction_type, date, created_at, updated_at";

/// Conjunctive filtering: every supplied predicate is ANDed. Default order
/// is most recent first (date descending, id descending as tie-break so the
/// order is stable within a session).
pub(crate) fn fetch_transactions(
    conn: &Connection,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>> {
    let mut clauses: Vec<&'static str> = Vec::new();
    let mut bound: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(category_id) = filter.category_id {
        clauses.push("category_id = ?");
        bound.push(Box::new(category_id));
    }
    if let Some(transaction_type) = filter.transaction_type {
        clauses.push("transaction_type = ?");
        bound.push(Box::new(transaction_type));
    }
    if let Some(start) = filter.start_date {
        clauses.push("date >= ?");
        bound.push(Box::new(start));
    }
    if let Some(end) = filter.end_date {
        clauses.push("date <= ?");
        bound.push(Box::new(end));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions{where_clause} ORDER BY date DESC, id DESC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params_from_iter(bound.iter().map(|p| p.as_ref())),
        map_transaction_row,
    )?;
    let mut transactions = Vec::new();
    for row in rows {
        transactions.push(row.map_err(Error::from)?);
    }
    debug!("Fetched {} transactions.", transactions.len());
    Ok(transactions)
}

pub(crate) fn fetch_transaction_by_id(conn: &Connection, id: i64) -> Result<Option<Transaction>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, amount, description, category_id, transaction_type, date, created_at, updated_at
         FROM transactions WHERE id = ?1",
    )?;
    let transaction = stmt
        .query_row(params![id], map_transaction_row)
        .optional()?;
    Ok(transaction)
}

/// Applies only the fields present in `patch`, re-validating each with the
/// create rules, and refreshes `updated_at`. Fails when `id` does not
/// exist. Shared by `update_transaction` and the unit-of-work path.
pub(crate) fn update_transaction_row(
    conn: &Connection,
    id: i64,
    patch: &TransactionPatch,
) -> Result<Transaction> {
    let current = fetch_transaction_by_id(conn, id)?.ok_or_else(|| Error::Validation {
        field: "id",
        message: format!("transaction {id} does not exist"),
    })?;

    if let Some(amount) = patch.amount {
        validate::amount(amount)?;
    }
    if let Some(description) = &patch.description {
        validate::description(description)?;
    }

    // Field presence, not value truthiness, decides what is touched.
    let amount = patch.amount.unwrap_or(current.amount);
    let description = patch.description.as_deref().unwrap_or(&current.description);
    let category_id = patch.category_id.unwrap_or(current.category_id);
    let transaction_type = patch.transaction_type.unwrap_or(current.transaction_type);
    let date = patch.date.unwrap_or(current.date);
    let updated_at = Utc::now();

    conn.execute(
        "UPDATE transactions
         SET amount = ?1, description = ?2, category_id = ?3, transaction_type = ?4, date = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            amount,
            description,
            category_id,
            transaction_type,
            date,
            updated_at,
            id
        ],
    )?;

    fetch_transaction_by_id(conn, id)?
        .ok_or_else(|| Error::Database(format!("transaction {id} vanished during update")))
}

/// Hard delete. Returns whether a row was removed; a missing id is not an
/// error.
pub(crate) fn delete_transaction_row(conn: &Connection, id: i64) -> Result<bool> {
    let rows = conn.execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

pub(crate) fn fetch_transactions_with_categories(
    conn: &Connection,
) -> Result<Vec<TransactionWithCategory>> {
    let mut stmt = conn.prepare_cached(
        "SELECT t.id, t.amount, t.description, t.category_id, t.transaction_type, t.date,
                t.created_at, t.updated_at, c.name, c.color, c.icon
         FROM transactions t
         JOIN categories c ON c.id = t.category_id
         ORDER BY t.date DESC, t.id DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(TransactionWithCategory {
            id: row.get(0)?,
            amount: row.get(1)?,
            description: row.get(2)?,
            category_id: row.get(3)?,
            transaction_type: row.get(4)?,
            date: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
            category_name: row.get(8)?,
            category_color: row.get(9)?,
            category_icon: row.get(10)?,
        })
    })?;
    let mut joined = Vec::new();
    for row in rows {
        joined.push(row.map_err(Error::from)?);
    }
    Ok(joined)
}

impl Database {
    /// Records an income or expense. Fails with [`Error::Validation`] on a
    /// non-positive amount or out-of-bounds description, and with
    /// [`Error::Referential`] when `category_id` names no existing
    /// category.
    #[instrument(skip(self, req))]
    pub async fn create_transaction(&self, req: &NewTransaction) -> Result<Transaction> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        let transaction = insert_transaction(conn, req)?;
        info!(
            "Created transaction {} ({} {} minor units, category {}).",
            transaction.id, transaction.transaction_type, transaction.amount,
            transaction.category_id
        );
        Ok(transaction)
    }

    /// Lists transactions matching all supplied predicates, most recent
    /// first.
    #[instrument(skip(self))]
    pub async fn get_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        fetch_transactions(conn, filter)
    }

    /// Returns the transaction with `id`, or `None` for a missing row.
    #[instrument(skip(self))]
    pub async fn get_transaction_by_id(&self, id: i64) -> Result<Option<Transaction>> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        fetch_transaction_by_id(conn, id)
    }

    /// Partially updates a transaction; see [`TransactionPatch`] for the
    /// presence semantics. `updated_at` always moves forward.
    #[instrument(skip(self, patch))]
    pub async fn update_transaction(
        &self,
        id: i64,
        patch: &TransactionPatch,
    ) -> Result<Transaction> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        let updated = update_transaction_row(conn, id, patch)?;
        info!("Updated transaction {}.", id);
        Ok(updated)
    }

    /// Hard-deletes a transaction. Returns `false` when there was nothing
    /// to delete.
    #[instrument(skip(self))]
    pub async fn delete_transaction(&self, id: i64) -> Result<bool> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        let deleted = delete_transaction_row(conn, id)?;
        if deleted {
            info!("Deleted transaction {}.", id);
        }
        Ok(deleted)
    }

    /// Read-side join of transactions with their category's display
    /// attributes, for list screens. Mutates nothing.
    #[instrument(skip(self))]
    pub async fn get_transactions_with_categories(
        &self,
    ) -> Result<Vec<TransactionWithCategory>> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        fetch_transactions_with_categories(conn)
    }
}
