use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Direction of a transaction. The sign is carried here, never by the
/// amount, which is always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Expense,
    Income,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            other => Err(FromSqlError::Other(
                format!("unknown transaction type '{other}'").into(),
            )),
        }
    }
}

/// A spending category. The nine default rows are seeded on first
/// initialization with `is_default = true`; user-created rows come in
/// through `create_category`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub color: String, // "#RRGGBB"
    pub icon: String,  // identifier into the app's icon set
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// An income or expense record. `amount` is an integer count of minor
/// currency units (cents); no floating-point currency crosses this boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub amount: i64,
    pub description: String,
    pub category_id: i64,
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A transaction joined with its category's display attributes. Read-side
/// denormalization for list screens; nothing here is writable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionWithCategory {
    pub id: i64,
    pub amount: i64,
    pub description: String,
    pub category_id: i64,
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category_name: String,
    pub category_color: String,
    pub category_icon: String,
}

/// A spending cap for one category over a date interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub category_id: i64,
    pub amount: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

/// A savings goal. `target_date` of `None` means no deadline; it is stored
/// as NULL, never as a sentinel date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub name: String,
    pub target_amount: i64,
    pub current_amount: i64,
    pub description: String,
    pub target_date: Option<NaiveDate>,
    pub is_completed: bool,
}

/// Request to create a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
    pub icon: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Request to create a transaction. `date` defaults to today when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: i64,
    pub description: String,
    pub category_id: i64,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Partial update for a transaction. Field *presence* decides which columns
/// are touched; a `None` field is left unchanged, never overwritten with a
/// default. Present fields are re-validated with the create rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionPatch {
    pub amount: Option<i64>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub transaction_type: Option<TransactionType>,
    pub date: Option<NaiveDate>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
            && self.transaction_type.is_none()
            && self.date.is_none()
    }
}

/// Request to create a budget. `period_end` must be strictly after
/// `period_start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBudget {
    pub category_id: i64,
    pub amount: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

/// Partial update for a budget (feature `symmetric-mutations`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetPatch {
    pub category_id: Option<i64>,
    pub amount: Option<i64>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

/// Request to create a goal. Progress fields are not accepted here: every
/// goal starts at `current_amount = 0` and `is_completed = false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: i64,
    pub description: String,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
}

/// Partial update for a category (feature `symmetric-mutations`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Optional conjunctive predicates for transaction listing. All supplied
/// predicates are ANDed; date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub category_id: Option<i64>,
    pub transaction_type: Option<TransactionType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Bulk dataset for `import_reference_data`. Trusted-input-only: rows are
/// inserted with their original ids and without per-row validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceDataset {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

/// Row counts per entity kind, used to verify import completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStats {
    pub categories: i64,
    pub transactions: i64,
    pub budgets: i64,
    pub goals: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_type_round_trips_through_str() {
        assert_eq!(TransactionType::Expense.as_str(), "expense");
        assert_eq!(TransactionType::Income.as_str(), "income");
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(TransactionPatch::default().is_empty());
        let patch = TransactionPatch {
            amount: Some(100),
            ..TransactionPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
