use crate::db::Database;
use crate::errors::{Error, Result};
use crate::models::{Goal, NewGoal};
use crate::validate;
use rusqlite::{params, Connection};
use tracing::{debug, info, instrument};

/// Validated insert, shared by `create_goal` and the unit-of-work path.
///
/// Progress is not accepted at creation: `current_amount` starts at 0 and
/// `is_completed` at false regardless of the request. An omitted
/// `target_date` is stored as NULL, never a sentinel date.
pub(crate) fn insert_goal(conn: &Connection, req: &NewGoal) -> Result<Goal> {
    validate::goal_name(&req.name)?;
    validate::amount(req.target_amount)?;

    let mut stmt = conn.prepare_cached(
        "INSERT INTO goals (name, target_amount, current_amount, description, target_date, is_completed)
         VALUES (?1, ?2, 0, ?3, ?4, FALSE)",
    )?;
    let id = stmt.insert(params![
        req.name,
        req.target_amount,
        req.description,
        req.target_date
    ])?;

    Ok(Goal {
        id,
        name: req.name.clone(),
        target_amount: req.target_amount,
        current_amount: 0,
        description: req.description.clone(),
        target_date: req.target_date,
        is_completed: false,
    })
}

fn map_goal_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        name: row.get(1)?,
        target_amount: row.get(2)?,
        current_amount: row.get(3)?,
        description: row.get(4)?,
        target_date: row.get(5)?,
        is_completed: row.get(6)?,
    })
}

pub(crate) fn fetch_goals(conn: &Connection) -> Result<Vec<Goal>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, name, target_amount, current_amount, description, target_date, is_completed
         FROM goals ORDER BY id",
    )?;
    let rows = stmt.query_map([], map_goal_row)?;
    let mut goals = Vec::new();
    for row in rows {
        goals.push(row.map_err(Error::from)?);
    }
    debug!("Fetched {} goals.", goals.len());
    Ok(goals)
}

impl Database {
    /// Creates a savings goal. Fails with [`Error::Validation`] on a name
    /// outside 1-100 characters or a non-positive target amount.
    #[instrument(skip(self, req))]
    pub async fn create_goal(&self, req: &NewGoal) -> Result<Goal> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        let goal = insert_goal(conn, req)?;
        info!("Created goal '{}' (id {}).", goal.name, goal.id);
        Ok(goal)
    }

    /// Returns all goals.
    #[instrument(skip(self))]
    pub async fn get_goals(&self) -> Result<Vec<Goal>> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        fetch_goals(conn)
    }
}
