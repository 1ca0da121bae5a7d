use crate::config::default_category_seed;
use crate::db::{system_state, Database};
use crate::errors::{Error, Result};
use crate::models::{Category, NewCategory};
use crate::validate;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "symmetric-mutations")]
use crate::models::CategoryPatch;

const SEED_GUARD_KEY: &str = "default_categories_seeded";

/// Seeds the nine default categories exactly once per store.
///
/// First-run detection is a `system_state` guard row, not an "is the table
/// empty" heuristic, so a legitimate `clear_all_data` does not cause
/// re-seeding on the next initialize.
#[instrument(skip(conn))]
pub(crate) fn seed_default_categories(conn: &mut Connection) -> Result<()> {
    if system_state::get_system_state_value(conn, SEED_GUARD_KEY)?.is_some() {
        debug!("Default categories already seeded; skipping.");
        return Ok(());
    }

    let seed = default_category_seed()?;
    info!("Seeding {} default categories.", seed.len());

    let tx = conn
        .transaction()
        .map_err(|e| Error::Database(format!("Failed to start transaction for seeding: {e}")))?;
    {
        let now = Utc::now();
        let mut stmt = tx.prepare_cached(
            "INSERT INTO categories (name, color, icon, is_default, created_at)
             VALUES (?1, ?2, ?3, TRUE, ?4)",
        )?;
        for entry in &seed {
            stmt.execute(params![entry.name, entry.color, entry.icon, now])?;
        }
    }
    system_state::set_system_state_value(&tx, SEED_GUARD_KEY, "true")?;
    tx.commit()
        .map_err(|e| Error::Database(format!("Failed to commit category seeding: {e}")))?;

    info!("Finished seeding default categories.");
    Ok(())
}

/// Validated insert, shared by `create_category` and the unit-of-work path.
pub(crate) fn insert_category(conn: &Connection, req: &NewCategory) -> Result<Category> {
    validate::category_name(&req.name)?;
    validate::color(&req.color)?;
    validate::icon(&req.icon)?;

    // Pre-check uniqueness for a field-named error; the UNIQUE index is the
    // backstop.
    let mut stmt_check = conn.prepare_cached("SELECT id FROM categories WHERE name = ?1")?;
    let existing: Option<i64> = stmt_check
        .query_row(params![req.name], |row| row.get(0))
        .optional()?;
    if existing.is_some() {
        warn!("Category '{}' already exists; rejecting create.", req.name);
        return Err(Error::Validation {
            field: "name",
            message: format!("a category named '{}' already exists", req.name),
        });
    }

    let created_at = Utc::now();
    let mut stmt = conn.prepare_cached(
        "INSERT INTO categories (name, color, icon, is_default, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let id = stmt.insert(params![
        req.name,
        req.color,
        req.icon,
        req.is_default,
        created_at
    ])?;

    Ok(Category {
        id,
        name: req.name.clone(),
        color: req.color.clone(),
        icon: req.icon.clone(),
        is_default: req.is_default,
        created_at,
    })
}

fn map_category_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        icon: row.get(3)?,
        is_default: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub(crate) fn fetch_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, name, color, icon, is_default, created_at FROM categories ORDER BY id",
    )?;
    let rows = stmt.query_map([], map_category_row)?;
    let mut categories = Vec::new();
    for row in rows {
        categories.push(row.map_err(Error::from)?);
    }
    debug!("Fetched {} categories.", categories.len());
    Ok(categories)
}

pub(crate) fn fetch_category_by_id(conn: &Connection, id: i64) -> Result<Option<Category>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, name, color, icon, is_default, created_at FROM categories WHERE id = ?1",
    )?;
    let category = stmt
        .query_row(params![id], map_category_row)
        .optional()?;
    Ok(category)
}

impl Database {
    /// Creates a user category. Fails with [`Error::Validation`] on a bad
    /// name, color, or icon, or on a duplicate name; the persisted row with
    /// its generated id and timestamp is returned on success.
    #[instrument(skip(self, req))]
    pub async fn create_category(&self, req: &NewCategory) -> Result<Category> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        let category = insert_category(conn, req)?;
        info!("Created category '{}' (id {}).", category.name, category.id);
        Ok(category)
    }

    /// Returns all categories, defaults and user-created alike.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        fetch_categories(conn)
    }

    /// Returns the category with `id`, or `None` if there is no such row.
    /// A missing id is a valid result, never an error.
    #[instrument(skip(self))]
    pub async fn get_category_by_id(&self, id: i64) -> Result<Option<Category>> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        fetch_category_by_id(conn, id)
    }

    /// Applies the supplied fields to an existing category, re-validating
    /// each present field with the create rules. Fails with
    /// [`Error::Validation`] if `id` does not exist.
    #[cfg(feature = "symmetric-mutations")]
    #[instrument(skip(self, patch))]
    pub async fn update_category(&self, id: i64, patch: &CategoryPatch) -> Result<Category> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;

        let current = fetch_category_by_id(conn, id)?.ok_or_else(|| Error::Validation {
            field: "id",
            message: format!("category {id} does not exist"),
        })?;

        if let Some(name) = &patch.name {
            validate::category_name(name)?;
            let mut stmt =
                conn.prepare_cached("SELECT id FROM categories WHERE name = ?1 AND id != ?2")?;
            let clash: Option<i64> = stmt
                .query_row(params![name, id], |row| row.get(0))
                .optional()?;
            if clash.is_some() {
                return Err(Error::Validation {
                    field: "name",
                    message: format!("a category named '{name}' already exists"),
                });
            }
        }
        if let Some(color) = &patch.color {
            validate::color(color)?;
        }
        if let Some(icon) = &patch.icon {
            validate::icon(icon)?;
        }

        let name = patch.name.as_deref().unwrap_or(&current.name);
        let color = patch.color.as_deref().unwrap_or(&current.color);
        let icon = patch.icon.as_deref().unwrap_or(&current.icon);
        conn.execute(
            "UPDATE categories SET name = ?1, color = ?2, icon = ?3 WHERE id = ?4",
            params![name, color, icon, id],
        )?;

        fetch_category_by_id(conn, id)?.ok_or_else(|| {
            Error::Database(format!("category {id} vanished during update"))
        })
    }

    /// Hard-deletes a category. Returns `false` when no such row exists;
    /// fails with [`Error::Referential`] while transactions or budgets
    /// still reference it.
    #[cfg(feature = "symmetric-mutations")]
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i64) -> Result<bool> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        let rows = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{init_test_tracing, setup_test_db};
    use crate::config::categories::DEFAULT_CATEGORY_COUNT;

    fn new_category(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            color: "#FF5722".to_string(),
            icon: "x".to_string(),
            is_default: false,
        }
    }

    #[tokio::test]
    async fn fresh_store_has_nine_default_categories() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let categories = db.get_categories().await?;
        assert_eq!(categories.len(), DEFAULT_CATEGORY_COUNT);
        assert!(categories.iter().all(|c| c.is_default));
        for required in ["Dining", "Groceries", "Transportation", "Income"] {
            assert!(categories.iter().any(|c| c.name == required));
        }
        Ok(())
    }

    #[tokio::test]
    async fn create_category_returns_persisted_row() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let before = Utc::now();
        let created = db.create_category(&new_category("Test")).await?;

        assert!(created.id > 0);
        assert_eq!(created.name, "Test");
        assert_eq!(created.color, "#FF5722");
        assert!(!created.is_default);
        assert!(created.created_at >= before && created.created_at <= Utc::now());

        let fetched = db.get_category_by_id(created.id).await?.expect("row exists");
        assert_eq!(fetched.name, created.name);
        assert_eq!(fetched.created_at, created.created_at);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_and_original_untouched() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let first = db.create_category(&new_category("Pets")).await?;

        let mut second = new_category("Pets");
        second.color = "#000000".to_string();
        let err = db.create_category(&second).await.unwrap_err();
        assert!(
            matches!(err, Error::Validation { field: "name", .. }),
            "got {err:?}"
        );

        let unchanged = db.get_category_by_id(first.id).await?.expect("row exists");
        assert_eq!(unchanged.color, "#FF5722");
        Ok(())
    }

    #[tokio::test]
    async fn malformed_color_is_rejected() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let mut req = new_category("BadColor");
        req.color = "red".to_string();
        let err = db.create_category(&req).await.unwrap_err();
        assert!(
            matches!(err, Error::Validation { field: "color", .. }),
            "got {err:?}"
        );
        // Nothing was persisted.
        assert!(db
            .get_categories()
            .await?
            .iter()
            .all(|c| c.name != "BadColor"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_id_lookup_is_none_not_error() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        assert!(db.get_category_by_id(999_999).await?.is_none());
        Ok(())
    }

    #[cfg(feature = "symmetric-mutations")]
    #[tokio::test]
    async fn update_and_delete_category_follow_transaction_pattern() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let created = db.create_category(&new_category("Mutable")).await?;

        let patch = CategoryPatch {
            color: Some("#123456".to_string()),
            ..CategoryPatch::default()
        };
        let updated = db.update_category(created.id, &patch).await?;
        assert_eq!(updated.color, "#123456");
        assert_eq!(updated.name, "Mutable", "untouched field preserved");

        assert!(db.delete_category(created.id).await?);
        assert!(db.get_category_by_id(created.id).await?.is_none());
        assert!(!db.delete_category(created.id).await?);
        Ok(())
    }
}
