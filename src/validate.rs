//! Field-level validation rules, applied before any write reaches SQLite.
//!
//! Every validated single-row operation and every unit-of-work operation
//! funnels through these checks; the trusted bulk-import path in
//! `db::maintenance` deliberately does not.

use crate::errors::{Error, Result};
use chrono::NaiveDate;

const CATEGORY_NAME_MAX: usize = 50;
const DESCRIPTION_MAX: usize = 200;
const GOAL_NAME_MAX: usize = 100;

fn length_in(field: &'static str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len == 0 {
        return Err(Error::Validation {
            field,
            message: "must not be empty".to_string(),
        });
    }
    if len > max {
        return Err(Error::Validation {
            field,
            message: format!("must be at most {max} characters, got {len}"),
        });
    }
    Ok(())
}

/// Category name: 1-50 characters.
pub fn category_name(name: &str) -> Result<()> {
    length_in("name", name, CATEGORY_NAME_MAX)
}

/// Color: exactly `#` followed by six hex digits.
pub fn color(value: &str) -> Result<()> {
    let ok = value.len() == 7
        && value.starts_with('#')
        && value[1..].bytes().all(|b| b.is_ascii_hexdigit());
    if ok {
        Ok(())
    } else {
        Err(Error::Validation {
            field: "color",
            message: format!("'{value}' is not a #RRGGBB color"),
        })
    }
}

/// Icon identifier: non-empty.
pub fn icon(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::Validation {
            field: "icon",
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Monetary amount in minor units: strictly positive. Direction lives in
/// the transaction type, not the sign.
pub fn amount(value: i64) -> Result<()> {
    if value <= 0 {
        return Err(Error::Validation {
            field: "amount",
            message: format!("must be a positive number of minor units, got {value}"),
        });
    }
    Ok(())
}

/// Transaction description: 1-200 characters.
pub fn description(value: &str) -> Result<()> {
    length_in("description", value, DESCRIPTION_MAX)
}

/// Budget period: end strictly after start.
pub fn budget_period(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end <= start {
        return Err(Error::Validation {
            field: "period_end",
            message: format!("period_end {end} must be after period_start {start}"),
        });
    }
    Ok(())
}

/// Goal name: 1-100 characters.
pub fn goal_name(name: &str) -> Result<()> {
    length_in("name", name, GOAL_NAME_MAX)
}
