//! Default category seed set.
//!
//! The nine household categories every fresh store starts with are declared
//! in `default_categories.toml` and embedded at compile time. Seeding itself
//! lives in `db::categories`; this module only parses the declaration.

use crate::errors::{Error, Result};
use serde::Deserialize;

const DEFAULT_CATEGORIES_TOML: &str = include_str!("default_categories.toml");

/// The expected size of the default seed set.
pub const DEFAULT_CATEGORY_COUNT: usize = 9;

#[derive(Debug, Deserialize)]
struct SeedFile {
    categories: Vec<CategorySeed>,
}

/// Declaration of a single default category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySeed {
    /// Display name, unique across the seed set
    pub name: String,
    /// "#RRGGBB" display color
    pub color: String,
    /// Identifier into the app's icon set
    pub icon: String,
}

/// Parses the embedded seed declaration.
///
/// # Errors
/// Returns `Error::Config` if the embedded TOML is malformed or does not
/// contain exactly [`DEFAULT_CATEGORY_COUNT`] entries.
pub fn default_category_seed() -> Result<Vec<CategorySeed>> {
    let parsed: SeedFile = toml::from_str(DEFAULT_CATEGORIES_TOML)
        .map_err(|e| Error::Config(format!("Failed to parse default category seed: {e}")))?;

    if parsed.categories.len() != DEFAULT_CATEGORY_COUNT {
        return Err(Error::Config(format!(
            "Default category seed must contain exactly {DEFAULT_CATEGORY_COUNT} entries, found {}",
            parsed.categories.len()
        )));
    }

    Ok(parsed.categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_parses_with_nine_entries() {
        let seed = default_category_seed().expect("embedded seed must parse");
        assert_eq!(seed.len(), DEFAULT_CATEGORY_COUNT);
    }

    #[test]
    fn seed_names_are_unique_and_fields_valid() {
        let seed = default_category_seed().unwrap();
        let names: HashSet<&str> = seed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), seed.len(), "seed names must be unique");

        for entry in &seed {
            crate::validate::category_name(&entry.name).unwrap();
            crate::validate::color(&entry.color).unwrap();
            crate::validate::icon(&entry.icon).unwrap();
        }
    }

    #[test]
    fn seed_covers_required_categories() {
        let seed = default_category_seed().unwrap();
        for required in ["Dining", "Groceries", "Transportation", "Income"] {
            assert!(
                seed.iter().any(|c| c.name == required),
                "seed must include '{required}'"
            );
        }
    }
}
