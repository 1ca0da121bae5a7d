/// Database path configuration from the environment
pub mod database;

/// Default category seed set, declared in embedded TOML
pub mod categories;

pub use categories::{default_category_seed, CategorySeed};
pub use database::AppConfig;
