/// All-or-nothing units of work
pub mod batch;
/// Budget operations
pub mod budgets;
/// Category operations and default-category seeding
pub mod categories;
/// Service object and connection lifecycle
pub mod connection;
/// Savings-goal operations
pub mod goals;
/// Bulk clear/import and row-count stats
pub mod maintenance;
pub(crate) mod schema;
pub(crate) mod system_state;
#[cfg(test)]
pub(crate) mod test_utils;
/// Transaction operations: create, filtered listing, patch, delete, join
pub mod transactions;

pub use batch::UnitOfWork;
pub use connection::Database;
