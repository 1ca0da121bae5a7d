//! `pocketledger` - the persistence layer of a personal-finance app
//!
//! This crate owns an embedded SQLite store and exposes typed CRUD and
//! query operations for four entity kinds (categories, transactions,
//! budgets, savings goals), with field-level validation before every write,
//! all-or-nothing units of work, default-category seeding on first run, and
//! bulk import/export hooks for migration and test tooling. Everything
//! above it (screens, charts, AI assistant, file export) consumes this
//! service through its async API and never touches the store directly.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    missing_docs,

    // Clippy categories for overall code quality
    clippy::all,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::expect_used,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
)]

/// Configuration: database path and the default category seed set
pub mod config;
/// The persistence service: connection lifecycle, per-entity operations,
/// units of work, and maintenance tooling
pub mod db;
/// Unified error types and result handling
pub mod errors;
/// Row, request, patch, and filter types crossing the service boundary
pub mod models;
/// Field-level validation rules applied before any write
pub mod validate;

pub use db::{Database, UnitOfWork};
pub use errors::{Error, Result};
