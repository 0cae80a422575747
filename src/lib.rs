//! `PoultryLedger` - a farm-management service for poultry trading
//!
//! This crate provides the record-keeping backend for a poultry trading
//! operation: product, purchase and sale records in a SQLite store with
//! additive schema migration, godown (warehouse) collections in a JSON
//! document store, and a derived stock overview computed from them.

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
    // Clippy categories for overall code quality
    clippy::all,
    clippy::pedantic,

    // Performance
    clippy::inefficient_to_string,
    clippy::needless_pass_by_value,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::float_cmp,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
    clippy::missing_errors_doc,        // Will add gradually
    clippy::cast_precision_loss,       // Bird counts fit comfortably in f64
    clippy::cast_possible_truncation,  // Rounded percentages and day counts
)]

/// Lenient numeric coercion for permissive intake shapes
pub(crate) mod coerce;
/// Configuration loading from ledger.toml and the environment
pub mod config;
/// Unified error types and result handling
pub mod errors;
/// Godown collections, records, and the derived stock overview
pub mod godown;
/// HTTP routing and request handlers
pub mod http;
/// Relational store - schema, migration, and resource operations
pub mod store;
