#![allow(dead_code)]
use crate::errors::{Error, Result};
use crate::store::{DbPool, schema};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_test_writer()
        .try_init();
}

// In-memory store with the full schema applied, one per test.
pub(crate) async fn setup_test_store() -> Result<DbPool> {
    let conn = Connection::open_in_memory()
        .map_err(|e| Error::Database(format!("Test DB: Failed to open in-memory: {}", e)))?;
    schema::create_tables(&conn)?;
    schema::apply_additive_columns(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}
