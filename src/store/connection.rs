use crate::errors::{Error, Result};
use crate::store::schema;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

pub type DbPool = Arc<Mutex<Connection>>;

/// Opens the database and brings the schema up to date: open, create any
/// missing tables, then append any missing columns. The returned pool is the
/// single shared handle every store operation goes through.
#[instrument]
pub async fn init_store(db_path: &str) -> Result<DbPool> {
    debug!("Initializing database connection to: {}", db_path);
    let conn = Connection::open(db_path)
        .map_err(|e| Error::Database(format!("Failed to open database at {}: {}", db_path, e)))?;

    info!("Database connection opened. Ensuring schema is current...");
    schema::create_tables(&conn)?;
    schema::apply_additive_columns(&conn)?;

    Ok(Arc::new(Mutex::new(conn)))
}
