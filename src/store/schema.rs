//! Declarative table descriptions for the relational store.
//!
//! Each managed table is described once, by a [`TableSpec`], and that single
//! description drives both the `CREATE TABLE IF NOT EXISTS` statement and the
//! additive `ALTER TABLE ... ADD COLUMN` migration, so the two can never
//! drift apart.

use crate::errors::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info, instrument, warn};

/// A single table: base columns (created with the table, may carry
/// constraints) and additive columns (appended on every startup, so they must
/// be plain nullable columns per SQLite's `ADD COLUMN` rules).
pub(crate) struct TableSpec {
    pub(crate) name: &'static str,
    pub(crate) base: &'static [(&'static str, &'static str)],
    pub(crate) additive: &'static [(&'static str, &'static str)],
}

impl TableSpec {
    fn create_sql(&self) -> String {
        let columns: Vec<String> = self
            .base
            .iter()
            .chain(self.additive.iter())
            .map(|(name, definition)| format!("{} {}", name, definition))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            columns.join(", ")
        )
    }
}

pub(crate) const PRODUCTS: TableSpec = TableSpec {
    name: "products",
    base: &[
        ("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        ("name", "TEXT NOT NULL"),
        ("category", "TEXT"),
        ("price", "REAL"),
        ("created_at", "DATETIME DEFAULT CURRENT_TIMESTAMP"),
    ],
    additive: &[],
};

pub(crate) const PURCHASES: TableSpec = TableSpec {
    name: "purchases",
    base: &[
        ("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        ("orderNumber", "TEXT NOT NULL"),
        ("supplier", "TEXT NOT NULL"),
        ("date", "TEXT NOT NULL"),
        ("description", "TEXT NOT NULL"),
        ("birdQuantity", "INTEGER NOT NULL"),
        ("cageQuantity", "INTEGER NOT NULL DEFAULT 0"),
        ("unitCost", "REAL NOT NULL"),
        ("totalValue", "REAL NOT NULL"),
        (
            "status",
            "TEXT NOT NULL CHECK(status IN ('pending', 'picked up', 'cancel')) DEFAULT 'pending'",
        ),
        ("notes", "TEXT"),
        ("created_at", "DATETIME DEFAULT CURRENT_TIMESTAMP"),
    ],
    additive: &[],
};

pub(crate) const SALES: TableSpec = TableSpec {
    name: "sales",
    base: &[
        ("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        ("created_at", "DATETIME DEFAULT CURRENT_TIMESTAMP"),
    ],
    additive: &[
        ("saleInvoiceNo", "TEXT"),
        ("shopName", "TEXT"),
        ("ownerName", "TEXT"),
        ("phone", "TEXT"),
        ("address", "TEXT"),
        ("saleMode", "TEXT"),
        ("vehicleNo", "TEXT"),
        ("salePayment", "TEXT"),
        ("notes", "TEXT"),
        ("birdType", "TEXT"),
        ("numberOfCages", "INTEGER"),
        ("numberOfBirds", "INTEGER"),
        ("averageWeight", "REAL"),
        ("totalWeight", "REAL"),
        ("ratePerKg", "REAL"),
        ("totalAmount", "REAL"),
        ("transportCharges", "REAL"),
        ("loadingCharges", "REAL"),
        ("commission", "REAL"),
        ("otherCharges", "REAL"),
        ("deductions", "REAL"),
        ("totalInvoice", "REAL"),
        ("advancePaid", "REAL"),
        ("creditBalance", "REAL"),
        ("totalPaymentMade", "REAL"),
        ("outstandingPayment", "REAL"),
        ("paymentMode", "TEXT"),
        ("balanceAmount", "REAL"),
        ("saleDate", "TEXT"),
    ],
};

pub(crate) const TABLES: &[&TableSpec] = &[&PRODUCTS, &PURCHASES, &SALES];

#[instrument(skip(conn))]
pub(crate) fn create_tables(conn: &Connection) -> Result<()> {
    debug!("Executing CREATE TABLE statements if tables do not exist.");
    for table in TABLES {
        conn.execute(&table.create_sql(), []).map_err(|e| {
            Error::Database(format!("Failed to create table {}: {}", table.name, e))
        })?;
    }
    info!("Database tables ensured.");
    Ok(())
}

/// Appends every additive column to its table.
///
/// "duplicate column" is the expected steady-state outcome and is treated as
/// success; any other failure is logged as a warning and migration continues
/// with the remaining columns. Safe to re-run any number of times.
#[instrument(skip(conn))]
pub(crate) fn apply_additive_columns(conn: &Connection) -> Result<()> {
    for table in TABLES {
        for (column, definition) in table.additive {
            let sql = format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                table.name, column, definition
            );
            match conn.execute(&sql, []) {
                Ok(_) => debug!("Added column {}.{}", table.name, column),
                Err(e) => {
                    let msg = e.to_string();
                    if !msg.contains("duplicate column") {
                        warn!("Could not add column {}.{}: {}", table.name, column, msg);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Checks `sqlite_master` for a table, so callers can degrade gracefully
/// instead of erroring on a database file that predates the table.
pub(crate) fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
