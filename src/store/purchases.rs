use crate::coerce::{coerce_f64, coerce_i64, first_truthy};
use crate::errors::{Error, Result};
use crate::store::DbPool;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// A purchase order row. The stored shape is the legacy order layout; the
/// invoice-style intake fields are folded into it on create.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: i64,
    pub order_number: String,
    pub supplier: String,
    pub date: String,
    pub description: String,
    pub bird_quantity: i64,
    pub cage_quantity: i64,
    pub unit_cost: f64,
    pub total_value: f64,
    pub status: String,
    pub notes: Option<String>,
    #[serde(rename = "created_at")]
    pub created_at: Option<String>,
}

/// Incoming shape of `POST /api/purchases`: either the invoice-style fields
/// or the legacy order fields must be supplied. Numeric fields are kept as
/// raw JSON values because presence (even as an empty string) is what the
/// required-field check tests; coercion to numbers happens afterwards.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchase {
    #[serde(default)]
    pub purchase_invoice_no: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<String>,
    #[serde(default)]
    pub farmer_name: Option<String>,
    #[serde(default)]
    pub bird_type: Option<String>,
    #[serde(default)]
    pub number_of_cages: Option<Value>,
    #[serde(default)]
    pub number_of_birds: Option<Value>,
    #[serde(default)]
    pub rate_per_kg: Option<Value>,
    #[serde(default)]
    pub total_amount: Option<Value>,
    #[serde(default)]
    pub notes: Option<String>,
    // Legacy order fields
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bird_quantity: Option<Value>,
    #[serde(default)]
    pub cage_quantity: Option<Value>,
    #[serde(default)]
    pub unit_cost: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
}

impl NewPurchase {
    fn has_invoice_fields(&self) -> bool {
        non_blank(&self.purchase_invoice_no)
            && non_blank(&self.purchase_date)
            && non_blank(&self.farmer_name)
            && self.number_of_cages.is_some()
            && self.number_of_birds.is_some()
            && self.rate_per_kg.is_some()
    }

    fn has_legacy_fields(&self) -> bool {
        non_blank(&self.supplier)
            && non_blank(&self.date)
            && non_blank(&self.description)
            && self.bird_quantity.is_some()
            && self.unit_cost.is_some()
    }
}

fn non_blank(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.is_empty())
}

fn read_purchase_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Purchase> {
    Ok(Purchase {
        id: row.get(0)?,
        order_number: row.get(1)?,
        supplier: row.get(2)?,
        date: row.get(3)?,
        description: row.get(4)?,
        bird_quantity: row.get(5)?,
        cage_quantity: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
        unit_cost: row.get(7)?,
        total_value: row.get(8)?,
        status: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
    })
}

const PURCHASE_COLUMNS: &str = "id, orderNumber, supplier, date, description, birdQuantity, \
     cageQuantity, unitCost, totalValue, status, notes, created_at";

/// Lists all purchase orders, most recent business date first (insertion
/// order breaks ties). A database file that predates the table yields an
/// empty list rather than an error.
#[instrument(skip(pool))]
pub async fn list_purchases(pool: &DbPool) -> Result<Vec<Purchase>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    if !crate::store::schema::table_exists(&conn, "purchases")? {
        debug!("Purchases table does not exist yet, returning empty list.");
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM purchases ORDER BY date DESC, created_at DESC",
        PURCHASE_COLUMNS
    ))?;
    let purchase_iter = stmt.query_map([], read_purchase_row)?;

    let mut purchases = Vec::new();
    for purchase_result in purchase_iter {
        purchases.push(
            purchase_result
                .map_err(|e| Error::Database(format!("Failed to map purchase row: {}", e)))?,
        );
    }
    debug!("Fetched {} purchases.", purchases.len());
    Ok(purchases)
}

/// Creates a purchase order from either intake shape and returns the
/// freshly-read row.
///
/// An order number `PO-NNN` is generated from the current row count when no
/// invoice number was supplied. Invoice-style fields win over their legacy
/// aliases; zero or blank values fall through to the alias the same way the
/// form clients resolved them.
///
/// # Errors
///
/// Returns `Error::Validation` when neither the invoice-style nor the legacy
/// required fields are present, `Error::Database` otherwise on failure.
#[instrument(skip(pool, new_purchase))]
pub async fn create_purchase(pool: &DbPool, new_purchase: &NewPurchase) -> Result<Purchase> {
    if !new_purchase.has_invoice_fields() && !new_purchase.has_legacy_fields() {
        return Err(Error::Validation("Missing required fields".to_string()));
    }

    let bird_quantity = first_truthy(&[&new_purchase.number_of_birds, &new_purchase.bird_quantity])
        .map_or(0, coerce_i64);
    let cage_quantity = first_truthy(&[&new_purchase.number_of_cages, &new_purchase.cage_quantity])
        .map_or(0, coerce_i64);
    let unit_cost =
        first_truthy(&[&new_purchase.rate_per_kg, &new_purchase.unit_cost]).map_or(0.0, coerce_f64);
    let total_value = new_purchase
        .total_amount
        .as_ref()
        .filter(|v| crate::coerce::is_truthy(v))
        .map_or_else(|| bird_quantity as f64 * unit_cost, coerce_f64);

    let supplier = new_purchase
        .farmer_name
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| new_purchase.supplier.clone())
        .unwrap_or_default()
        .trim()
        .to_string();
    let date = new_purchase
        .purchase_date
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| new_purchase.date.clone())
        .unwrap_or_default();
    let description = new_purchase
        .description
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            format!(
                "{} - {} birds",
                new_purchase.bird_type.as_deref().unwrap_or(""),
                bird_quantity
            )
            .trim()
            .to_string()
        });
    let status = new_purchase
        .status
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "pending".to_string());
    let notes = new_purchase
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(ToString::to_string);

    let conn = pool.lock().map_err(|_| {
        Error::Database("Failed to acquire DB lock for creating purchase".to_string())
    })?;
    let order_number = match new_purchase
        .purchase_invoice_no
        .clone()
        .filter(|s| !s.is_empty())
    {
        Some(invoice_no) => invoice_no,
        None => {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM purchases", [], |row| row.get(0))?;
            format!("PO-{:03}", count + 1)
        }
    };

    let mut stmt = conn.prepare_cached(
        "INSERT INTO purchases (orderNumber, supplier, date, description, birdQuantity,
            cageQuantity, unitCost, totalValue, status, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    let purchase_id = stmt.insert(params![
        order_number,
        supplier,
        date,
        description,
        bird_quantity,
        cage_quantity,
        unit_cost,
        total_value,
        status,
        notes,
    ])?;
    info!(
        "Created purchase order '{}' (ID: {}): {} birds from '{}'",
        order_number, purchase_id, bird_quantity, supplier
    );

    match get_purchase_by_id(&conn, purchase_id) {
        Ok(Some(purchase)) => Ok(purchase),
        other => {
            if let Err(e) = other {
                warn!("Failed to read back created purchase {}: {}", purchase_id, e);
            }
            Ok(Purchase {
                id: purchase_id,
                order_number,
                supplier,
                date,
                description,
                bird_quantity,
                cage_quantity,
                unit_cost,
                total_value,
                status,
                notes,
                created_at: None,
            })
        }
    }
}

fn get_purchase_by_id(conn: &Connection, id: i64) -> Result<Option<Purchase>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM purchases WHERE id = ?1",
        PURCHASE_COLUMNS
    ))?;
    stmt.query_row(params![id], read_purchase_row)
        .optional()
        .map_err(Error::from)
}
