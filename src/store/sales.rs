use crate::coerce::{lenient_f64, lenient_i64};
use crate::errors::{Error, Result};
use crate::store::{DbPool, schema};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Birds assumed per cage when a sale reports cages but no bird count.
pub const BIRDS_PER_CAGE: i64 = 16;

/// Payment modes accepted on a sale; anything else is silently stored as NULL.
const PAYMENT_MODES: [&str; 3] = ["Cash", "Credit", "Online"];

/// A sale row as stored and served. Numeric columns that predate the additive
/// migration may hold NULL, which readers coalesce to zero.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,
    pub sale_invoice_no: String,
    pub shop_name: String,
    pub owner_name: String,
    pub phone: String,
    pub address: String,
    pub sale_mode: String,
    pub vehicle_no: String,
    pub sale_payment: String,
    pub notes: String,
    pub bird_type: String,
    pub number_of_cages: i64,
    pub number_of_birds: i64,
    pub average_weight: f64,
    pub total_weight: f64,
    pub rate_per_kg: f64,
    pub total_amount: f64,
    pub transport_charges: f64,
    pub loading_charges: f64,
    pub commission: f64,
    pub other_charges: f64,
    pub deductions: f64,
    pub total_invoice: f64,
    pub advance_paid: f64,
    pub credit_balance: f64,
    pub total_payment_made: f64,
    pub outstanding_payment: f64,
    pub payment_mode: Option<String>,
    pub balance_amount: f64,
    pub sale_date: String,
    #[serde(rename = "created_at")]
    pub created_at: Option<String>,
}

impl Sale {
    /// The date the listing sorts by: the business sale date when present,
    /// otherwise the insertion timestamp.
    fn effective_date(&self) -> &str {
        if self.sale_date.is_empty() {
            self.created_at.as_deref().unwrap_or("")
        } else {
            &self.sale_date
        }
    }
}

/// Incoming shape of `POST /api/sales`.
///
/// Every field is optional; numeric fields tolerate strings and garbage by
/// coercing to zero. The trailing fields are legacy aliases still accepted
/// from older clients.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    #[serde(default)]
    pub sale_invoice_no: Option<String>,
    #[serde(default)]
    pub shop_name: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub sale_mode: Option<String>,
    #[serde(default)]
    pub vehicle_no: Option<String>,
    #[serde(default)]
    pub sale_payment: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub bird_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub number_of_cages: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub number_of_birds: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average_weight: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_weight: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rate_per_kg: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub transport_charges: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub loading_charges: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub commission: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub other_charges: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub deductions: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_invoice: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub advance_paid: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub credit_balance: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_payment_made: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub outstanding_payment: f64,
    #[serde(default)]
    pub payment_mode: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub balance_amount: f64,
    #[serde(default)]
    pub sale_date: Option<String>,
    // Legacy aliases
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub unit_price: f64,
    #[serde(default)]
    pub payment_status: Option<String>,
}

const SALE_COLUMNS: &str = "id, saleInvoiceNo, shopName, ownerName, phone, address, saleMode, \
     vehicleNo, salePayment, notes, birdType, numberOfCages, numberOfBirds, averageWeight, \
     totalWeight, ratePerKg, totalAmount, transportCharges, loadingCharges, commission, \
     otherCharges, deductions, totalInvoice, advancePaid, creditBalance, totalPaymentMade, \
     outstandingPayment, paymentMode, balanceAmount, saleDate, created_at";

fn read_sale_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Sale> {
    let text = |i: usize| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(i)?.unwrap_or_default())
    };
    let real = |i: usize| -> rusqlite::Result<f64> {
        Ok(row.get::<_, Option<f64>>(i)?.unwrap_or(0.0))
    };
    let int = |i: usize| -> rusqlite::Result<i64> {
        Ok(row.get::<_, Option<i64>>(i)?.unwrap_or(0))
    };
    Ok(Sale {
        id: row.get(0)?,
        sale_invoice_no: text(1)?,
        shop_name: text(2)?,
        owner_name: text(3)?,
        phone: text(4)?,
        address: text(5)?,
        sale_mode: text(6)?,
        vehicle_no: text(7)?,
        sale_payment: text(8)?,
        notes: text(9)?,
        bird_type: text(10)?,
        number_of_cages: int(11)?,
        number_of_birds: int(12)?,
        average_weight: real(13)?,
        total_weight: real(14)?,
        rate_per_kg: real(15)?,
        total_amount: real(16)?,
        transport_charges: real(17)?,
        loading_charges: real(18)?,
        commission: real(19)?,
        other_charges: real(20)?,
        deductions: real(21)?,
        total_invoice: real(22)?,
        advance_paid: real(23)?,
        credit_balance: real(24)?,
        total_payment_made: real(25)?,
        outstanding_payment: real(26)?,
        payment_mode: row.get(27)?,
        balance_amount: real(28)?,
        sale_date: text(29)?,
        created_at: row.get(30)?,
    })
}

/// Lists all sales, most recent effective date first.
///
/// A database file that predates the sales table yields an empty list rather
/// than an error; every other failure surfaces as `Error::Database`.
#[instrument(skip(pool))]
pub async fn list_sales(pool: &DbPool) -> Result<Vec<Sale>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    if !schema::table_exists(&conn, "sales")? {
        debug!("Sales table does not exist yet, returning empty list.");
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM sales ORDER BY created_at DESC",
        SALE_COLUMNS
    ))?;
    let sale_iter = stmt.query_map([], read_sale_row)?;

    let mut sales = Vec::new();
    for sale_result in sale_iter {
        sales.push(sale_result.map_err(|e| Error::Database(format!("Failed to map sale row: {}", e)))?);
    }
    // Present by business date rather than raw insertion order.
    sales.sort_by(|a, b| b.effective_date().cmp(a.effective_date()));
    debug!("Fetched {} sales.", sales.len());
    Ok(sales)
}

/// Creates a sale from the permissive intake shape and returns the
/// freshly-read row (or an echo of the coerced input if the read-back fails).
///
/// Intake rules, applied in order:
/// - numeric fields are already zero-coerced by deserialization,
/// - `numberOfBirds` falls back to `numberOfCages * 16`,
/// - `ratePerKg` falls back to the legacy `unitPrice`,
/// - `shopName` falls back to the legacy `customer`,
/// - `salePayment` falls back to `paymentStatus`, then to `"Paid"`,
/// - `saleDate` falls back to the legacy `date`, then to today,
/// - an unrecognized `paymentMode` is stored as NULL, never rejected.
///
/// # Errors
///
/// Returns `Error::Database` for lock or statement failures. There is no
/// validation path: this intake accepts anything the shape admits.
#[instrument(skip(pool, new_sale))]
pub async fn create_sale(pool: &DbPool, new_sale: &NewSale) -> Result<Sale> {
    let number_of_cages = new_sale.number_of_cages;
    let number_of_birds = if new_sale.number_of_birds != 0 {
        new_sale.number_of_birds
    } else {
        number_of_cages * BIRDS_PER_CAGE
    };
    let rate_per_kg = if new_sale.rate_per_kg != 0.0 {
        new_sale.rate_per_kg
    } else {
        new_sale.unit_price
    };
    let shop_name = new_sale
        .shop_name
        .clone()
        .or_else(|| new_sale.customer.clone())
        .unwrap_or_default();
    let sale_payment = new_sale
        .sale_payment
        .clone()
        .or_else(|| new_sale.payment_status.clone())
        .unwrap_or_else(|| "Paid".to_string());
    let sale_date = new_sale
        .sale_date
        .clone()
        .or_else(|| new_sale.date.clone())
        .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());
    let payment_mode = new_sale
        .payment_mode
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty() && PAYMENT_MODES.contains(m))
        .map(ToString::to_string);

    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for creating sale".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO sales (
            saleInvoiceNo, shopName, ownerName, phone, address, saleMode, vehicleNo,
            salePayment, notes, birdType, numberOfCages, numberOfBirds, averageWeight,
            totalWeight, ratePerKg, totalAmount, transportCharges, loadingCharges,
            commission, otherCharges, deductions, totalInvoice, advancePaid,
            creditBalance, totalPaymentMade, outstandingPayment, paymentMode,
            balanceAmount, saleDate, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                  ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28,
                  ?29, CURRENT_TIMESTAMP)",
    )?;
    let sale_id = stmt.insert(params![
        new_sale.sale_invoice_no.clone().unwrap_or_default(),
        shop_name,
        new_sale.owner_name.clone().unwrap_or_default(),
        new_sale.phone.clone().unwrap_or_default(),
        new_sale.address.clone().unwrap_or_default(),
        new_sale.sale_mode.clone().unwrap_or_default(),
        new_sale.vehicle_no.clone().unwrap_or_default(),
        sale_payment,
        new_sale.notes.clone().unwrap_or_default(),
        new_sale.bird_type.clone().unwrap_or_default(),
        number_of_cages,
        number_of_birds,
        new_sale.average_weight,
        new_sale.total_weight,
        rate_per_kg,
        new_sale.total_amount,
        new_sale.transport_charges,
        new_sale.loading_charges,
        new_sale.commission,
        new_sale.other_charges,
        new_sale.deductions,
        new_sale.total_invoice,
        new_sale.advance_paid,
        new_sale.credit_balance,
        new_sale.total_payment_made,
        new_sale.outstanding_payment,
        payment_mode,
        new_sale.balance_amount,
        sale_date,
    ])?;
    info!(
        "Created sale (ID: {}): invoice='{}', birds={}, cages={}",
        sale_id,
        new_sale.sale_invoice_no.as_deref().unwrap_or(""),
        number_of_birds,
        number_of_cages
    );

    match get_sale_by_id(&conn, sale_id) {
        Ok(Some(sale)) => Ok(sale),
        other => {
            if let Err(e) = other {
                warn!("Failed to read back created sale {}: {}", sale_id, e);
            }
            Ok(Sale {
                id: sale_id,
                sale_invoice_no: new_sale.sale_invoice_no.clone().unwrap_or_default(),
                shop_name: new_sale
                    .shop_name
                    .clone()
                    .or_else(|| new_sale.customer.clone())
                    .unwrap_or_default(),
                owner_name: new_sale.owner_name.clone().unwrap_or_default(),
                phone: new_sale.phone.clone().unwrap_or_default(),
                address: new_sale.address.clone().unwrap_or_default(),
                sale_mode: new_sale.sale_mode.clone().unwrap_or_default(),
                vehicle_no: new_sale.vehicle_no.clone().unwrap_or_default(),
                sale_payment: new_sale
                    .sale_payment
                    .clone()
                    .or_else(|| new_sale.payment_status.clone())
                    .unwrap_or_else(|| "Paid".to_string()),
                notes: new_sale.notes.clone().unwrap_or_default(),
                bird_type: new_sale.bird_type.clone().unwrap_or_default(),
                number_of_cages,
                number_of_birds,
                average_weight: new_sale.average_weight,
                total_weight: new_sale.total_weight,
                rate_per_kg,
                total_amount: new_sale.total_amount,
                transport_charges: new_sale.transport_charges,
                loading_charges: new_sale.loading_charges,
                commission: new_sale.commission,
                other_charges: new_sale.other_charges,
                deductions: new_sale.deductions,
                total_invoice: new_sale.total_invoice,
                advance_paid: new_sale.advance_paid,
                credit_balance: new_sale.credit_balance,
                total_payment_made: new_sale.total_payment_made,
                outstanding_payment: new_sale.outstanding_payment,
                payment_mode,
                balance_amount: new_sale.balance_amount,
                sale_date,
                created_at: None,
            })
        }
    }
}

fn get_sale_by_id(conn: &Connection, id: i64) -> Result<Option<Sale>> {
    let mut stmt =
        conn.prepare_cached(&format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS))?;
    stmt.query_row(params![id], read_sale_row)
        .optional()
        .map_err(Error::from)
}

/// Deletes a sale by id.
///
/// The id is bound as the raw text the client sent; SQLite's column affinity
/// handles numeric comparison, and anything that matches no row (garbage
/// included) reports not-found rather than a parse error.
///
/// # Errors
///
/// Returns `Error::NotFound` when no row was deleted, `Error::Database` for
/// lock or statement failures.
#[instrument(skip(pool))]
pub async fn delete_sale(pool: &DbPool, id: &str) -> Result<()> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let rows_affected = conn.execute("DELETE FROM sales WHERE id = ?1", params![id])?;
    if rows_affected == 0 {
        return Err(Error::NotFound("Sale not found".to_string()));
    }
    info!("Deleted sale with id {}", id);
    Ok(())
}
