//! Record shapes held in the godown collections.
//!
//! These are JSON documents with client-generated string ids, and nothing
//! guarantees a well-formed file: every numeric field deserializes leniently
//! so a malformed or missing value reads as zero instead of poisoning the
//! whole collection.

use crate::coerce::{lenient_f64, lenient_i64};
use serde::{Deserialize, Serialize};

/// A batch of birds received into the godown.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct InwardEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub entry_date: String,
    #[serde(default)]
    pub reference_no: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub cage_id: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub number_of_birds: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight_kg: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rate_per_kg: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(default)]
    pub notes: String,
}

/// Birds sold out of the godown.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GodownSale {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub sale_date: String,
    #[serde(default)]
    pub invoice_no: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub cage_id: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub number_of_birds: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rate_per_kg: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(default)]
    pub notes: String,
}

/// Birds lost to mortality.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MortalityRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub reference_no: String,
    #[serde(default)]
    pub cage_id: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub number_of_birds_died: i64,
    #[serde(default)]
    pub cause: String,
    #[serde(default)]
    pub notes: String,
}

/// A legacy godown stock item, the older flat purchase-lot shape kept for
/// stores that still carry that collection.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GodownItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub order_number: String,
    #[serde(default)]
    pub supplier_name: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub no_of_cages: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub no_of_birds: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub purchase_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_value: f64,
    #[serde(default)]
    pub last_updated: String,
}
