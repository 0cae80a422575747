//! The godown document store.
//!
//! Inward entries, godown sales, mortality records, legacy items and the
//! configured capacity live in a single JSON file of keyed collections,
//! mirroring the key-per-collection browser storage older clients kept these
//! records in. Every mutation updates the in-memory state and then rewrites
//! the whole file; there is no transaction, and collections share no keys
//! with each other or with the relational store.

use crate::errors::{Error, Result};
use crate::godown::records::{GodownItem, GodownSale, InwardEntry, MortalityRecord};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Default godown capacity in birds, used until an override is persisted.
pub const DEFAULT_CAPACITY: i64 = 5000;

/// An optional inclusive date window applied to list operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether a record with this date string falls inside the window.
    /// When a bound is set, records with unparsable dates are excluded.
    fn contains(&self, date_str: &str) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
            return false;
        };
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collections {
    #[serde(default, rename = "godownInwardEntry")]
    inward: Vec<InwardEntry>,
    #[serde(default, rename = "godownSale")]
    sales: Vec<GodownSale>,
    #[serde(default, rename = "godownMortality")]
    mortality: Vec<MortalityRecord>,
    #[serde(default, rename = "godown")]
    items: Vec<GodownItem>,
    #[serde(default, rename = "godownCapacity")]
    capacity: Option<i64>,
    /// Keys this version does not understand are carried through untouched.
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

pub struct GodownStore {
    path: PathBuf,
    state: RwLock<Collections>,
}

fn generate_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

fn today_string() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

impl GodownStore {
    /// Opens the store, reading the backing file when it exists.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` when the file exists but cannot be read, and
    /// `Error::Database` when its contents are not the expected JSON shape.
    #[instrument]
    pub fn load<P: AsRef<Path> + std::fmt::Debug>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents).map_err(|e| {
                Error::Database(format!("Failed to parse godown store {:?}: {}", path, e))
            })?
        } else {
            debug!("Godown store {:?} not found, starting empty.", path);
            Collections::default()
        };
        info!("Godown store loaded from {:?}", path);
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    fn persist(&self, state: &Collections) -> Result<()> {
        let contents = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, contents)
            .map_err(|e| Error::Database(format!("Failed to write godown store: {}", e)))
    }

    // ----- inward entries -----

    pub async fn list_inward(&self, range: DateRange) -> Vec<InwardEntry> {
        let state = self.state.read().await;
        state
            .inward
            .iter()
            .filter(|e| range.contains(&e.entry_date))
            .cloned()
            .collect()
    }

    /// Adds an inward entry. `entryDate`, `referenceNo` and `cageId` are
    /// required; the money amount is always recomputed from weight and rate,
    /// ignoring whatever the client sent.
    pub async fn create_inward(&self, mut entry: InwardEntry) -> Result<InwardEntry> {
        if entry.entry_date.is_empty() || entry.reference_no.is_empty() || entry.cage_id.is_empty()
        {
            return Err(Error::Validation(
                "Date, Reference No and Cage ID are required".to_string(),
            ));
        }
        if entry.id.is_empty() {
            entry.id = generate_id();
        }
        entry.amount = entry.weight_kg * entry.rate_per_kg;

        let mut state = self.state.write().await;
        state.inward.push(entry.clone());
        self.persist(&state)?;
        info!(
            "Godown inward entry {} recorded: {} birds under '{}'",
            entry.id, entry.number_of_birds, entry.reference_no
        );
        Ok(entry)
    }

    pub async fn update_inward(&self, id: &str, mut entry: InwardEntry) -> Result<InwardEntry> {
        if entry.entry_date.is_empty() || entry.reference_no.is_empty() || entry.cage_id.is_empty()
        {
            return Err(Error::Validation(
                "Date, Reference No and Cage ID are required".to_string(),
            ));
        }
        entry.id = id.to_string();
        entry.amount = entry.weight_kg * entry.rate_per_kg;

        let mut state = self.state.write().await;
        let slot = state
            .inward
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::NotFound("Inward entry not found".to_string()))?;
        *slot = entry.clone();
        self.persist(&state)?;
        Ok(entry)
    }

    pub async fn delete_inward(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let before = state.inward.len();
        state.inward.retain(|e| e.id != id);
        if state.inward.len() == before {
            return Err(Error::NotFound("Inward entry not found".to_string()));
        }
        self.persist(&state)
    }

    // ----- godown sales -----

    pub async fn list_sales(&self, range: DateRange) -> Vec<GodownSale> {
        let state = self.state.read().await;
        state
            .sales
            .iter()
            .filter(|s| range.contains(&s.sale_date))
            .cloned()
            .collect()
    }

    /// Adds a godown sale. `saleDate`, `invoiceNo` and `cageId` are required;
    /// the amount is recomputed as birds times rate.
    pub async fn create_sale(&self, mut sale: GodownSale) -> Result<GodownSale> {
        if sale.sale_date.is_empty() || sale.invoice_no.is_empty() || sale.cage_id.is_empty() {
            return Err(Error::Validation(
                "Date, Invoice No and Cage ID are required".to_string(),
            ));
        }
        if sale.id.is_empty() {
            sale.id = generate_id();
        }
        sale.amount = sale.number_of_birds as f64 * sale.rate_per_kg;

        let mut state = self.state.write().await;
        state.sales.push(sale.clone());
        self.persist(&state)?;
        info!(
            "Godown sale {} recorded: {} birds on invoice '{}'",
            sale.id, sale.number_of_birds, sale.invoice_no
        );
        Ok(sale)
    }

    pub async fn update_sale(&self, id: &str, mut sale: GodownSale) -> Result<GodownSale> {
        if sale.sale_date.is_empty() || sale.invoice_no.is_empty() || sale.cage_id.is_empty() {
            return Err(Error::Validation(
                "Date, Invoice No and Cage ID are required".to_string(),
            ));
        }
        sale.id = id.to_string();
        sale.amount = sale.number_of_birds as f64 * sale.rate_per_kg;

        let mut state = self.state.write().await;
        let slot = state
            .sales
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::NotFound("Godown sale not found".to_string()))?;
        *slot = sale.clone();
        self.persist(&state)?;
        Ok(sale)
    }

    pub async fn delete_sale(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let before = state.sales.len();
        state.sales.retain(|s| s.id != id);
        if state.sales.len() == before {
            return Err(Error::NotFound("Godown sale not found".to_string()));
        }
        self.persist(&state)
    }

    // ----- mortality records -----

    pub async fn list_mortality(&self, range: DateRange) -> Vec<MortalityRecord> {
        let state = self.state.read().await;
        state
            .mortality
            .iter()
            .filter(|r| range.contains(&r.date))
            .cloned()
            .collect()
    }

    /// Adds a mortality record. `date` and `cageId` are required; a missing
    /// or malformed died-count is tolerated as zero.
    pub async fn create_mortality(&self, mut record: MortalityRecord) -> Result<MortalityRecord> {
        if record.date.is_empty() || record.cage_id.is_empty() {
            return Err(Error::Validation(
                "Date and Cage ID are required".to_string(),
            ));
        }
        if record.id.is_empty() {
            record.id = generate_id();
        }

        let mut state = self.state.write().await;
        state.mortality.push(record.clone());
        self.persist(&state)?;
        info!(
            "Godown mortality {} recorded: {} birds died in cage '{}'",
            record.id, record.number_of_birds_died, record.cage_id
        );
        Ok(record)
    }

    pub async fn update_mortality(
        &self,
        id: &str,
        mut record: MortalityRecord,
    ) -> Result<MortalityRecord> {
        if record.date.is_empty() || record.cage_id.is_empty() {
            return Err(Error::Validation(
                "Date and Cage ID are required".to_string(),
            ));
        }
        record.id = id.to_string();

        let mut state = self.state.write().await;
        let slot = state
            .mortality
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound("Mortality record not found".to_string()))?;
        *slot = record.clone();
        self.persist(&state)?;
        Ok(record)
    }

    pub async fn delete_mortality(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let before = state.mortality.len();
        state.mortality.retain(|r| r.id != id);
        if state.mortality.len() == before {
            return Err(Error::NotFound("Mortality record not found".to_string()));
        }
        self.persist(&state)
    }

    // ----- legacy godown items -----

    pub async fn list_items(&self, range: DateRange) -> Vec<GodownItem> {
        let state = self.state.read().await;
        state
            .items
            .iter()
            .filter(|i| range.contains(&i.last_updated))
            .cloned()
            .collect()
    }

    /// Adds a legacy godown item. Order number and supplier are required; the
    /// total value is recomputed from birds and purchase rate and the
    /// last-updated stamp is always today's date.
    pub async fn create_item(&self, mut item: GodownItem) -> Result<GodownItem> {
        if item.order_number.is_empty() || item.supplier_name.is_empty() {
            return Err(Error::Validation(
                "Order number and supplier name are required".to_string(),
            ));
        }
        if item.id.is_empty() {
            item.id = generate_id();
        }
        item.total_value = item.no_of_birds as f64 * item.purchase_rate;
        item.last_updated = today_string();

        let mut state = self.state.write().await;
        state.items.push(item.clone());
        self.persist(&state)?;
        Ok(item)
    }

    pub async fn update_item(&self, id: &str, mut item: GodownItem) -> Result<GodownItem> {
        if item.order_number.is_empty() || item.supplier_name.is_empty() {
            return Err(Error::Validation(
                "Order number and supplier name are required".to_string(),
            ));
        }
        item.id = id.to_string();
        item.total_value = item.no_of_birds as f64 * item.purchase_rate;
        item.last_updated = today_string();

        let mut state = self.state.write().await;
        let slot = state
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::NotFound("Godown item not found".to_string()))?;
        *slot = item.clone();
        self.persist(&state)?;
        Ok(item)
    }

    pub async fn delete_item(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let before = state.items.len();
        state.items.retain(|i| i.id != id);
        if state.items.len() == before {
            return Err(Error::NotFound("Godown item not found".to_string()));
        }
        self.persist(&state)
    }

    // ----- capacity -----

    pub async fn capacity(&self) -> i64 {
        self.state.read().await.capacity.unwrap_or(DEFAULT_CAPACITY)
    }

    pub async fn set_capacity(&self, capacity: i64) -> Result<i64> {
        let mut state = self.state.write().await;
        state.capacity = Some(capacity);
        self.persist(&state)?;
        info!("Godown capacity set to {}", capacity);
        Ok(capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use serde_json::json;

    fn temp_store_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("godown-store.json")
    }

    fn inward(entry_date: &str, reference_no: &str, birds: i64) -> InwardEntry {
        InwardEntry {
            entry_date: entry_date.to_string(),
            reference_no: reference_no.to_string(),
            cage_id: "C-1".to_string(),
            number_of_birds: birds,
            weight_kg: 10.0,
            rate_per_kg: 2.0,
            ..InwardEntry::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_recomputes_amount() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = GodownStore::load(temp_store_path(&dir))?;

        let mut entry = inward("2025-07-01", "INV-A", 100);
        entry.amount = 99999.0; // client-supplied amount is ignored
        let created = store.create_inward(entry).await?;

        assert!(!created.id.is_empty());
        assert_eq!(created.amount, 20.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_inward_requires_fields() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = GodownStore::load(temp_store_path(&dir))?;

        let mut entry = inward("2025-07-01", "INV-A", 100);
        entry.cage_id = String::new();
        let result = store.create_inward(entry).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(store.list_inward(DateRange::default()).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_mutations_survive_reload() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = temp_store_path(&dir);

        {
            let store = GodownStore::load(&path)?;
            store.create_inward(inward("2025-07-01", "INV-A", 100)).await?;
            store
                .create_mortality(MortalityRecord {
                    date: "2025-07-02".to_string(),
                    cage_id: "C-1".to_string(),
                    number_of_birds_died: 3,
                    cause: "heat".to_string(),
                    ..MortalityRecord::default()
                })
                .await?;
            store.set_capacity(1200).await?;
        }

        let reloaded = GodownStore::load(&path)?;
        assert_eq!(reloaded.list_inward(DateRange::default()).await.len(), 1);
        assert_eq!(reloaded.list_mortality(DateRange::default()).await.len(), 1);
        assert_eq!(reloaded.capacity().await, 1200);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_keys_are_preserved_across_rewrites() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = temp_store_path(&dir);
        fs::write(
            &path,
            json!({
                "godownInwardEntry": [],
                "dateFilterStartDate": "2025-01-01"
            })
            .to_string(),
        )?;

        let store = GodownStore::load(&path)?;
        store.create_inward(inward("2025-07-01", "INV-A", 10)).await?;

        let written: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(written["dateFilterStartDate"], json!("2025-01-01"));
        assert_eq!(written["godownInwardEntry"].as_array().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_not_found() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = GodownStore::load(temp_store_path(&dir))?;

        let result = store
            .update_inward("missing", inward("2025-07-01", "INV-A", 10))
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        let result = store.delete_inward("missing").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_replaces_record_in_place() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = GodownStore::load(temp_store_path(&dir))?;

        let created = store.create_inward(inward("2025-07-01", "INV-A", 10)).await?;
        let updated = store
            .update_inward(&created.id, inward("2025-07-02", "INV-B", 25))
            .await?;

        assert_eq!(updated.id, created.id);
        let all = store.list_inward(DateRange::default()).await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].reference_no, "INV-B");
        assert_eq!(all[0].number_of_birds, 25);
        Ok(())
    }

    #[tokio::test]
    async fn test_date_range_filters_inclusively() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = GodownStore::load(temp_store_path(&dir))?;

        store.create_inward(inward("2025-06-30", "A", 1)).await?;
        store.create_inward(inward("2025-07-01", "B", 2)).await?;
        store.create_inward(inward("2025-07-15", "C", 3)).await?;
        store.create_inward(inward("not-a-date", "D", 4)).await?;

        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2025, 7, 1),
            to: NaiveDate::from_ymd_opt(2025, 7, 31),
        };
        let filtered = store.list_inward(range).await;
        let refs: Vec<&str> = filtered.iter().map(|e| e.reference_no.as_str()).collect();
        assert_eq!(refs, vec!["B", "C"]);

        // No bounds: everything comes back, bad dates included.
        assert_eq!(store.list_inward(DateRange::default()).await.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_capacity_defaults_until_overridden() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = GodownStore::load(temp_store_path(&dir))?;

        assert_eq!(store.capacity().await, DEFAULT_CAPACITY);
        store.set_capacity(800).await?;
        assert_eq!(store.capacity().await, 800);
        Ok(())
    }

    #[tokio::test]
    async fn test_godown_sale_amount_is_birds_times_rate() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = GodownStore::load(temp_store_path(&dir))?;

        let sale = store
            .create_sale(GodownSale {
                sale_date: "2025-07-01".to_string(),
                invoice_no: "GS-1".to_string(),
                cage_id: "C-2".to_string(),
                number_of_birds: 12,
                rate_per_kg: 150.0,
                ..GodownSale::default()
            })
            .await?;
        assert_eq!(sale.amount, 1800.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_legacy_item_total_and_stamp() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = GodownStore::load(temp_store_path(&dir))?;

        let item = store
            .create_item(GodownItem {
                order_number: "ORD-001".to_string(),
                supplier_name: "Ahmed Khan".to_string(),
                no_of_cages: 2,
                no_of_birds: 32,
                purchase_rate: 110.0,
                ..GodownItem::default()
            })
            .await?;
        assert_eq!(item.total_value, 32.0 * 110.0);
        assert_eq!(item.last_updated, today_string());
        Ok(())
    }
}
