use crate::errors::{Error, Result};
use crate::store::DbPool;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub created_at: Option<String>,
}

/// Incoming shape of `POST /api/products`.
///
/// Unlike the sale intake, products are validated strictly: a missing or
/// blank name and a negative price are rejected instead of coerced.
#[derive(Debug, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

fn read_product_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        price: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Lists all products, newest first. A database file that predates the
/// table yields an empty list rather than an error.
///
/// # Errors
///
/// Returns `Error::Database` if there's an issue acquiring the database lock,
/// preparing the SQL statement, or mapping query results.
#[instrument(skip(pool))]
pub async fn list_products(pool: &DbPool) -> Result<Vec<Product>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    if !crate::store::schema::table_exists(&conn, "products")? {
        debug!("Products table does not exist yet, returning empty list.");
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare_cached(
        "SELECT id, name, category, price, created_at FROM products
         ORDER BY created_at DESC",
    )?;
    let product_iter = stmt.query_map([], read_product_row)?;

    let mut products = Vec::new();
    for product_result in product_iter {
        products.push(
            product_result
                .map_err(|e| Error::Database(format!("Failed to map product row: {}", e)))?,
        );
    }
    debug!("Fetched {} products.", products.len());
    Ok(products)
}

/// Creates a new product and returns the freshly-read row.
///
/// The name is required and must be non-blank; the price, when given, must be
/// non-negative. If the read-back of the inserted row fails, an echo of the
/// validated input plus the generated id is returned instead, so the caller
/// still sees the record it just created.
///
/// # Errors
///
/// Returns `Error::Validation` for a missing/blank name or a negative price.
/// Returns `Error::Database` for lock or statement failures.
#[instrument(skip(pool, new_product))]
pub async fn create_product(pool: &DbPool, new_product: &NewProduct) -> Result<Product> {
    let name = match new_product.name.as_deref().map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        _ => return Err(Error::Validation("Product name is required".to_string())),
    };
    if let Some(price) = new_product.price {
        if price < 0.0 {
            return Err(Error::Validation(
                "Price must be a non-negative number".to_string(),
            ));
        }
    }
    let category = new_product
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(ToString::to_string);

    let conn = pool.lock().map_err(|_| {
        Error::Database("Failed to acquire DB lock for creating product".to_string())
    })?;
    let mut stmt =
        conn.prepare_cached("INSERT INTO products (name, category, price) VALUES (?1, ?2, ?3)")?;
    let product_id = stmt.insert(params![name, category, new_product.price])?;
    info!("Created product '{}' (ID: {})", name, product_id);

    match get_product_by_id(&conn, product_id) {
        Ok(Some(product)) => Ok(product),
        other => {
            // The insert succeeded; echo the input rather than failing the call.
            if let Err(e) = other {
                warn!("Failed to read back created product {}: {}", product_id, e);
            }
            Ok(Product {
                id: product_id,
                name,
                category,
                price: new_product.price,
                created_at: None,
            })
        }
    }
}

fn get_product_by_id(conn: &Connection, id: i64) -> Result<Option<Product>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, name, category, price, created_at FROM products WHERE id = ?1",
    )?;
    stmt.query_row(params![id], read_product_row)
        .optional()
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_utils::{init_test_tracing, setup_test_store};
    use crate::errors::Result;
    use rusqlite::params;

    #[tokio::test]
    async fn test_create_and_list_product() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_store().await?;

        let created = create_product(
            &pool,
            &NewProduct {
                name: Some("Broiler".to_string()),
                category: Some("Live birds".to_string()),
                price: Some(250.0),
            },
        )
        .await?;
        assert!(created.id > 0);
        assert_eq!(created.name, "Broiler");
        assert!(
            created.created_at.is_some(),
            "created_at should be server-assigned"
        );

        let products = list_products(&pool).await?;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Broiler");
        assert_eq!(products[0].category.as_deref(), Some("Live birds"));
        assert_eq!(products[0].price, Some(250.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_trims_and_blanks_category() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_store().await?;

        let created = create_product(
            &pool,
            &NewProduct {
                name: Some("  Desi Eggs  ".to_string()),
                category: Some("   ".to_string()),
                price: None,
            },
        )
        .await?;
        assert_eq!(created.name, "Desi Eggs");
        assert_eq!(created.category, None, "blank category is stored as NULL");
        assert_eq!(created.price, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_rejects_blank_name_without_insert() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_store().await?;

        for bad_name in [None, Some("".to_string()), Some("   ".to_string())] {
            let result = create_product(
                &pool,
                &NewProduct {
                    name: bad_name,
                    category: None,
                    price: None,
                },
            )
            .await;
            assert!(matches!(result, Err(Error::Validation(_))));
        }

        assert!(
            list_products(&pool).await?.is_empty(),
            "rejected creates must not insert"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_rejects_negative_price() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_store().await?;

        let result = create_product(
            &pool,
            &NewProduct {
                name: Some("Feed bag".to_string()),
                category: None,
                price: Some(-1.0),
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(list_products(&pool).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_products_orders_newest_first() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_store().await?;

        // Insert with explicit timestamps so the ordering is deterministic.
        {
            let conn = pool.lock().unwrap();
            conn.execute(
                "INSERT INTO products (name, created_at) VALUES (?1, ?2)",
                params!["Older", "2025-01-01 08:00:00"],
            )?;
            conn.execute(
                "INSERT INTO products (name, created_at) VALUES (?1, ?2)",
                params!["Newer", "2025-06-01 08:00:00"],
            )?;
        }

        let products = list_products(&pool).await?;
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Newer");
        assert_eq!(products[1].name, "Older");
        Ok(())
    }
}
