//! Product Catalog Repository
//!
//! Stock is `NULL` for unlimited items; the stop-list reconciler writes the
//! remaining balance here when the POS reports a limited product.

use super::{RepoError, RepoResult};
use shared::models::{Product, ProductVariation, ProductVariationGroup};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    external_id: String,
    name: String,
    price: f64,
    weight: f64,
    stock: Option<f64>,
    hidden: bool,
}

impl ProductRow {
    fn into_product(self) -> RepoResult<Product> {
        Ok(Product {
            id: super::parse_uuid(&self.id, "product")?,
            external_id: self.external_id,
            name: self.name,
            price: self.price,
            weight: self.weight,
            stock: self.stock,
            hidden: self.hidden,
        })
    }
}

#[derive(Debug, FromRow)]
struct VariationRow {
    id: String,
    group_id: String,
    external_id: String,
    name: String,
}

#[derive(Debug, FromRow)]
struct VariationGroupRow {
    id: String,
    name: String,
}

pub async fn find_product(pool: &SqlitePool, id: Uuid) -> RepoResult<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, external_id, name, price, weight, stock, hidden FROM product WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;
    row.map(ProductRow::into_product).transpose()
}

pub async fn find_all_products(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, external_id, name, price, weight, stock, hidden FROM product ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(ProductRow::into_product).collect()
}

pub async fn find_variation(pool: &SqlitePool, id: Uuid) -> RepoResult<Option<ProductVariation>> {
    let row = sqlx::query_as::<_, VariationRow>(
        "SELECT id, group_id, external_id, name FROM product_variation WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => Ok(Some(ProductVariation {
            id: super::parse_uuid(&row.id, "variation")?,
            group_id: super::parse_uuid(&row.group_id, "variation group")?,
            external_id: row.external_id,
            name: row.name,
        })),
        None => Ok(None),
    }
}

pub async fn find_variation_group(
    pool: &SqlitePool,
    id: Uuid,
) -> RepoResult<Option<ProductVariationGroup>> {
    let row = sqlx::query_as::<_, VariationGroupRow>(
        "SELECT id, name FROM product_variation_group WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => Ok(Some(ProductVariationGroup {
            id: super::parse_uuid(&row.id, "variation group")?,
            name: row.name,
        })),
        None => Ok(None),
    }
}

/// `None` clears the limit back to unlimited stock.
pub async fn update_stock_by_external_id(
    pool: &SqlitePool,
    external_id: &str,
    stock: Option<f64>,
) -> RepoResult<()> {
    let result = sqlx::query("UPDATE product SET stock = ? WHERE external_id = ?")
        .bind(stock)
        .bind(external_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Product with external id {external_id} not found"
        )));
    }
    Ok(())
}
