//! Product Repository
//!
//! 库存扣减是检查加更新的单条语句 (`stock >= $qty` 谓词)，
//! 结账时一次性预留，验证支付时不再触碰库存。

use super::{BaseRepository, RepoError, RepoResult, strip_table_prefix};
use crate::db::models::{ProductCreate, ProductRow, ProductUpdate};
use shared::util::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active products (storefront)
    pub async fn find_all_active(&self) -> RepoResult<Vec<ProductRow>> {
        let products: Vec<ProductRow> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE is_active = true ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find all products including inactive (admin)
    pub async fn find_all(&self) -> RepoResult<Vec<ProductRow>> {
        let products: Vec<ProductRow> = self
            .base
            .db()
            .query("SELECT * FROM product ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find product by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<ProductRow>> {
        let pure_id = strip_table_prefix(PRODUCT_TABLE, id).to_string();
        let product: Option<ProductRow> =
            self.base.db().select((PRODUCT_TABLE, pure_id)).await?;
        Ok(product)
    }

    /// Create a new product
    pub async fn create(&self, data: ProductCreate) -> RepoResult<ProductRow> {
        if data.price.is_sign_negative() {
            return Err(RepoError::Validation("Price cannot be negative".to_string()));
        }
        if data.stock < 0 {
            return Err(RepoError::Validation("Stock cannot be negative".to_string()));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE product SET
                    title = $title,
                    description = $description,
                    seller = $seller,
                    category = $category,
                    price = $price,
                    stock = $stock,
                    is_active = true,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("title", data.title))
            .bind(("description", data.description))
            .bind(("seller", data.seller))
            .bind(("category", data.category))
            .bind(("price", data.price))
            .bind(("stock", data.stock))
            .bind(("created_at", now_millis()))
            .await?;

        let created: Option<ProductRow> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Update a product (partial merge)
    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<ProductRow> {
        let pure_id = strip_table_prefix(PRODUCT_TABLE, id).to_string();
        let updated: Option<ProductRow> = self
            .base
            .db()
            .update((PRODUCT_TABLE, pure_id))
            .merge(data)
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Delete a product (orders keep their title/price snapshots)
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let pure_id = strip_table_prefix(PRODUCT_TABLE, id).to_string();
        let deleted: Option<ProductRow> =
            self.base.db().delete((PRODUCT_TABLE, pure_id)).await?;
        Ok(deleted.is_some())
    }

    /// Reserve stock for a checkout: decrement iff enough units remain.
    ///
    /// Returns the updated row, or None when the product is missing,
    /// inactive, or short on stock. Single-statement check-and-set.
    pub async fn reserve_stock(
        &self,
        id: &RecordId,
        quantity: i64,
    ) -> RepoResult<Option<ProductRow>> {
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE product SET stock -= $qty
                   WHERE id = $id AND is_active = true AND stock >= $qty
                   RETURN AFTER"#,
            )
            .bind(("id", id.clone()))
            .bind(("qty", quantity))
            .await?;
        let rows: Vec<ProductRow> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    /// Return previously reserved stock (order cancelled before payment)
    pub async fn restore_stock(&self, id: &RecordId, quantity: i64) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE product SET stock += $qty WHERE id = $id")
            .bind(("id", id.clone()))
            .bind(("qty", quantity))
            .await?
            .check()?;
        Ok(())
    }
}
