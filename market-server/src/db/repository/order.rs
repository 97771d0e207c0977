//! Order Repository
//!
//! 订单行访问。状态转换语义由 `orders::OrderLifecycle` 负责，
//! 这里只做行级读写。

use super::{BaseRepository, RepoError, RepoResult, strip_table_prefix};
use crate::db::models::OrderRow;
use shared::models::{OrderStatus, PaymentStatus};
use shared::util::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const ORDER_TABLE: &str = "order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn parse_id(id: &str) -> RepoResult<RecordId> {
        let pure_id = strip_table_prefix(ORDER_TABLE, id);
        format!("{}:{}", ORDER_TABLE, pure_id)
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid order ID: {}", id)))
    }

    /// Persist a freshly built PENDING order
    pub async fn create(&self, row: OrderRow) -> RepoResult<OrderRow> {
        let created: Option<OrderRow> = self.base.db().create(ORDER_TABLE).content(row).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Find order by id (admin scope)
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<OrderRow>> {
        let thing = Self::parse_id(id)?;
        let order: Option<OrderRow> = self.base.db().select(thing).await?;
        Ok(order)
    }

    /// Find order by id, scoped to its owning user
    ///
    /// 跨账号访问返回 None (对外表现为 404)，防止越权读取/更新。
    pub async fn find_by_id_for_user(
        &self,
        id: &str,
        user: &RecordId,
    ) -> RepoResult<Option<OrderRow>> {
        let thing = Self::parse_id(id)?;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM order WHERE id = $id AND user = $user")
            .bind(("id", thing))
            .bind(("user", user.clone()))
            .await?;
        let orders: Vec<OrderRow> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// All orders of one user, newest first
    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Vec<OrderRow>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM order WHERE user = $user ORDER BY created_at DESC")
            .bind(("user", user.clone()))
            .await?;
        let orders: Vec<OrderRow> = result.take(0)?;
        Ok(orders)
    }

    /// All orders, newest first (admin)
    pub async fn find_all(&self) -> RepoResult<Vec<OrderRow>> {
        let orders: Vec<OrderRow> = self
            .base
            .db()
            .query("SELECT * FROM order ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Record the gateway order id once the remote reservation is created
    pub async fn set_gateway_order(
        &self,
        id: &str,
        gateway_order_id: &str,
    ) -> RepoResult<OrderRow> {
        let thing = Self::parse_id(id)?;
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE order SET
                    gateway_order_id = $gateway_order_id,
                    updated_at = $now
                WHERE id = $id
                RETURN AFTER"#,
            )
            .bind(("id", thing))
            .bind(("gateway_order_id", gateway_order_id.to_string()))
            .bind(("now", now_millis()))
            .await?;
        let orders: Vec<OrderRow> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// Apply a verified payment: PENDING → IN_PROCESS, payment COMPLETED,
    /// correlation fields persisted, paid_at set.
    ///
    /// 库存不在这里扣减——结账时已预留 (单次扣减点)。
    pub async fn mark_paid(
        &self,
        id: &str,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        gateway_signature: &str,
    ) -> RepoResult<OrderRow> {
        let thing = Self::parse_id(id)?;
        let now = now_millis();
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE order SET
                    status = $status,
                    payment_status = $payment_status,
                    gateway_order_id = $gateway_order_id,
                    gateway_payment_id = $gateway_payment_id,
                    gateway_signature = $gateway_signature,
                    paid_at = $now,
                    updated_at = $now
                WHERE id = $id
                RETURN AFTER"#,
            )
            .bind(("id", thing))
            .bind(("status", OrderStatus::InProcess))
            .bind(("payment_status", PaymentStatus::Completed))
            .bind(("gateway_order_id", gateway_order_id.to_string()))
            .bind(("gateway_payment_id", gateway_payment_id.to_string()))
            .bind(("gateway_signature", gateway_signature.to_string()))
            .bind(("now", now))
            .await?;
        let orders: Vec<OrderRow> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// Set order status unconditionally (admin transition handler)
    pub async fn set_status(&self, id: &str, status: OrderStatus) -> RepoResult<OrderRow> {
        let thing = Self::parse_id(id)?;
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE order SET
                    status = $status,
                    updated_at = $now
                WHERE id = $id
                RETURN AFTER"#,
            )
            .bind(("id", thing))
            .bind(("status", status))
            .bind(("now", now_millis()))
            .await?;
        let orders: Vec<OrderRow> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }
}
