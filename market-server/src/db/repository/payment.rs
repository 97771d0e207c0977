//! Payment Repository
//!
//! 独立 payment 表 CRUD。网关交易同步以 gateway_payment_id
//! 查询去重，保证幂等。

use super::{BaseRepository, RepoError, RepoResult, strip_table_prefix};
use crate::db::models::{PaymentCreate, PaymentRow};
use shared::models::PaymentStatus;
use shared::util::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const PAYMENT_TABLE: &str = "payment";
const ORDER_TABLE: &str = "order";

#[derive(Clone)]
pub struct PaymentRepository {
    base: BaseRepository,
}

impl PaymentRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a payment record
    pub async fn create(&self, data: PaymentCreate) -> RepoResult<PaymentRow> {
        let order_ref: Option<RecordId> = match &data.order_id {
            Some(id) => Some(
                format!("{}:{}", ORDER_TABLE, strip_table_prefix(ORDER_TABLE, id))
                    .parse()
                    .map_err(|_| RepoError::Validation(format!("Invalid order ID: {}", id)))?,
            ),
            None => None,
        };

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE payment SET
                    order = $order,
                    amount = $amount,
                    method = $method,
                    gateway_order_id = $gateway_order_id,
                    gateway_payment_id = $gateway_payment_id,
                    gateway_meta = $gateway_meta,
                    status = $status,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("order", order_ref))
            .bind(("amount", data.amount))
            .bind(("method", data.method))
            .bind(("gateway_order_id", data.gateway_order_id))
            .bind(("gateway_payment_id", data.gateway_payment_id))
            .bind(("gateway_meta", data.gateway_meta))
            .bind(("status", data.status))
            .bind(("created_at", now_millis()))
            .await?;

        let created: Option<PaymentRow> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create payment".to_string()))
    }

    /// All payment records, newest first (admin aggregation view)
    pub async fn find_all(&self) -> RepoResult<Vec<PaymentRow>> {
        let payments: Vec<PaymentRow> = self
            .base
            .db()
            .query("SELECT * FROM payment ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(payments)
    }

    /// Look up a payment by its gateway payment id (sync dedupe)
    pub async fn find_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> RepoResult<Option<PaymentRow>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM payment WHERE gateway_payment_id = $pid LIMIT 1")
            .bind(("pid", gateway_payment_id.to_string()))
            .await?;
        let payments: Vec<PaymentRow> = result.take(0)?;
        Ok(payments.into_iter().next())
    }

    /// Settle the payment record tied to a gateway order
    ///
    /// 结算后仅 status 可变。
    pub async fn settle_by_gateway_order(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query(
                r#"UPDATE payment SET
                    status = $status,
                    gateway_payment_id = $pid
                WHERE gateway_order_id = $goid"#,
            )
            .bind(("status", PaymentStatus::Completed))
            .bind(("pid", gateway_payment_id.to_string()))
            .bind(("goid", gateway_order_id.to_string()))
            .await?
            .check()?;
        Ok(())
    }
}
