//! 类型转换模块
//!
//! 将数据库模型 (db::models) 转换为 API 响应模型 (shared::models)

use crate::db::models as db;
use shared::models as api;

// ============ Helper ============

pub fn record_id_to_string(id: &surrealdb::RecordId) -> String {
    id.to_string()
}

pub fn option_record_id_to_string(id: &Option<surrealdb::RecordId>) -> Option<String> {
    id.as_ref().map(record_id_to_string)
}

// ============ User ============

impl From<db::User> for api::UserPublic {
    fn from(u: db::User) -> Self {
        Self {
            id: option_record_id_to_string(&u.id),
            name: u.name,
            email: u.email,
            created_at: u.created_at,
        }
    }
}

// ============ Product ============

impl From<db::ProductRow> for api::Product {
    fn from(p: db::ProductRow) -> Self {
        Self {
            id: option_record_id_to_string(&p.id),
            title: p.title,
            description: p.description,
            seller: p.seller,
            category: p.category,
            price: p.price,
            stock: p.stock,
            is_active: p.is_active,
            created_at: p.created_at,
        }
    }
}

// ============ Order ============

impl From<db::OrderItemRow> for api::OrderItem {
    fn from(i: db::OrderItemRow) -> Self {
        Self {
            product_id: record_id_to_string(&i.product),
            title: i.title,
            quantity: i.quantity,
            unit_price: i.unit_price,
        }
    }
}

impl From<db::OrderRow> for api::Order {
    fn from(o: db::OrderRow) -> Self {
        Self {
            id: option_record_id_to_string(&o.id),
            user_id: record_id_to_string(&o.user),
            items: o.items.into_iter().map(Into::into).collect(),
            total: o.total,
            status: o.status,
            payment_status: o.payment_status,
            gateway_order_id: o.gateway_order_id,
            gateway_payment_id: o.gateway_payment_id,
            gateway_signature: o.gateway_signature,
            paid_at: o.paid_at,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

// ============ Payment ============

impl From<db::PaymentRow> for api::Payment {
    fn from(p: db::PaymentRow) -> Self {
        Self {
            id: option_record_id_to_string(&p.id),
            order_id: option_record_id_to_string(&p.order),
            amount: p.amount,
            method: p.method,
            gateway_order_id: p.gateway_order_id,
            gateway_payment_id: p.gateway_payment_id,
            gateway_meta: p.gateway_meta,
            status: p.status,
            created_at: p.created_at,
        }
    }
}

// ============ Service Listing ============

impl From<db::ServiceListingRow> for api::ServiceListing {
    fn from(s: db::ServiceListingRow) -> Self {
        Self {
            id: option_record_id_to_string(&s.id),
            user_id: record_id_to_string(&s.user),
            title: s.title,
            description: s.description,
            category: s.category,
            price: s.price,
            contact_email: s.contact_email,
            is_active: s.is_active,
            created_at: s.created_at,
        }
    }
}
