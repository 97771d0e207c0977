//! Service Listing Repository (B2B)

use super::{BaseRepository, RepoError, RepoResult, strip_table_prefix};
use crate::db::models::{ServiceListingCreate, ServiceListingRow, ServiceListingUpdate};
use shared::util::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const SERVICE_TABLE: &str = "service";

#[derive(Clone)]
pub struct ServiceListingRepository {
    base: BaseRepository,
}

impl ServiceListingRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn parse_id(id: &str) -> RepoResult<RecordId> {
        let pure_id = strip_table_prefix(SERVICE_TABLE, id);
        format!("{}:{}", SERVICE_TABLE, pure_id)
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid listing ID: {}", id)))
    }

    /// All active listings (public directory)
    pub async fn find_all_active(&self) -> RepoResult<Vec<ServiceListingRow>> {
        let listings: Vec<ServiceListingRow> = self
            .base
            .db()
            .query("SELECT * FROM service WHERE is_active = true ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(listings)
    }

    /// Listings owned by one user
    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Vec<ServiceListingRow>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM service WHERE user = $user ORDER BY created_at DESC")
            .bind(("user", user.clone()))
            .await?;
        let listings: Vec<ServiceListingRow> = result.take(0)?;
        Ok(listings)
    }

    /// Find listing by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<ServiceListingRow>> {
        let thing = Self::parse_id(id)?;
        let listing: Option<ServiceListingRow> = self.base.db().select(thing).await?;
        Ok(listing)
    }

    /// Create a listing owned by `user`
    pub async fn create(
        &self,
        user: &RecordId,
        data: ServiceListingCreate,
    ) -> RepoResult<ServiceListingRow> {
        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE service SET
                    user = $user,
                    title = $title,
                    description = $description,
                    category = $category,
                    price = $price,
                    contact_email = $contact_email,
                    is_active = true,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("user", user.clone()))
            .bind(("title", data.title))
            .bind(("description", data.description))
            .bind(("category", data.category))
            .bind(("price", data.price))
            .bind(("contact_email", data.contact_email))
            .bind(("created_at", now_millis()))
            .await?;

        let created: Option<ServiceListingRow> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create listing".to_string()))
    }

    /// Update a listing, enforcing ownership
    pub async fn update_owned(
        &self,
        id: &str,
        user: &RecordId,
        data: ServiceListingUpdate,
    ) -> RepoResult<ServiceListingRow> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Listing {} not found", id)))?;
        if &existing.user != user {
            // 非属主按不存在处理，避免泄露他人资源
            return Err(RepoError::NotFound(format!("Listing {} not found", id)));
        }

        let thing = Self::parse_id(id)?;
        let updated: Option<ServiceListingRow> =
            self.base.db().update(thing).merge(data).await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Listing {} not found", id)))
    }

    /// Deactivate a listing, enforcing ownership
    pub async fn deactivate_owned(&self, id: &str, user: &RecordId) -> RepoResult<()> {
        self.update_owned(
            id,
            user,
            ServiceListingUpdate {
                title: None,
                description: None,
                category: None,
                price: None,
                contact_email: None,
                is_active: Some(false),
            },
        )
        .await?;
        Ok(())
    }
}
