//! Discounts service.

use async_trait::async_trait;
use cowork::discounts::Discount;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::discounts::{errors::DiscountsServiceError, repository::PgDiscountsRepository},
};

#[derive(Debug, Clone)]
pub struct PgDiscountsService {
    db: Db,
    repository: PgDiscountsRepository,
}

impl PgDiscountsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgDiscountsRepository::new(),
        }
    }
}

#[async_trait]
impl DiscountsService for PgDiscountsService {
    #[tracing::instrument(
        name = "discounts.service.create_discount",
        skip(self, discount),
        fields(discount_uuid = %discount.uuid, discount_name = %discount.name),
        err
    )]
    async fn create_discount(&self, discount: Discount) -> Result<Discount, DiscountsServiceError> {
        discount.validate()?;

        let mut tx = self.db.begin().await?;

        let created = self.repository.create_discount(&mut tx, &discount).await?;

        tx.commit().await?;

        info!(discount_uuid = %created.uuid, "created discount");

        Ok(created)
    }

    async fn list_active_discounts(&self) -> Result<Vec<Discount>, DiscountsServiceError> {
        let mut tx = self.db.begin().await?;

        let discounts = self.repository.list_active_discounts(&mut tx).await?;

        tx.commit().await?;

        Ok(discounts)
    }
}

#[automock]
#[async_trait]
pub trait DiscountsService: Send + Sync {
    /// Validates and stores a new discount definition.
    async fn create_discount(&self, discount: Discount) -> Result<Discount, DiscountsServiceError>;

    /// Retrieves every active discount, highest priority first.
    async fn list_active_discounts(&self) -> Result<Vec<Discount>, DiscountsServiceError>;
}
