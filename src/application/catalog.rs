use super::audit::AuditRecorder;
use crate::domain::audit::{AuditAction, EntityType};
use crate::domain::catalog::{Branch, Product, Role, User};
use crate::domain::money::Price;
use crate::domain::ports::{LedgerStoreRef, Sequence};
use crate::domain::{BranchId, ProductId, UserId};
use crate::error::{OrderError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

/// Thin registration surface for users, branches and products.
///
/// Each call writes one row plus its audit entry in a single transaction.
pub struct Catalog {
    store: LedgerStoreRef,
}

impl Catalog {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }

    pub async fn register_user(
        &self,
        name: &str,
        role: Role,
        actor: Option<UserId>,
    ) -> Result<User> {
        require_name("user", name)?;
        let mut tx = self.store.begin().await?;
        let user = User {
            id: tx.next_id(Sequence::User).await?,
            name: name.to_string(),
            role,
            loyalty_points: 0,
            created_at: Utc::now(),
        };
        tx.put_user(user.clone()).await?;
        AuditRecorder::record(
            tx.as_mut(),
            actor,
            AuditAction::UserRegistered,
            EntityType::User,
            user.id,
            format!("{} registered as {}", user.name, user.role),
        )
        .await?;
        tx.commit().await?;
        info!(user = user.id, role = %user.role, "user registered");
        Ok(user)
    }

    pub async fn open_branch(
        &self,
        name: &str,
        city: &str,
        actor: Option<UserId>,
    ) -> Result<Branch> {
        require_name("branch", name)?;
        let mut tx = self.store.begin().await?;
        let branch = Branch {
            id: tx.next_id(Sequence::Branch).await?,
            name: name.to_string(),
            city: city.to_string(),
            active: true,
        };
        tx.put_branch(branch.clone()).await?;
        AuditRecorder::record(
            tx.as_mut(),
            actor,
            AuditAction::BranchOpened,
            EntityType::Branch,
            branch.id,
            format!("{} in {}", branch.name, branch.city),
        )
        .await?;
        tx.commit().await?;
        info!(branch = branch.id, "branch opened");
        Ok(branch)
    }

    pub async fn add_product(
        &self,
        name: &str,
        description: &str,
        price: Decimal,
        actor: Option<UserId>,
    ) -> Result<Product> {
        require_name("product", name)?;
        let price = Price::new(price)?;
        let mut tx = self.store.begin().await?;
        let product = Product {
            id: tx.next_id(Sequence::Product).await?,
            name: name.to_string(),
            description: description.to_string(),
            price,
            active: true,
        };
        tx.put_product(product.clone()).await?;
        AuditRecorder::record(
            tx.as_mut(),
            actor,
            AuditAction::ProductAdded,
            EntityType::Product,
            product.id,
            format!("{} at {}", product.name, product.price),
        )
        .await?;
        tx.commit().await?;
        info!(product = product.id, "product added");
        Ok(product)
    }

    /// Changes the catalog price. Existing orders keep their snapshot.
    pub async fn update_price(
        &self,
        id: ProductId,
        price: Decimal,
        actor: Option<UserId>,
    ) -> Result<Product> {
        let price = Price::new(price)?;
        let mut tx = self.store.begin().await?;
        let mut product = tx
            .product(id)
            .await?
            .ok_or_else(|| OrderError::not_found("product", id))?;
        let previous = product.price;
        product.price = price;
        tx.put_product(product.clone()).await?;
        AuditRecorder::record(
            tx.as_mut(),
            actor,
            AuditAction::ProductUpdated,
            EntityType::Product,
            id,
            format!("price {previous} -> {price}"),
        )
        .await?;
        tx.commit().await?;
        Ok(product)
    }

    pub async fn set_product_active(
        &self,
        id: ProductId,
        active: bool,
        actor: Option<UserId>,
    ) -> Result<Product> {
        let mut tx = self.store.begin().await?;
        let mut product = tx
            .product(id)
            .await?
            .ok_or_else(|| OrderError::not_found("product", id))?;
        product.active = active;
        tx.put_product(product.clone()).await?;
        AuditRecorder::record(
            tx.as_mut(),
            actor,
            AuditAction::ProductUpdated,
            EntityType::Product,
            id,
            format!("active = {active}"),
        )
        .await?;
        tx.commit().await?;
        Ok(product)
    }

    pub async fn set_branch_active(
        &self,
        id: BranchId,
        active: bool,
        actor: Option<UserId>,
    ) -> Result<Branch> {
        let mut tx = self.store.begin().await?;
        let mut branch = tx
            .branch(id)
            .await?
            .ok_or_else(|| OrderError::not_found("branch", id))?;
        branch.active = active;
        tx.put_branch(branch.clone()).await?;
        AuditRecorder::record(
            tx.as_mut(),
            actor,
            AuditAction::BranchUpdated,
            EntityType::Branch,
            id,
            format!("active = {active}"),
        )
        .await?;
        tx.commit().await?;
        Ok(branch)
    }

    pub async fn users(&self) -> Result<Vec<User>> {
        let mut tx = self.store.begin().await?;
        tx.users().await
    }
}

fn require_name(entity: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        Err(OrderError::InvalidArgument(format!(
            "{entity} name must not be empty"
        )))
    } else {
        Ok(())
    }
}
