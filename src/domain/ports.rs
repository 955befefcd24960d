use super::audit::AuditEntry;
use super::catalog::{Branch, Product, User};
use super::inventory::{Decrement, StockBalance, StockKey};
use super::order::Order;
use super::payment::PaymentRecord;
use super::{BranchId, OrderId, ProductId, UserId};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Monotonic id counters kept by the store.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Sequence {
    User,
    Branch,
    Product,
    Order,
    Audit,
}

impl Sequence {
    pub fn name(&self) -> &'static str {
        match self {
            Sequence::User => "user",
            Sequence::Branch => "branch",
            Sequence::Product => "product",
            Sequence::Order => "order",
            Sequence::Audit => "audit",
        }
    }
}

/// Source of ledger transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a transaction. Its writes become visible only on `commit`;
    /// dropping it discards them.
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>>;
}

/// A unit of work against the ledger.
///
/// Implementations must keep every read and write of one transaction
/// isolated from concurrent transactions until commit. The counter operations
/// (`take_stock`, `take_points`) evaluate their guard and apply the change as
/// one step.
#[async_trait]
pub trait LedgerTransaction: Send {
    async fn next_id(&mut self, sequence: Sequence) -> Result<u64>;

    async fn user(&mut self, id: UserId) -> Result<Option<User>>;
    async fn put_user(&mut self, user: User) -> Result<()>;
    async fn users(&mut self) -> Result<Vec<User>>;

    async fn branch(&mut self, id: BranchId) -> Result<Option<Branch>>;
    async fn put_branch(&mut self, branch: Branch) -> Result<()>;

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>>;
    async fn put_product(&mut self, product: Product) -> Result<()>;

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>>;
    async fn put_order(&mut self, order: Order) -> Result<()>;
    async fn orders(&mut self) -> Result<Vec<Order>>;

    async fn stock(&mut self, key: StockKey) -> Result<Option<u32>>;
    async fn stock_levels(&mut self) -> Result<Vec<StockBalance>>;
    /// Decrements the balance only if it covers `quantity`.
    async fn take_stock(&mut self, key: StockKey, quantity: u32) -> Result<Decrement<u32>>;
    /// Increments the balance, creating the row at zero first if needed.
    async fn add_stock(&mut self, key: StockKey, quantity: u32) -> Result<u32>;

    /// Returns the new balance, or `None` if the user does not exist.
    async fn add_points(&mut self, user: UserId, points: u64) -> Result<Option<u64>>;
    async fn take_points(&mut self, user: UserId, points: u64) -> Result<Decrement<u64>>;

    async fn payment(&mut self, order: OrderId) -> Result<Option<PaymentRecord>>;
    /// Fails with `AlreadySettled` if the order already has a record.
    async fn insert_payment(&mut self, record: PaymentRecord) -> Result<()>;

    async fn append_audit(&mut self, entry: AuditEntry) -> Result<()>;
    async fn audit_entries(&mut self) -> Result<Vec<AuditEntry>>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
