use crate::domain::audit::AuditEntry;
use crate::domain::catalog::{Branch, Product, User};
use crate::domain::inventory::{Decrement, StockBalance, StockKey};
use crate::domain::order::Order;
use crate::domain::payment::PaymentRecord;
use crate::domain::ports::{LedgerStore, LedgerTransaction, Sequence};
use crate::domain::{BranchId, OrderId, ProductId, UserId};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
struct LedgerState {
    sequences: HashMap<Sequence, u64>,
    users: HashMap<UserId, User>,
    branches: HashMap<BranchId, Branch>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    stock: HashMap<StockKey, u32>,
    payments: HashMap<OrderId, PaymentRecord>,
    audit: Vec<AuditEntry>,
}

/// A thread-safe in-memory ledger.
///
/// Uses `Arc<Mutex<..>>` so clones share the same rows. A transaction holds
/// the lock until it commits or is dropped, which makes transactions
/// serializable. Ideal for testing or single-process deployments where
/// persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
        let state = self.state.clone().lock_owned().await;
        Ok(Box::new(InMemoryTransaction {
            state,
            undo: Vec::new(),
            committed: false,
        }))
    }
}

/// Previous value of a row touched by the running transaction.
enum Undo {
    Sequence(Sequence, Option<u64>),
    User(UserId, Option<User>),
    Branch(BranchId, Option<Branch>),
    Product(ProductId, Option<Product>),
    Order(OrderId, Option<Order>),
    Stock(StockKey, Option<u32>),
    Payment(OrderId),
    Audit,
}

fn restore<K: Eq + Hash, V>(rows: &mut HashMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(value) => {
            rows.insert(key, value);
        }
        None => {
            rows.remove(&key);
        }
    }
}

/// Writes go straight to the locked state; the undo log puts them back if
/// the transaction is dropped before `commit`.
pub struct InMemoryTransaction {
    state: OwnedMutexGuard<LedgerState>,
    undo: Vec<Undo>,
    committed: bool,
}

impl InMemoryTransaction {
    fn revert(&mut self, undo: Undo) {
        let state = &mut *self.state;
        match undo {
            Undo::Sequence(seq, prev) => restore(&mut state.sequences, seq, prev),
            Undo::User(id, prev) => restore(&mut state.users, id, prev),
            Undo::Branch(id, prev) => restore(&mut state.branches, id, prev),
            Undo::Product(id, prev) => restore(&mut state.products, id, prev),
            Undo::Order(id, prev) => restore(&mut state.orders, id, prev),
            Undo::Stock(key, prev) => restore(&mut state.stock, key, prev),
            Undo::Payment(order) => {
                state.payments.remove(&order);
            }
            Undo::Audit => {
                state.audit.pop();
            }
        }
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        while let Some(undo) = self.undo.pop() {
            self.revert(undo);
        }
    }
}

#[async_trait]
impl LedgerTransaction for InMemoryTransaction {
    async fn next_id(&mut self, sequence: Sequence) -> Result<u64> {
        let prev = self.state.sequences.get(&sequence).copied();
        let next = prev.unwrap_or(0) + 1;
        self.state.sequences.insert(sequence, next);
        self.undo.push(Undo::Sequence(sequence, prev));
        Ok(next)
    }

    async fn user(&mut self, id: UserId) -> Result<Option<User>> {
        Ok(self.state.users.get(&id).cloned())
    }

    async fn put_user(&mut self, user: User) -> Result<()> {
        let id = user.id;
        let prev = self.state.users.insert(id, user);
        self.undo.push(Undo::User(id, prev));
        Ok(())
    }

    async fn users(&mut self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.state.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn branch(&mut self, id: BranchId) -> Result<Option<Branch>> {
        Ok(self.state.branches.get(&id).cloned())
    }

    async fn put_branch(&mut self, branch: Branch) -> Result<()> {
        let id = branch.id;
        let prev = self.state.branches.insert(id, branch);
        self.undo.push(Undo::Branch(id, prev));
        Ok(())
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.products.get(&id).cloned())
    }

    async fn put_product(&mut self, product: Product) -> Result<()> {
        let id = product.id;
        let prev = self.state.products.insert(id, product);
        self.undo.push(Undo::Product(id, prev));
        Ok(())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.orders.get(&id).cloned())
    }

    async fn put_order(&mut self, order: Order) -> Result<()> {
        let id = order.id;
        let prev = self.state.orders.insert(id, order);
        self.undo.push(Undo::Order(id, prev));
        Ok(())
    }

    async fn orders(&mut self) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self.state.orders.values().cloned().collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    async fn stock(&mut self, key: StockKey) -> Result<Option<u32>> {
        Ok(self.state.stock.get(&key).copied())
    }

    async fn stock_levels(&mut self) -> Result<Vec<StockBalance>> {
        let mut levels: Vec<StockBalance> = self
            .state
            .stock
            .iter()
            .map(|(key, quantity)| StockBalance::new(*key, *quantity))
            .collect();
        levels.sort_by_key(|b| (b.branch, b.product));
        Ok(levels)
    }

    async fn take_stock(&mut self, key: StockKey, quantity: u32) -> Result<Decrement<u32>> {
        let outcome = match self.state.stock.get_mut(&key) {
            None => Decrement::Missing,
            Some(available) if *available < quantity => Decrement::Insufficient {
                available: *available,
            },
            Some(available) => {
                let prev = *available;
                *available -= quantity;
                self.undo.push(Undo::Stock(key, Some(prev)));
                Decrement::Applied {
                    remaining: *available,
                }
            }
        };
        Ok(outcome)
    }

    async fn add_stock(&mut self, key: StockKey, quantity: u32) -> Result<u32> {
        let prev = self.state.stock.get(&key).copied();
        let next = prev.unwrap_or(0).checked_add(quantity).ok_or_else(|| {
            OrderError::InvalidArgument(format!("stock for {key} would overflow"))
        })?;
        self.state.stock.insert(key, next);
        self.undo.push(Undo::Stock(key, prev));
        Ok(next)
    }

    async fn add_points(&mut self, user: UserId, points: u64) -> Result<Option<u64>> {
        let Some(row) = self.state.users.get_mut(&user) else {
            return Ok(None);
        };
        let next = row.loyalty_points.checked_add(points).ok_or_else(|| {
            OrderError::InvalidArgument(format!("points for user {user} would overflow"))
        })?;
        let prev = row.clone();
        row.loyalty_points = next;
        self.undo.push(Undo::User(user, Some(prev)));
        Ok(Some(next))
    }

    async fn take_points(&mut self, user: UserId, points: u64) -> Result<Decrement<u64>> {
        let outcome = match self.state.users.get_mut(&user) {
            None => Decrement::Missing,
            Some(row) if row.loyalty_points < points => Decrement::Insufficient {
                available: row.loyalty_points,
            },
            Some(row) => {
                let prev = row.clone();
                row.loyalty_points -= points;
                let remaining = row.loyalty_points;
                self.undo.push(Undo::User(user, Some(prev)));
                Decrement::Applied { remaining }
            }
        };
        Ok(outcome)
    }

    async fn payment(&mut self, order: OrderId) -> Result<Option<PaymentRecord>> {
        Ok(self.state.payments.get(&order).cloned())
    }

    async fn insert_payment(&mut self, record: PaymentRecord) -> Result<()> {
        let order = record.order;
        if self.state.payments.contains_key(&order) {
            return Err(OrderError::AlreadySettled { order });
        }
        self.state.payments.insert(order, record);
        self.undo.push(Undo::Payment(order));
        Ok(())
    }

    async fn append_audit(&mut self, entry: AuditEntry) -> Result<()> {
        self.state.audit.push(entry);
        self.undo.push(Undo::Audit);
        Ok(())
    }

    async fn audit_entries(&mut self) -> Result<Vec<AuditEntry>> {
        Ok(self.state.audit.clone())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut tx = self;
        tx.committed = true;
        tx.undo.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Role;
    use crate::domain::payment::PaymentOutcome;
    use chrono::Utc;

    fn user(id: UserId, points: u64) -> User {
        User {
            id,
            name: format!("user-{id}"),
            role: Role::Customer,
            loyalty_points: points,
            created_at: Utc::now(),
        }
    }

    fn payment(order: OrderId) -> PaymentRecord {
        PaymentRecord {
            order,
            outcome: PaymentOutcome::Approved,
            request: "{}".to_string(),
            response: "{}".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let ledger = InMemoryLedger::new();
        let key = StockKey::new(1, 1);

        let mut tx = ledger.begin().await.unwrap();
        tx.put_user(user(1, 0)).await.unwrap();
        tx.add_stock(key, 5).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = ledger.begin().await.unwrap();
        assert!(tx.user(1).await.unwrap().is_some());
        assert_eq!(tx.stock(key).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_drop_rolls_back_every_write() {
        let ledger = InMemoryLedger::new();
        let key = StockKey::new(1, 1);

        let mut tx = ledger.begin().await.unwrap();
        tx.put_user(user(1, 10)).await.unwrap();
        tx.add_stock(key, 5).await.unwrap();
        tx.commit().await.unwrap();

        {
            let mut tx = ledger.begin().await.unwrap();
            assert_eq!(tx.next_id(Sequence::Order).await.unwrap(), 1);
            tx.take_stock(key, 3).await.unwrap();
            tx.add_stock(StockKey::new(2, 2), 1).await.unwrap();
            tx.add_points(1, 7).await.unwrap();
            tx.insert_payment(payment(1)).await.unwrap();
            // dropped without commit
        }

        let mut tx = ledger.begin().await.unwrap();
        assert_eq!(tx.stock(key).await.unwrap(), Some(5));
        assert_eq!(tx.stock(StockKey::new(2, 2)).await.unwrap(), None);
        assert_eq!(tx.user(1).await.unwrap().unwrap().loyalty_points, 10);
        assert!(tx.payment(1).await.unwrap().is_none());
        assert_eq!(tx.next_id(Sequence::Order).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_take_stock_is_conditional() {
        let ledger = InMemoryLedger::new();
        let key = StockKey::new(1, 1);
        let mut tx = ledger.begin().await.unwrap();

        assert_eq!(tx.take_stock(key, 1).await.unwrap(), Decrement::Missing);
        tx.add_stock(key, 4).await.unwrap();
        assert_eq!(
            tx.take_stock(key, 5).await.unwrap(),
            Decrement::Insufficient { available: 4 }
        );
        assert_eq!(
            tx.take_stock(key, 4).await.unwrap(),
            Decrement::Applied { remaining: 0 }
        );
    }

    #[tokio::test]
    async fn test_take_points_never_goes_negative() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin().await.unwrap();
        tx.put_user(user(1, 3)).await.unwrap();

        assert_eq!(
            tx.take_points(1, 4).await.unwrap(),
            Decrement::Insufficient { available: 3 }
        );
        assert_eq!(
            tx.take_points(1, 3).await.unwrap(),
            Decrement::Applied { remaining: 0 }
        );
        assert_eq!(tx.take_points(9, 1).await.unwrap(), Decrement::Missing);
        assert_eq!(tx.add_points(9, 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_payment_is_unique_per_order() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin().await.unwrap();
        tx.insert_payment(payment(3)).await.unwrap();
        let err = tx.insert_payment(payment(3)).await.unwrap_err();
        assert!(matches!(err, OrderError::AlreadySettled { order: 3 }));
    }
}
