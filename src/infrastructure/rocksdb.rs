use crate::domain::audit::AuditEntry;
use crate::domain::catalog::{Branch, Product, User};
use crate::domain::inventory::{Decrement, StockBalance, StockKey};
use crate::domain::order::Order;
use crate::domain::payment::PaymentRecord;
use crate::domain::ports::{LedgerStore, LedgerTransaction, Sequence};
use crate::domain::{BranchId, OrderId, ProductId, UserId};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Column Family for id counters.
pub const CF_SEQUENCES: &str = "sequences";
pub const CF_USERS: &str = "users";
pub const CF_BRANCHES: &str = "branches";
pub const CF_PRODUCTS: &str = "products";
/// Orders, stored with their lines.
pub const CF_ORDERS: &str = "orders";
/// Inventory balances keyed by branch id followed by product id.
pub const CF_STOCK: &str = "stock";
pub const CF_PAYMENTS: &str = "payments";
pub const CF_AUDIT: &str = "audit";

const COLUMN_FAMILIES: [&str; 8] = [
    CF_SEQUENCES,
    CF_USERS,
    CF_BRANCHES,
    CF_PRODUCTS,
    CF_ORDERS,
    CF_STOCK,
    CF_PAYMENTS,
    CF_AUDIT,
];

/// A persistent ledger backed by RocksDB.
///
/// Each entity lives in its own Column Family as JSON. Transactions take the
/// writer lock, stage their writes, and apply them with a single
/// `WriteBatch` on commit, so a dropped transaction leaves no trace.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

impl RocksDbLedger {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that every ledger column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }
}

#[async_trait]
impl LedgerStore for RocksDbLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
        let writer = self.writer.clone().lock_owned().await;
        Ok(Box::new(RocksDbTransaction {
            db: self.db.clone(),
            _writer: writer,
            pending: BTreeMap::new(),
        }))
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| OrderError::Storage(format!("Serialization error: {}", e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| OrderError::Storage(format!("Deserialization error: {}", e)))
}

fn stock_key(key: StockKey) -> Vec<u8> {
    let mut bytes = key.branch.to_be_bytes().to_vec();
    bytes.extend_from_slice(&key.product.to_be_bytes());
    bytes
}

pub struct RocksDbTransaction {
    db: Arc<DB>,
    _writer: OwnedMutexGuard<()>,
    pending: BTreeMap<(&'static str, Vec<u8>), Vec<u8>>,
}

impl RocksDbTransaction {
    fn cf(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| OrderError::Storage(format!("{} column family not found", name)))
    }

    /// Reads a row, preferring this transaction's own staged writes.
    fn read<T: DeserializeOwned>(&self, cf: &'static str, key: &[u8]) -> Result<Option<T>> {
        if let Some(staged) = self.pending.get(&(cf, key.to_vec())) {
            return decode(staged).map(Some);
        }
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&mut self, cf: &'static str, key: Vec<u8>, value: &T) -> Result<()> {
        let bytes = encode(value)?;
        self.pending.insert((cf, key), bytes);
        Ok(())
    }

    /// All rows of a column family in key order, staged writes included.
    fn scan<T: DeserializeOwned>(&self, cf: &'static str) -> Result<Vec<T>> {
        let mut rows = BTreeMap::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (key, value) = item?;
            rows.insert(key.to_vec(), value.to_vec());
        }
        for ((name, key), value) in &self.pending {
            if *name == cf {
                rows.insert(key.clone(), value.clone());
            }
        }
        rows.values().map(|bytes| decode(bytes)).collect()
    }
}

#[async_trait]
impl LedgerTransaction for RocksDbTransaction {
    async fn next_id(&mut self, sequence: Sequence) -> Result<u64> {
        let key = sequence.name().as_bytes();
        let next = self.read::<u64>(CF_SEQUENCES, key)?.unwrap_or(0) + 1;
        self.write(CF_SEQUENCES, key.to_vec(), &next)?;
        Ok(next)
    }

    async fn user(&mut self, id: UserId) -> Result<Option<User>> {
        self.read(CF_USERS, &id.to_be_bytes())
    }

    async fn put_user(&mut self, user: User) -> Result<()> {
        self.write(CF_USERS, user.id.to_be_bytes().to_vec(), &user)
    }

    async fn users(&mut self) -> Result<Vec<User>> {
        self.scan(CF_USERS)
    }

    async fn branch(&mut self, id: BranchId) -> Result<Option<Branch>> {
        self.read(CF_BRANCHES, &id.to_be_bytes())
    }

    async fn put_branch(&mut self, branch: Branch) -> Result<()> {
        self.write(CF_BRANCHES, branch.id.to_be_bytes().to_vec(), &branch)
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>> {
        self.read(CF_PRODUCTS, &id.to_be_bytes())
    }

    async fn put_product(&mut self, product: Product) -> Result<()> {
        self.write(CF_PRODUCTS, product.id.to_be_bytes().to_vec(), &product)
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>> {
        self.read(CF_ORDERS, &id.to_be_bytes())
    }

    async fn put_order(&mut self, order: Order) -> Result<()> {
        self.write(CF_ORDERS, order.id.to_be_bytes().to_vec(), &order)
    }

    async fn orders(&mut self) -> Result<Vec<Order>> {
        self.scan(CF_ORDERS)
    }

    async fn stock(&mut self, key: StockKey) -> Result<Option<u32>> {
        let balance: Option<StockBalance> = self.read(CF_STOCK, &stock_key(key))?;
        Ok(balance.map(|b| b.quantity))
    }

    async fn stock_levels(&mut self) -> Result<Vec<StockBalance>> {
        self.scan(CF_STOCK)
    }

    async fn take_stock(&mut self, key: StockKey, quantity: u32) -> Result<Decrement<u32>> {
        let row = stock_key(key);
        let Some(mut balance) = self.read::<StockBalance>(CF_STOCK, &row)? else {
            return Ok(Decrement::Missing);
        };
        if balance.quantity < quantity {
            return Ok(Decrement::Insufficient {
                available: balance.quantity,
            });
        }
        balance.quantity -= quantity;
        self.write(CF_STOCK, row, &balance)?;
        Ok(Decrement::Applied {
            remaining: balance.quantity,
        })
    }

    async fn add_stock(&mut self, key: StockKey, quantity: u32) -> Result<u32> {
        let row = stock_key(key);
        let current = self
            .read::<StockBalance>(CF_STOCK, &row)?
            .map_or(0, |b| b.quantity);
        let next = current.checked_add(quantity).ok_or_else(|| {
            OrderError::InvalidArgument(format!("stock for {key} would overflow"))
        })?;
        self.write(CF_STOCK, row, &StockBalance::new(key, next))?;
        Ok(next)
    }

    async fn add_points(&mut self, user: UserId, points: u64) -> Result<Option<u64>> {
        let Some(mut row) = self.read::<User>(CF_USERS, &user.to_be_bytes())? else {
            return Ok(None);
        };
        row.loyalty_points = row.loyalty_points.checked_add(points).ok_or_else(|| {
            OrderError::InvalidArgument(format!("points for user {user} would overflow"))
        })?;
        let balance = row.loyalty_points;
        self.write(CF_USERS, user.to_be_bytes().to_vec(), &row)?;
        Ok(Some(balance))
    }

    async fn take_points(&mut self, user: UserId, points: u64) -> Result<Decrement<u64>> {
        let Some(mut row) = self.read::<User>(CF_USERS, &user.to_be_bytes())? else {
            return Ok(Decrement::Missing);
        };
        if row.loyalty_points < points {
            return Ok(Decrement::Insufficient {
                available: row.loyalty_points,
            });
        }
        row.loyalty_points -= points;
        let remaining = row.loyalty_points;
        self.write(CF_USERS, user.to_be_bytes().to_vec(), &row)?;
        Ok(Decrement::Applied { remaining })
    }

    async fn payment(&mut self, order: OrderId) -> Result<Option<PaymentRecord>> {
        self.read(CF_PAYMENTS, &order.to_be_bytes())
    }

    async fn insert_payment(&mut self, record: PaymentRecord) -> Result<()> {
        let key = record.order.to_be_bytes();
        if self.read::<PaymentRecord>(CF_PAYMENTS, &key)?.is_some() {
            return Err(OrderError::AlreadySettled {
                order: record.order,
            });
        }
        self.write(CF_PAYMENTS, key.to_vec(), &record)
    }

    async fn append_audit(&mut self, entry: AuditEntry) -> Result<()> {
        self.write(CF_AUDIT, entry.id.to_be_bytes().to_vec(), &entry)
    }

    async fn audit_entries(&mut self) -> Result<Vec<AuditEntry>> {
        self.scan(CF_AUDIT)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut batch = WriteBatch::default();
        for ((cf, key), value) in &self.pending {
            batch.put_cf(self.cf(*cf)?, key, value);
        }
        self.db.write(batch)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Role;
    use chrono::Utc;
    use tempfile::tempdir;

    fn customer(id: UserId) -> User {
        User {
            id,
            name: "Ana".to_string(),
            role: Role::Customer,
            loyalty_points: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let ledger = RocksDbLedger::open(dir.path()).expect("Failed to open RocksDB");

        for name in COLUMN_FAMILIES {
            assert!(ledger.db.cf_handle(name).is_some());
        }
    }

    #[tokio::test]
    async fn test_rocksdb_commit_and_reopen() {
        let dir = tempdir().unwrap();
        let key = StockKey::new(1, 2);
        {
            let ledger = RocksDbLedger::open(dir.path()).unwrap();
            let mut tx = ledger.begin().await.unwrap();
            tx.put_user(customer(1)).await.unwrap();
            tx.add_stock(key, 8).await.unwrap();
            assert_eq!(tx.next_id(Sequence::Order).await.unwrap(), 1);
            tx.commit().await.unwrap();
        }

        let ledger = RocksDbLedger::open(dir.path()).unwrap();
        let mut tx = ledger.begin().await.unwrap();
        assert_eq!(tx.user(1).await.unwrap().unwrap().name, "Ana");
        assert_eq!(tx.stock(key).await.unwrap(), Some(8));
        assert_eq!(tx.next_id(Sequence::Order).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rocksdb_uncommitted_writes_are_discarded() {
        let dir = tempdir().unwrap();
        let ledger = RocksDbLedger::open(dir.path()).unwrap();
        let key = StockKey::new(1, 1);

        {
            let mut tx = ledger.begin().await.unwrap();
            tx.add_stock(key, 3).await.unwrap();
            // staged writes are visible inside the transaction
            assert_eq!(tx.stock(key).await.unwrap(), Some(3));
            assert_eq!(tx.stock_levels().await.unwrap().len(), 1);
        }

        let mut tx = ledger.begin().await.unwrap();
        assert_eq!(tx.stock(key).await.unwrap(), None);
        assert_eq!(tx.take_stock(key, 1).await.unwrap(), Decrement::Missing);
    }

    #[tokio::test]
    async fn test_rocksdb_conditional_decrement() {
        let dir = tempdir().unwrap();
        let ledger = RocksDbLedger::open(dir.path()).unwrap();
        let key = StockKey::new(1, 1);

        let mut tx = ledger.begin().await.unwrap();
        tx.add_stock(key, 2).await.unwrap();
        assert_eq!(
            tx.take_stock(key, 3).await.unwrap(),
            Decrement::Insufficient { available: 2 }
        );
        assert_eq!(
            tx.take_stock(key, 2).await.unwrap(),
            Decrement::Applied { remaining: 0 }
        );
    }
}
