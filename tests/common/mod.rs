#![allow(dead_code)]

use orderflow::application::catalog::Catalog;
use orderflow::application::engine::{EngineConfig, NewOrder, OrderEngine};
use orderflow::domain::catalog::Role;
use orderflow::domain::inventory::{MovementKind, StockMovement};
use orderflow::domain::order::{Channel, LineRequest};
use orderflow::domain::ports::LedgerStoreRef;
use orderflow::domain::{BranchId, ProductId, UserId};
use orderflow::infrastructure::in_memory::InMemoryLedger;
use rust_decimal_macros::dec;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Branch "B1" selling product "P1" at 10.00.
pub struct Shop {
    pub engine: OrderEngine,
    pub catalog: Catalog,
    pub manager: UserId,
    pub customer: UserId,
    pub branch: BranchId,
    pub product: ProductId,
}

pub async fn shop(stock: u32) -> Shop {
    shop_with(stock, EngineConfig::default()).await
}

pub async fn shop_with(stock: u32, config: EngineConfig) -> Shop {
    let store: LedgerStoreRef = Arc::new(InMemoryLedger::new());
    let catalog = Catalog::new(store.clone());
    let engine = OrderEngine::new(store, config);

    let manager = catalog
        .register_user("Gil", Role::Manager, None)
        .await
        .unwrap()
        .id;
    let customer = catalog
        .register_user("Ana", Role::Customer, Some(manager))
        .await
        .unwrap()
        .id;
    let branch = catalog
        .open_branch("B1", "Curitiba", Some(manager))
        .await
        .unwrap()
        .id;
    let product = catalog
        .add_product("P1", "burger", dec!(10.00), Some(manager))
        .await
        .unwrap()
        .id;
    engine
        .move_stock(
            manager,
            StockMovement {
                branch,
                product,
                kind: MovementKind::In,
                quantity: stock,
            },
        )
        .await
        .unwrap();

    Shop {
        engine,
        catalog,
        manager,
        customer,
        branch,
        product,
    }
}

impl Shop {
    pub fn order_of(&self, quantity: u32) -> NewOrder {
        NewOrder {
            branch: self.branch,
            channel: Channel::App,
            lines: vec![LineRequest {
                product: self.product,
                quantity,
            }],
        }
    }

    pub async fn stock(&self) -> u32 {
        self.engine
            .stock_balance(self.branch, self.product)
            .await
            .unwrap()
            .quantity
    }

    pub async fn audit_len(&self) -> usize {
        self.engine.audit_trail().await.unwrap().len()
    }
}

/// The seed shared by the CLI tests: manager 1, customer 2, branch 1,
/// product 1 at 10.00 with 5 units.
pub const SEED: &[&str] = &[
    r#"{"command":"register_user","name":"Gil","role":"MANAGER"}"#,
    r#"{"command":"register_user","name":"Ana","role":"CUSTOMER","actor":1}"#,
    r#"{"command":"open_branch","name":"B1","city":"Curitiba","actor":1}"#,
    r#"{"command":"add_product","name":"P1","description":"burger","price":"10.00","actor":1}"#,
    r#"{"command":"move_stock","actor":1,"branch":1,"product":1,"kind":"IN","quantity":5}"#,
];

pub fn write_script(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in SEED.iter().chain(lines) {
        writeln!(file, "{}", line).unwrap();
    }
    file
}
