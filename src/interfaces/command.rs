use crate::application::catalog::Catalog;
use crate::application::engine::{EngineConfig, NewOrder, OrderEngine};
use crate::domain::catalog::{Branch, Product, Role, User};
use crate::domain::inventory::{MovementKind, StockBalance, StockMovement};
use crate::domain::order::{Channel, LineRequest, Order, OrderStatus};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::{BranchId, OrderId, ProductId, UserId};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Deserialize;

/// One request from a command script, already authenticated upstream.
///
/// The `actor` on catalog commands is optional; `None` marks a system action.
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    RegisterUser {
        name: String,
        role: Role,
        #[serde(default)]
        actor: Option<UserId>,
    },
    OpenBranch {
        name: String,
        city: String,
        #[serde(default)]
        actor: Option<UserId>,
    },
    AddProduct {
        name: String,
        #[serde(default)]
        description: String,
        price: Decimal,
        #[serde(default)]
        actor: Option<UserId>,
    },
    UpdatePrice {
        product: ProductId,
        price: Decimal,
        #[serde(default)]
        actor: Option<UserId>,
    },
    SetBranchActive {
        branch: BranchId,
        active: bool,
        #[serde(default)]
        actor: Option<UserId>,
    },
    SetProductActive {
        product: ProductId,
        active: bool,
        #[serde(default)]
        actor: Option<UserId>,
    },
    MoveStock {
        actor: UserId,
        branch: BranchId,
        product: ProductId,
        kind: MovementKind,
        quantity: u32,
    },
    CreateOrder {
        customer: UserId,
        branch: BranchId,
        channel: Channel,
        lines: Vec<LineRequest>,
    },
    SettlePayment {
        actor: UserId,
        order: OrderId,
        approved: bool,
        #[serde(default)]
        note: String,
    },
    AdvanceStatus {
        actor: UserId,
        order: OrderId,
        status: OrderStatus,
    },
    RedeemPoints {
        actor: UserId,
        customer: UserId,
        points: u64,
    },
}

/// The entity a successful command produced or changed.
#[derive(Debug, PartialEq, Clone)]
pub enum Outcome {
    User(User),
    Branch(Branch),
    Product(Product),
    Stock(StockBalance),
    Order(Order),
    Points { customer: UserId, remaining: u64 },
}

/// Routes commands to the engine or the catalog.
pub struct CommandDispatcher {
    engine: OrderEngine,
    catalog: Catalog,
}

impl CommandDispatcher {
    pub fn new(store: LedgerStoreRef, config: EngineConfig) -> Self {
        Self {
            engine: OrderEngine::new(store.clone(), config),
            catalog: Catalog::new(store),
        }
    }

    pub fn engine(&self) -> &OrderEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn apply(&self, command: Command) -> Result<Outcome> {
        let outcome = match command {
            Command::RegisterUser { name, role, actor } => {
                Outcome::User(self.catalog.register_user(&name, role, actor).await?)
            }
            Command::OpenBranch { name, city, actor } => {
                Outcome::Branch(self.catalog.open_branch(&name, &city, actor).await?)
            }
            Command::AddProduct {
                name,
                description,
                price,
                actor,
            } => Outcome::Product(
                self.catalog
                    .add_product(&name, &description, price, actor)
                    .await?,
            ),
            Command::UpdatePrice {
                product,
                price,
                actor,
            } => Outcome::Product(self.catalog.update_price(product, price, actor).await?),
            Command::SetBranchActive {
                branch,
                active,
                actor,
            } => Outcome::Branch(self.catalog.set_branch_active(branch, active, actor).await?),
            Command::SetProductActive {
                product,
                active,
                actor,
            } => Outcome::Product(
                self.catalog
                    .set_product_active(product, active, actor)
                    .await?,
            ),
            Command::MoveStock {
                actor,
                branch,
                product,
                kind,
                quantity,
            } => {
                let movement = StockMovement {
                    branch,
                    product,
                    kind,
                    quantity,
                };
                Outcome::Stock(self.engine.move_stock(actor, movement).await?)
            }
            Command::CreateOrder {
                customer,
                branch,
                channel,
                lines,
            } => {
                let request = NewOrder {
                    branch,
                    channel,
                    lines,
                };
                Outcome::Order(self.engine.create_order(customer, request).await?)
            }
            Command::SettlePayment {
                actor,
                order,
                approved,
                note,
            } => Outcome::Order(
                self.engine
                    .settle_payment(order, approved, &note, actor)
                    .await?,
            ),
            Command::AdvanceStatus {
                actor,
                order,
                status,
            } => Outcome::Order(self.engine.advance_status(order, status, actor).await?),
            Command::RedeemPoints {
                actor,
                customer,
                points,
            } => Outcome::Points {
                customer,
                remaining: self.engine.redeem_points(actor, customer, points).await?,
            },
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::infrastructure::in_memory::InMemoryLedger;
    use std::sync::Arc;

    fn parse(line: &str) -> Command {
        serde_json::from_str(line).expect("valid command")
    }

    #[test]
    fn test_command_parsing() {
        let command = parse(
            r#"{"command":"create_order","customer":2,"branch":1,"channel":"TOTEM","lines":[{"product":1,"quantity":3}]}"#,
        );
        assert_eq!(
            command,
            Command::CreateOrder {
                customer: 2,
                branch: 1,
                channel: Channel::Totem,
                lines: vec![LineRequest {
                    product: 1,
                    quantity: 3
                }],
            }
        );

        let command = parse(r#"{"command":"settle_payment","actor":1,"order":4,"approved":false}"#);
        assert!(matches!(
            command,
            Command::SettlePayment {
                approved: false,
                ref note,
                ..
            } if note.is_empty()
        ));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let parsed: std::result::Result<Command, _> =
            serde_json::from_str(r#"{"command":"refund","order":1}"#);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_script() {
        let dispatcher =
            CommandDispatcher::new(Arc::new(InMemoryLedger::new()), EngineConfig::default());
        let script = [
            r#"{"command":"register_user","name":"Gil","role":"MANAGER"}"#,
            r#"{"command":"register_user","name":"Ana","role":"CUSTOMER","actor":1}"#,
            r#"{"command":"open_branch","name":"B1","city":"Curitiba","actor":1}"#,
            r#"{"command":"add_product","name":"P1","price":"10.00","actor":1}"#,
            r#"{"command":"move_stock","actor":1,"branch":1,"product":1,"kind":"IN","quantity":5}"#,
            r#"{"command":"create_order","customer":2,"branch":1,"channel":"APP","lines":[{"product":1,"quantity":3}]}"#,
            r#"{"command":"settle_payment","actor":1,"order":1,"approved":true,"note":"ok"}"#,
        ];
        for line in script {
            dispatcher.apply(parse(line)).await.unwrap();
        }

        let outcome = dispatcher
            .apply(parse(
                r#"{"command":"redeem_points","actor":1,"customer":2,"points":10}"#,
            ))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Points {
                customer: 2,
                remaining: 20
            }
        );

        let err = dispatcher
            .apply(parse(
                r#"{"command":"advance_status","actor":1,"order":1,"status":"DELIVERED"}"#,
            ))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}
