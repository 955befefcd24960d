use super::audit::AuditRecorder;
use super::inventory::InventoryGuard;
use super::loyalty::LoyaltyLedger;
use crate::domain::audit::{AuditAction, AuditEntry, EntityType};
use crate::domain::catalog::User;
use crate::domain::inventory::{MovementKind, StockBalance, StockKey, StockMovement};
use crate::domain::money::Money;
use crate::domain::order::{Channel, LineRequest, Order, OrderFilter, OrderLine, OrderStatus};
use crate::domain::payment::{MockPaymentGateway, PaymentOutcome, PaymentRecord};
use crate::domain::ports::{LedgerStoreRef, LedgerTransaction, Sequence};
use crate::domain::status::{self, Trigger};
use crate::domain::{BranchId, OrderId, ProductId, UserId};
use crate::error::{OrderError, Result};
use chrono::Utc;
use tracing::info;

/// What happens to reserved stock when a paid order is canceled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CancellationPolicy {
    /// Return every line quantity to the branch.
    #[default]
    Restock,
    /// Leave stock committed to the canceled order.
    Retain,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EngineConfig {
    pub cancellation: CancellationPolicy,
}

/// Input for `create_order`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub branch: BranchId,
    pub channel: Channel,
    pub lines: Vec<LineRequest>,
}

/// The order lifecycle engine.
///
/// Every public mutation runs as exactly one ledger transaction: guards,
/// row changes and the audit entry either all commit or, on any error, the
/// transaction is dropped and nothing is kept.
pub struct OrderEngine {
    store: LedgerStoreRef,
    gateway: MockPaymentGateway,
    config: EngineConfig,
}

impl OrderEngine {
    /// Creates a new `OrderEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `store` - The ledger holding catalog, inventory, orders and audit rows.
    /// * `config` - Engine policies.
    pub fn new(store: LedgerStoreRef, config: EngineConfig) -> Self {
        Self {
            store,
            gateway: MockPaymentGateway::new(),
            config,
        }
    }

    /// Places an order, reserving stock for every line at the current price.
    pub async fn create_order(&self, customer: UserId, request: NewOrder) -> Result<Order> {
        if request.lines.is_empty() {
            return Err(OrderError::InvalidArgument(
                "order must have at least one line".to_string(),
            ));
        }
        if let Some(line) = request.lines.iter().find(|l| l.quantity == 0) {
            return Err(OrderError::InvalidArgument(format!(
                "quantity for product {} must be positive",
                line.product
            )));
        }

        let mut tx = self.store.begin().await?;

        require_user(tx.as_mut(), customer).await?;
        require_active_branch(tx.as_mut(), request.branch).await?;

        let id = tx.next_id(Sequence::Order).await?;
        let mut total = Money::ZERO;
        let mut lines = Vec::with_capacity(request.lines.len());

        for requested in &request.lines {
            let product = tx
                .product(requested.product)
                .await?
                .filter(|p| p.active)
                .ok_or_else(|| OrderError::not_found("product", requested.product))?;

            InventoryGuard::reserve(
                tx.as_mut(),
                StockKey::new(request.branch, product.id),
                requested.quantity,
            )
            .await?;

            let line = OrderLine {
                product: product.id,
                quantity: requested.quantity,
                unit_price: product.price,
            };
            total = total.checked_add(line.subtotal()?)?;
            lines.push(line);
        }

        let order = Order {
            id,
            customer,
            branch: request.branch,
            channel: request.channel,
            status: OrderStatus::AwaitingPayment,
            total,
            lines,
            created_at: Utc::now(),
        };
        tx.put_order(order.clone()).await?;

        AuditRecorder::record(
            tx.as_mut(),
            Some(customer),
            AuditAction::OrderCreated,
            EntityType::Order,
            order.id,
            format!("order created via channel {}", order.channel),
        )
        .await?;

        tx.commit().await?;
        info!(order = order.id, customer, total = %order.total, "order created");
        Ok(order)
    }

    /// Records the single payment outcome of an order awaiting payment.
    ///
    /// Not idempotent: a second call on the same order fails with a conflict
    /// whatever the first outcome was.
    pub async fn settle_payment(
        &self,
        order_id: OrderId,
        approved: bool,
        note: &str,
        actor: UserId,
    ) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        let mut order = require_order(tx.as_mut(), order_id).await?;

        if order.status != OrderStatus::AwaitingPayment {
            return Err(OrderError::NotAwaitingPayment {
                order: order.id,
                status: order.status,
            });
        }

        let record = self.gateway.settle(&order, approved, note)?;
        let outcome = record.outcome;
        let target = match outcome {
            PaymentOutcome::Approved => OrderStatus::Paid,
            PaymentOutcome::Declined => OrderStatus::PaymentDeclined,
        };
        status::check(order.status, target, Trigger::Settlement)?;
        tx.insert_payment(record).await?;

        if outcome == PaymentOutcome::Approved {
            LoyaltyLedger::credit(tx.as_mut(), order.customer, order.total.loyalty_points()?)
                .await?;
        }
        order.status = target;
        tx.put_order(order.clone()).await?;

        AuditRecorder::record(
            tx.as_mut(),
            Some(actor),
            AuditAction::PaymentProcessed,
            EntityType::Order,
            order.id,
            format!("payment {outcome}"),
        )
        .await?;

        tx.commit().await?;
        info!(order = order.id, %outcome, "payment settled");
        Ok(order)
    }

    /// Moves a paid order along the kitchen pipeline or cancels it.
    pub async fn advance_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
        actor: UserId,
    ) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        let mut order = require_order(tx.as_mut(), order_id).await?;
        let previous = order.status;

        status::check(previous, new_status, Trigger::Advance)?;

        let mut detail = format!("status {previous} -> {new_status}");
        if new_status == OrderStatus::Canceled
            && self.config.cancellation == CancellationPolicy::Restock
        {
            for line in &order.lines {
                InventoryGuard::release(
                    tx.as_mut(),
                    StockKey::new(order.branch, line.product),
                    line.quantity,
                )
                .await?;
            }
            detail.push_str(", stock returned");
        }

        order.status = new_status;
        tx.put_order(order.clone()).await?;

        AuditRecorder::record(
            tx.as_mut(),
            Some(actor),
            AuditAction::StatusAdvanced,
            EntityType::Order,
            order.id,
            detail,
        )
        .await?;

        tx.commit().await?;
        info!(order = order.id, from = %previous, to = %new_status, "status advanced");
        Ok(order)
    }

    /// Spends loyalty points and returns the remaining balance.
    pub async fn redeem_points(&self, actor: UserId, customer: UserId, points: u64) -> Result<u64> {
        if points == 0 {
            return Err(OrderError::InvalidArgument(
                "points to redeem must be positive".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;
        let remaining = LoyaltyLedger::debit(tx.as_mut(), customer, points).await?;

        AuditRecorder::record(
            tx.as_mut(),
            Some(actor),
            AuditAction::PointsRedeemed,
            EntityType::User,
            customer,
            format!("{points} points redeemed, {remaining} remaining"),
        )
        .await?;

        tx.commit().await?;
        info!(customer, points, remaining, "points redeemed");
        Ok(remaining)
    }

    /// Applies a manual stock entry or withdrawal at a branch.
    pub async fn move_stock(&self, actor: UserId, movement: StockMovement) -> Result<StockBalance> {
        if movement.quantity == 0 {
            return Err(OrderError::InvalidArgument(
                "movement quantity must be positive".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;
        require_active_branch(tx.as_mut(), movement.branch).await?;
        require_active_product(tx.as_mut(), movement.product).await?;

        let key = StockKey::new(movement.branch, movement.product);
        let quantity = match movement.kind {
            MovementKind::In => InventoryGuard::release(tx.as_mut(), key, movement.quantity).await?,
            MovementKind::Out => InventoryGuard::reserve(tx.as_mut(), key, movement.quantity).await?,
        };

        AuditRecorder::record(
            tx.as_mut(),
            Some(actor),
            AuditAction::StockMoved,
            EntityType::Inventory,
            key,
            format!("{:?} {} units, balance {}", movement.kind, movement.quantity, quantity),
        )
        .await?;

        tx.commit().await?;
        info!(%key, kind = ?movement.kind, quantity, "stock moved");
        Ok(StockBalance::new(key, quantity))
    }

    pub async fn order(&self, id: OrderId) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        require_order(tx.as_mut(), id).await
    }

    /// Orders matching `filter`, newest first.
    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let mut tx = self.store.begin().await?;
        let mut orders: Vec<Order> = tx
            .orders()
            .await?
            .into_iter()
            .filter(|o| filter.matches(o))
            .collect();
        orders.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(orders)
    }

    pub async fn payment(&self, order: OrderId) -> Result<Option<PaymentRecord>> {
        let mut tx = self.store.begin().await?;
        tx.payment(order).await
    }

    pub async fn stock_balance(&self, branch: BranchId, product: ProductId) -> Result<StockBalance> {
        let key = StockKey::new(branch, product);
        let mut tx = self.store.begin().await?;
        let quantity = tx
            .stock(key)
            .await?
            .ok_or_else(|| OrderError::not_found("stock balance", key))?;
        Ok(StockBalance::new(key, quantity))
    }

    pub async fn stock_levels(&self) -> Result<Vec<StockBalance>> {
        let mut tx = self.store.begin().await?;
        tx.stock_levels().await
    }

    pub async fn loyalty_balance(&self, customer: UserId) -> Result<u64> {
        let mut tx = self.store.begin().await?;
        Ok(require_user(tx.as_mut(), customer).await?.loyalty_points)
    }

    pub async fn audit_trail(&self) -> Result<Vec<AuditEntry>> {
        let mut tx = self.store.begin().await?;
        tx.audit_entries().await
    }
}

async fn require_order(tx: &mut dyn LedgerTransaction, id: OrderId) -> Result<Order> {
    tx.order(id)
        .await?
        .ok_or_else(|| OrderError::not_found("order", id))
}

async fn require_user(tx: &mut dyn LedgerTransaction, id: UserId) -> Result<User> {
    tx.user(id)
        .await?
        .ok_or_else(|| OrderError::not_found("customer", id))
}

async fn require_active_branch(tx: &mut dyn LedgerTransaction, id: BranchId) -> Result<()> {
    match tx.branch(id).await? {
        Some(branch) if branch.active => Ok(()),
        _ => Err(OrderError::not_found("branch", id)),
    }
}

async fn require_active_product(tx: &mut dyn LedgerTransaction, id: ProductId) -> Result<()> {
    match tx.product(id).await? {
        Some(product) if product.active => Ok(()),
        _ => Err(OrderError::not_found("product", id)),
    }
}
