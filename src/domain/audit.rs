use super::{AuditId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    OrderCreated,
    PaymentProcessed,
    StatusAdvanced,
    StockMoved,
    PointsRedeemed,
    UserRegistered,
    BranchOpened,
    BranchUpdated,
    ProductAdded,
    ProductUpdated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::OrderCreated => "ORDER_CREATED",
            AuditAction::PaymentProcessed => "PAYMENT_PROCESSED",
            AuditAction::StatusAdvanced => "STATUS_ADVANCED",
            AuditAction::StockMoved => "STOCK_MOVED",
            AuditAction::PointsRedeemed => "POINTS_REDEEMED",
            AuditAction::UserRegistered => "USER_REGISTERED",
            AuditAction::BranchOpened => "BRANCH_OPENED",
            AuditAction::BranchUpdated => "BRANCH_UPDATED",
            AuditAction::ProductAdded => "PRODUCT_ADDED",
            AuditAction::ProductUpdated => "PRODUCT_UPDATED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum EntityType {
    Order,
    Inventory,
    User,
    Branch,
    Product,
}

/// One immutable line of the audit trail.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct AuditEntry {
    pub id: AuditId,
    /// `None` for system-initiated actions.
    pub actor: Option<UserId>,
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}
