use super::{BranchId, ProductId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one inventory balance row.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy)]
pub struct StockKey {
    pub branch: BranchId,
    pub product: ProductId,
}

impl StockKey {
    pub fn new(branch: BranchId, product: ProductId) -> Self {
        Self { branch, product }
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.branch, self.product)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct StockBalance {
    pub branch: BranchId,
    pub product: ProductId,
    pub quantity: u32,
}

impl StockBalance {
    pub fn new(key: StockKey, quantity: u32) -> Self {
        Self {
            branch: key.branch,
            product: key.product,
            quantity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    In,
    Out,
}

/// A manual stock adjustment at a branch.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct StockMovement {
    pub branch: BranchId,
    pub product: ProductId,
    pub kind: MovementKind,
    pub quantity: u32,
}

/// Outcome of a conditional decrement on a counter row.
///
/// Stores evaluate the guard and apply the decrement in one step, so callers
/// never act on a balance they read earlier.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Decrement<T> {
    Applied { remaining: T },
    Insufficient { available: T },
    Missing,
}
