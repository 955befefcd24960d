use crate::domain::inventory::{Decrement, StockKey};
use crate::domain::ports::LedgerTransaction;
use crate::error::{OrderError, Result};
use tracing::debug;

/// Stock reservation over `(branch, product)` balances.
///
/// Reservations go through the store's conditional decrement, so two
/// concurrent callers can never both pass a check on the same units.
pub struct InventoryGuard;

impl InventoryGuard {
    /// Takes `quantity` units and returns the remaining balance.
    pub async fn reserve(
        tx: &mut dyn LedgerTransaction,
        key: StockKey,
        quantity: u32,
    ) -> Result<u32> {
        match tx.take_stock(key, quantity).await? {
            Decrement::Applied { remaining } => {
                debug!(%key, quantity, remaining, "stock reserved");
                Ok(remaining)
            }
            Decrement::Insufficient { available } => Err(OrderError::InsufficientStock {
                branch: key.branch,
                product: key.product,
                requested: quantity,
                available,
            }),
            Decrement::Missing => Err(OrderError::MissingStock {
                branch: key.branch,
                product: key.product,
            }),
        }
    }

    /// Puts `quantity` units back, creating the balance row if needed.
    pub async fn release(
        tx: &mut dyn LedgerTransaction,
        key: StockKey,
        quantity: u32,
    ) -> Result<u32> {
        let balance = tx.add_stock(key, quantity).await?;
        debug!(%key, quantity, balance, "stock released");
        Ok(balance)
    }
}
