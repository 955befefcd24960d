use crate::domain::UserId;
use crate::domain::inventory::Decrement;
use crate::domain::ports::LedgerTransaction;
use crate::error::{OrderError, Result};

/// Loyalty point balances. Runs inside the caller's transaction.
pub struct LoyaltyLedger;

impl LoyaltyLedger {
    pub async fn credit(
        tx: &mut dyn LedgerTransaction,
        customer: UserId,
        points: u64,
    ) -> Result<u64> {
        tx.add_points(customer, points)
            .await?
            .ok_or_else(|| OrderError::not_found("customer", customer))
    }

    /// Fails with a conflict rather than letting the balance go negative.
    pub async fn debit(
        tx: &mut dyn LedgerTransaction,
        customer: UserId,
        points: u64,
    ) -> Result<u64> {
        match tx.take_points(customer, points).await? {
            Decrement::Applied { remaining } => Ok(remaining),
            Decrement::Insufficient { available } => Err(OrderError::InsufficientPoints {
                customer,
                requested: points,
                available,
            }),
            Decrement::Missing => Err(OrderError::not_found("customer", customer)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{Role, User};
    use crate::domain::ports::LedgerStore;
    use crate::error::ErrorKind;
    use crate::infrastructure::in_memory::InMemoryLedger;
    use chrono::Utc;

    async fn ledger_with_customer(points: u64) -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin().await.unwrap();
        tx.put_user(User {
            id: 1,
            name: "Bia".to_string(),
            role: Role::Customer,
            loyalty_points: points,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();
        ledger
    }

    #[tokio::test]
    async fn test_credit_then_debit() {
        let ledger = ledger_with_customer(0).await;
        let mut tx = ledger.begin().await.unwrap();
        assert_eq!(LoyaltyLedger::credit(tx.as_mut(), 1, 30).await.unwrap(), 30);
        assert_eq!(LoyaltyLedger::debit(tx.as_mut(), 1, 12).await.unwrap(), 18);
    }

    #[tokio::test]
    async fn test_debit_over_balance_conflicts() {
        let ledger = ledger_with_customer(5).await;
        let mut tx = ledger.begin().await.unwrap();
        let err = LoyaltyLedger::debit(tx.as_mut(), 1, 6).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(tx.user(1).await.unwrap().unwrap().loyalty_points, 5);
    }

    #[tokio::test]
    async fn test_unknown_customer() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin().await.unwrap();
        let err = LoyaltyLedger::credit(tx.as_mut(), 42, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = LoyaltyLedger::debit(tx.as_mut(), 42, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
