//! Application layer containing the business operations.
//!
//! `OrderEngine` is the primary entry point for order creation, payment
//! settlement, status changes, loyalty redemption and stock movements. Each
//! operation opens one ledger transaction and hands it to the guards
//! (`InventoryGuard`, `LoyaltyLedger`) and the `AuditRecorder`.

pub mod audit;
pub mod catalog;
pub mod engine;
pub mod inventory;
pub mod loyalty;
