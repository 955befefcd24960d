//! Domain types for order fulfillment and the storage port they travel
//! through. Nothing here performs I/O.

pub mod audit;
pub mod catalog;
pub mod inventory;
pub mod money;
pub mod order;
pub mod payment;
pub mod ports;
pub mod status;

pub type UserId = u64;
pub type BranchId = u64;
pub type ProductId = u64;
pub type OrderId = u64;
pub type AuditId = u64;
