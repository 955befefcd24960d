use crate::domain::order::OrderStatus;
use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrderError>;

/// The three business failure classes reported to callers, plus `Internal`
/// for anything the store or the process boundary raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Conflict,
    Internal,
}

#[derive(Error, Debug, Diagnostic)]
pub enum OrderError {
    #[error("{entity} {id} not found")]
    #[diagnostic(code(orderflow::not_found))]
    NotFound { entity: &'static str, id: String },

    #[error("invalid argument: {0}")]
    #[diagnostic(code(orderflow::invalid_argument))]
    InvalidArgument(String),

    #[error(
        "insufficient stock for product {product} at branch {branch}: requested {requested}, available {available}"
    )]
    #[diagnostic(code(orderflow::insufficient_stock))]
    InsufficientStock {
        branch: u64,
        product: u64,
        requested: u32,
        available: u32,
    },

    #[error("product {product} has no stock at branch {branch}")]
    #[diagnostic(code(orderflow::missing_stock))]
    MissingStock { branch: u64, product: u64 },

    #[error("invalid transition from {from} to {to}")]
    #[diagnostic(code(orderflow::invalid_transition))]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order {order} is not awaiting payment (status {status})")]
    #[diagnostic(code(orderflow::not_awaiting_payment))]
    NotAwaitingPayment { order: u64, status: OrderStatus },

    #[error("order {order} already has a payment record")]
    #[diagnostic(code(orderflow::already_settled))]
    AlreadySettled { order: u64 },

    #[error("customer {customer} has {available} points, {requested} requested")]
    #[diagnostic(code(orderflow::insufficient_points))]
    InsufficientPoints {
        customer: u64,
        requested: u64,
        available: u64,
    },

    #[error("Storage error: {0}")]
    #[diagnostic(code(orderflow::storage))]
    Storage(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
}

impl OrderError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::InsufficientStock { .. }
            | Self::MissingStock { .. }
            | Self::InvalidTransition { .. }
            | Self::NotAwaitingPayment { .. }
            | Self::AlreadySettled { .. }
            | Self::InsufficientPoints { .. } => ErrorKind::Conflict,
            _ => ErrorKind::Internal,
        }
    }
}
