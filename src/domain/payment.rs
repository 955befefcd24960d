use super::OrderId;
use super::money::Money;
use super::order::{Channel, Order};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Approved,
    Declined,
}

impl fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentOutcome::Approved => "APPROVED",
            PaymentOutcome::Declined => "DECLINED",
        })
    }
}

/// What the gateway was asked to charge.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentRequest {
    pub order: OrderId,
    pub amount: Money,
    pub channel: Channel,
}

/// What the gateway answered.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentResponse {
    pub outcome: PaymentOutcome,
    pub message: String,
    pub note: String,
}

/// The single settlement of an order. Request and response are kept as the
/// serialized JSON exchanged with the gateway.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentRecord {
    pub order: OrderId,
    pub outcome: PaymentOutcome,
    pub request: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

/// Deterministic stand-in for a card processor: the caller decides the
/// outcome and the gateway only shapes the exchange.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockPaymentGateway;

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self
    }

    pub fn charge(&self, request: &PaymentRequest, approved: bool, note: &str) -> PaymentResponse {
        let (outcome, message) = if approved {
            (PaymentOutcome::Approved, "payment approved")
        } else {
            (PaymentOutcome::Declined, "payment declined")
        };
        PaymentResponse {
            outcome,
            message: message.to_string(),
            note: note.to_string(),
        }
    }

    /// Runs the exchange for `order` and returns the record to persist.
    pub fn settle(&self, order: &Order, approved: bool, note: &str) -> Result<PaymentRecord> {
        let request = PaymentRequest {
            order: order.id,
            amount: order.total,
            channel: order.channel,
        };
        let response = self.charge(&request, approved, note);
        Ok(PaymentRecord {
            order: order.id,
            outcome: response.outcome,
            request: serde_json::to_string(&request)?,
            response: serde_json::to_string(&response)?,
            created_at: Utc::now(),
        })
    }
}
