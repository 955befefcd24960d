use super::money::{Money, Price};
use super::{BranchId, OrderId, ProductId, UserId};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    App,
    Totem,
    Counter,
    Pickup,
    Web,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Channel::App => "APP",
            Channel::Totem => "TOTEM",
            Channel::Counter => "COUNTER",
            Channel::Pickup => "PICKUP",
            Channel::Web => "WEB",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    AwaitingPayment,
    Paid,
    Preparing,
    Ready,
    Delivered,
    Canceled,
    PaymentDeclined,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::AwaitingPayment,
        OrderStatus::Paid,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
        OrderStatus::PaymentDeclined,
    ];
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            OrderStatus::AwaitingPayment => "AWAITING_PAYMENT",
            OrderStatus::Paid => "PAID",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::PaymentDeclined => "PAYMENT_DECLINED",
        };
        f.write_str(tag)
    }
}

/// A line as requested by the customer, before pricing.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct LineRequest {
    pub product: ProductId,
    pub quantity: u32,
}

/// A priced order line. `unit_price` is the catalog price at creation time
/// and is never re-read from the product afterwards.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OrderLine {
    pub product: ProductId,
    pub quantity: u32,
    pub unit_price: Price,
}

impl OrderLine {
    pub fn subtotal(&self) -> Result<Money> {
        self.unit_price.times(self.quantity)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: OrderId,
    pub customer: UserId,
    pub branch: BranchId,
    pub channel: Channel,
    pub status: OrderStatus,
    pub total: Money,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

/// Optional criteria for order listings; `None` matches everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrderFilter {
    pub channel: Option<Channel>,
    pub status: Option<OrderStatus>,
    pub customer: Option<UserId>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.channel.is_none_or(|c| c == order.channel)
            && self.status.is_none_or(|s| s == order.status)
            && self.customer.is_none_or(|c| c == order.customer)
    }
}
