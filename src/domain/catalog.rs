use super::money::Price;
use super::{BranchId, ProductId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Kitchen,
    Attendant,
    Customer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Kitchen => "KITCHEN",
            Role::Attendant => "ATTENDANT",
            Role::Customer => "CUSTOMER",
        };
        f.write_str(tag)
    }
}

/// A registered user. Any user an order is placed for accrues loyalty points
/// when it is paid, whatever the role.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub loyalty_points: u64,
    pub created_at: DateTime<Utc>,
}

/// A physical store location holding its own inventory.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub city: String,
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub active: bool,
}
