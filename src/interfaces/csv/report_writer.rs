use crate::domain::catalog::{Role, User};
use crate::domain::inventory::StockBalance;
use crate::domain::money::Money;
use crate::domain::order::{Channel, Order, OrderStatus};
use crate::domain::{OrderId, UserId};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct OrderRow {
    order: OrderId,
    customer: UserId,
    branch: u64,
    channel: Channel,
    status: OrderStatus,
    total: Money,
}

#[derive(Serialize)]
struct LoyaltyRow<'a> {
    user: UserId,
    name: &'a str,
    role: Role,
    points: u64,
}

/// Writes end-of-run reports as CSV. Each report writes its own header row.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink),
        }
    }

    /// `order,customer,branch,channel,status,total`
    pub fn write_orders(&mut self, orders: &[Order]) -> Result<()> {
        self.writer
            .write_record(["order", "customer", "branch", "channel", "status", "total"])?;
        for order in orders {
            self.writer.serialize(OrderRow {
                order: order.id,
                customer: order.customer,
                branch: order.branch,
                channel: order.channel,
                status: order.status,
                total: order.total,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// `branch,product,quantity`
    pub fn write_stock(&mut self, levels: &[StockBalance]) -> Result<()> {
        self.writer.write_record(["branch", "product", "quantity"])?;
        for level in levels {
            self.writer.serialize(level)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// `user,name,role,points`
    pub fn write_loyalty(&mut self, users: &[User]) -> Result<()> {
        self.writer.write_record(["user", "name", "role", "points"])?;
        for user in users {
            self.writer.serialize(LoyaltyRow {
                user: user.id,
                name: &user.name,
                role: user.role,
                points: user.loyalty_points,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_orders() {
        let order = Order {
            id: 1,
            customer: 2,
            branch: 1,
            channel: Channel::Counter,
            status: OrderStatus::Paid,
            total: Money::new(dec!(30.00)),
            lines: vec![],
            created_at: Utc::now(),
        };
        let mut buffer = Vec::new();
        ReportWriter::new(&mut buffer).write_orders(&[order]).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "order,customer,branch,channel,status,total\n1,2,1,COUNTER,PAID,30.00\n"
        );
    }

    #[test]
    fn test_write_stock() {
        let mut buffer = Vec::new();
        ReportWriter::new(&mut buffer)
            .write_stock(&[StockBalance {
                branch: 1,
                product: 3,
                quantity: 2,
            }])
            .unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "branch,product,quantity\n1,3,2\n"
        );
    }
}
