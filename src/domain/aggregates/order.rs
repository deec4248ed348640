//! Order Aggregate
//!
//! Cash orders go `Pending -> Completed | Failed`; gateway orders go
//! `Pending -> AwaitingPayment` and complete when the shopper returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::domain::aggregates::cart::CartItem;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{Money, ProductId};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: String,
    status: OrderStatus,
    payment_method: PaymentMethod,
    customer: CustomerDetails,
    items: Vec<LineItem>,
    subtotal: Money,
    delivery_charge: Money,
    discount: Money,
    total: Money,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem { pub product_id: ProductId, pub name: String, pub sku: String, pub size: Option<String>, pub quantity: u32, pub unit_price: Money, pub total: Money }

impl LineItem {
    pub fn from_cart_item(item: &CartItem, currency: &str) -> Self {
        let unit_price = Money::new(item.price, currency);
        Self {
            product_id: item.product_id, name: item.name.clone(), sku: item.sku.to_string(), size: item.size.clone(),
            quantity: item.quantity, total: unit_price.multiply(item.quantity), unit_price,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] Pending, AwaitingPayment, Completed, Failed }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod { Cash, Card, Upi, NetBanking }

impl PaymentMethod {
    pub fn is_cash(&self) -> bool { matches!(self, Self::Cash) }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 10, max = 15))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(equal = 6))]
    pub pincode: String,
}

impl Order {
    pub fn create(customer: CustomerDetails, payment_method: PaymentMethod, currency: &str) -> Self {
        let now = Utc::now();
        Self {
            id: format!("ORD-{:08}", rand::random::<u32>() % 100_000_000), status: OrderStatus::Pending, payment_method, customer,
            items: vec![], subtotal: Money::zero(currency), delivery_charge: Money::zero(currency),
            discount: Money::zero(currency), total: Money::zero(currency), failure_reason: None,
            created_at: now, updated_at: now, events: vec![],
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn status(&self) -> &OrderStatus { &self.status }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }
    pub fn customer(&self) -> &CustomerDetails { &self.customer }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn delivery_charge(&self) -> &Money { &self.delivery_charge }
    pub fn discount(&self) -> &Money { &self.discount }
    pub fn total(&self) -> &Money { &self.total }
    pub fn failure_reason(&self) -> Option<&str> { self.failure_reason.as_deref() }

    pub fn add_item(&mut self, item: LineItem) { self.items.push(item); self.recalculate(); }
    pub fn set_delivery_charge(&mut self, charge: Money) { self.delivery_charge = charge; self.recalculate(); }

    /// Savings against original prices. Informational; not subtracted from the total.
    pub fn set_discount(&mut self, discount: Money) { self.discount = discount; self.touch(); }

    pub fn place(&mut self) -> Result<(), OrderError> {
        if self.items.is_empty() { return Err(OrderError::NoItems); }
        self.ensure_status(&[OrderStatus::Pending])?;
        self.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_id: self.id.clone(), payment_method: self.payment_method, total: self.total.amount(),
        }));
        Ok(())
    }

    pub fn hand_off(&mut self) -> Result<(), OrderError> {
        self.ensure_status(&[OrderStatus::Pending])?;
        self.status = OrderStatus::AwaitingPayment;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::HandedOff { order_id: self.id.clone(), amount: self.total.amount() }));
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), OrderError> {
        self.ensure_status(&[OrderStatus::Pending, OrderStatus::AwaitingPayment])?;
        self.status = OrderStatus::Completed;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::Completed { order_id: self.id.clone() }));
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        self.ensure_status(&[OrderStatus::Pending])?;
        let reason = reason.into();
        self.status = OrderStatus::Failed;
        self.failure_reason = Some(reason.clone());
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::Failed { order_id: self.id.clone(), reason }));
        Ok(())
    }

    fn ensure_status(&self, allowed: &[OrderStatus]) -> Result<(), OrderError> {
        if allowed.contains(&self.status) { Ok(()) } else { Err(OrderError::InvalidTransition(self.status.clone())) }
    }

    fn recalculate(&mut self) {
        self.subtotal = self.items.iter().fold(Money::zero(self.subtotal.currency()), |acc, i| acc.add(&i.total).unwrap_or(acc));
        self.total = self.subtotal.add(&self.delivery_charge).unwrap_or(self.subtotal.clone());
        self.touch();
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("No items")]
    NoItems,
    #[error("Order is {0:?}")]
    InvalidTransition(OrderStatus),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn line(qty: u32) -> LineItem {
        let unit_price = Money::new(Decimal::new(500, 0), "INR");
        LineItem { product_id: 7, name: "Tee".into(), sku: "PRD007-L".into(), size: Some("L".into()), quantity: qty, total: unit_price.multiply(qty), unit_price }
    }

    #[test]
    fn test_cash_order_workflow() {
        let mut order = Order::create(CustomerDetails::default(), PaymentMethod::Cash, "INR");
        assert!(order.id().starts_with("ORD-"));
        assert_eq!(order.place(), Err(OrderError::NoItems));
        order.add_item(line(2));
        order.set_delivery_charge(Money::new(Decimal::new(50, 0), "INR"));
        assert_eq!(order.total().amount(), Decimal::new(1050, 0));
        order.place().unwrap();
        order.complete().unwrap();
        assert_eq!(order.status(), &OrderStatus::Completed);
        assert_eq!(order.take_events().len(), 2);
        assert!(order.fail("late").is_err());
    }

    #[test]
    fn test_gateway_order_workflow() {
        let mut order = Order::create(CustomerDetails::default(), PaymentMethod::Upi, "INR");
        order.add_item(line(1));
        order.place().unwrap();
        order.hand_off().unwrap();
        assert_eq!(order.status(), &OrderStatus::AwaitingPayment);
        assert!(order.fail("x").is_err());
        order.complete().unwrap();
    }

    #[test]
    fn test_customer_validation() {
        let mut c = CustomerDetails {
            name: "Asha".into(), email: "asha@example.com".into(), phone: "9876543210".into(),
            address: "12 MG Road".into(), city: "Pune".into(), state: "MH".into(), pincode: "411001".into(),
        };
        assert!(c.validate().is_ok());
        c.email = "nope".into();
        assert!(c.validate().is_err());
    }
}
