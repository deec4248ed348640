//! Domain events
use crate::domain::aggregates::order::PaymentMethod;
use crate::domain::value_objects::{ProductId, VariationId};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Inventory(InventoryEvent),
    Order(OrderEvent),
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Inventory(InventoryEvent::StockDeducted { .. }) => "storefront.inventory.stock_deducted",
            Self::Inventory(InventoryEvent::DeductionSkipped { .. }) => "storefront.inventory.deduction_skipped",
            Self::Order(OrderEvent::Placed { .. }) => "storefront.order.placed",
            Self::Order(OrderEvent::HandedOff { .. }) => "storefront.order.handed_off",
            Self::Order(OrderEvent::Completed { .. }) => "storefront.order.completed",
            Self::Order(OrderEvent::Failed { .. }) => "storefront.order.failed",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InventoryEvent {
    StockDeducted { product_id: ProductId, variation_id: VariationId, previous_stock: u32, new_stock: u32 },
    DeductionSkipped { product_id: Option<ProductId>, size: Option<String>, reason: String },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: String, payment_method: PaymentMethod, total: Decimal },
    HandedOff { order_id: String, amount: Decimal },
    Completed { order_id: String },
    Failed { order_id: String, reason: String },
}
