//! Shopper-side selection on a product page.

use serde::Serialize;
use crate::domain::aggregates::{AttributeMap, Product, ProductVariation};
use crate::domain::value_objects::{Quantity, VariationId};
use crate::inventory::policy::quantity_ceiling;
use crate::inventory::resolver::resolve_variation;

/// Attribute picks made so far plus the quantity stepper.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    selected: AttributeMap,
    resolved: Option<VariationId>,
    quantity: Quantity,
}

impl SelectionState {
    pub fn new() -> Self { Self::default() }

    pub fn selected(&self) -> &AttributeMap { &self.selected }
    pub fn quantity(&self) -> Quantity { self.quantity }

    /// Records one axis pick. The quantity goes back to 1 whenever the
    /// resolved variation changes, since its stock ceiling may be lower.
    pub fn select<'a>(&mut self, product: &'a Product, attribute: &str, value: &str) -> Option<&'a ProductVariation> {
        self.selected.insert(attribute.to_string(), value.to_string());
        let resolved = resolve_variation(product, &self.selected);
        let id = resolved.map(|v| v.id.clone());
        if id != self.resolved {
            self.quantity = Quantity::one();
            self.resolved = id;
        }
        resolved
    }

    /// Resolution against the product as it is now (e.g. after a live refresh).
    pub fn resolved<'a>(&self, product: &'a Product) -> Option<&'a ProductVariation> {
        resolve_variation(product, &self.selected)
    }

    pub fn increment(&mut self, product: &Product, max_per_line: u32) -> Quantity {
        if let Some(variation) = self.resolved(product) {
            self.quantity = self.quantity.increment(quantity_ceiling(variation, max_per_line));
        }
        self.quantity
    }

    pub fn decrement(&mut self) -> Quantity {
        self.quantity = self.quantity.decrement();
        self.quantity
    }
}
