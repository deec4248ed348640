//! Variation resolution from a (possibly partial) attribute selection.

use crate::domain::aggregates::{AttributeMap, Product, ProductVariation};

/// First variation, in catalog order, whose attributes agree with every
/// selected key. Unselected axes are unconstrained; an empty selection
/// resolves to nothing.
pub fn resolve_variation<'a>(product: &'a Product, selected: &AttributeMap) -> Option<&'a ProductVariation> {
    if selected.is_empty() {
        return None;
    }
    product.variations.iter().find(|v| {
        selected.iter().all(|(name, value)| v.attributes.get(name) == Some(value))
    })
}
