//! Stock deduction after a confirmed purchase.
//!
//! Lines are processed one by one in input order. A line that cannot be
//! resolved or written is recorded and the batch moves on; nothing already
//! written is rolled back. Whether failures should block order completion is
//! the caller's decision, made from the returned [`DeductionReport`].

use serde::{Deserialize, Serialize};
use crate::domain::events::{DomainEvent, InventoryEvent};
use crate::domain::value_objects::{ProductId, VariationId};
use crate::store::InventoryStore;

/// Purchased line as it arrives from stored cart state. Fields may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPurchasedLine {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub quantity: u32,
}

/// A line with everything needed to locate and decrement a variation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchasedLine { pub product_id: ProductId, pub size: String, pub quantity: u32 }

impl TryFrom<&RawPurchasedLine> for PurchasedLine {
    type Error = SkipReason;

    fn try_from(raw: &RawPurchasedLine) -> Result<Self, Self::Error> {
        let product_id = raw.product_id.ok_or(SkipReason::MissingProductId)?;
        let size = raw.size.as_deref().map(str::trim).filter(|s| !s.is_empty()).ok_or(SkipReason::MissingSize)?;
        if raw.quantity == 0 { return Err(SkipReason::ZeroQuantity); }
        Ok(Self { product_id, size: size.to_string(), quantity: raw.quantity })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason { MissingProductId, MissingSize, ZeroQuantity, VariationNotFound }

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LineOutcome {
    Deducted { variation_id: VariationId, previous_stock: u32, new_stock: u32 },
    Skipped { reason: SkipReason },
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineReport {
    pub index: usize,
    pub product_id: Option<ProductId>,
    pub size: Option<String>,
    pub quantity: u32,
    #[serde(flatten)]
    pub outcome: LineOutcome,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeductionReport { pub lines: Vec<LineReport> }

impl DeductionReport {
    pub fn deducted(&self) -> usize { self.count(|o| matches!(o, LineOutcome::Deducted { .. })) }
    pub fn skipped(&self) -> usize { self.count(|o| matches!(o, LineOutcome::Skipped { .. })) }
    pub fn failed(&self) -> usize { self.count(|o| matches!(o, LineOutcome::Failed { .. })) }
    pub fn has_failures(&self) -> bool { self.failed() > 0 }

    fn count(&self, pred: impl Fn(&LineOutcome) -> bool) -> usize { self.lines.iter().filter(|l| pred(&l.outcome)).count() }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.lines
            .iter()
            .filter_map(|l| match &l.outcome {
                LineOutcome::Deducted { variation_id, previous_stock, new_stock } => l.product_id.map(|product_id| {
                    DomainEvent::Inventory(InventoryEvent::StockDeducted {
                        product_id, variation_id: variation_id.clone(), previous_stock: *previous_stock, new_stock: *new_stock,
                    })
                }),
                LineOutcome::Skipped { reason } => Some(DomainEvent::Inventory(InventoryEvent::DeductionSkipped {
                    product_id: l.product_id, size: l.size.clone(), reason: format!("{reason:?}"),
                })),
                LineOutcome::Failed { .. } => None,
            })
            .collect()
    }
}

/// Decrements stock for every purchased line, flooring at zero.
#[tracing::instrument(skip_all, fields(lines = lines.len()))]
pub async fn deduct_stock(store: &dyn InventoryStore, lines: &[RawPurchasedLine]) -> DeductionReport {
    let mut report = DeductionReport::default();
    for (index, raw) in lines.iter().enumerate() {
        let outcome = deduct_line(store, index, raw).await;
        report.lines.push(LineReport { index, product_id: raw.product_id, size: raw.size.clone(), quantity: raw.quantity, outcome });
    }
    tracing::info!(deducted = report.deducted(), skipped = report.skipped(), failed = report.failed(), "Stock deduction finished");
    report
}

async fn deduct_line(store: &dyn InventoryStore, index: usize, raw: &RawPurchasedLine) -> LineOutcome {
    let line = match PurchasedLine::try_from(raw) {
        Ok(line) => line,
        Err(SkipReason::MissingSize) => {
            tracing::warn!(index, product_id = ?raw.product_id, "Purchased line has no size; cannot pick a variation");
            return LineOutcome::Skipped { reason: SkipReason::MissingSize };
        }
        Err(reason) => {
            tracing::info!(index, ?reason, "Skipping purchased line");
            return LineOutcome::Skipped { reason };
        }
    };

    let found = match store.find_variation_by_product_and_size(line.product_id, &line.size).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            tracing::info!(index, product_id = line.product_id, size = %line.size, "No variation for purchased line");
            return LineOutcome::Skipped { reason: SkipReason::VariationNotFound };
        }
        Err(e) => {
            tracing::error!(index, product_id = line.product_id, size = %line.size, error = %e, "Variation lookup failed");
            return LineOutcome::Failed { reason: e.to_string() };
        }
    };

    let new_stock = found.stock.saturating_sub(line.quantity);
    match store.write_variation_stock(&found.variation_id, new_stock).await {
        Ok(()) => {
            tracing::debug!(index, variation_id = %found.variation_id, previous = found.stock, new_stock, "Stock deducted");
            LineOutcome::Deducted { variation_id: found.variation_id, previous_stock: found.stock, new_stock }
        }
        Err(e) => {
            tracing::error!(index, variation_id = %found.variation_id, error = %e, "Stock write failed");
            LineOutcome::Failed { reason: e.to_string() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::catalog::Catalog;
    use crate::store::{MemoryInventoryStore, VariationStock};
    use crate::inventory::sync::LiveInventory;
    use crate::{Result, StorefrontError};

    fn line(product_id: Option<ProductId>, size: Option<&str>, quantity: u32) -> RawPurchasedLine {
        RawPurchasedLine { product_id, size: size.map(str::to_string), quantity }
    }

    fn store() -> MemoryInventoryStore { MemoryInventoryStore::from_catalog(&Catalog::bundled().unwrap()) }

    #[test]
    fn test_boundary_validation() {
        assert_eq!(PurchasedLine::try_from(&line(None, Some("M"), 1)), Err(SkipReason::MissingProductId));
        assert_eq!(PurchasedLine::try_from(&line(Some(1), None, 1)), Err(SkipReason::MissingSize));
        assert_eq!(PurchasedLine::try_from(&line(Some(1), Some("  "), 1)), Err(SkipReason::MissingSize));
        assert_eq!(PurchasedLine::try_from(&line(Some(1), Some("M"), 0)), Err(SkipReason::ZeroQuantity));
        assert_eq!(PurchasedLine::try_from(&line(Some(1), Some("M"), 2)).unwrap().size, "M");
    }

    #[test]
    fn test_raw_line_tolerates_missing_fields() {
        let raw: RawPurchasedLine = serde_json::from_str(r#"{"quantity": 2}"#).unwrap();
        assert_eq!(raw, line(None, None, 2));
    }

    #[tokio::test]
    async fn test_deduction_floors_at_zero() {
        let store = store();
        let report = deduct_stock(&store, &[line(Some(7), Some("L"), 50)]).await;
        assert_eq!(report.deducted(), 1);
        assert_eq!(store.stock_of("var-7-l").await, Some(0));
        assert!(matches!(report.lines[0].outcome, LineOutcome::Deducted { new_stock: 0, .. }));
    }

    #[tokio::test]
    async fn test_bad_line_does_not_stop_batch() {
        let store = store();
        let before = store.stock_of("var-7-l").await.unwrap();
        let report = deduct_stock(&store, &[
            line(Some(7), Some("L"), 1),
            line(Some(7), Some("XXXL"), 1),
            line(None, Some("M"), 1),
            line(Some(7), None, 1),
        ]).await;
        assert_eq!(store.stock_of("var-7-l").await, Some(before - 1));
        assert_eq!(report.deducted(), 1);
        assert_eq!(report.skipped(), 3);
        assert!(!report.has_failures());
        assert_eq!(report.lines[1].outcome, LineOutcome::Skipped { reason: SkipReason::VariationNotFound });
        assert_eq!(report.events().len(), 4);
    }

    /// Wraps the memory store and refuses writes to one variation.
    struct BrokenWrites { inner: MemoryInventoryStore, broken: &'static str }

    #[async_trait]
    impl InventoryStore for BrokenWrites {
        async fn fetch_variation_inventory(&self, product_id: Option<ProductId>) -> Result<LiveInventory> { self.inner.fetch_variation_inventory(product_id).await }
        async fn write_variation_stock(&self, variation_id: &str, new_stock: u32) -> Result<()> {
            if variation_id == self.broken { return Err(StorefrontError::Remote("timeout".into())); }
            self.inner.write_variation_stock(variation_id, new_stock).await
        }
        async fn find_variation_by_product_and_size(&self, product_id: ProductId, size: &str) -> Result<Option<VariationStock>> {
            self.inner.find_variation_by_product_and_size(product_id, size).await
        }
    }

    #[tokio::test]
    async fn test_write_failure_is_per_line() {
        let store = BrokenWrites { inner: store(), broken: "var-7-m" };
        let report = deduct_stock(&store, &[line(Some(7), Some("L"), 2), line(Some(7), Some("M"), 1)]).await;
        assert_eq!(report.deducted(), 1);
        assert!(report.has_failures());
        assert!(matches!(&report.lines[1].outcome, LineOutcome::Failed { reason } if reason.contains("timeout")));
        assert_eq!(store.inner.stock_of("var-7-l").await, Some(3));
    }
}
