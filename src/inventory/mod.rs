//! Variation-level inventory: resolution, stock policy, live sync and deduction.

pub mod deduction;
pub mod policy;
pub mod resolver;
pub mod selection;
pub mod sync;

pub use deduction::{deduct_stock, DeductionReport, LineOutcome, PurchasedLine, RawPurchasedLine, SkipReason};
pub use policy::{ensure_purchasable, is_in_stock, quantity_ceiling, stock_status, StockState, StockStatus};
pub use resolver::resolve_variation;
pub use selection::SelectionState;
pub use sync::{merge_live_inventory, LiveCatalog, LiveInventory, LiveRecord, RefreshOutcome};
