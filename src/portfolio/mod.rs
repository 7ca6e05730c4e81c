//! Portfolio reconstruction: holdings history, cost basis, and the cached
//! holdings table

pub mod cost_basis;
pub mod history;
pub mod store;

pub use cost_basis::CostBasisTable;
pub use history::{HistoryError, HoldingsHistory};
pub use store::HoldingsStore;
