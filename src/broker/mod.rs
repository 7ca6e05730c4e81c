//! Brokerage API access
//!
//! Login produces a `Session`; a `Session` is the only way to construct the
//! authenticated `BrokerClient` that fetches order history, transfers, and
//! instrument metadata.

pub mod client;
pub mod session;
pub mod types;

pub use client::{BrokerClient, SymbolResolver};
pub use session::{login, Session, DEFAULT_API_URL};
pub use types::{
    BrokerError, ExecutionRecord, OrderRecord, TransferEvent, TransferKind, TransferRecord,
};
