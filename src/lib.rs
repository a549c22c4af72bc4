//! Tradebinder marketplace core
//!
//! Peer-to-peer trading-card marketplace: two parties negotiate an
//! exchange of card lots, schedule a physical meeting, and verify in
//! person that the exchange happened — without a shared database
//! transaction between them.
//!
//! The crate provides:
//! - the proposal lifecycle (offer, accept, decline, lazy expiry)
//! - the trade transaction state machine (session codes, arrival
//!   confirmation, inspection, completion/cancellation)
//! - in-memory stores that serialize concurrent updates per aggregate
//! - binder collections that absorb a completed trade
//! - a CLI with a scripted two-party demo

pub mod binder;
pub mod cli;
pub mod error;
pub mod store;
pub mod trade;
pub mod types;

// Re-export commonly used types
pub use error::{MarketError, Result};
pub use trade::{
    InspectionResult, PartyState, Proposal, ProposalStatus, TradeStatus, TradeTransaction,
};
pub use types::{CardLot, GameType, ProposalId, TransactionId, UserId};
