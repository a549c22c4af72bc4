//! Trade negotiation and in-person verification protocol

pub mod proposal;
pub mod transaction;
pub mod types;

pub use proposal::{Proposal, PROPOSAL_TTL_HOURS};
pub use transaction::TradeTransaction;
pub use types::{
    Feedback, InspectionResult, PartyState, ProposalStatus, TradeStatus, SESSION_CODE_MAX,
    SESSION_CODE_MIN,
};
