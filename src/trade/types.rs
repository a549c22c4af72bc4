//! Trade status types and per-party fulfillment state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Lifecycle status of a proposal as persisted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Waiting for the receiver to accept or decline
    Pending,
    /// Receiver accepted; a trade transaction has been derived
    Accepted,
    /// Receiver declined
    Rejected,
    /// Pending past its acceptance window
    Expired,
}

impl ProposalStatus {
    /// Check if the proposal can no longer change
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProposalStatus::Pending)
    }
}

/// Status of a trade transaction, derived from per-party state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    /// Neither party has confirmed presence at the meeting point
    WaitingForArrival,
    /// Exactly one party has confirmed presence
    PartiallyArrived,
    /// Both parties present; cards are being inspected
    InspectionPhase,
    /// Both inspections passed; the exchange stands
    Completed,
    /// Cancelled explicitly or through a failed inspection
    Cancelled,
}

impl TradeStatus {
    /// Check if the transaction is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TradeStatus::Completed | TradeStatus::Cancelled)
    }
}

/// Outcome of one party's physical inspection of the other's cards
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionResult {
    Pass,
    Fail,
}

/// Inclusive bounds for session codes (6 digits, human-readable)
pub const SESSION_CODE_MIN: u32 = 100_000;
pub const SESSION_CODE_MAX: u32 = 999_999;

/// One party's fulfillment state within a transaction.
///
/// `session_code` and `arrived` are set together by `confirm_presence`;
/// a party with a code has arrived.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyState {
    pub session_code: Option<u32>,
    pub arrived: bool,
    pub inspection: Option<InspectionResult>,
}

/// Feedback left by a participant on a resolved transaction. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub author: UserId,
    /// 1 (worst) to 5 (best)
    pub rating: u8,
    pub comment: String,
    pub at: DateTime<Utc>,
}
