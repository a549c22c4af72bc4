//! Proposal lifecycle: offer, accept, decline, lazy expiry

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::types::{CardLot, ProposalId, UserId};

use super::transaction::TradeTransaction;
use super::types::ProposalStatus;

/// How long a pending proposal stays acceptable
pub const PROPOSAL_TTL_HOURS: i64 = 24;

/// A two-party trade offer with a proposed physical meeting
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    id: ProposalId,
    proposer_id: UserId,
    receiver_id: UserId,
    offered_lots: Vec<CardLot>,
    requested_lots: Vec<CardLot>,
    status: ProposalStatus,
    /// Store or user hosting the meeting
    meeting_place: String,
    meeting_date: NaiveDate,
    meeting_time: Option<NaiveTime>,
    last_updated: DateTime<Utc>,
}

impl Proposal {
    /// Create a new pending proposal.
    ///
    /// The meeting date must be strictly after the creation date; a
    /// physical meeting needs lead time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        proposer_id: UserId,
        receiver_id: UserId,
        offered_lots: Vec<CardLot>,
        requested_lots: Vec<CardLot>,
        meeting_place: impl Into<String>,
        meeting_date: NaiveDate,
        meeting_time: Option<NaiveTime>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if proposer_id.0.trim().is_empty() || receiver_id.0.trim().is_empty() {
            return Err(MarketError::Validation(
                "party ids must not be empty".to_string(),
            ));
        }
        if proposer_id == receiver_id {
            return Err(MarketError::Validation(
                "proposer and receiver must be different users".to_string(),
            ));
        }
        if offered_lots.is_empty() && requested_lots.is_empty() {
            return Err(MarketError::Validation(
                "a proposal must offer or request at least one lot".to_string(),
            ));
        }
        let meeting_place = meeting_place.into();
        if meeting_place.trim().is_empty() {
            return Err(MarketError::Validation(
                "meeting place must not be empty".to_string(),
            ));
        }
        if meeting_date <= now.date_naive() {
            return Err(MarketError::Validation(format!(
                "meeting date {} must be after the proposal date {}",
                meeting_date,
                now.date_naive()
            )));
        }

        Ok(Self {
            id: ProposalId::generate(),
            proposer_id,
            receiver_id,
            offered_lots,
            requested_lots,
            status: ProposalStatus::Pending,
            meeting_place,
            meeting_date,
            meeting_time,
            last_updated: now,
        })
    }

    /// Get proposal ID
    pub fn id(&self) -> &ProposalId {
        &self.id
    }

    /// Get the proposing party
    pub fn proposer_id(&self) -> &UserId {
        &self.proposer_id
    }

    /// Get the receiving party
    pub fn receiver_id(&self) -> &UserId {
        &self.receiver_id
    }

    /// Lots the proposer gives away
    pub fn offered_lots(&self) -> &[CardLot] {
        &self.offered_lots
    }

    /// Lots the proposer asks for in return
    pub fn requested_lots(&self) -> &[CardLot] {
        &self.requested_lots
    }

    /// Status as persisted; see [`Proposal::effective_status`] for display
    pub fn status(&self) -> ProposalStatus {
        self.status
    }

    /// Get the meeting place identifier
    pub fn meeting_place(&self) -> &str {
        &self.meeting_place
    }

    pub fn meeting_date(&self) -> NaiveDate {
        self.meeting_date
    }

    pub fn meeting_time(&self) -> Option<NaiveTime> {
        self.meeting_time
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Check if either party owns this proposal
    pub fn involves(&self, user: &UserId) -> bool {
        &self.proposer_id == user || &self.receiver_id == user
    }

    /// A pending proposal past its acceptance window is expired.
    /// Expiry is derived at query time, never written back.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == ProposalStatus::Pending
            && self.last_updated + Duration::hours(PROPOSAL_TTL_HOURS) < now
    }

    /// Stored status reinterpreted at `now`; a stale pending proposal
    /// reads as expired for display and blocks accept/decline.
    pub fn effective_status(&self, now: DateTime<Utc>) -> ProposalStatus {
        if self.is_expired(now) {
            ProposalStatus::Expired
        } else {
            self.status
        }
    }

    /// Accept the proposal (receiver action)
    pub fn accept(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.resolve(ProposalStatus::Accepted, now)
    }

    /// Decline the proposal (receiver action)
    pub fn decline(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.resolve(ProposalStatus::Rejected, now)
    }

    fn resolve(&mut self, target: ProposalStatus, now: DateTime<Utc>) -> Result<()> {
        match self.effective_status(now) {
            ProposalStatus::Pending => {
                self.status = target;
                self.last_updated = now;
                Ok(())
            }
            current => Err(MarketError::InvalidStateTransition(format!(
                "proposal {} is {:?} and can no longer be resolved",
                self.id, current
            ))),
        }
    }

    /// Derive the committed transaction from an accepted proposal.
    ///
    /// Lot lists are copied by value, so the proposal shown in historical
    /// views stays independent of the transaction. The meeting place
    /// becomes the transaction's mediating store.
    pub fn to_trade_transaction(&self, now: DateTime<Utc>) -> Result<TradeTransaction> {
        if self.status != ProposalStatus::Accepted {
            return Err(MarketError::InvalidStateTransition(format!(
                "proposal {} is {:?}, only an accepted proposal can become a transaction",
                self.id, self.status
            )));
        }

        let trade_date = self
            .meeting_date
            .and_time(self.meeting_time.unwrap_or(NaiveTime::MIN))
            .and_utc();

        Ok(TradeTransaction::new(
            self.proposer_id.clone(),
            self.receiver_id.clone(),
            self.meeting_place.clone(),
            self.offered_lots.clone(),
            self.requested_lots.clone(),
            trade_date,
            now,
        ))
    }

    // Listing predicates backing the filtered store queries. Each one
    // classifies against the effective status at `now`.

    /// Proposals this user sent that still await (or outlived) a response
    pub fn is_sent_pending_for(&self, user: &UserId, now: DateTime<Utc>) -> bool {
        &self.proposer_id == user
            && matches!(
                self.effective_status(now),
                ProposalStatus::Pending | ProposalStatus::Expired
            )
    }

    /// Proposals this user received that still await (or outlived) a response
    pub fn is_received_pending_for(&self, user: &UserId, now: DateTime<Utc>) -> bool {
        &self.receiver_id == user
            && matches!(
                self.effective_status(now),
                ProposalStatus::Pending | ProposalStatus::Expired
            )
    }

    /// Accepted proposals with a meeting ahead, for either party
    pub fn is_scheduled_for(&self, user: &UserId, now: DateTime<Utc>) -> bool {
        self.involves(user) && self.effective_status(now) == ProposalStatus::Accepted
    }

    /// Resolved proposals shown in either party's history
    pub fn is_history_for(&self, user: &UserId, now: DateTime<Utc>) -> bool {
        self.involves(user)
            && matches!(
                self.effective_status(now),
                ProposalStatus::Accepted | ProposalStatus::Rejected | ProposalStatus::Expired
            )
    }
}
