//! Trade transaction fulfillment state machine

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::types::{CardLot, TransactionId, UserId};

use super::types::{
    Feedback, InspectionResult, PartyState, TradeStatus, SESSION_CODE_MAX, SESSION_CODE_MIN,
};

/// The committed record of an accepted proposal, tracking physical
/// fulfillment independently per party.
///
/// Created exactly once via [`Proposal::to_trade_transaction`]; the lot
/// lists are a copy taken at that moment and never change afterwards.
///
/// [`Proposal::to_trade_transaction`]: super::proposal::Proposal::to_trade_transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTransaction {
    id: Option<TransactionId>,
    status: TradeStatus,
    proposer_id: UserId,
    receiver_id: UserId,
    /// Meeting mediator, copied from the proposal's meeting place
    store_id: String,
    created_at: DateTime<Utc>,
    trade_date: DateTime<Utc>,
    offered_lots: Vec<CardLot>,
    requested_lots: Vec<CardLot>,
    parties: HashMap<UserId, PartyState>,
    feedback: Vec<Feedback>,
}

impl TradeTransaction {
    pub(crate) fn new(
        proposer_id: UserId,
        receiver_id: UserId,
        store_id: String,
        offered_lots: Vec<CardLot>,
        requested_lots: Vec<CardLot>,
        trade_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let parties = HashMap::from([
            (proposer_id.clone(), PartyState::default()),
            (receiver_id.clone(), PartyState::default()),
        ]);

        Self {
            id: None,
            status: TradeStatus::WaitingForArrival,
            proposer_id,
            receiver_id,
            store_id,
            created_at: now,
            trade_date,
            offered_lots,
            requested_lots,
            parties,
            feedback: Vec::new(),
        }
    }

    /// Store-assigned ID, `None` until first saved
    pub fn id(&self) -> Option<TransactionId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: TransactionId) {
        self.id = Some(id);
    }

    pub fn status(&self) -> TradeStatus {
        self.status
    }

    pub fn proposer_id(&self) -> &UserId {
        &self.proposer_id
    }

    pub fn receiver_id(&self) -> &UserId {
        &self.receiver_id
    }

    /// Get the mediating store identifier
    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Agreed meeting instant; a surrounding scheduler can compare this
    /// against the arrival flags to spot no-shows
    pub fn trade_date(&self) -> DateTime<Utc> {
        self.trade_date
    }

    /// Lots moving from proposer to receiver
    pub fn offered_lots(&self) -> &[CardLot] {
        &self.offered_lots
    }

    /// Lots moving from receiver to proposer
    pub fn requested_lots(&self) -> &[CardLot] {
        &self.requested_lots
    }

    /// Read-only per-party snapshot for display
    pub fn parties(&self) -> &HashMap<UserId, PartyState> {
        &self.parties
    }

    /// One party's state, if the user is a participant
    pub fn party(&self, user: &UserId) -> Option<&PartyState> {
        self.parties.get(user)
    }

    /// Check if the user is one of the two parties
    pub fn involves(&self, user: &UserId) -> bool {
        self.parties.contains_key(user)
    }

    /// Feedback entries in the order they were left
    pub fn feedback(&self) -> &[Feedback] {
        &self.feedback
    }

    /// Session codes currently issued on this transaction
    pub fn session_codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.parties.values().filter_map(|state| state.session_code)
    }

    fn label(&self) -> String {
        match self.id {
            Some(id) => id.to_string(),
            None => "unassigned".to_string(),
        }
    }

    fn unknown_participant(&self, user: &UserId) -> MarketError {
        MarketError::UnknownParticipant {
            user: user.to_string(),
            transaction: self.label(),
        }
    }

    /// Record that `user` is physically present at the meeting point and
    /// return their session code for the mediator to compare.
    ///
    /// Idempotent per party: a repeat call returns the code already
    /// issued. Regenerating would invalidate the code the party may have
    /// already shown the mediator.
    ///
    /// `reserved_codes` holds codes issued to this party on other
    /// still-open transactions; a fresh draw colliding with one of them,
    /// or with the counterparty's code, is redrawn.
    pub fn confirm_presence(
        &mut self,
        user: &UserId,
        reserved_codes: &HashSet<u32>,
    ) -> Result<u32> {
        let state = self
            .parties
            .get(user)
            .ok_or_else(|| self.unknown_participant(user))?;

        if let Some(code) = state.session_code {
            return Ok(code);
        }
        if self.status.is_terminal() {
            return Err(MarketError::InvalidStateTransition(format!(
                "transaction {} is already {:?}",
                self.label(),
                self.status
            )));
        }

        let mut taken = reserved_codes.clone();
        taken.extend(self.session_codes());
        let code = generate_session_code(&taken);

        if let Some(state) = self.parties.get_mut(user) {
            state.session_code = Some(code);
            state.arrived = true;
        }
        self.status = self.derived_status();
        Ok(code)
    }

    /// Record one party's inspection outcome.
    ///
    /// Idempotent per party for the same result; a changed result
    /// overwrites the previous one while the transaction is unresolved
    /// (last write wins). Any failure cancels the whole transaction.
    pub fn record_inspection(&mut self, user: &UserId, result: InspectionResult) -> Result<()> {
        if !self.parties.contains_key(user) {
            return Err(self.unknown_participant(user));
        }
        if self.status != TradeStatus::InspectionPhase {
            return Err(MarketError::InvalidStateTransition(format!(
                "transaction {} is {:?}, inspection can only be recorded during the inspection phase",
                self.label(),
                self.status
            )));
        }

        if let Some(state) = self.parties.get_mut(user) {
            state.inspection = Some(result);
        }
        self.status = self.resolve_inspection();
        Ok(())
    }

    /// Cooperative cancellation by either party or the mediating store
    pub fn cancel(&mut self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(MarketError::InvalidStateTransition(format!(
                "transaction {} is already {:?}",
                self.label(),
                self.status
            )));
        }

        self.status = TradeStatus::Cancelled;
        Ok(())
    }

    /// Append feedback to a resolved transaction. Entries are never
    /// removed or overwritten.
    pub fn leave_feedback(
        &mut self,
        author: &UserId,
        rating: u8,
        comment: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.parties.contains_key(author) {
            return Err(self.unknown_participant(author));
        }
        if !self.status.is_terminal() {
            return Err(MarketError::InvalidStateTransition(format!(
                "transaction {} has not resolved yet, feedback comes after",
                self.label()
            )));
        }
        if !(1..=5).contains(&rating) {
            return Err(MarketError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        self.feedback.push(Feedback {
            author: author.clone(),
            rating,
            comment: comment.into(),
            at: now,
        });
        Ok(())
    }

    /// Status as a function of the per-party arrival flags. Terminal
    /// states are sticky and never derived away.
    fn derived_status(&self) -> TradeStatus {
        if self.status.is_terminal() {
            return self.status;
        }

        match self.parties.values().filter(|state| state.arrived).count() {
            0 => TradeStatus::WaitingForArrival,
            1 => TradeStatus::PartiallyArrived,
            _ => TradeStatus::InspectionPhase,
        }
    }

    /// A single failed inspection cancels the trade regardless of the
    /// other party's verdict; completion needs both to pass.
    fn resolve_inspection(&self) -> TradeStatus {
        let any_fail = self
            .parties
            .values()
            .any(|state| state.inspection == Some(InspectionResult::Fail));
        if any_fail {
            return TradeStatus::Cancelled;
        }

        let all_pass = self
            .parties
            .values()
            .all(|state| state.inspection == Some(InspectionResult::Pass));
        if all_pass {
            TradeStatus::Completed
        } else {
            TradeStatus::InspectionPhase
        }
    }
}

/// Uniformly random 6-digit code, redrawn while it collides with a
/// reserved code. Collisions are negligibly likely, redrawing is still
/// cheaper than reasoning about them downstream.
fn generate_session_code(reserved: &HashSet<u32>) -> u32 {
    let mut rng = rand::thread_rng();
    loop {
        let code = rng.gen_range(SESSION_CODE_MIN..=SESSION_CODE_MAX);
        if !reserved.contains(&code) {
            return code;
        }
    }
}
