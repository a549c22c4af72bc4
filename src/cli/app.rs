//! Marketplace application integrating stores and trade operations

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime, Utc};

use crate::binder::{apply_completed_trade, Binder};
use crate::error::{MarketError, Result};
use crate::store::{MemoryProposalStore, MemoryTransactionStore};
use crate::trade::{InspectionResult, Proposal, TradeStatus, TradeTransaction};
use crate::types::{CardLot, GameType, ProposalId, TransactionId, UserId};

/// Main marketplace application
#[derive(Clone, Default)]
pub struct MarketApp {
    proposals: MemoryProposalStore,
    transactions: MemoryTransactionStore,
}

impl MarketApp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the proposal store
    pub fn proposals(&self) -> &MemoryProposalStore {
        &self.proposals
    }

    /// Get the transaction store
    pub fn transactions(&self) -> &MemoryTransactionStore {
        &self.transactions
    }

    /// Create and persist a new proposal
    #[allow(clippy::too_many_arguments)]
    pub async fn create_proposal(
        &self,
        proposer: UserId,
        receiver: UserId,
        offered: Vec<CardLot>,
        requested: Vec<CardLot>,
        place: impl Into<String>,
        date: NaiveDate,
        time: Option<NaiveTime>,
    ) -> Result<ProposalId> {
        let proposal = Proposal::new(
            proposer, receiver, offered, requested, place, date, time,
            Utc::now(),
        )?;
        let id = proposal.id().clone();

        tracing::info!(
            "Created proposal {} from {} to {}, meeting at {} on {}",
            id,
            proposal.proposer_id(),
            proposal.receiver_id(),
            proposal.meeting_place(),
            proposal.meeting_date()
        );
        self.proposals.save(proposal).await;

        Ok(id)
    }

    /// Accept a proposal and derive the committed transaction
    pub async fn accept_proposal(&self, id: &ProposalId) -> Result<TransactionId> {
        let now = Utc::now();
        let accepted = self
            .proposals
            .update_with(id, |proposal| {
                proposal.accept(now)?;
                Ok(proposal.clone())
            })
            .await?;

        let transaction = accepted.to_trade_transaction(now)?;
        let transaction_id = self.transactions.save(transaction).await;

        tracing::info!(
            "Proposal {} accepted, transaction {} scheduled at {} for {}",
            id,
            transaction_id,
            accepted.meeting_place(),
            accepted.meeting_date()
        );

        Ok(transaction_id)
    }

    /// Decline a proposal
    pub async fn decline_proposal(&self, id: &ProposalId) -> Result<()> {
        let now = Utc::now();
        self.proposals
            .update_with(id, |proposal| proposal.decline(now))
            .await?;

        tracing::info!("Proposal {} declined", id);
        Ok(())
    }

    /// Confirm a party's presence at the meeting point, returning the
    /// session code to show the mediating store
    pub async fn confirm_presence(&self, id: TransactionId, user: &UserId) -> Result<u32> {
        // Codes on the party's other unresolved meetings stay reserved
        let reserved: HashSet<u32> = self.transactions.open_session_codes_for(user).await;

        let code = self
            .transactions
            .update_with(id, |transaction| {
                transaction.confirm_presence(user, &reserved)
            })
            .await?;

        tracing::info!("{} confirmed presence on transaction {}", user, id);
        Ok(code)
    }

    /// Record a party's inspection outcome, returning the new status
    pub async fn record_inspection(
        &self,
        id: TransactionId,
        user: &UserId,
        result: InspectionResult,
    ) -> Result<TradeStatus> {
        let status = self
            .transactions
            .update_with(id, |transaction| {
                transaction.record_inspection(user, result)?;
                Ok(transaction.status())
            })
            .await?;

        match status {
            TradeStatus::Completed => {
                tracing::info!("Transaction {} completed, both inspections passed", id)
            }
            TradeStatus::Cancelled => {
                tracing::warn!("Transaction {} cancelled after a failed inspection", id)
            }
            _ => tracing::info!("{} recorded {:?} on transaction {}", user, result, id),
        }

        Ok(status)
    }

    /// Cancel an unresolved transaction
    pub async fn cancel_transaction(&self, id: TransactionId) -> Result<()> {
        self.transactions
            .update_with(id, |transaction| transaction.cancel())
            .await?;

        tracing::warn!("Transaction {} cancelled", id);
        Ok(())
    }

    /// Leave feedback on a resolved transaction
    pub async fn leave_feedback(
        &self,
        id: TransactionId,
        user: &UserId,
        rating: u8,
        comment: impl Into<String>,
    ) -> Result<()> {
        let comment = comment.into();
        let now = Utc::now();
        self.transactions
            .update_with(id, |transaction| {
                transaction.leave_feedback(user, rating, comment, now)
            })
            .await?;

        tracing::info!("{} left feedback on transaction {}", user, id);
        Ok(())
    }

    /// Snapshot of one transaction
    pub async fn transaction(&self, id: TransactionId) -> Result<TradeTransaction> {
        self.transactions
            .get(id)
            .await
            .ok_or(MarketError::TransactionNotFound(id.0))
    }

    /// Proposals this user sent that are pending or expired
    pub async fn sent_pending(&self, user: &UserId) -> Vec<Proposal> {
        self.proposals.sent_pending(user, Utc::now()).await
    }

    /// Proposals this user received that are pending or expired
    pub async fn received_pending(&self, user: &UserId) -> Vec<Proposal> {
        self.proposals.received_pending(user, Utc::now()).await
    }

    /// Accepted proposals involving this user
    pub async fn scheduled(&self, user: &UserId) -> Vec<Proposal> {
        self.proposals.scheduled(user, Utc::now()).await
    }

    /// Resolved proposals involving this user
    pub async fn history(&self, user: &UserId) -> Vec<Proposal> {
        self.proposals.history(user, Utc::now()).await
    }

    /// Scripted two-party flow from proposal to binder update, used by
    /// the `demo` CLI command
    pub async fn run_demo(&self) -> Result<()> {
        let proposer = UserId("user3".to_string());
        let receiver = UserId("user1".to_string());

        let mut proposer_binder = Binder::new(proposer.clone());
        let mut receiver_binder = Binder::new(receiver.clone());
        let garchomp = CardLot::new("sv4pt5-245", "Garchomp ex", GameType::Pokemon, 1)?;
        let charizard = CardLot::new("sv3pt5-199", "Charizard ex", GameType::Pokemon, 1)?;
        proposer_binder.add(&garchomp);
        receiver_binder.add(&charizard);

        let tomorrow = Utc::now().date_naive() + chrono::Duration::days(1);
        let proposal_id = self
            .create_proposal(
                proposer.clone(),
                receiver.clone(),
                vec![garchomp],
                vec![charizard],
                "CiccioGamer89TCG",
                tomorrow,
                NaiveTime::from_hms_opt(15, 30, 0),
            )
            .await?;

        let inbox = self.received_pending(&receiver).await;
        tracing::info!("{} has {} pending proposal(s)", receiver, inbox.len());

        let transaction_id = self.accept_proposal(&proposal_id).await?;

        let proposer_code = self.confirm_presence(transaction_id, &proposer).await?;
        let receiver_code = self.confirm_presence(transaction_id, &receiver).await?;
        tracing::info!(
            "Session codes for the store clerk: {} -> {}, {} -> {}",
            proposer,
            proposer_code,
            receiver,
            receiver_code
        );

        self.record_inspection(transaction_id, &proposer, InspectionResult::Pass)
            .await?;
        self.record_inspection(transaction_id, &receiver, InspectionResult::Pass)
            .await?;

        let transaction = self.transaction(transaction_id).await?;
        apply_completed_trade(&mut proposer_binder, &mut receiver_binder, &transaction)?;
        tracing::info!(
            "Binders updated: {} now holds {}x Charizard ex, {} holds {}x Garchomp ex",
            proposer,
            proposer_binder.quantity_of("sv3pt5-199"),
            receiver,
            receiver_binder.quantity_of("sv4pt5-245")
        );

        self.leave_feedback(transaction_id, &proposer, 5, "smooth trade")
            .await?;
        self.leave_feedback(transaction_id, &receiver, 5, "cards as described")
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(id: &str) -> UserId {
        UserId(id.to_string())
    }

    fn garchomp() -> Vec<CardLot> {
        vec![CardLot::new("sv4pt5-245", "Garchomp ex", GameType::Pokemon, 1).unwrap()]
    }

    fn tomorrow() -> NaiveDate {
        Utc::now().date_naive() + Duration::days(1)
    }

    async fn proposal_for(app: &MarketApp) -> ProposalId {
        app.create_proposal(
            user("user3"),
            user("user1"),
            garchomp(),
            Vec::new(),
            "CiccioGamer89TCG",
            tomorrow(),
            None,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_accept_derives_transaction() {
        let app = MarketApp::new();
        let proposal_id = proposal_for(&app).await;

        let transaction_id = app.accept_proposal(&proposal_id).await.unwrap();
        let transaction = app.transaction(transaction_id).await.unwrap();

        assert_eq!(transaction.status(), TradeStatus::WaitingForArrival);
        assert_eq!(transaction.store_id(), "CiccioGamer89TCG");
        assert!(transaction.parties().values().all(|state| !state.arrived));

        // The accepted proposal moves to the scheduled view
        assert_eq!(app.scheduled(&user("user3")).await.len(), 1);
        assert!(app.received_pending(&user("user1")).await.is_empty());
    }

    #[tokio::test]
    async fn test_decline_keeps_transaction_out() {
        let app = MarketApp::new();
        let proposal_id = proposal_for(&app).await;

        app.decline_proposal(&proposal_id).await.unwrap();

        assert!(app.scheduled(&user("user3")).await.is_empty());
        assert_eq!(app.history(&user("user1")).await.len(), 1);

        // Declining twice is a state error, not a store error
        let err = app.decline_proposal(&proposal_id).await.unwrap_err();
        assert!(matches!(err, MarketError::InvalidStateTransition(_)));
    }

    #[tokio::test]
    async fn test_full_trade_flow() {
        let app = MarketApp::new();
        let proposal_id = proposal_for(&app).await;
        let transaction_id = app.accept_proposal(&proposal_id).await.unwrap();

        let code3 = app
            .confirm_presence(transaction_id, &user("user3"))
            .await
            .unwrap();
        let code1 = app
            .confirm_presence(transaction_id, &user("user1"))
            .await
            .unwrap();
        assert_ne!(code3, code1);

        // Repeat arrival returns the same code
        let again = app
            .confirm_presence(transaction_id, &user("user3"))
            .await
            .unwrap();
        assert_eq!(code3, again);

        let status = app
            .record_inspection(transaction_id, &user("user3"), InspectionResult::Pass)
            .await
            .unwrap();
        assert_eq!(status, TradeStatus::InspectionPhase);

        let status = app
            .record_inspection(transaction_id, &user("user1"), InspectionResult::Pass)
            .await
            .unwrap();
        assert_eq!(status, TradeStatus::Completed);

        app.leave_feedback(transaction_id, &user("user1"), 5, "great")
            .await
            .unwrap();
        let transaction = app.transaction(transaction_id).await.unwrap();
        assert_eq!(transaction.feedback().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_inspection_cancels() {
        let app = MarketApp::new();
        let proposal_id = proposal_for(&app).await;
        let transaction_id = app.accept_proposal(&proposal_id).await.unwrap();

        app.confirm_presence(transaction_id, &user("user3"))
            .await
            .unwrap();
        app.confirm_presence(transaction_id, &user("user1"))
            .await
            .unwrap();

        app.record_inspection(transaction_id, &user("user3"), InspectionResult::Pass)
            .await
            .unwrap();
        let status = app
            .record_inspection(transaction_id, &user("user1"), InspectionResult::Fail)
            .await
            .unwrap();

        assert_eq!(status, TradeStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_session_codes_unique_across_open_transactions() {
        let app = MarketApp::new();

        // Same pair, two meetings; the shared party's codes must differ
        let first = proposal_for(&app).await;
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = proposal_for(&app).await;

        let tx1 = app.accept_proposal(&first).await.unwrap();
        let tx2 = app.accept_proposal(&second).await.unwrap();

        let code_a = app.confirm_presence(tx1, &user("user3")).await.unwrap();
        let code_b = app.confirm_presence(tx2, &user("user3")).await.unwrap();
        assert_ne!(code_a, code_b);
    }

    #[tokio::test]
    async fn test_unknown_user_rejected_end_to_end() {
        let app = MarketApp::new();
        let proposal_id = proposal_for(&app).await;
        let transaction_id = app.accept_proposal(&proposal_id).await.unwrap();

        let err = app
            .confirm_presence(transaction_id, &user("user9"))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::UnknownParticipant { .. }));
    }

    #[tokio::test]
    async fn test_demo_runs_clean() {
        let app = MarketApp::new();
        app.run_demo().await.unwrap();

        let transaction = app.transaction(TransactionId(1)).await.unwrap();
        assert_eq!(transaction.status(), TradeStatus::Completed);
        assert_eq!(transaction.feedback().len(), 2);
    }
}
