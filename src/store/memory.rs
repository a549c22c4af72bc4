//! In-memory reference stores for proposals and transactions
//!
//! Both parties act through independent clients, so concurrent
//! read-modify-write calls against the same aggregate id must be
//! serialized. Every mutation goes through `update_with`, which applies
//! the closure to a draft under the store lock and commits it only on
//! success; a failed guard leaves the stored aggregate untouched and
//! no update is ever lost.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::{MarketError, Result};
use crate::trade::{Proposal, TradeTransaction};
use crate::types::{ProposalId, TransactionId, UserId};

/// Keyed proposal store with the filtered listings the UI consumes
#[derive(Clone, Default)]
pub struct MemoryProposalStore {
    proposals: Arc<Mutex<HashMap<ProposalId, Proposal>>>,
}

impl MemoryProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &ProposalId) -> Option<Proposal> {
        self.proposals.lock().await.get(id).cloned()
    }

    pub async fn save(&self, proposal: Proposal) {
        self.proposals
            .lock()
            .await
            .insert(proposal.id().clone(), proposal);
    }

    /// Replace an existing proposal wholesale
    pub async fn update(&self, proposal: Proposal) -> Result<()> {
        let mut proposals = self.proposals.lock().await;
        if !proposals.contains_key(proposal.id()) {
            return Err(MarketError::ProposalNotFound(proposal.id().to_string()));
        }
        proposals.insert(proposal.id().clone(), proposal);
        Ok(())
    }

    pub async fn delete(&self, id: &ProposalId) -> Result<()> {
        self.proposals
            .lock()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| MarketError::ProposalNotFound(id.to_string()))
    }

    /// Apply a mutation to the stored proposal under the store lock
    pub async fn update_with<F, R>(&self, id: &ProposalId, mutate: F) -> Result<R>
    where
        F: FnOnce(&mut Proposal) -> Result<R>,
    {
        let mut proposals = self.proposals.lock().await;
        let stored = proposals
            .get_mut(id)
            .ok_or_else(|| MarketError::ProposalNotFound(id.to_string()))?;

        let mut draft = stored.clone();
        let out = mutate(&mut draft)?;
        *stored = draft;
        Ok(out)
    }

    /// Proposals this user sent that are pending or expired
    pub async fn sent_pending(&self, user: &UserId, now: DateTime<Utc>) -> Vec<Proposal> {
        self.filtered(|proposal| proposal.is_sent_pending_for(user, now))
            .await
    }

    /// Proposals this user received that are pending or expired
    pub async fn received_pending(&self, user: &UserId, now: DateTime<Utc>) -> Vec<Proposal> {
        self.filtered(|proposal| proposal.is_received_pending_for(user, now))
            .await
    }

    /// Accepted proposals involving this user
    pub async fn scheduled(&self, user: &UserId, now: DateTime<Utc>) -> Vec<Proposal> {
        self.filtered(|proposal| proposal.is_scheduled_for(user, now))
            .await
    }

    /// Resolved proposals involving this user
    pub async fn history(&self, user: &UserId, now: DateTime<Utc>) -> Vec<Proposal> {
        self.filtered(|proposal| proposal.is_history_for(user, now))
            .await
    }

    async fn filtered<P>(&self, predicate: P) -> Vec<Proposal>
    where
        P: Fn(&Proposal) -> bool,
    {
        self.proposals
            .lock()
            .await
            .values()
            .filter(|proposal| predicate(proposal))
            .cloned()
            .collect()
    }
}

#[derive(Default)]
struct TransactionStoreInner {
    transactions: HashMap<TransactionId, TradeTransaction>,
    next_id: u64,
}

/// Keyed transaction store; integer ids are assigned on first save
#[derive(Clone, Default)]
pub struct MemoryTransactionStore {
    inner: Arc<Mutex<TransactionStoreInner>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a freshly derived transaction, assigning its id
    pub async fn save(&self, mut transaction: TradeTransaction) -> TransactionId {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = TransactionId(inner.next_id);
        transaction.assign_id(id);
        inner.transactions.insert(id, transaction);
        id
    }

    pub async fn get(&self, id: TransactionId) -> Option<TradeTransaction> {
        self.inner.lock().await.transactions.get(&id).cloned()
    }

    /// Replace an existing transaction wholesale
    pub async fn update(&self, transaction: TradeTransaction) -> Result<()> {
        let id = transaction.id().ok_or_else(|| {
            MarketError::Validation("transaction has never been saved".to_string())
        })?;

        let mut inner = self.inner.lock().await;
        if !inner.transactions.contains_key(&id) {
            return Err(MarketError::TransactionNotFound(id.0));
        }
        inner.transactions.insert(id, transaction);
        Ok(())
    }

    /// Apply a mutation to the stored transaction under the store lock
    pub async fn update_with<F, R>(&self, id: TransactionId, mutate: F) -> Result<R>
    where
        F: FnOnce(&mut TradeTransaction) -> Result<R>,
    {
        let mut inner = self.inner.lock().await;
        let stored = inner
            .transactions
            .get_mut(&id)
            .ok_or(MarketError::TransactionNotFound(id.0))?;

        let mut draft = stored.clone();
        let out = mutate(&mut draft)?;
        *stored = draft;
        Ok(out)
    }

    /// Session codes issued to this party on still-open transactions.
    /// Feeds the reservation set so a code is never reused while another
    /// of the party's meetings remains unresolved.
    pub async fn open_session_codes_for(&self, user: &UserId) -> HashSet<u32> {
        self.inner
            .lock()
            .await
            .transactions
            .values()
            .filter(|tx| !tx.status().is_terminal() && tx.involves(user))
            .flat_map(|tx| tx.session_codes().collect::<Vec<_>>())
            .collect()
    }
}
