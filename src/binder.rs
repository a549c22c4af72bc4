//! Binder collections and the application of completed trades
//!
//! A binder is a user's card collection. Applying a completed
//! transaction moves the traded quantities between the two binders; the
//! transaction itself is never mutated by this step.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::trade::{TradeStatus, TradeTransaction};
use crate::types::{CardLot, GameType, UserId};

/// Copies of one card held in a binder
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedCard {
    pub display_name: String,
    pub game_type: GameType,
    pub quantity: u32,
}

/// A user's card collection, keyed by catalog id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binder {
    owner: UserId,
    cards: HashMap<String, OwnedCard>,
}

impl Binder {
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            cards: HashMap::new(),
        }
    }

    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Copies of the given card currently held
    pub fn quantity_of(&self, card_id: &str) -> u32 {
        self.cards.get(card_id).map_or(0, |card| card.quantity)
    }

    /// All held cards, keyed by catalog id
    pub fn cards(&self) -> &HashMap<String, OwnedCard> {
        &self.cards
    }

    /// Add a lot's quantity to the collection
    pub fn add(&mut self, lot: &CardLot) {
        self.cards
            .entry(lot.card_id().to_string())
            .and_modify(|card| card.quantity += lot.quantity())
            .or_insert_with(|| OwnedCard {
                display_name: lot.display_name().to_string(),
                game_type: lot.game_type(),
                quantity: lot.quantity(),
            });
    }

    /// Remove a lot's quantity; the entry disappears at zero copies
    pub fn remove(&mut self, lot: &CardLot) -> Result<()> {
        let held = self.quantity_of(lot.card_id());
        if held < lot.quantity() {
            return Err(MarketError::Validation(format!(
                "{} holds {}x {} but the trade needs {}x",
                self.owner,
                held,
                lot.card_id(),
                lot.quantity()
            )));
        }

        if held == lot.quantity() {
            self.cards.remove(lot.card_id());
        } else if let Some(card) = self.cards.get_mut(lot.card_id()) {
            card.quantity -= lot.quantity();
        }
        Ok(())
    }
}

/// Apply a completed transaction's exchange to both parties' binders.
///
/// Offered lots move proposer to receiver, requested lots the other way.
/// The swap is applied to drafts and committed only when every removal
/// succeeds, so a shortfall leaves both binders untouched.
pub fn apply_completed_trade(
    proposer: &mut Binder,
    receiver: &mut Binder,
    transaction: &TradeTransaction,
) -> Result<()> {
    if transaction.status() != TradeStatus::Completed {
        return Err(MarketError::InvalidStateTransition(format!(
            "transaction is {:?}, only a completed trade can be applied to binders",
            transaction.status()
        )));
    }
    if proposer.owner() != transaction.proposer_id() || receiver.owner() != transaction.receiver_id()
    {
        return Err(MarketError::Validation(
            "binder owners do not match the transaction parties".to_string(),
        ));
    }

    let mut proposer_draft = proposer.clone();
    let mut receiver_draft = receiver.clone();

    for lot in transaction.offered_lots() {
        proposer_draft.remove(lot)?;
        receiver_draft.add(lot);
    }
    for lot in transaction.requested_lots() {
        receiver_draft.remove(lot)?;
        proposer_draft.add(lot);
    }

    *proposer = proposer_draft;
    *receiver = receiver_draft;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::{InspectionResult, Proposal};
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashSet;

    fn t0() -> DateTime<Utc> {
        "2026-08-07T10:00:00Z".parse().unwrap()
    }

    fn lot(card_id: &str, name: &str, quantity: u32) -> CardLot {
        CardLot::new(card_id, name, GameType::Pokemon, quantity).unwrap()
    }

    fn completed_transaction() -> TradeTransaction {
        let user3 = UserId("user3".to_string());
        let user1 = UserId("user1".to_string());

        let mut proposal = Proposal::new(
            user3.clone(),
            user1.clone(),
            vec![lot("sv4pt5-245", "Garchomp ex", 1)],
            vec![lot("sv3pt5-199", "Charizard ex", 2)],
            "CiccioGamer89TCG",
            t0().date_naive() + Duration::days(1),
            None,
            t0(),
        )
        .unwrap();
        proposal.accept(t0()).unwrap();

        let mut tx = proposal.to_trade_transaction(t0()).unwrap();
        tx.confirm_presence(&user3, &HashSet::new()).unwrap();
        tx.confirm_presence(&user1, &HashSet::new()).unwrap();
        tx.record_inspection(&user3, InspectionResult::Pass).unwrap();
        tx.record_inspection(&user1, InspectionResult::Pass).unwrap();
        tx
    }

    #[test]
    fn test_add_and_remove() {
        let mut binder = Binder::new(UserId("user3".to_string()));
        binder.add(&lot("sv4pt5-245", "Garchomp ex", 3));
        binder.add(&lot("sv4pt5-245", "Garchomp ex", 2));
        assert_eq!(binder.quantity_of("sv4pt5-245"), 5);

        binder.remove(&lot("sv4pt5-245", "Garchomp ex", 4)).unwrap();
        assert_eq!(binder.quantity_of("sv4pt5-245"), 1);

        // Down to zero removes the entry entirely
        binder.remove(&lot("sv4pt5-245", "Garchomp ex", 1)).unwrap();
        assert!(binder.cards().is_empty());

        let err = binder.remove(&lot("sv4pt5-245", "Garchomp ex", 1)).unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }

    #[test]
    fn test_apply_completed_trade() {
        let tx = completed_transaction();

        let mut proposer = Binder::new(UserId("user3".to_string()));
        proposer.add(&lot("sv4pt5-245", "Garchomp ex", 2));
        let mut receiver = Binder::new(UserId("user1".to_string()));
        receiver.add(&lot("sv3pt5-199", "Charizard ex", 2));

        apply_completed_trade(&mut proposer, &mut receiver, &tx).unwrap();

        assert_eq!(proposer.quantity_of("sv4pt5-245"), 1);
        assert_eq!(proposer.quantity_of("sv3pt5-199"), 2);
        assert_eq!(receiver.quantity_of("sv4pt5-245"), 1);
        assert_eq!(receiver.quantity_of("sv3pt5-199"), 0);
    }

    #[test]
    fn test_apply_requires_completed() {
        let user3 = UserId("user3".to_string());
        let user1 = UserId("user1".to_string());
        let mut proposal = Proposal::new(
            user3.clone(),
            user1.clone(),
            vec![lot("sv4pt5-245", "Garchomp ex", 1)],
            Vec::new(),
            "CiccioGamer89TCG",
            t0().date_naive() + Duration::days(1),
            None,
            t0(),
        )
        .unwrap();
        proposal.accept(t0()).unwrap();
        let tx = proposal.to_trade_transaction(t0()).unwrap();

        let mut proposer = Binder::new(user3);
        let mut receiver = Binder::new(user1);
        let err = apply_completed_trade(&mut proposer, &mut receiver, &tx).unwrap_err();
        assert!(matches!(err, MarketError::InvalidStateTransition(_)));
    }

    #[test]
    fn test_apply_shortfall_leaves_binders_untouched() {
        let tx = completed_transaction();

        // Receiver holds only one of the two Charizards requested
        let mut proposer = Binder::new(UserId("user3".to_string()));
        proposer.add(&lot("sv4pt5-245", "Garchomp ex", 1));
        let mut receiver = Binder::new(UserId("user1".to_string()));
        receiver.add(&lot("sv3pt5-199", "Charizard ex", 1));

        let before_proposer = proposer.clone();
        let before_receiver = receiver.clone();

        let err = apply_completed_trade(&mut proposer, &mut receiver, &tx).unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
        assert_eq!(proposer, before_proposer);
        assert_eq!(receiver, before_receiver);
    }

    #[test]
    fn test_apply_checks_owners() {
        let tx = completed_transaction();
        let mut wrong = Binder::new(UserId("user9".to_string()));
        let mut receiver = Binder::new(UserId("user1".to_string()));

        let err = apply_completed_trade(&mut wrong, &mut receiver, &tx).unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }
}
