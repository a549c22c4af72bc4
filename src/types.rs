//! Core types used throughout tradebinder

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{MarketError, Result};

/// Opaque user identifier, supplied by the external auth component
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for proposals (timestamp-based)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub String);

impl ProposalId {
    /// Generate a new unique proposal ID with timestamp
    pub fn generate() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis();

        Self(format!("proposal_{}", timestamp))
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier assigned to a trade transaction by the transaction store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported card games
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameType {
    Pokemon,
    Magic,
    YuGiOh,
    Lorcana,
}

/// A quantity of a specific card, attached to a proposal or transaction
/// as a line item. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardLot {
    card_id: String,
    display_name: String,
    game_type: GameType,
    quantity: u32,
}

impl CardLot {
    pub fn new(
        card_id: impl Into<String>,
        display_name: impl Into<String>,
        game_type: GameType,
        quantity: u32,
    ) -> Result<Self> {
        let card_id = card_id.into();
        if card_id.trim().is_empty() {
            return Err(MarketError::Validation(
                "card id must not be empty".to_string(),
            ));
        }
        if quantity == 0 {
            return Err(MarketError::Validation(
                "lot quantity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            card_id,
            display_name: display_name.into(),
            game_type,
            quantity,
        })
    }

    pub fn card_id(&self) -> &str {
        &self.card_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

impl fmt::Display for CardLot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x {} [{}]", self.quantity, self.display_name, self.card_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_id_creation() {
        let id1 = ProposalId::generate();

        // IDs should start with "proposal_"
        assert!(id1.0.starts_with("proposal_"));

        // Wait a tiny bit to ensure different timestamp
        std::thread::sleep(std::time::Duration::from_millis(2));

        let id2 = ProposalId::generate();

        // IDs should be different (due to timestamp)
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_card_lot_validation() {
        let lot = CardLot::new("sv4pt5-245", "Garchomp ex", GameType::Pokemon, 2).unwrap();
        assert_eq!(lot.card_id(), "sv4pt5-245");
        assert_eq!(lot.quantity(), 2);

        let err = CardLot::new("", "Garchomp ex", GameType::Pokemon, 1).unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));

        let err = CardLot::new("sv4pt5-245", "Garchomp ex", GameType::Pokemon, 0).unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }

    #[test]
    fn test_card_lot_display() {
        let lot = CardLot::new("base1-4", "Charizard", GameType::Pokemon, 1).unwrap();
        assert_eq!(lot.to_string(), "1x Charizard [base1-4]");
    }

    #[test]
    fn test_serialization() {
        let user_id = UserId("user3".to_string());
        let serialized = serde_json::to_string(&user_id).unwrap();
        let deserialized: UserId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(user_id, deserialized);

        let lot = CardLot::new("mtg-1234", "Black Lotus", GameType::Magic, 1).unwrap();
        let serialized = serde_json::to_string(&lot).unwrap();
        let deserialized: CardLot = serde_json::from_str(&serialized).unwrap();
        assert_eq!(lot, deserialized);
    }
}
