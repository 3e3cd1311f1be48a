//! Card ranks for the Kuhn/Leduc decks.
//!
//! Only the rank matters for these games: there are no suits, and hand
//! strength is plain rank comparison plus the public-card pair rule.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A card, identified only by its rank.
///
/// Ordering follows the rank value: a higher rank wins an unpaired showdown.
/// The rank is also what appears in information-set keys, so it must be
/// stable across training runs and the consuming runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Card(pub u8);

impl Card {
    /// The rank value of this card.
    pub fn rank(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The 3-card Kuhn deck: one card of each rank 1..=3.
pub fn kuhn_deck() -> Vec<Card> {
    vec![Card(1), Card(2), Card(3)]
}

/// The 6-card Leduc deck: two cards of each rank 1..=3.
///
/// The third card of the shuffle becomes the public card when the second
/// betting round opens.
pub fn leduc_deck() -> Vec<Card> {
    vec![Card(1), Card(1), Card(2), Card(2), Card(3), Card(3)]
}

/// Build a deck from a list of ranks (one card per entry).
pub fn deck_from_ranks(ranks: &[u8]) -> Vec<Card> {
    ranks.iter().copied().map(Card).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_ordering() {
        assert!(Card(3) > Card(2));
        assert!(Card(1) < Card(2));
        assert_eq!(Card(2), Card(2));
    }

    #[test]
    fn test_deck_composition() {
        assert_eq!(kuhn_deck().len(), 3);

        let leduc = leduc_deck();
        assert_eq!(leduc.len(), 6);
        for rank in 1..=3u8 {
            assert_eq!(leduc.iter().filter(|c| c.rank() == rank).count(), 2);
        }
    }
}
