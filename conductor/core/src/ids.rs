//! History Entry Identifiers
//!
//! Short random identifiers used to key history entries. Uniqueness is
//! probabilistic: ids are drawn from a 36-symbol alphabet and carry no
//! ordering or timing information.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Symbols ids are drawn from
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Default id length (36^10 possible ids)
pub const DEFAULT_ID_LENGTH: usize = 10;

/// Shortest id length accepted by [`IdGenerator::with_length`]
pub const MIN_ID_LENGTH: usize = 6;

/// History entry identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HistoryId(pub String);

impl HistoryId {
    /// Borrow the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HistoryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Random id generator
pub struct IdGenerator {
    rng: StdRng,
    length: usize,
}

impl IdGenerator {
    /// Create a generator seeded from OS entropy
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            length: DEFAULT_ID_LENGTH,
        }
    }

    /// Create a deterministic generator (for tests)
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            length: DEFAULT_ID_LENGTH,
        }
    }

    /// Set the id length (clamped to [`MIN_ID_LENGTH`])
    #[must_use]
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length.max(MIN_ID_LENGTH);
        self
    }

    /// Length of generated ids
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Generate a fresh id
    pub fn next_id(&mut self) -> HistoryId {
        let id: String = (0..self.length)
            .map(|_| char::from(ALPHABET[self.rng.gen_range(0..ALPHABET.len())]))
            .collect();
        HistoryId(id)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_id_shape() {
        let mut ids = IdGenerator::new();
        let id = ids.next_id();
        assert_eq!(id.as_str().len(), DEFAULT_ID_LENGTH);
        assert!(id
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
    }

    #[test]
    fn test_ten_thousand_ids_unique() {
        let mut ids = IdGenerator::from_seed(0x5eed);
        let generated: HashSet<HistoryId> = (0..10_000).map(|_| ids.next_id()).collect();
        assert_eq!(generated.len(), 10_000);
    }

    #[test]
    fn test_seeded_generators_repeat() {
        let mut a = IdGenerator::from_seed(7);
        let mut b = IdGenerator::from_seed(7);
        assert_eq!(a.next_id(), b.next_id());
    }

    #[test]
    fn test_length_is_clamped() {
        let ids = IdGenerator::from_seed(1).with_length(2);
        assert_eq!(ids.length(), MIN_ID_LENGTH);

        let mut ids = IdGenerator::from_seed(1).with_length(7);
        assert_eq!(ids.next_id().as_str().len(), 7);
    }
}
