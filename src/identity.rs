use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric identity of a key (djb2 over the key's bytes).
///
/// Identities are not collision free. The graph resolves keys by exact
/// comparison, so two keys that share an identity are still two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub u64);

impl Identity {
    pub fn of(key: &str) -> Self {
        let mut hash: u64 = 5381;
        for &byte in key.as_bytes() {
            // hash * 33 + c
            hash = (hash << 5).wrapping_add(hash).wrapping_add(u64::from(byte));
        }
        Identity(hash)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_seed() {
        assert_eq!(Identity::of(""), Identity(5381));
    }

    #[test]
    fn matches_djb2() {
        // 5381 * 33 + 'a'
        assert_eq!(Identity::of("a"), Identity(177_670));
        assert_eq!(Identity::of("ab"), Identity(177_670 * 33 + 98));
    }

    #[test]
    fn known_collision() {
        // 'A' * 33 + 'a' == 'B' * 33 + '@'
        assert_eq!(Identity::of("Aa"), Identity::of("B@"));
        assert_ne!(Identity::of("Aa"), Identity::of("BB"));
    }
}
