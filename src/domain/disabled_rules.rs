//! Disabled sell-rule index set.
//!
//! Stored as `idx{;idx}*` of 0-based indices; the empty string is the empty set.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::ParseError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisabledRules {
    indices: BTreeSet<usize>,
}

impl DisabledRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_indices<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        Self {
            indices: indices.into_iter().collect(),
        }
    }

    /// Decode the stored form. Empty tokens are ignored.
    pub fn decode(input: &str) -> Result<Self, ParseError> {
        let mut indices = BTreeSet::new();
        let mut token_start = 0usize;
        for raw in input.split(';') {
            let position = token_start + (raw.len() - raw.trim_start().len());
            token_start += raw.len() + 1;
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }
            let index = token.parse::<usize>().map_err(|_| ParseError {
                message: format!("invalid rule index '{}'", token),
                position,
            })?;
            indices.insert(index);
        }
        Ok(Self { indices })
    }

    /// Encode in ascending order.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Flip one index. Returns `true` if the rule is now enabled.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.indices.remove(&index) {
            true
        } else {
            self.indices.insert(index);
            false
        }
    }
}

impl fmt::Display for DisabledRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .indices
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(";");
        f.write_str(&joined)
    }
}

impl FromStr for DisabledRules {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_empty_set() {
        let set = DisabledRules::decode("").unwrap();
        assert!(set.is_empty());
        assert_eq!(set.encode(), "");
    }

    #[test]
    fn decode_and_encode_sorted() {
        let set = DisabledRules::decode("3;0;1").unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains(0));
        assert!(!set.contains(2));
        assert_eq!(set.encode(), "0;1;3");
    }

    #[test]
    fn decode_tolerates_blank_tokens() {
        let set = DisabledRules::decode("1;;2;").unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = DisabledRules::decode("1;x").unwrap_err();
        assert_eq!(err.position, 2);
        assert!(err.message.contains("'x'"));
        assert!(DisabledRules::decode("-1").is_err());
    }

    #[test]
    fn toggle_flips_membership() {
        let mut set = DisabledRules::new();
        assert!(!set.toggle(2));
        assert!(set.contains(2));
        assert!(set.toggle(2));
        assert!(!set.contains(2));
    }

    #[test]
    fn from_str_matches_decode() {
        let set: DisabledRules = "0;4".parse().unwrap();
        assert_eq!(set, DisabledRules::from_indices([4, 0]));
    }
}
