use serde::{Deserialize, Serialize};
use std::fmt;

/// Position-derived identifier of a question within one session (1-based).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(u32);

impl QuestionId {
    /// Creates a new `QuestionId`
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Builds the id for the record found at zero-based `position`.
    #[must_use]
    pub fn from_position(position: usize) -> Self {
        let id = u32::try_from(position).map_or(u32::MAX, |p| p.saturating_add(1));
        Self(id)
    }

    /// Returns the underlying u32 value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_is_one_based() {
        assert_eq!(QuestionId::from_position(0), QuestionId::new(1));
        assert_eq!(QuestionId::from_position(19).value(), 20);
    }

    #[test]
    fn displays_bare_number() {
        assert_eq!(QuestionId::new(7).to_string(), "7");
        assert_eq!(format!("{:?}", QuestionId::new(7)), "QuestionId(7)");
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&QuestionId::new(3)).unwrap();
        assert_eq!(json, "3");
    }
}
