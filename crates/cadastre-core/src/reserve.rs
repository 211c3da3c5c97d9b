//! Reservation and publish levels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested reservation depth for a catalogue.
///
/// `None` is a valid request payload: it asks the authority to release an
/// existing reservation rather than take one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReserveLevel {
    /// Release the current reservation.
    None,
    /// Reserve for minor editing.
    Minor,
    /// Reserve for major editing.
    Major,
}

impl ReserveLevel {
    /// Whether this level grants editing rights at all.
    #[inline]
    #[must_use]
    pub fn grants_editing(self) -> bool {
        self != ReserveLevel::None
    }
}

impl fmt::Display for ReserveLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReserveLevel::None => write!(f, "none"),
            ReserveLevel::Minor => write!(f, "minor"),
            ReserveLevel::Major => write!(f, "major"),
        }
    }
}

/// Publish depth: which segment of the version tuple is incremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublishLevel {
    Minor,
    Major,
}

impl fmt::Display for PublishLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishLevel::Minor => write!(f, "minor"),
            PublishLevel::Major => write!(f, "major"),
        }
    }
}

/// A granted reservation: who holds it and at what depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub username: String,
    pub level: ReserveLevel,
}

impl Reservation {
    #[must_use]
    pub fn new(username: impl Into<String>, level: ReserveLevel) -> Self {
        Self {
            username: username.into(),
            level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_grants_no_editing() {
        assert!(!ReserveLevel::None.grants_editing());
        assert!(ReserveLevel::Minor.grants_editing());
        assert!(ReserveLevel::Major.grants_editing());
    }

    #[test]
    fn levels_are_ordered_by_depth() {
        assert!(ReserveLevel::None < ReserveLevel::Minor);
        assert!(ReserveLevel::Minor < ReserveLevel::Major);
    }
}
