//! Catalogue version identifiers
//!
//! A version is an ordered tuple of numeric segments (`major.minor.internal`)
//! with two terminal flags layered on top:
//! - `forced` marks an uncommitted edit state created locally before the
//!   remote authority confirmed the operation
//! - `invalid` marks a forced state the authority later rejected
//!
//! The flags are mutually exclusive and only move through [`Version::force`],
//! [`Version::invalidate`] and [`Version::confirm`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Index of the internal segment within the numeric tuple.
const INTERNAL_SEGMENT: usize = 2;

/// Rendered in place of a numeric tuple that could not be parsed.
const NOT_APPLICABLE: &str = "N/A";

/// Suffix for an uncommitted forced edit state.
const FORCED_SUFFIX: &str = "TEMP";

/// Suffix for a forced state rejected by the authority.
const INVALID_SUFFIX: &str = "NULL";

/// Ordered, comparable catalogue version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    /// Numeric tuple; empty when the source string was unparseable.
    segments: Vec<u64>,
    forced: bool,
    invalid: bool,
    forced_count: u32,
}

impl Version {
    /// Build a version from an explicit numeric tuple.
    #[must_use]
    pub fn new(segments: Vec<u64>) -> Self {
        Self {
            segments,
            forced: false,
            invalid: false,
            forced_count: 0,
        }
    }

    /// Parse a dotted numeric tuple such as `"2.3"` or `"2.3.1"`.
    ///
    /// A string that is not a plain numeric tuple yields the
    /// not-applicable sentinel rather than an error; catalogues loaded
    /// from legacy data keep working, they just render as `N/A`.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Self::not_applicable();
        }
        let mut segments = Vec::new();
        for part in trimmed.split('.') {
            match part.parse::<u64>() {
                Ok(n) => segments.push(n),
                Err(_) => return Self::not_applicable(),
            }
        }
        Self::new(segments)
    }

    /// The sentinel for a catalogue whose version tuple cannot be parsed.
    #[must_use]
    pub fn not_applicable() -> Self {
        Self::new(Vec::new())
    }

    /// Whether the numeric tuple was parseable.
    #[inline]
    #[must_use]
    pub fn is_applicable(&self) -> bool {
        !self.segments.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn is_forced(&self) -> bool {
        self.forced
    }

    #[inline]
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Number of forced edit sessions accumulated on this version.
    ///
    /// Meaningful only while `forced` or `invalid` is set.
    #[inline]
    #[must_use]
    pub fn forced_count(&self) -> u32 {
        self.forced_count
    }

    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// Enter a forced edit state.
    ///
    /// Sets `forced`, clears `invalid`, increments the internal segment by
    /// one and records `count` as the running forced-session counter.
    pub fn force(&mut self, count: u32) {
        self.pad_to(INTERNAL_SEGMENT + 1);
        self.segments[INTERNAL_SEGMENT] += 1;
        self.forced = true;
        self.invalid = false;
        self.forced_count = count;
    }

    /// Mark a forced state as rejected by the authority.
    ///
    /// Idempotent; the edits made under forcing are flagged, never deleted.
    pub fn invalidate(&mut self) {
        self.invalid = true;
        self.forced = false;
    }

    /// Accept a forced state: clear both flags and reset the counter.
    ///
    /// The internal increments applied by [`Version::force`] are retained.
    pub fn confirm(&mut self) {
        self.forced = false;
        self.invalid = false;
        self.forced_count = 0;
    }

    /// Version increment for a minor publish: bump the minor segment and
    /// reset the internal one.
    pub fn publish_minor(&mut self) {
        self.pad_to(2);
        self.segments[1] += 1;
        self.reset_internal();
        self.confirm();
    }

    /// Version increment for a major publish: bump the major segment and
    /// reset everything below it.
    pub fn publish_major(&mut self) {
        self.pad_to(1);
        self.segments[0] += 1;
        for segment in self.segments.iter_mut().skip(1) {
            *segment = 0;
        }
        self.confirm();
    }

    /// Compare the numeric tuples alone, zero-padding the shorter one.
    #[must_use]
    pub fn numeric_cmp(&self, other: &Version) -> Ordering {
        Self::cmp_tuples(&self.segments, &other.segments)
    }

    /// Compare the numeric tuples with forced increments backed out.
    ///
    /// A forced version is numerically ahead of the state the authority
    /// knows about; comparisons against an authority-reported version must
    /// use the pre-force tuple or every forced session would look diverged.
    #[must_use]
    pub fn base_numeric_cmp(&self, other: &Version) -> Ordering {
        Self::cmp_tuples(&self.base_segments(), &other.base_segments())
    }

    fn base_segments(&self) -> Vec<u64> {
        let mut segments = self.segments.clone();
        if (self.forced || self.invalid) && segments.len() > INTERNAL_SEGMENT {
            let backed_out = segments[INTERNAL_SEGMENT].saturating_sub(u64::from(self.forced_count));
            segments[INTERNAL_SEGMENT] = backed_out;
        }
        segments
    }

    fn cmp_tuples(a: &[u64], b: &[u64]) -> Ordering {
        let len = a.len().max(b.len());
        for i in 0..len {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            match left.cmp(&right) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }

    /// Tie-break rank: invalid sorts oldest, forced next, committed newest.
    fn rank(&self) -> u8 {
        if self.invalid {
            0
        } else if self.forced {
            1
        } else {
            2
        }
    }

    fn pad_to(&mut self, len: usize) {
        while self.segments.len() < len {
            self.segments.push(0);
        }
    }

    fn reset_internal(&mut self) {
        for segment in self.segments.iter_mut().skip(INTERNAL_SEGMENT) {
            *segment = 0;
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numeric_cmp(other)
            .then_with(|| self.rank().cmp(&other.rank()))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_applicable() {
            return write!(f, "{NOT_APPLICABLE}");
        }
        let tuple = self
            .segments
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".");
        if self.forced {
            write!(f, "{tuple}.{FORCED_SUFFIX}")
        } else if self.invalid {
            write!(f, "{tuple}.{INVALID_SUFFIX}")
        } else {
            write!(f, "{tuple}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_numeric_tuple() {
        let v = Version::parse("2.3");
        assert_eq!(v.segments(), &[2, 3]);
        assert!(!v.is_forced());
        assert!(!v.is_invalid());
    }

    #[test]
    fn parse_garbage_is_not_applicable() {
        assert!(!Version::parse("two.three").is_applicable());
        assert!(!Version::parse("").is_applicable());
        assert_eq!(Version::parse("2.x.1").to_string(), "N/A");
    }

    #[test]
    fn force_renders_temp_suffix() {
        let mut v = Version::parse("2.3");
        v.force(1);
        assert_eq!(v.to_string(), "2.3.1.TEMP");
        assert_eq!(v.forced_count(), 1);
    }

    #[test]
    fn invalidate_renders_null_suffix() {
        let mut v = Version::parse("2.3");
        v.force(1);
        v.invalidate();
        assert_eq!(v.to_string(), "2.3.1.NULL");
        assert!(!v.is_forced());
    }

    #[test]
    fn invalidate_is_idempotent() {
        let mut v = Version::parse("2.3");
        v.force(1);
        v.invalidate();
        let once = v.clone();
        v.invalidate();
        assert_eq!(v.is_invalid(), once.is_invalid());
        assert_eq!(v.is_forced(), once.is_forced());
        assert_eq!(v.to_string(), once.to_string());
    }

    #[test]
    fn confirm_keeps_internal_increment() {
        let mut v = Version::parse("2.3");
        v.force(1);
        v.confirm();
        assert!(!v.is_forced());
        assert!(!v.is_invalid());
        assert_eq!(v.forced_count(), 0);
        assert_eq!(v.segments(), &[2, 3, 1]);
    }

    #[test]
    fn repeated_force_accumulates() {
        let mut v = Version::parse("1.0");
        v.force(1);
        v.force(2);
        assert_eq!(v.segments(), &[1, 0, 2]);
        assert_eq!(v.forced_count(), 2);
        assert_eq!(v.to_string(), "1.0.2.TEMP");
    }

    #[test]
    fn base_comparison_backs_out_forcing() {
        let mut forced = Version::parse("2.3");
        forced.force(1);
        let authority = Version::parse("2.3");
        assert_eq!(forced.base_numeric_cmp(&authority), Ordering::Equal);

        let newer = Version::parse("2.3.2");
        assert_eq!(forced.base_numeric_cmp(&newer), Ordering::Less);
    }

    #[test]
    fn ordering_pads_missing_segments() {
        assert_eq!(Version::parse("2.3"), Version::parse("2.3.0"));
        assert!(Version::parse("2.3.1") > Version::parse("2.3"));
    }

    #[test]
    fn invalid_sorts_older_than_valid() {
        let mut invalid = Version::parse("2.3.1");
        invalid.invalidate();
        let valid = Version::parse("2.3.1");
        assert!(invalid < valid);
    }

    #[test]
    fn forced_sorts_older_than_unforced() {
        let mut forced = Version::parse("2.3");
        forced.force(1);
        let plain = Version::parse("2.3.1");
        assert!(forced < plain);

        let mut invalid = forced.clone();
        invalid.invalidate();
        assert!(invalid < forced);
    }

    #[test]
    fn publish_minor_bumps_and_resets_internal() {
        let mut v = Version::parse("2.3.4");
        v.publish_minor();
        assert_eq!(v.segments(), &[2, 4, 0]);
        assert_eq!(v.to_string(), "2.4.0");
    }

    #[test]
    fn publish_major_resets_lower_segments() {
        let mut v = Version::parse("2.3.4");
        v.publish_major();
        assert_eq!(v.segments(), &[3, 0, 0]);
    }

    #[test]
    fn publish_clears_forced_state() {
        let mut v = Version::parse("2.3");
        v.force(1);
        v.publish_minor();
        assert!(!v.is_forced());
        assert_eq!(v.forced_count(), 0);
    }
}
