//! Catalogue records and their reservation state
//!
//! A catalogue carries the subset of state relevant to remote coordination:
//! the committed version, the optional reservation granted by the authority,
//! and the optional forced-edit grant issued optimistically while the
//! authority is still processing.

use crate::error::CoreError;
use crate::reserve::{PublishLevel, Reservation, ReserveLevel};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Unique catalogue identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CatalogueId(pub Ulid);

impl CatalogueId {
    /// Generate a new catalogue id.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for CatalogueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CatalogueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a catalogue is (or is not) available for reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservableStatus {
    /// Nothing blocks a reservation.
    Free,
    /// Local catalogues never participate in remote reservation.
    Local,
    /// The version carries edits the authority rejected; manual
    /// reconciliation is needed before reserving again.
    Invalid,
    /// An optimistic forced-edit session is in flight.
    ForcedEditing(String),
    /// Someone holds a confirmed reservation.
    ReservedBy(String),
}

impl ReservableStatus {
    /// Whether a new reservation request can be issued right now.
    #[inline]
    #[must_use]
    pub fn is_free(&self) -> bool {
        matches!(self, ReservableStatus::Free)
    }
}

/// A catalogue as seen by the coordination core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalogue {
    pub id: CatalogueId,
    /// Short mnemonic shown in logs.
    pub code: String,
    pub version: Version,
    /// Reservation confirmed by the authority, if any.
    pub reserved_by: Option<Reservation>,
    /// Optimistic forced-edit grant, if any.
    pub forced_edit: Option<Reservation>,
    /// Local-only catalogues are outside the authority's jurisdiction.
    pub local: bool,
}

impl Catalogue {
    /// Create a remote-managed catalogue at the given version.
    #[must_use]
    pub fn new(code: impl Into<String>, version: Version) -> Self {
        Self {
            id: CatalogueId::new(),
            code: code.into(),
            version,
            reserved_by: None,
            forced_edit: None,
            local: false,
        }
    }

    /// Mark as local-only.
    #[must_use]
    pub fn local(mut self) -> Self {
        self.local = true;
        self
    }

    /// Record a reservation confirmed by the authority.
    pub fn reserve(&mut self, username: &str, level: ReserveLevel) -> Result<(), CoreError> {
        self.ensure_remote()?;
        if !level.grants_editing() {
            return Err(CoreError::LevelRequired(self.id));
        }
        self.reserved_by = Some(Reservation::new(username, level));
        Ok(())
    }

    /// Release the current reservation, if any.
    pub fn unreserve(&mut self) -> Result<(), CoreError> {
        self.ensure_remote()?;
        self.reserved_by = None;
        Ok(())
    }

    /// Grant an optimistic local editing session before the authority has
    /// answered. Increments the version's internal segment and the running
    /// forced-session counter.
    pub fn force_edit(&mut self, username: &str, level: ReserveLevel) -> Result<(), CoreError> {
        self.ensure_remote()?;
        if !level.grants_editing() {
            return Err(CoreError::LevelRequired(self.id));
        }
        let count = self.version.forced_count() + 1;
        self.version.force(count);
        self.forced_edit = Some(Reservation::new(username, level));
        Ok(())
    }

    /// The authority confirmed the forced session: keep the edits, clear
    /// the flags and the grant.
    pub fn confirm(&mut self) {
        self.version.confirm();
        self.forced_edit = None;
    }

    /// The authority rejected the forced session: flag the version, keep
    /// the data for manual reconciliation.
    pub fn invalidate(&mut self) {
        self.version.invalidate();
        self.forced_edit = None;
    }

    /// Apply the version increment for a confirmed publish.
    pub fn publish(&mut self, level: PublishLevel) -> Result<(), CoreError> {
        self.ensure_remote()?;
        match level {
            PublishLevel::Minor => self.version.publish_minor(),
            PublishLevel::Major => self.version.publish_major(),
        }
        Ok(())
    }

    /// What currently blocks a reservation on this catalogue, if anything.
    #[must_use]
    pub fn reservable_status(&self) -> ReservableStatus {
        if self.local {
            return ReservableStatus::Local;
        }
        if self.version.is_invalid() {
            return ReservableStatus::Invalid;
        }
        if let Some(grant) = &self.forced_edit {
            return ReservableStatus::ForcedEditing(grant.username.clone());
        }
        if let Some(reservation) = &self.reserved_by {
            return ReservableStatus::ReservedBy(reservation.username.clone());
        }
        ReservableStatus::Free
    }

    fn ensure_remote(&self) -> Result<(), CoreError> {
        if self.local {
            return Err(CoreError::LocalCatalogue(self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> Catalogue {
        Catalogue::new("TAX", Version::parse("2.3"))
    }

    #[test]
    fn reserve_records_holder_and_level() {
        let mut cat = catalogue();
        cat.reserve("alice", ReserveLevel::Major).unwrap();
        assert_eq!(
            cat.reserved_by,
            Some(Reservation::new("alice", ReserveLevel::Major))
        );
        assert_eq!(
            cat.reservable_status(),
            ReservableStatus::ReservedBy("alice".to_string())
        );
    }

    #[test]
    fn reserve_rejects_none_level() {
        let mut cat = catalogue();
        assert!(matches!(
            cat.reserve("alice", ReserveLevel::None),
            Err(CoreError::LevelRequired(_))
        ));
    }

    #[test]
    fn local_catalogue_rejects_remote_operations() {
        let mut cat = catalogue().local();
        assert!(matches!(
            cat.reserve("alice", ReserveLevel::Minor),
            Err(CoreError::LocalCatalogue(_))
        ));
        assert!(matches!(
            cat.force_edit("alice", ReserveLevel::Minor),
            Err(CoreError::LocalCatalogue(_))
        ));
        assert_eq!(cat.reservable_status(), ReservableStatus::Local);
    }

    #[test]
    fn force_edit_increments_counter_and_version() {
        let mut cat = catalogue();
        cat.force_edit("bob", ReserveLevel::Minor).unwrap();
        assert_eq!(cat.version.forced_count(), 1);
        assert_eq!(cat.version.to_string(), "2.3.1.TEMP");
        assert_eq!(
            cat.reservable_status(),
            ReservableStatus::ForcedEditing("bob".to_string())
        );

        cat.force_edit("bob", ReserveLevel::Minor).unwrap();
        assert_eq!(cat.version.forced_count(), 2);
        assert_eq!(cat.version.to_string(), "2.3.2.TEMP");
    }

    #[test]
    fn confirm_clears_grant_and_flags() {
        let mut cat = catalogue();
        cat.force_edit("bob", ReserveLevel::Minor).unwrap();
        cat.confirm();
        assert!(cat.forced_edit.is_none());
        assert!(!cat.version.is_forced());
        assert_eq!(cat.version.to_string(), "2.3.1");
        assert!(cat.reservable_status().is_free());
    }

    #[test]
    fn invalidate_blocks_further_reservation() {
        let mut cat = catalogue();
        cat.force_edit("bob", ReserveLevel::Major).unwrap();
        cat.invalidate();
        assert_eq!(cat.reservable_status(), ReservableStatus::Invalid);
        assert_eq!(cat.version.to_string(), "2.3.1.NULL");
    }

    #[test]
    fn publish_increments_version() {
        let mut cat = catalogue();
        cat.publish(PublishLevel::Minor).unwrap();
        assert_eq!(cat.version.to_string(), "2.4.0");
        cat.publish(PublishLevel::Major).unwrap();
        assert_eq!(cat.version.to_string(), "3.0.0");
    }
}
