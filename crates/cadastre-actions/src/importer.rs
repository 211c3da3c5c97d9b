//! Collaborators for version import and local update files

use crate::error::TransportError;
use cadastre_core::{CatalogueId, Version};

/// Fetches a newer internal version of a catalogue from the authority.
///
/// Invoked as an asynchronous sub-step while an action is in the
/// `ImportingLastVersion` status; a transport failure here aborts the
/// action with `Error` without terminating the remote-side ticket.
#[async_trait::async_trait]
pub trait VersionImporter: Send + Sync {
    async fn import_latest(
        &self,
        catalogue_id: CatalogueId,
        version: &Version,
    ) -> Result<(), TransportError>;
}

/// Produces the local updates file the download variant submits back to
/// the authority as a nested upload.
#[async_trait::async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch_updates(&self, catalogue_id: CatalogueId) -> Result<Vec<u8>, TransportError>;
}
