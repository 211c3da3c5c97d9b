//! Persistence contract for catalogues
//!
//! The relational layer is an external collaborator; only its contract is
//! used here. Every state transition in the registry persists through this
//! trait before the per-catalogue lock is released.

use crate::catalogue::Catalogue;
use crate::error::RepositoryError;

/// Durable storage for catalogue records.
#[async_trait::async_trait]
pub trait CatalogueRepository: Send + Sync {
    /// Load every known catalogue at startup.
    async fn load_all(&self) -> Result<Vec<Catalogue>, RepositoryError>;

    /// Persist the full current state of one catalogue.
    async fn save(&self, catalogue: &Catalogue) -> Result<(), RepositoryError>;
}
