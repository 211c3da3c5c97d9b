//! Error types for catalogue state transitions and persistence

use crate::catalogue::CatalogueId;

/// Errors raised by catalogue state transitions.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The catalogue id is not present in the registry.
    #[error("unknown catalogue: {0}")]
    UnknownCatalogue(CatalogueId),

    /// Local catalogues never participate in remote reservation.
    #[error("catalogue {0} is local and cannot be reserved remotely")]
    LocalCatalogue(CatalogueId),

    /// A reservation needs a level above `None`; release goes through
    /// `unreserve` instead.
    #[error("reserve level required for catalogue {0}")]
    LevelRequired(CatalogueId),

    /// Persistence backend failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors surfaced by the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}
