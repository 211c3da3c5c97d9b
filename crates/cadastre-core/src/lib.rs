//! Cadastre Core - versioned catalogue reservation state
//!
//! The local model of a shared, versioned catalogue whose authoritative
//! reservation state lives on a remote authority:
//! - Ordered version identifiers with forced/invalid terminal flags
//! - Per-catalogue reservation and forced-edit state
//! - A registry applying state transitions one-at-a-time per catalogue
//! - The persistence contract the relational layer fulfils

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod catalogue;
pub mod context;
pub mod error;
pub mod registry;
pub mod repository;
pub mod reserve;
pub mod version;

// Re-exports for convenience
pub use catalogue::{Catalogue, CatalogueId, ReservableStatus};
pub use context::OperationContext;
pub use error::{CoreError, RepositoryError};
pub use registry::CatalogueRegistry;
pub use repository::CatalogueRepository;
pub use reserve::{PublishLevel, Reservation, ReserveLevel};
pub use version::Version;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
