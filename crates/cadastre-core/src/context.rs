//! Operation context
//!
//! Identity is passed explicitly to every operation that needs it; there is
//! no ambient "current user" global.

use serde::{Deserialize, Serialize};

/// Who is performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationContext {
    pub username: String,
}

impl OperationContext {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}
