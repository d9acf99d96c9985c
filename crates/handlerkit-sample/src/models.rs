//! Widget domain types.

use serde::{Deserialize, Serialize};

/// A widget in the sample inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    /// Store-assigned identifier.
    pub id: String,
    pub name: String,
    pub quantity: i64,
}

impl Widget {
    pub fn new(id: impl Into<String>, name: impl Into<String>, quantity: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quantity,
        }
    }
}
