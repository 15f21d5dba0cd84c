use serde::{Deserialize, Serialize};

/// A hardware tier that models can run on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hardware {
    pub name: String,
    pub sku: String,
}
