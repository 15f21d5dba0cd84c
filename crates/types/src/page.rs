//! Paginated envelope used by the remote service's list endpoints.

use serde::{Deserialize, Serialize};

/// A page of results.
///
/// `next` and `previous` are full URLs carrying an opaque `cursor` query
/// parameter; `total` is only present on endpoints that report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
}
