use serde::{Deserialize, Serialize};

/// Body of every non 2xx response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// Stable machine readable code, e.g. `expired` or `not_found`
    pub error: String,
    pub message: String,
}
