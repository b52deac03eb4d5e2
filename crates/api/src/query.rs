//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// `?limit=` on list endpoints.
///
/// Kept as a string so a non-numeric value means "no limit" instead of a
/// rejected request.
#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<String>,
}

impl LimitParams {
    /// The limit if it parses as a positive integer.
    pub fn limit(&self) -> Option<usize> {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
    }

    pub fn limit_or(&self, default: usize) -> usize {
        self.limit().unwrap_or(default)
    }
}
