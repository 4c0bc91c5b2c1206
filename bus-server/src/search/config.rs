//! Search configuration for trip matching.

/// Configuration parameters for trip search.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Only match trips that call at a "from" stop strictly before a "to"
    /// stop.
    ///
    /// Off by default: a trip matches when it calls at both, in either
    /// order.
    pub enforce_direction: bool,
}

impl SearchConfig {
    /// Create a new configuration.
    pub fn new(enforce_direction: bool) -> Self {
        Self { enforce_direction }
    }

    /// Set whether direction is enforced.
    pub fn with_enforce_direction(mut self, enforce: bool) -> Self {
        self.enforce_direction = enforce;
        self
    }
}
