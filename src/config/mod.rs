//! Configuration for `MapRegistry`.

/// Configuration for the `MapRegistryBuilder`
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    /// Validate independent mapping functions on the rayon thread pool
    pub parallel_validation: bool,
    /// Fail auto-registration when two methods of one set map the same type pair
    /// into the same slot instead of letting the last one win
    pub reject_shape_collisions: bool,
    /// Emit a `trace!` record for every dispatched mapping call
    pub log_dispatch: bool,
}

impl MapConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel validation
    #[must_use]
    pub fn with_parallel_validation(mut self, enabled: bool) -> Self {
        self.parallel_validation = enabled;
        self
    }

    /// Enable or disable shape collision rejection
    #[must_use]
    pub fn with_reject_shape_collisions(mut self, enabled: bool) -> Self {
        self.reject_shape_collisions = enabled;
        self
    }

    /// Enable or disable dispatch tracing
    #[must_use]
    pub fn with_log_dispatch(mut self, enabled: bool) -> Self {
        self.log_dispatch = enabled;
        self
    }
}
