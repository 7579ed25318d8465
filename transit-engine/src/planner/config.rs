//! Configuration for direct-trip suggestions.

/// Configuration parameters for suggestion search.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// How far from each endpoint a stop may be (meters).
    pub search_radius_meters: f64,

    /// Maximum number of suggestions to return. `None` returns all.
    pub max_results: Option<usize>,
}

impl PlannerConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(search_radius_meters: f64, max_results: Option<usize>) -> Self {
        Self {
            search_radius_meters,
            max_results,
        }
    }

    pub fn with_search_radius(mut self, meters: f64) -> Self {
        self.search_radius_meters = meters;
        self
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            search_radius_meters: 1000.0,
            max_results: None,
        }
    }
}
