//! Statistics collection for answer searches
//!
//! This module provides structures for collecting and reporting statistics
//! about search runs on the coordinator.

use std::time::Duration;

/// Statistics collected during a search run
#[derive(Debug, Clone)]
pub struct SearchStatistics {
    /// Number of iterations performed
    pub iterations: usize,

    /// Iterations that selected an expandable node and produced children
    pub expansions: usize,

    /// Iterations skipped because the frontier node was not expandable
    pub skipped: usize,

    /// Evaluations handed to workers over the run
    pub evaluations_dispatched: usize,

    /// Total time spent searching
    pub total_time: Duration,

    /// Total number of nodes in the tree
    pub tree_size: usize,

    /// Maximum depth reached in the tree
    pub max_depth: usize,
}

impl SearchStatistics {
    /// Creates a new, empty statistics object
    pub fn new() -> Self {
        SearchStatistics {
            iterations: 0,
            expansions: 0,
            skipped: 0,
            evaluations_dispatched: 0,
            total_time: Duration::from_secs(0),
            tree_size: 1, // Start with root node
            max_depth: 0,
        }
    }

    /// Returns the number of iterations per second
    pub fn iterations_per_second(&self) -> f64 {
        if self.total_time.as_secs_f64() <= 0.0 {
            return 0.0;
        }
        self.iterations as f64 / self.total_time.as_secs_f64()
    }

    /// Returns a summary of the statistics as a string
    pub fn summary(&self) -> String {
        format!(
            "Answer Search Statistics:\n\
             - Iterations: {} ({} expanded, {} skipped)\n\
             - Evaluations dispatched: {}\n\
             - Total time: {:.3} seconds\n\
             - Tree size: {} nodes\n\
             - Max depth: {}\n\
             - Iterations per second: {:.1}",
            self.iterations,
            self.expansions,
            self.skipped,
            self.evaluations_dispatched,
            self.total_time.as_secs_f64(),
            self.tree_size,
            self.max_depth,
            self.iterations_per_second()
        )
    }
}

impl Default for SearchStatistics {
    fn default() -> Self {
        Self::new()
    }
}
