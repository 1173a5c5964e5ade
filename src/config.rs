//! Configuration options for the answer search
//!
//! This module defines the run parameters of the search. Use the builder
//! methods to customize a configuration.

/// Configuration for one search run
///
/// # Example
///
/// ```
/// use answer_mcts::SearchConfig;
///
/// let config = SearchConfig::default()
///     .with_iterations(5)
///     .with_seed_response("No idea yet")
///     .with_model("llama-3.2-1b-preview");
/// ```
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of MCTS iterations the coordinator runs
    ///
    /// Workers follow the coordinator round by round, so this is also the
    /// upper bound on scoring rounds each worker serves.
    pub iterations: usize,

    /// Answer text seeded into the root node
    ///
    /// The search starts from a deliberately weak answer and improves on it.
    pub seed_response: String,

    /// Model name sent to the generation service
    pub model: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            iterations: 3,
            seed_response: "I don't know".to_string(),
            model: "llama-3.2-1b-preview".to_string(),
        }
    }
}

impl SearchConfig {
    /// Sets the number of iterations
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the root seed answer
    pub fn with_seed_response(mut self, response: impl Into<String>) -> Self {
        self.seed_response = response.into();
        self
    }

    /// Sets the generation model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}
