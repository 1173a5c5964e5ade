//! # answer-mcts
//!
//! A distributed Monte Carlo Tree Search over natural-language answers.
//!
//! The search starts from a deliberately weak seed answer and iteratively
//! improves it: each iteration selects a promising node by UCT, asks an
//! external text-generation service for improvement suggestions and up to
//! three rewritten candidate answers, fans the candidates out to a pool of
//! worker processes for scoring, and backpropagates visit counts up the
//! tree. After the final iteration the best-scoring root-to-leaf path is
//! reported as the answer's evolution.
//!
//! ## Roles
//!
//! One process is the **coordinator**: it owns the tree, drives iterations,
//! and collects scores. Every other process is a **worker** that blocks for
//! one work message per round, rates a single answer through the scoring
//! service, and replies with the score. Roles share nothing but the two
//! message kinds in [`protocol`]; transports are pluggable via the traits
//! in [`transport`].
//!
//! ## Basic usage
//!
//! ```
//! use std::thread;
//!
//! use answer_mcts::gateway::{GatewayError, ScoringGateway};
//! use answer_mcts::transport::channel::channel_pair;
//! use answer_mcts::{run_worker, AnswerSearch, SearchConfig};
//!
//! // A canned gateway; production code uses OpenAiGateway instead.
//! struct CannedGateway;
//!
//! impl ScoringGateway for CannedGateway {
//!     fn get_suggestions(&self, _: &str, _: &str) -> Result<Vec<String>, GatewayError> {
//!         Ok(vec![
//!             "Be more precise".to_string(),
//!             "Give an example".to_string(),
//!             "Explain the trade-off".to_string(),
//!         ])
//!     }
//!
//!     fn generate_improved_responses(
//!         &self,
//!         _: &str,
//!         response: &str,
//!         _: &[String],
//!     ) -> Result<Vec<String>, GatewayError> {
//!         Ok(vec![
//!             format!("{response}, refined"),
//!             format!("{response}, with an example"),
//!             format!("{response}, with trade-offs"),
//!         ])
//!     }
//!
//!     fn rate_response(&self, _: &str, response: &str) -> Result<f64, GatewayError> {
//!         Ok(response.len() as f64 % 100.0)
//!     }
//! }
//!
//! fn main() -> answer_mcts::Result<()> {
//!     // Three workers running in-process over the channel transport.
//!     let (mut coordinator, workers) = channel_pair(3);
//!     let handles: Vec<_> = workers
//!         .into_iter()
//!         .map(|mut endpoint| {
//!             thread::spawn(move || run_worker(&CannedGateway, &mut endpoint))
//!         })
//!         .collect();
//!
//!     let config = SearchConfig::default().with_iterations(2);
//!     let mut search = AnswerSearch::new(config, CannedGateway);
//!     let report = search.run_coordinator("What is MCTS good for?", &mut coordinator)?;
//!
//!     // Dropping the coordinator endpoint ends the workers cleanly.
//!     drop(coordinator);
//!     for handle in handles {
//!         handle.join().expect("worker thread panicked")?;
//!     }
//!
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! ## Distributed runs
//!
//! The `answer-mcts` binary wires the same engine to the TCP transport and
//! the OpenAI-compatible gateway: start one `coordinator` process and one
//! `worker` process per scoring slot, on the same host or across machines.

pub mod config;
pub mod gateway;
pub mod mcts;
pub mod policy;
pub mod protocol;
pub mod report;
pub mod stats;
pub mod transport;
pub mod tree;

pub use config::SearchConfig;
pub use gateway::{OpenAiGateway, ScoringGateway};
pub use mcts::{run_worker, AnswerSearch, IterationOutcome, SkipReason};
pub use protocol::Role;
pub use report::SearchReport;
pub use stats::SearchStatistics;
pub use tree::{NodeId, SearchTree, MAX_CHILDREN};

/// Error type for a whole search run
#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    /// A message round desynchronized or a peer vanished mid-round
    ///
    /// Fatal: the lock-step protocol has no recovery path, so the run
    /// aborts without a report.
    #[error("coordination fault: {0}")]
    Coordination(#[from] transport::TransportError),

    /// The generation backend could not be set up at startup
    #[error("initialization fault: {0}")]
    Initialization(#[from] gateway::GatewayError),
}

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
