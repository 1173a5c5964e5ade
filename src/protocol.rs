//! Roles and wire messages of the coordination protocol
//!
//! One process per role: a single coordinator that owns the tree, and a
//! fixed set of workers that each score at most one answer per iteration.
//! All coordination happens through the two message kinds defined here.

use serde::{Deserialize, Serialize};

/// Identity of a process in the distributed run
///
/// The role is decided once at startup and passed into the entry points;
/// nothing downstream branches on a raw process index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Owns the search tree and drives iterations
    Coordinator,

    /// Scores one answer per round on request; indices start at 1
    Worker(usize),
}

/// A work message sent from the coordinator to one worker
///
/// Every worker receives exactly one work message per evaluation round,
/// either an answer to score or an explicit idle marker when there are
/// fewer new children than workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkMessage {
    /// Score `response` as an answer to `question`
    Evaluate { question: String, response: String },

    /// Nothing to score this round; send no reply
    Idle,
}

/// A result message sent from a worker back to the coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    /// Quality score in [0, 100]
    pub score: f64,
}

/// Handshake frame a worker sends right after connecting over TCP
///
/// Lets the coordinator map connections to worker indices regardless of
/// accept order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hello {
    /// The worker's index, 1-based
    pub index: usize,
}
