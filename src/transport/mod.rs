//! Message transports between the coordinator and its workers
//!
//! The engine is written against the two traits defined here, so the same
//! coordinator and worker logic runs over a real distributed transport
//! ([`tcp`]) or an in-process one ([`channel`]) used in tests and
//! single-host runs.
//!
//! Both transports keep one dedicated link per worker. Results are received
//! from a named worker, never from "whoever answers first": when workers
//! finish out of order, attribution still follows the source.

pub mod channel;
pub mod tcp;

use crate::protocol::{ResultMessage, WorkMessage};

/// Errors raised by a transport
///
/// Any of these during an active round is a coordination fault: the
/// lock-step protocol has no recovery path once a round desynchronizes, so
/// callers abort the run.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// The peer hung up in the middle of a round
    #[error("connection closed mid-round")]
    Closed,

    /// Socket-level failure
    #[error("transport I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A frame could not be encoded or decoded
    #[error("invalid frame: {0}")]
    Codec(#[from] serde_json::Error),

    /// A worker index outside the configured pool
    #[error("unknown worker index {0}")]
    UnknownWorker(usize),

    /// A worker failed to identify itself correctly when connecting
    #[error("worker handshake failed: {0}")]
    Handshake(String),
}

/// Coordinator side of a transport: fan work out, collect results by source
pub trait CoordinatorTransport {
    /// Number of workers attached to this transport
    fn worker_count(&self) -> usize;

    /// Sends one work message to the worker with the given 1-based index
    fn send_work(&mut self, worker: usize, message: WorkMessage) -> Result<(), TransportError>;

    /// Blocks until the worker with the given 1-based index replies
    fn recv_result(&mut self, worker: usize) -> Result<ResultMessage, TransportError>;
}

/// Worker side of a transport: one work message in, at most one result out
pub trait WorkerTransport {
    /// Blocks for the next work message from the coordinator
    ///
    /// Returns `Ok(None)` when the coordinator shut the link down between
    /// rounds, which is the orderly end of a run rather than a fault.
    fn recv_work(&mut self) -> Result<Option<WorkMessage>, TransportError>;

    /// Sends a result message back to the coordinator
    fn send_result(&mut self, message: ResultMessage) -> Result<(), TransportError>;
}
