//! In-process transport over `std::sync::mpsc` channels
//!
//! Each worker gets its own work/result channel pair, which keeps result
//! attribution by source trivially correct. Used by the test suite and for
//! running the whole pool inside one process.

use std::sync::mpsc::{channel, Receiver, Sender};

use crate::protocol::{ResultMessage, WorkMessage};
use crate::transport::{CoordinatorTransport, TransportError, WorkerTransport};

struct WorkerLink {
    work_tx: Sender<WorkMessage>,
    result_rx: Receiver<ResultMessage>,
}

/// Coordinator end of an in-process transport
pub struct ChannelCoordinator {
    workers: Vec<WorkerLink>,
}

/// Worker end of an in-process transport
pub struct ChannelWorker {
    work_rx: Receiver<WorkMessage>,
    result_tx: Sender<ResultMessage>,
}

/// Creates a coordinator endpoint plus one endpoint per worker
///
/// Worker endpoints are returned in index order: the first element serves
/// worker 1, and so on. Dropping the coordinator endpoint closes every work
/// channel, which workers observe as an orderly shutdown.
pub fn channel_pair(worker_count: usize) -> (ChannelCoordinator, Vec<ChannelWorker>) {
    let mut links = Vec::with_capacity(worker_count);
    let mut endpoints = Vec::with_capacity(worker_count);

    for _ in 0..worker_count {
        let (work_tx, work_rx) = channel();
        let (result_tx, result_rx) = channel();
        links.push(WorkerLink { work_tx, result_rx });
        endpoints.push(ChannelWorker { work_rx, result_tx });
    }

    (ChannelCoordinator { workers: links }, endpoints)
}

impl ChannelCoordinator {
    fn link(&self, worker: usize) -> Result<&WorkerLink, TransportError> {
        // Worker indices are 1-based; index 0 is the coordinator itself.
        worker
            .checked_sub(1)
            .and_then(|i| self.workers.get(i))
            .ok_or(TransportError::UnknownWorker(worker))
    }
}

impl CoordinatorTransport for ChannelCoordinator {
    fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn send_work(&mut self, worker: usize, message: WorkMessage) -> Result<(), TransportError> {
        self.link(worker)?
            .work_tx
            .send(message)
            .map_err(|_| TransportError::Closed)
    }

    fn recv_result(&mut self, worker: usize) -> Result<ResultMessage, TransportError> {
        self.link(worker)?
            .result_rx
            .recv()
            .map_err(|_| TransportError::Closed)
    }
}

impl WorkerTransport for ChannelWorker {
    fn recv_work(&mut self) -> Result<Option<WorkMessage>, TransportError> {
        // A closed work channel means the coordinator is gone for good,
        // which between rounds is the normal end of a run.
        Ok(self.work_rx.recv().ok())
    }

    fn send_result(&mut self, message: ResultMessage) -> Result<(), TransportError> {
        self.result_tx
            .send(message)
            .map_err(|_| TransportError::Closed)
    }
}
