//! TCP transport with newline-delimited JSON frames
//!
//! The coordinator binds a listening socket and waits until every worker
//! index has checked in with a [`Hello`] frame; workers connect and identify
//! themselves. One frame is one serialized message terminated by a newline.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::protocol::{Hello, ResultMessage, WorkMessage};
use crate::transport::{CoordinatorTransport, TransportError, WorkerTransport};

struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Connection {
    fn new(stream: TcpStream) -> Result<Self, TransportError> {
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Connection {
            reader,
            writer: stream,
        })
    }

    fn write_frame<T: Serialize>(&mut self, value: &T) -> Result<(), TransportError> {
        let mut frame = serde_json::to_string(value)?;
        frame.push('\n');
        self.writer.write_all(frame.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Reads one frame; `Ok(None)` on a clean EOF before any bytes arrive
    fn read_frame<T: DeserializeOwned>(&mut self) -> Result<Option<T>, TransportError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(line.trim_end())?))
    }
}

/// Listening socket from which a coordinator transport is assembled
///
/// Binding and accepting are split so callers can learn the bound address
/// (for instance with port 0) before workers start connecting.
pub struct CoordinatorListener {
    listener: TcpListener,
}

impl CoordinatorListener {
    /// Binds the listening socket
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)?;
        Ok(CoordinatorListener { listener })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    /// Blocks until all `worker_count` workers have connected
    ///
    /// Workers may connect in any order; the `Hello` handshake maps each
    /// connection to its index. Duplicate or out-of-range indices fail the
    /// whole startup, since a mismatched pool can never reach lock-step.
    pub fn accept_workers(self, worker_count: usize) -> Result<TcpCoordinator, TransportError> {
        info!(
            "coordinator listening on {}, waiting for {worker_count} workers",
            self.listener.local_addr()?
        );

        let mut slots: Vec<Option<Connection>> = Vec::new();
        slots.resize_with(worker_count, || None);
        let mut connected = 0;

        while connected < worker_count {
            let (stream, peer) = self.listener.accept()?;
            let mut connection = Connection::new(stream)?;

            let hello: Hello = connection
                .read_frame()?
                .ok_or_else(|| TransportError::Handshake(format!("{peer} closed before hello")))?;

            let slot = hello
                .index
                .checked_sub(1)
                .and_then(|i| slots.get_mut(i))
                .ok_or_else(|| {
                    TransportError::Handshake(format!("worker index {} out of range", hello.index))
                })?;
            if slot.is_some() {
                return Err(TransportError::Handshake(format!(
                    "worker index {} connected twice",
                    hello.index
                )));
            }

            debug!("worker {} connected from {peer}", hello.index);
            *slot = Some(connection);
            connected += 1;
        }

        let workers = slots
            .into_iter()
            .map(|slot| slot.expect("all slots filled"))
            .collect();
        Ok(TcpCoordinator { workers })
    }
}

/// Coordinator end of the TCP transport
pub struct TcpCoordinator {
    workers: Vec<Connection>,
}

impl TcpCoordinator {
    /// Binds `addr` and blocks until all `worker_count` workers connect
    pub fn bind(addr: impl ToSocketAddrs, worker_count: usize) -> Result<Self, TransportError> {
        CoordinatorListener::bind(addr)?.accept_workers(worker_count)
    }

    fn connection(&mut self, worker: usize) -> Result<&mut Connection, TransportError> {
        worker
            .checked_sub(1)
            .and_then(|i| self.workers.get_mut(i))
            .ok_or(TransportError::UnknownWorker(worker))
    }
}

impl CoordinatorTransport for TcpCoordinator {
    fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn send_work(&mut self, worker: usize, message: WorkMessage) -> Result<(), TransportError> {
        self.connection(worker)?.write_frame(&message)
    }

    fn recv_result(&mut self, worker: usize) -> Result<ResultMessage, TransportError> {
        // EOF while a result is owed is a desynchronized round, not a
        // shutdown.
        self.connection(worker)?
            .read_frame()?
            .ok_or(TransportError::Closed)
    }
}

/// Worker end of the TCP transport
pub struct TcpWorker {
    connection: Connection,
}

impl TcpWorker {
    /// Connects to the coordinator and identifies as worker `index`
    pub fn connect(addr: impl ToSocketAddrs, index: usize) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)?;
        let mut connection = Connection::new(stream)?;
        connection.write_frame(&Hello { index })?;
        info!("worker {index} connected to coordinator");
        Ok(TcpWorker { connection })
    }
}

impl WorkerTransport for TcpWorker {
    fn recv_work(&mut self) -> Result<Option<WorkMessage>, TransportError> {
        self.connection.read_frame()
    }

    fn send_result(&mut self, message: ResultMessage) -> Result<(), TransportError> {
        self.connection.write_frame(&message)
    }
}
