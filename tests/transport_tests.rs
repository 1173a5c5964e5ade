use std::thread;

use answer_mcts::protocol::{ResultMessage, WorkMessage};
use answer_mcts::transport::channel::channel_pair;
use answer_mcts::transport::tcp::{CoordinatorListener, TcpWorker};
use answer_mcts::transport::{CoordinatorTransport, TransportError, WorkerTransport};

fn evaluate(question: &str, response: &str) -> WorkMessage {
    WorkMessage::Evaluate {
        question: question.to_string(),
        response: response.to_string(),
    }
}

#[test]
fn test_channel_round_delivers_work_and_idle() {
    let (mut coordinator, mut workers) = channel_pair(2);
    assert_eq!(coordinator.worker_count(), 2);

    coordinator.send_work(1, evaluate("q", "a")).unwrap();
    coordinator.send_work(2, WorkMessage::Idle).unwrap();

    assert_eq!(workers[0].recv_work().unwrap(), Some(evaluate("q", "a")));
    assert_eq!(workers[1].recv_work().unwrap(), Some(WorkMessage::Idle));
}

#[test]
fn test_channel_results_match_by_source_not_arrival() {
    let (mut coordinator, mut workers) = channel_pair(2);

    coordinator.send_work(1, evaluate("q", "first")).unwrap();
    coordinator.send_work(2, evaluate("q", "second")).unwrap();

    // Worker 2 answers before worker 1; attribution must not flip.
    workers[1].send_result(ResultMessage { score: 22.0 }).unwrap();
    workers[0].send_result(ResultMessage { score: 11.0 }).unwrap();

    assert_eq!(coordinator.recv_result(1).unwrap().score, 11.0);
    assert_eq!(coordinator.recv_result(2).unwrap().score, 22.0);
}

#[test]
fn test_channel_rejects_unknown_worker_index() {
    let (mut coordinator, _workers) = channel_pair(2);

    // Index 0 is the coordinator itself, 3 is past the pool.
    for index in [0, 3] {
        match coordinator.send_work(index, WorkMessage::Idle) {
            Err(TransportError::UnknownWorker(i)) => assert_eq!(i, index),
            other => panic!("expected UnknownWorker, got {other:?}"),
        }
    }
}

#[test]
fn test_channel_shutdown_is_orderly_between_rounds() {
    let (coordinator, mut workers) = channel_pair(1);
    drop(coordinator);

    assert_eq!(
        workers[0].recv_work().unwrap(),
        None,
        "a closed link between rounds means the run is over, not a fault"
    );
}

#[test]
fn test_tcp_round_trip_matches_workers_by_index() {
    let listener = CoordinatorListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    // Connect in reverse index order; the hello handshake re-maps them.
    let handles: Vec<_> = [2usize, 1]
        .into_iter()
        .map(|index| {
            thread::spawn(move || {
                let mut worker = TcpWorker::connect(addr, index).unwrap();

                match worker.recv_work().unwrap() {
                    Some(WorkMessage::Evaluate { response, .. }) => {
                        let score: f64 = response.parse().unwrap();
                        worker.send_result(ResultMessage { score }).unwrap();
                    }
                    other => panic!("expected work for worker {index}, got {other:?}"),
                }

                assert!(
                    worker.recv_work().unwrap().is_none(),
                    "worker {index} should observe an orderly shutdown"
                );
            })
        })
        .collect();

    let mut coordinator = listener.accept_workers(2).unwrap();
    assert_eq!(coordinator.worker_count(), 2);

    coordinator.send_work(1, evaluate("q", "11.5")).unwrap();
    coordinator.send_work(2, evaluate("q", "22.5")).unwrap();

    assert_eq!(coordinator.recv_result(1).unwrap().score, 11.5);
    assert_eq!(coordinator.recv_result(2).unwrap().score, 22.5);

    drop(coordinator);
    for handle in handles {
        handle.join().expect("worker thread panicked");
    }
}

#[test]
fn test_tcp_rejects_duplicate_worker_index() {
    let listener = CoordinatorListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            thread::spawn(move || {
                // Connect and identify, nothing more.
                let _worker = TcpWorker::connect(addr, 1).unwrap();
            })
        })
        .collect();

    match listener.accept_workers(2) {
        Err(TransportError::Handshake(message)) => {
            assert!(message.contains("twice"), "unexpected handshake error: {message}")
        }
        other => panic!("expected a handshake failure, got worker_count {:?}", other.map(|c| c.worker_count())),
    }

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }
}

#[test]
fn test_tcp_rejects_out_of_range_worker_index() {
    let listener = CoordinatorListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let _worker = TcpWorker::connect(addr, 7).unwrap();
    });

    match listener.accept_workers(1) {
        Err(TransportError::Handshake(message)) => {
            assert!(message.contains("out of range"), "unexpected handshake error: {message}")
        }
        other => panic!("expected a handshake failure, got worker_count {:?}", other.map(|c| c.worker_count())),
    }

    handle.join().expect("worker thread panicked");
}
