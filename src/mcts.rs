//! Main implementation of the distributed answer search
//!
//! This module contains the engine run on the coordinator, orchestrating
//! selection, expansion, distributed evaluation, and backpropagation, plus
//! the entry point each worker runs. Only the coordinator ever touches the
//! tree; workers see nothing but work and result messages.

use std::time::Instant;

use log::{debug, info};

use crate::{
    config::SearchConfig,
    gateway::ScoringGateway,
    policy,
    protocol::{ResultMessage, WorkMessage},
    report::SearchReport,
    stats::SearchStatistics,
    transport::{CoordinatorTransport, WorkerTransport},
    tree::{NodeId, SearchTree, ROOT},
    Result,
};

/// Why an iteration ended without touching the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The frontier node has never been evaluated (`visits == 0`)
    ///
    /// Happens when a child was left unscored in an earlier round (more new
    /// children than workers) and its infinite UCT then wins selection.
    UnvisitedFrontier,

    /// The frontier node already holds the full fan-out of children
    AtCapacity,
}

/// Outcome of a single iteration
///
/// A skipped iteration performs no expansion, contacts no worker, and runs
/// no backpropagation. It is surfaced as an explicit outcome rather than a
/// silent fall-through so callers can observe and test it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// New children were created and evaluation ran
    Expanded {
        /// Children appended to the frontier node this iteration
        new_children: usize,
        /// How many of them received a score (capped by the worker count)
        scored: usize,
    },

    /// The frontier node was not expandable; nothing happened
    Skipped(SkipReason),
}

/// The coordinator-side search engine
///
/// Owns the tree, the configuration, and the statistics for one run. The
/// tree lives exactly as long as the engine and is never shared with
/// another role.
pub struct AnswerSearch<G> {
    /// Root-owning arena for this run
    tree: SearchTree,

    /// Configuration for the search
    config: SearchConfig,

    /// Statistics gathered during search
    statistics: SearchStatistics,

    /// Gateway used for expansion (suggestions and candidate rewrites)
    gateway: G,
}

impl<G: ScoringGateway> AnswerSearch<G> {
    /// Creates an engine with the configured seed answer at the root
    pub fn new(config: SearchConfig, gateway: G) -> Self {
        let tree = SearchTree::new(config.seed_response.clone());

        AnswerSearch {
            tree,
            config,
            statistics: SearchStatistics::new(),
            gateway,
        }
    }

    /// Runs the configured number of iterations and builds the final report
    ///
    /// Transport failures abort the run: once a work/result round
    /// desynchronizes there is no way back into lock-step, so no partial
    /// report is produced.
    pub fn run_coordinator<T: CoordinatorTransport>(
        &mut self,
        question: &str,
        transport: &mut T,
    ) -> Result<SearchReport> {
        let start = Instant::now();

        for i in 0..self.config.iterations {
            info!("starting iteration {}", i + 1);
            match self.execute_iteration(question, transport)? {
                IterationOutcome::Expanded {
                    new_children,
                    scored,
                } => {
                    info!("iteration {}: {new_children} new answers, {scored} scored", i + 1);
                }
                IterationOutcome::Skipped(reason) => {
                    info!("iteration {}: skipped ({reason:?})", i + 1);
                }
            }
            self.statistics.iterations = i + 1;
        }

        self.statistics.total_time = start.elapsed();
        info!("search finished: {} nodes", self.tree.len());

        Ok(SearchReport::from_tree(question, &self.tree))
    }

    /// Executes a single iteration of the search
    pub fn execute_iteration<T: CoordinatorTransport>(
        &mut self,
        question: &str,
        transport: &mut T,
    ) -> Result<IterationOutcome> {
        // 1. Selection: walk to the frontier
        let frontier = self.select_frontier();

        // 2. Expansion gate: a node is expanded only after it has been
        //    evaluated itself and only while it has room for children
        if let Some(reason) = self.skip_reason(frontier) {
            self.statistics.skipped += 1;
            debug!("frontier {frontier} not expandable: {reason:?}");
            return Ok(IterationOutcome::Skipped(reason));
        }

        // 3. Expansion via the gateway
        let children = self.expand(question, frontier);

        // 4./5. Distributed evaluation of the new children
        let scored = self.dispatch_evaluations(question, &children, transport)?;

        // 6. Backpropagation from the expanded node up to the root
        self.backpropagate(frontier);

        self.statistics.expansions += 1;
        self.statistics.tree_size = self.tree.len();
        if let Some(&child) = children.first() {
            self.statistics.max_depth = self.statistics.max_depth.max(self.tree.depth(child));
        }

        Ok(IterationOutcome::Expanded {
            new_children: children.len(),
            scored,
        })
    }

    /// Descends from the root while the current node is fully expanded
    fn select_frontier(&self) -> NodeId {
        let mut current = ROOT;

        while self.tree.node(current).is_fully_expanded() {
            match policy::select_best_child(&self.tree, current) {
                Some(child) => current = child,
                None => break,
            }
        }

        current
    }

    /// The gate of step 2: `None` means the node can be expanded
    fn skip_reason(&self, id: NodeId) -> Option<SkipReason> {
        let node = self.tree.node(id);
        if node.visits == 0 {
            Some(SkipReason::UnvisitedFrontier)
        } else if node.is_fully_expanded() {
            Some(SkipReason::AtCapacity)
        } else {
            None
        }
    }

    /// Asks the gateway for candidate rewrites and appends them as children
    ///
    /// Candidates land in return order and are cut off at the node's
    /// remaining capacity, so the fan-out cap holds even if the node
    /// already had children from an earlier under-delivering round.
    fn expand(&mut self, question: &str, id: NodeId) -> Vec<NodeId> {
        let response = self.tree.node(id).response.clone();

        let suggestions = self.gateway.suggestions_or_fallback(question, &response);
        let candidates = self
            .gateway
            .improved_or_fallback(question, &response, &suggestions);

        let mut children = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match self.tree.add_child(id, candidate) {
                Some(child) => children.push(child),
                None => break,
            }
        }

        debug!("expanded {id} into {} children", children.len());
        children
    }

    /// Fans the new children out to the worker pool and applies the scores
    ///
    /// Every worker gets exactly one message per round: child `i` goes to
    /// worker `i + 1`, workers beyond the child count get an explicit idle.
    /// Results are collected per sent request and matched by source worker,
    /// so out-of-order completion cannot misattribute a score. Children
    /// beyond the worker count stay unscored and keep `visits == 0`.
    fn dispatch_evaluations<T: CoordinatorTransport>(
        &mut self,
        question: &str,
        children: &[NodeId],
        transport: &mut T,
    ) -> Result<usize> {
        let workers = transport.worker_count();

        for worker in 1..=workers {
            let message = match children.get(worker - 1) {
                Some(&child) => WorkMessage::Evaluate {
                    question: question.to_string(),
                    response: self.tree.node(child).response.clone(),
                },
                None => WorkMessage::Idle,
            };
            transport.send_work(worker, message)?;
        }

        let dispatched = children.len().min(workers);
        for worker in 1..=dispatched {
            let ResultMessage { score } = transport.recv_result(worker)?;
            let child = children[worker - 1];

            let node = self.tree.node_mut(child);
            node.total_score = score;
            node.visits = 1;
            debug!("worker {worker} scored {child}: {score:.1}");
        }

        self.statistics.evaluations_dispatched += dispatched;
        Ok(dispatched)
    }

    /// Increments visit counts from `from` up to and including the root
    ///
    /// Ancestor scores are left alone on purpose: a node's `total_score`
    /// only ever holds its own evaluation results.
    fn backpropagate(&mut self, from: NodeId) {
        let mut current = Some(from);

        while let Some(id) = current {
            let node = self.tree.node_mut(id);
            node.visits += 1;
            current = node.parent;
        }
    }

    /// Returns the search tree
    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    /// Returns the search statistics
    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }
}

/// Entry point for the worker role
///
/// Blocks on one work message per round, rates the received answer through
/// the gateway, and replies with a single result. Idle rounds produce no
/// reply. Returns cleanly when the coordinator closes the transport between
/// rounds; a failure inside a round is a coordination fault.
pub fn run_worker<G: ScoringGateway, T: WorkerTransport>(
    gateway: &G,
    transport: &mut T,
) -> Result<()> {
    loop {
        match transport.recv_work()? {
            None => {
                info!("coordinator closed the link, worker done");
                return Ok(());
            }
            Some(WorkMessage::Idle) => {
                debug!("idle round");
            }
            Some(WorkMessage::Evaluate { question, response }) => {
                let score = gateway.rating_or_fallback(&question, &response);
                transport.send_result(ResultMessage { score })?;
            }
        }
    }
}
