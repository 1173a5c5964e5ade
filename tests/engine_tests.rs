use std::thread::{self, JoinHandle};

use answer_mcts::gateway::{GatewayError, ScoringGateway, FALLBACK_SUGGESTIONS};
use answer_mcts::transport::channel::{channel_pair, ChannelCoordinator, ChannelWorker};
use answer_mcts::tree::ROOT;
use answer_mcts::{
    run_worker, AnswerSearch, IterationOutcome, SearchConfig, SkipReason, MAX_CHILDREN,
};

/// Gateway stub with canned expansion output and content-keyed ratings
///
/// With `candidates: None` the improved answers echo the suggestions, which
/// makes fallback suggestions observable as child responses.
#[derive(Clone)]
struct StubGateway {
    fail_suggestions: bool,
    candidates: Option<Vec<String>>,
}

impl StubGateway {
    fn with_candidates(candidates: &[&str]) -> Self {
        StubGateway {
            fail_suggestions: false,
            candidates: Some(candidates.iter().map(|c| c.to_string()).collect()),
        }
    }

    fn failing_suggestions() -> Self {
        StubGateway {
            fail_suggestions: true,
            candidates: None,
        }
    }
}

fn score_for(response: &str) -> f64 {
    match response {
        "candidate a" => 80.0,
        "candidate b" => 60.0,
        "candidate c" => 40.0,
        _ => 25.0,
    }
}

impl ScoringGateway for StubGateway {
    fn get_suggestions(&self, _: &str, _: &str) -> Result<Vec<String>, GatewayError> {
        if self.fail_suggestions {
            return Err(GatewayError::Malformed("stub fault".to_string()));
        }
        Ok(vec![
            "tighten the wording".to_string(),
            "add an example".to_string(),
            "check the facts".to_string(),
        ])
    }

    fn generate_improved_responses(
        &self,
        _: &str,
        _: &str,
        suggestions: &[String],
    ) -> Result<Vec<String>, GatewayError> {
        match &self.candidates {
            Some(candidates) => Ok(candidates.clone()),
            None => Ok(suggestions.to_vec()),
        }
    }

    fn rate_response(&self, _: &str, response: &str) -> Result<f64, GatewayError> {
        Ok(score_for(response))
    }
}

fn spawn_workers(
    gateway: &StubGateway,
    endpoints: Vec<ChannelWorker>,
) -> Vec<JoinHandle<answer_mcts::Result<()>>> {
    endpoints
        .into_iter()
        .map(|mut endpoint| {
            let gateway = gateway.clone();
            thread::spawn(move || run_worker(&gateway, &mut endpoint))
        })
        .collect()
}

fn shut_down(coordinator: ChannelCoordinator, handles: Vec<JoinHandle<answer_mcts::Result<()>>>) {
    drop(coordinator);
    for handle in handles {
        handle
            .join()
            .expect("worker thread panicked")
            .expect("worker should exit cleanly");
    }
}

#[test]
fn test_round_trip_single_iteration() {
    let gateway = StubGateway::with_candidates(&["candidate a", "candidate b", "candidate c"]);
    let (mut coordinator, endpoints) = channel_pair(3);
    let handles = spawn_workers(&gateway, endpoints);

    let config = SearchConfig::default().with_iterations(1);
    let mut search = AnswerSearch::new(config, gateway);
    let report = search
        .run_coordinator("What is the capital of France?", &mut coordinator)
        .expect("search should succeed");

    let tree = search.tree();
    let root = tree.node(ROOT);
    assert_eq!(root.children.len(), 3, "root should gain exactly 3 children");
    assert_eq!(root.visits, 2, "backpropagation should bump the root once");
    assert_eq!(root.total_score, 0.0, "backpropagation must not touch scores");

    // Scores land on the children in creation order, matched by source.
    let expected = [80.0, 60.0, 40.0];
    for (i, &child) in root.children.iter().enumerate() {
        assert_eq!(tree.node(child).visits, 1);
        assert_eq!(tree.node(child).total_score, expected[i]);
    }

    assert_eq!(report.best_answer().response, "candidate a");
    assert_eq!(report.best_answer().mean_score, 80.0);

    let stats = search.statistics();
    assert_eq!(stats.iterations, 1);
    assert_eq!(stats.expansions, 1);
    assert_eq!(stats.evaluations_dispatched, 3);
    assert_eq!(stats.tree_size, 4);

    shut_down(coordinator, handles);
}

#[test]
fn test_suggestion_fault_uses_fallback_and_continues() {
    // Candidates echo the suggestions, so the fallback strings become the
    // child responses when get_suggestions faults.
    let gateway = StubGateway::failing_suggestions();
    let (mut coordinator, endpoints) = channel_pair(3);
    let handles = spawn_workers(&gateway, endpoints);

    let config = SearchConfig::default().with_iterations(1);
    let mut search = AnswerSearch::new(config, gateway);
    search
        .run_coordinator("Why is the sky blue?", &mut coordinator)
        .expect("a gateway fault must not abort the search");

    let tree = search.tree();
    let responses: Vec<&str> = tree
        .node(ROOT)
        .children
        .iter()
        .map(|&child| tree.node(child).response.as_str())
        .collect();
    assert_eq!(
        responses, FALLBACK_SUGGESTIONS,
        "expansion should proceed on the generic fallback suggestions"
    );

    shut_down(coordinator, handles);
}

#[test]
fn test_fewer_workers_leaves_child_unscored_then_skips() {
    let gateway = StubGateway::with_candidates(&["candidate a", "candidate b", "candidate c"]);
    let (mut coordinator, endpoints) = channel_pair(2);
    let handles = spawn_workers(&gateway, endpoints);

    let config = SearchConfig::default();
    let mut search = AnswerSearch::new(config, gateway);

    let first = search
        .execute_iteration("question", &mut coordinator)
        .unwrap();
    assert_eq!(
        first,
        IterationOutcome::Expanded {
            new_children: 3,
            scored: 2,
        },
        "only as many children as workers can be scored"
    );

    let tree = search.tree();
    let children = tree.node(ROOT).children.clone();
    assert_eq!(tree.node(children[0]).total_score, 80.0);
    assert_eq!(tree.node(children[1]).total_score, 60.0);
    assert_eq!(
        tree.node(children[2]).visits,
        0,
        "the undispatched child stays unscored"
    );

    // The unscored child has infinite UCT, wins selection, and is not
    // expandable: the next iteration is an explicit no-op.
    let second = search
        .execute_iteration("question", &mut coordinator)
        .unwrap();
    assert_eq!(
        second,
        IterationOutcome::Skipped(SkipReason::UnvisitedFrontier)
    );

    let tree = search.tree();
    assert_eq!(tree.len(), 4, "a skipped iteration creates no nodes");
    assert_eq!(
        tree.node(ROOT).visits,
        2,
        "a skipped iteration must not backpropagate"
    );
    assert_eq!(search.statistics().skipped, 1);

    shut_down(coordinator, handles);
}

#[test]
fn test_partial_node_refills_only_to_capacity() {
    // The gateway under-delivers two candidates per expansion; the second
    // expansion of the root may then only add one more child.
    let gateway = StubGateway::with_candidates(&["candidate a", "candidate b"]);
    let (mut coordinator, endpoints) = channel_pair(3);
    let handles = spawn_workers(&gateway, endpoints);

    let mut search = AnswerSearch::new(SearchConfig::default(), gateway);

    let first = search.execute_iteration("question", &mut coordinator).unwrap();
    assert_eq!(
        first,
        IterationOutcome::Expanded {
            new_children: 2,
            scored: 2,
        }
    );

    let second = search.execute_iteration("question", &mut coordinator).unwrap();
    assert_eq!(
        second,
        IterationOutcome::Expanded {
            new_children: 1,
            scored: 1,
        },
        "a node with two children has room for exactly one more"
    );
    assert_eq!(search.tree().node(ROOT).children.len(), MAX_CHILDREN);

    shut_down(coordinator, handles);
}

#[test]
fn test_over_returning_gateway_is_capped() {
    let gateway = StubGateway::with_candidates(&[
        "candidate a",
        "candidate b",
        "candidate c",
        "candidate d",
        "candidate e",
    ]);
    let (mut coordinator, endpoints) = channel_pair(3);
    let handles = spawn_workers(&gateway, endpoints);

    let mut search = AnswerSearch::new(SearchConfig::default(), gateway);
    let outcome = search.execute_iteration("question", &mut coordinator).unwrap();

    assert_eq!(
        outcome,
        IterationOutcome::Expanded {
            new_children: 3,
            scored: 3,
        },
        "an over-delivering gateway must not break the fan-out cap"
    );

    shut_down(coordinator, handles);
}

#[test]
fn test_second_iteration_descends_and_backpropagates_path() {
    let gateway = StubGateway::with_candidates(&["candidate a", "candidate b", "candidate c"]);
    let (mut coordinator, endpoints) = channel_pair(3);
    let handles = spawn_workers(&gateway, endpoints);

    let config = SearchConfig::default().with_iterations(2);
    let mut search = AnswerSearch::new(config, gateway);
    let report = search
        .run_coordinator("question", &mut coordinator)
        .expect("search should succeed");

    let tree = search.tree();
    let best = tree.node(ROOT).children[0];

    // Iteration 2 walks through the full root to its best child (80.0),
    // expands it, and backpropagates through both.
    assert_eq!(tree.node(best).children.len(), 3);
    assert_eq!(tree.node(best).visits, 2);
    assert_eq!(
        tree.node(best).total_score, 80.0,
        "backpropagation leaves scores on the path unchanged"
    );
    assert_eq!(tree.node(ROOT).visits, 3);
    assert_eq!(tree.len(), 7);
    assert_eq!(search.statistics().max_depth, 2);

    // The report follows mean scores level by level.
    assert_eq!(report.steps.len(), 3);
    assert_eq!(report.best_answer().response, "candidate a");

    let rendered = report.to_string();
    assert!(rendered.contains("Answer evolution:"));
    assert!(rendered.contains("Best final answer: candidate a"));

    shut_down(coordinator, handles);
}
