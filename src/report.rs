//! Final report of a search run
//!
//! After the last iteration the coordinator extracts the best root-to-leaf
//! path and renders it as the answer's evolution, one step per tree level,
//! ending with the best final answer.

use std::fmt;

use crate::tree::SearchTree;

/// One level of the best path
#[derive(Debug, Clone)]
pub struct ReportStep {
    /// The candidate answer at this level
    pub response: String,

    /// Mean evaluation score of the node
    pub mean_score: f64,

    /// Visit count of the node
    pub visits: u64,
}

/// Human-readable result of a search run
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// The question that was searched
    pub question: String,

    /// Best path from the root down, in root-first order
    pub steps: Vec<ReportStep>,
}

impl SearchReport {
    /// Builds a report from the finished tree
    pub fn from_tree(question: impl Into<String>, tree: &SearchTree) -> Self {
        let steps = tree
            .best_path()
            .into_iter()
            .map(|id| ReportStep {
                response: tree.node(id).response.clone(),
                mean_score: tree.mean_score(id),
                visits: tree.node(id).visits,
            })
            .collect();

        SearchReport {
            question: question.into(),
            steps,
        }
    }

    /// The best final answer: the deepest step of the best path
    pub fn best_answer(&self) -> &ReportStep {
        self.steps.last().expect("a report always has a root step")
    }
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Answer Search Results:")?;
        writeln!(f, "Question: {}", self.question)?;
        writeln!(f, "\nAnswer evolution:")?;

        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "\nStep {i}:")?;
            writeln!(f, "Answer: {}", step.response)?;
            writeln!(f, "Score: {:.2}", step.mean_score)?;
            writeln!(f, "Visits: {}", step.visits)?;
        }

        let best = self.best_answer();
        writeln!(f, "\nBest final answer: {}", best.response)?;
        write!(f, "Final score: {:.2}", best.mean_score)
    }
}
