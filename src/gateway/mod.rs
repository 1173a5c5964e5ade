//! Gateway to the external text-generation and scoring service
//!
//! The engine talks to the service through the [`ScoringGateway`] trait and
//! only ever through the `*_or_fallback` wrappers: a gateway fault is
//! absorbed right here by substituting documented fallback values, so
//! neither the engine nor the dispatch protocol ever observes one.

pub mod openai;

pub use openai::OpenAiGateway;

use log::warn;

use crate::tree::MAX_CHILDREN;

/// Errors raised by a gateway implementation
///
/// These never cross the gateway boundary during a search; they surface
/// only from constructors, where an unreachable backend is fatal.
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    /// The HTTP request failed or the service answered with an error status
    #[error("request to generation service failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered, but not in the shape the adapter expects
    #[error("malformed response from generation service: {0}")]
    Malformed(String),

    /// A required environment variable is missing
    #[error("missing configuration: {0} is not set")]
    MissingConfig(&'static str),
}

/// Suggestions used when the service cannot provide any
pub const FALLBACK_SUGGESTIONS: [&str; 3] = [
    "Add more specific details",
    "Include relevant examples",
    "Explain the reasoning",
];

/// Rating used when the service cannot score an answer
pub const FALLBACK_RATING: f64 = 50.0;

/// Candidate rewrites derived mechanically from the current answer
pub fn fallback_responses(current: &str) -> Vec<String> {
    vec![
        format!("Based on {current}, I can elaborate..."),
        format!("While starting from {current}, we can add..."),
        format!("Building on {current}, consider..."),
    ]
}

/// Operations the search delegates to the generation service
///
/// Implementations report faults through `Result`; the provided
/// `*_or_fallback` methods are what the rest of the crate calls.
pub trait ScoringGateway {
    /// Asks for ways the current answer could be improved
    fn get_suggestions(&self, question: &str, response: &str) -> Result<Vec<String>, GatewayError>;

    /// Asks for improved candidate answers conditioned on `suggestions`
    fn generate_improved_responses(
        &self,
        question: &str,
        response: &str,
        suggestions: &[String],
    ) -> Result<Vec<String>, GatewayError>;

    /// Asks for a quality score of `response` in [0, 100]
    fn rate_response(&self, question: &str, response: &str) -> Result<f64, GatewayError>;

    /// Suggestions, or the fixed generic set when the service fails
    fn suggestions_or_fallback(&self, question: &str, response: &str) -> Vec<String> {
        match self.get_suggestions(question, response) {
            Ok(mut suggestions) => {
                suggestions.truncate(MAX_CHILDREN);
                suggestions
            }
            Err(e) => {
                warn!("falling back to generic suggestions: {e}");
                FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect()
            }
        }
    }

    /// Candidate rewrites, or templated ones when the service fails
    ///
    /// At most [`MAX_CHILDREN`] candidates are ever returned; the service
    /// may under-deliver but never over-deliver past the fan-out.
    fn improved_or_fallback(
        &self,
        question: &str,
        response: &str,
        suggestions: &[String],
    ) -> Vec<String> {
        match self.generate_improved_responses(question, response, suggestions) {
            Ok(mut responses) => {
                responses.truncate(MAX_CHILDREN);
                responses
            }
            Err(e) => {
                warn!("falling back to templated responses: {e}");
                fallback_responses(response)
            }
        }
    }

    /// A rating clamped into [0, 100], or 50.0 when the service fails
    fn rating_or_fallback(&self, question: &str, response: &str) -> f64 {
        match self.rate_response(question, response) {
            Ok(rating) => rating.clamp(0.0, 100.0),
            Err(e) => {
                warn!("falling back to neutral rating: {e}");
                FALLBACK_RATING
            }
        }
    }
}
