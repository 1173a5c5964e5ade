//! Blocking adapter for an OpenAI-compatible chat-completions service

use log::debug;
use serde::{Deserialize, Serialize};

use crate::gateway::{GatewayError, ScoringGateway};

const SUGGESTIONS_SYSTEM_PROMPT: &str = "You are helping improve answer quality. \
    Generate exactly 3 specific suggestions for improving the answer. \
    Format as JSON format like this - \
    {\"suggestions\": [\"Suggestion 1\", \"Suggestion 2\", \"Suggestion 3\"]}.";

const RESPONSES_SYSTEM_PROMPT: &str = "Generate 3 improved answers based on the suggestions. \
    Format as JSON format like this - \
    {\"responses\": [\"Response 1\", \"Response 2\", \"Response 3\"]}.";

const RATING_SYSTEM_PROMPT: &str = "Rate how well the answer addresses the question from 0-100. \
    Consider accuracy, completeness, and clarity. Return only the numeric score.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Deserialize)]
struct SuggestionsPayload {
    suggestions: Vec<String>,
}

#[derive(Deserialize)]
struct ResponsesPayload {
    responses: Vec<String>,
}

/// Gateway speaking the OpenAI chat-completions protocol over blocking HTTP
///
/// Works against any compatible endpoint; the base URL, API key, and model
/// name decide which service actually answers.
pub struct OpenAiGateway {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiGateway {
    /// Environment variable holding the API key
    pub const API_KEY_VAR: &'static str = "ANSWER_MCTS_API_KEY";

    /// Environment variable holding the service base URL
    pub const API_BASE_VAR: &'static str = "ANSWER_MCTS_API_BASE";

    /// Creates a gateway for the given endpoint
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("answer-mcts/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(OpenAiGateway {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Creates a gateway from `ANSWER_MCTS_API_BASE` and `ANSWER_MCTS_API_KEY`
    ///
    /// Failing here is an initialization fault: the caller aborts before any
    /// iteration runs.
    pub fn from_env(model: impl Into<String>) -> Result<Self, GatewayError> {
        let base_url = std::env::var(Self::API_BASE_VAR)
            .map_err(|_| GatewayError::MissingConfig(Self::API_BASE_VAR))?;
        let api_key = std::env::var(Self::API_KEY_VAR)
            .map_err(|_| GatewayError::MissingConfig(Self::API_KEY_VAR))?;
        Self::new(base_url, api_key, model)
    }

    /// Sends one two-message chat completion and returns the reply text
    fn chat(
        &self,
        system: &str,
        user: &str,
        json_response: bool,
    ) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: json_response.then_some(ResponseFormat {
                format: "json_object",
            }),
        };

        let response: ChatResponse = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::Malformed("completion with no choices".to_string()))
    }
}

impl ScoringGateway for OpenAiGateway {
    fn get_suggestions(&self, question: &str, response: &str) -> Result<Vec<String>, GatewayError> {
        debug!("requesting suggestions for current answer");
        let user = format!(
            "Question: {question}\nCurrent answer: {response}\nHow can this answer be improved?"
        );

        let content = self.chat(SUGGESTIONS_SYSTEM_PROMPT, &user, true)?;
        let payload: SuggestionsPayload = serde_json::from_str(&content)
            .map_err(|e| GatewayError::Malformed(format!("suggestions payload: {e}")))?;
        Ok(payload.suggestions)
    }

    fn generate_improved_responses(
        &self,
        question: &str,
        response: &str,
        suggestions: &[String],
    ) -> Result<Vec<String>, GatewayError> {
        debug!("requesting {} improved answers", suggestions.len());
        let mut user = format!(
            "Question: {question}\nCurrent answer: {response}\n\nImprovement suggestions:\n"
        );
        for (i, suggestion) in suggestions.iter().enumerate() {
            user.push_str(&format!("{}. {suggestion}\n", i + 1));
        }

        let content = self.chat(RESPONSES_SYSTEM_PROMPT, &user, true)?;
        let payload: ResponsesPayload = serde_json::from_str(&content)
            .map_err(|e| GatewayError::Malformed(format!("responses payload: {e}")))?;
        Ok(payload.responses)
    }

    fn rate_response(&self, question: &str, response: &str) -> Result<f64, GatewayError> {
        debug!("requesting rating for candidate answer");
        let user = format!("Question: {question}\nAnswer: {response}\nRate (0-100):");

        let content = self.chat(RATING_SYSTEM_PROMPT, &user, false)?;
        content
            .trim()
            .parse()
            .map_err(|_| GatewayError::Malformed(format!("non-numeric rating {content:?}")))
    }
}
