//! HTTP client for the external assessment service.
//!
//! One endpoint, two logical operations selected by an `action` field in the
//! request body. The rest of the crate sees the typed collaborator traits;
//! this module owns the wire shapes and their decoding.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::collaborators::{
    AnswerEvaluator, AnswerSubmission, GeneratedQuestion, GradedAnswer, QuestionProvider,
};
use crate::error::{EvaluatorError, ProviderError, RemoteInitError};
use tutor_core::model::{Evaluation, Level, Mastery, Question, Score};

const GENERATE_ACTION: &str = "generate_question";
const EVALUATE_ACTION: &str = "evaluate_answer";

/// Request timeout applied when the environment does not override it.
/// Timeout handling is this client's policy; the controller itself defines no
/// timeout or cancellation.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct RemoteAssessmentConfig {
    pub endpoint: Url,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl RemoteAssessmentConfig {
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads `TUTOR_API_URL`, `TUTOR_API_KEY`, and `TUTOR_API_TIMEOUT_SECS`.
    ///
    /// Returns `None` when no usable endpoint is configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let endpoint = env::var("TUTOR_API_URL").ok()?;
        let endpoint = Url::parse(endpoint.trim()).ok()?;
        let api_key = env::var("TUTOR_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let timeout = env::var("TUTOR_API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        Some(Self {
            endpoint,
            api_key,
            timeout,
        })
    }
}

/// Implements both assessment collaborators over the remote endpoint.
#[derive(Clone)]
pub struct RemoteAssessmentService {
    client: Client,
    config: RemoteAssessmentConfig,
}

impl RemoteAssessmentService {
    /// Builds the client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `RemoteInitError` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: RemoteAssessmentConfig) -> Result<Self, RemoteInitError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    async fn post<Req, Resp>(&self, payload: &Req) -> Result<(reqwest::StatusCode, Option<Resp>), reqwest::Error>
    where
        Req: Serialize + Sync,
        Resp: for<'de> Deserialize<'de>,
    {
        let mut request = self.client.post(self.config.endpoint.clone()).json(payload);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Ok((status, None));
        }
        let body = response.json::<Resp>().await?;
        Ok((status, Some(body)))
    }
}

#[async_trait]
impl QuestionProvider for RemoteAssessmentService {
    async fn generate_question(
        &self,
        topic: &str,
        mastery: Mastery,
    ) -> Result<GeneratedQuestion, ProviderError> {
        let payload = GenerateQuestionRequest {
            action: GENERATE_ACTION,
            topic,
            mastery: mastery.value(),
        };

        let (status, body) = self.post::<_, GenerateQuestionResponse>(&payload).await?;
        let Some(body) = body else {
            return Err(ProviderError::HttpStatus(status));
        };
        decode_question(body)
    }
}

#[async_trait]
impl AnswerEvaluator for RemoteAssessmentService {
    async fn evaluate(
        &self,
        submission: AnswerSubmission<'_>,
    ) -> Result<GradedAnswer, EvaluatorError> {
        let payload = EvaluateAnswerRequest {
            action: EVALUATE_ACTION,
            question: submission.question,
            answer: submission.answer,
            correct_answer: submission.correct_answer,
            topic: submission.topic,
            user_id: submission.learner.as_str(),
            topic_id: submission.topic_id.as_str(),
            mastery: submission.mastery.value(),
        };

        let (status, body) = self.post::<_, EvaluateAnswerResponse>(&payload).await?;
        let Some(body) = body else {
            return Err(EvaluatorError::HttpStatus(status));
        };
        decode_evaluation(body)
    }
}

//
// ─── WIRE TYPES ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct GenerateQuestionRequest<'a> {
    action: &'static str,
    topic: &'a str,
    mastery: f64,
}

#[derive(Debug, Deserialize)]
struct WireQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: String,
}

#[derive(Debug, Deserialize)]
struct GenerateQuestionResponse {
    success: bool,
    question: Option<WireQuestion>,
    level: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct EvaluateAnswerRequest<'a> {
    action: &'static str,
    question: &'a str,
    answer: &'a str,
    correct_answer: &'a str,
    topic: &'a str,
    #[serde(rename = "userId")]
    user_id: &'a str,
    #[serde(rename = "topicId")]
    topic_id: &'a str,
    mastery: f64,
}

#[derive(Debug, Deserialize)]
struct WireEvaluation {
    score: f64,
    feedback: String,
    correction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EvaluateAnswerResponse {
    success: bool,
    evaluation: Option<WireEvaluation>,
    #[serde(rename = "newMastery")]
    new_mastery: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

fn rejection(error: Option<String>) -> String {
    error.unwrap_or_else(|| "no reason given".into())
}

fn decode_question(body: GenerateQuestionResponse) -> Result<GeneratedQuestion, ProviderError> {
    if !body.success {
        return Err(ProviderError::Rejected(rejection(body.error)));
    }
    let (Some(wire), Some(level)) = (body.question, body.level) else {
        return Err(ProviderError::EmptyResponse);
    };

    let question = Question::new(wire.question, wire.options, wire.correct_answer)?;
    Ok(GeneratedQuestion {
        question,
        level: Level::new(level),
    })
}

fn decode_evaluation(body: EvaluateAnswerResponse) -> Result<GradedAnswer, EvaluatorError> {
    if !body.success {
        return Err(EvaluatorError::Rejected(rejection(body.error)));
    }
    let (Some(wire), Some(new_mastery)) = (body.evaluation, body.new_mastery) else {
        return Err(EvaluatorError::EmptyResponse);
    };

    Ok(GradedAnswer {
        evaluation: Evaluation::new(Score::clamped(wire.score), wire.feedback, wire.correction),
        new_mastery: Mastery::clamped(new_mastery),
    })
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_generated_question() {
        let body: GenerateQuestionResponse = serde_json::from_str(
            r#"{
                "success": true,
                "question": {
                    "question": "What does the borrow checker enforce?",
                    "options": ["Aliasing xor mutation", "Garbage collection", "Monomorphization"],
                    "correct_answer": "Aliasing xor mutation"
                },
                "level": "intermediate"
            }"#,
        )
        .unwrap();

        let generated = decode_question(body).unwrap();
        assert_eq!(generated.level.as_str(), "intermediate");
        assert_eq!(generated.question.options().len(), 3);
        assert!(generated.question.offers("Garbage collection"));
    }

    #[test]
    fn rejected_generation_carries_the_reason() {
        let body: GenerateQuestionResponse = serde_json::from_str(
            r#"{"success": false, "error": "model overloaded"}"#,
        )
        .unwrap();

        match decode_question(body).unwrap_err() {
            ProviderError::Rejected(reason) => assert_eq!(reason, "model overloaded"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn question_without_payload_is_an_empty_response() {
        let body: GenerateQuestionResponse =
            serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(
            decode_question(body).unwrap_err(),
            ProviderError::EmptyResponse
        ));
    }

    #[test]
    fn contract_violations_surface_as_provider_errors() {
        let body: GenerateQuestionResponse = serde_json::from_str(
            r#"{
                "success": true,
                "question": {
                    "question": "Q",
                    "options": ["a", "b"],
                    "correct_answer": "c"
                },
                "level": "beginner"
            }"#,
        )
        .unwrap();

        assert!(matches!(
            decode_question(body).unwrap_err(),
            ProviderError::Contract(_)
        ));
    }

    #[test]
    fn decodes_an_evaluation_and_suppresses_the_sentinel() {
        let body: EvaluateAnswerResponse = serde_json::from_str(
            r#"{
                "success": true,
                "evaluation": {
                    "score": 0.8,
                    "feedback": "Well done",
                    "correction": "None needed"
                },
                "newMastery": 0.32
            }"#,
        )
        .unwrap();

        let graded = decode_evaluation(body).unwrap();
        assert_eq!(graded.evaluation.score(), Score::clamped(0.8));
        assert_eq!(graded.evaluation.feedback(), "Well done");
        assert_eq!(graded.evaluation.correction(), None);
        assert_eq!(graded.new_mastery, Mastery::clamped(0.32));
    }

    #[test]
    fn out_of_range_mastery_is_clamped_at_decode() {
        let body: EvaluateAnswerResponse = serde_json::from_str(
            r#"{
                "success": true,
                "evaluation": {"score": 1.4, "feedback": "ok", "correction": null},
                "newMastery": -0.25
            }"#,
        )
        .unwrap();

        let graded = decode_evaluation(body).unwrap();
        assert_eq!(graded.evaluation.score(), Score::clamped(1.0));
        assert_eq!(graded.new_mastery, Mastery::clamped(0.0));
    }

    #[test]
    fn evaluation_requests_use_the_wire_field_names() {
        let learner = tutor_core::model::LearnerId::new("user-7").unwrap();
        let topic_id = tutor_core::model::TopicId::new("topic-3").unwrap();
        let payload = EvaluateAnswerRequest {
            action: EVALUATE_ACTION,
            question: "Q",
            answer: "a",
            correct_answer: "a",
            topic: "Ownership",
            user_id: learner.as_str(),
            topic_id: topic_id.as_str(),
            mastery: 0.2,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["action"], "evaluate_answer");
        assert_eq!(json["userId"], "user-7");
        assert_eq!(json["topicId"], "topic-3");
        assert_eq!(json["correct_answer"], "a");
    }

    #[test]
    fn config_defaults_apply_without_env_overrides() {
        let config =
            RemoteAssessmentConfig::new(Url::parse("https://assessment.example/api").unwrap());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.api_key.is_none());
    }
}
