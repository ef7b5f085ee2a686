//! AI grade recommendations
//!
//! A chat-completions model is asked to grade a submission and to end its
//! reply with `const result={"grade":..,"feedback":".."}`. Whatever goes wrong
//! along the way, a recommendation is always produced: failures turn into a
//! fixed fallback grade with an explanatory feedback line.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::GradingConfig;
use crate::models::Assignment;

/// Grade returned whenever no usable model answer exists
pub const FALLBACK_GRADE: f64 = 10.0;

pub const PARSE_FAILED_FEEDBACK: &str = "Failed to parse AI result";
pub const NO_RESULT_FEEDBACK: &str = "No valid AI result";
pub const RATE_LIMITED_FEEDBACK: &str =
    "Hang tight! The AI needs a short break. Try again in an hour!";

static RESULT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)const result\s*=\s*(\{.*?\})").expect("valid regex"));

/// Suggested grade and feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecommendation {
    pub grade: f64,
    pub feedback: String,
}

impl GradeRecommendation {
    fn fallback(feedback: &str) -> Self {
        Self {
            grade: FALLBACK_GRADE,
            feedback: feedback.to_string(),
        }
    }
}

/// Why a completion could not be obtained
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("rate limited by the completion endpoint")]
    RateLimited,

    #[error("completion request failed: {0}")]
    Request(String),

    #[error("completion response had no message content")]
    EmptyResponse,
}

/// Text completion backend
#[async_trait]
pub trait GradeAdvisor: Send + Sync {
    /// Send `prompt` as a single user message and return the reply text
    async fn complete(&self, prompt: &str) -> Result<String, AdvisorError>;
}

/// Prompt sent for one submission
pub fn grading_prompt(assignment: &Assignment) -> String {
    format!(
        "Grade this submission with a score between 1 and 10, decimals are allowed. \
Also, provide feedback that encourages the student to explore deeper ideas while acknowledging their effort. \
Use a positive and motivational tone. Evaluate the correctness of the solution first. \
If the solution is correct but simple, still give a reasonable grade rather than a very low score. \
Consider the clarity and correctness of the response rather than just complexity. \
If the subject is Math, only consider accuracy. \
If the answer is fully correct with no mistakes, assign a perfect score of 10. \
Do not lower the score based on simplicity, complexity, or any other factor. \
For the end result, please return it in the exact following json format at the very end of your response, \
and replace the grade and feedback with your grade and feedback like this: \
`const result={{\"grade\":1.1,\"feedback\":\"AI Feedback\"}}`.\n\n\n\
Subject: {}\n\nTitle: {}\n\n\nContent: {}",
        assignment.subject.as_str(),
        assignment.title,
        assignment.content
    )
}

/// Extract the recommendation from a model reply
pub fn parse_recommendation(reply: &str) -> GradeRecommendation {
    let Some(block) = RESULT_BLOCK.captures(reply).and_then(|c| c.get(1)) else {
        return GradeRecommendation::fallback(NO_RESULT_FEEDBACK);
    };

    serde_json::from_str(block.as_str())
        .unwrap_or_else(|_| GradeRecommendation::fallback(PARSE_FAILED_FEEDBACK))
}

/// Ask `advisor` to grade `assignment`
pub async fn recommend(advisor: &dyn GradeAdvisor, assignment: &Assignment) -> GradeRecommendation {
    match advisor.complete(&grading_prompt(assignment)).await {
        Ok(reply) => parse_recommendation(&reply),
        Err(AdvisorError::RateLimited) => {
            tracing::warn!(assignment_id = assignment.id, "Grade advisor rate limited");
            GradeRecommendation::fallback(RATE_LIMITED_FEEDBACK)
        }
        Err(e) => {
            tracing::warn!(assignment_id = assignment.id, error = %e, "Grade advisor failed");
            GradeRecommendation::fallback(NO_RESULT_FEEDBACK)
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client
pub struct ChatCompletionAdvisor {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionAdvisor {
    pub fn new(config: &GradingConfig) -> Self {
        Self::with_timeout(config, config.timeout())
    }

    fn with_timeout(config: &GradingConfig, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl GradeAdvisor for ChatCompletionAdvisor {
    async fn complete(&self, prompt: &str) -> Result<String, AdvisorError> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AdvisorError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AdvisorError::RateLimited);
        }

        let completion: ChatCompletion = response
            .error_for_status()
            .map_err(|e| AdvisorError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| AdvisorError::Request(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AdvisorError::EmptyResponse)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::CannedAdvisor;
    use super::*;
    use crate::models::{Role, Subject, User};

    fn assignment() -> Assignment {
        Assignment {
            id: 1,
            title: "Addition".to_string(),
            content: "2 + 2 = 4".to_string(),
            subject: Subject::Math,
            student: User {
                id: 1,
                name: "Ada".to_string(),
                email: "ada@school.test".to_string(),
                role: Role::Student,
            },
            grade: None,
        }
    }

    #[test]
    fn test_prompt_carries_submission() {
        let prompt = grading_prompt(&assignment());
        assert!(prompt.contains(r#"const result={"grade":1.1,"feedback":"AI Feedback"}"#));
        assert!(prompt.ends_with("Subject: Math\n\nTitle: Addition\n\n\nContent: 2 + 2 = 4"));
    }

    #[test]
    fn test_parse_result_block() {
        let reply = "Nice work!\n\n`const result={\"grade\":9.5,\n\"feedback\":\"Great job\"}`";
        assert_eq!(
            parse_recommendation(reply),
            GradeRecommendation {
                grade: 9.5,
                feedback: "Great job".to_string()
            }
        );
    }

    #[test]
    fn test_parse_tolerates_spaces_around_equals() {
        let reply = r#"const result = {"grade": 7, "feedback": "ok"}"#;
        assert_eq!(parse_recommendation(reply).grade, 7.0);
    }

    #[test]
    fn test_parse_fallbacks() {
        assert_eq!(
            parse_recommendation("I think it deserves an 8."),
            GradeRecommendation::fallback(NO_RESULT_FEEDBACK)
        );
        assert_eq!(
            parse_recommendation("const result={grade: 8}"),
            GradeRecommendation::fallback(PARSE_FAILED_FEEDBACK)
        );
    }

    #[tokio::test]
    async fn test_recommend_maps_advisor_failures() {
        assert_eq!(
            recommend(&CannedAdvisor::RateLimited, &assignment()).await.feedback,
            RATE_LIMITED_FEEDBACK
        );

        assert_eq!(
            recommend(&CannedAdvisor::Broken, &assignment()).await,
            GradeRecommendation::fallback(NO_RESULT_FEEDBACK)
        );

        let fine = CannedAdvisor::Reply(r#"const result={"grade":10,"feedback":"Perfect"}"#);
        assert_eq!(recommend(&fine, &assignment()).await.feedback, "Perfect");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_request_error() {
        let config = GradingConfig {
            endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            ..GradingConfig::default()
        };
        let advisor = ChatCompletionAdvisor::with_timeout(&config, Duration::from_secs(2));
        assert!(matches!(
            advisor.complete("hi").await,
            Err(AdvisorError::Request(_))
        ));
    }
}
