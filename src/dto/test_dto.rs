use crate::models::question::QuestionWithOptions;
use crate::models::test::Test;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTestPayload {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestWithQuestions {
    #[serde(flatten)]
    pub test: Test,
    pub questions: Vec<QuestionWithOptions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GetTestQuery {
    /// Kept for API compatibility with older clients; fetching a test always
    /// produces a fresh student variation.
    pub generate_new: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateVariationPayload {
    pub new_title: Option<String>,
}
