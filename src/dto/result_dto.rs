use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateResultPayload {
    pub test_id: i32,
    #[validate(length(min = 1, max = 255))]
    pub user_name: String,
    pub score: i32,
    pub max_score: i32,
    pub total_time: Option<i32>,
    pub question_times: Option<JsonValue>,
    pub answers: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
pub struct QuestionWithStudentAnswer {
    pub id: i32,
    pub text: String,
    pub options: JsonValue,
    pub student_answer: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
pub struct ResultWithQuestions {
    pub id: i32,
    pub test_id: i32,
    pub original_test_id: Option<i32>,
    pub test_title: String,
    pub user_name: String,
    pub score: i32,
    pub max_score: i32,
    pub created_at: DateTime<Utc>,
    pub total_time: Option<i32>,
    pub question_times: Option<JsonValue>,
    pub questions_with_answers: Vec<QuestionWithStudentAnswer>,
}
