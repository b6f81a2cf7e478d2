use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestResult {
    pub id: i32,
    pub test_id: i32,
    pub user_name: String,
    pub score: i32,
    pub max_score: i32,
    pub created_at: DateTime<Utc>,
    /// Map of question id (as a string key) to the chosen option id.
    pub answers: JsonValue,
    pub question_times: Option<JsonValue>,
    pub total_time: Option<i32>,
    /// When the sat test was a generated variation, results are re-attached
    /// to the template test and this records that template id.
    pub original_test_id: Option<i32>,
    /// The exact questions and options the student saw, so review still works
    /// after the variation row is deleted.
    pub questions_snapshot: Option<JsonValue>,
}
