use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOptionPayload {
    #[validate(length(min = 1))]
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionPayload {
    #[validate(length(min = 1))]
    pub text: String,
    pub test_id: i32,
    #[validate(nested)]
    pub options: Vec<CreateOptionPayload>,
}
