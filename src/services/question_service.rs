use crate::dto::question_dto::CreateQuestionPayload;
use crate::error::Result;
use crate::models::question::{AnswerOption, Question, QuestionWithOptions};
use sqlx::PgPool;

#[derive(Clone)]
pub struct QuestionService {
    pool: PgPool,
}

impl QuestionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a question together with its options. Options keep the order
    /// they were submitted in.
    pub async fn create_question(
        &self,
        payload: &CreateQuestionPayload,
        topic: Option<&str>,
    ) -> Result<QuestionWithOptions> {
        let question = sqlx::query_as::<_, Question>(
            "INSERT INTO questions (text, test_id, topic) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&payload.text)
        .bind(payload.test_id)
        .bind(topic)
        .fetch_one(&self.pool)
        .await?;

        let mut options = Vec::with_capacity(payload.options.len());
        for option in &payload.options {
            let created = sqlx::query_as::<_, AnswerOption>(
                "INSERT INTO options (text, is_correct, question_id) VALUES ($1, $2, $3) RETURNING *",
            )
            .bind(&option.text)
            .bind(option.is_correct)
            .bind(question.id)
            .fetch_one(&self.pool)
            .await?;
            options.push(created);
        }

        Ok(QuestionWithOptions { question, options })
    }

    pub async fn list_question_texts(&self, test_id: i32) -> Result<Vec<String>> {
        let texts = sqlx::query_scalar::<_, String>(
            "SELECT text FROM questions WHERE test_id = $1 ORDER BY id",
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(texts)
    }
}
