use crate::dto::test_dto::{CreateTestPayload, TestWithQuestions};
use crate::error::{Error, Result};
use crate::models::question::{AnswerOption, Question, QuestionWithOptions};
use crate::models::test::Test;
use sqlx::PgPool;

#[derive(Clone)]
pub struct TestService {
    pool: PgPool,
}

impl TestService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Tests authored by the user. Generated variations (student-only copies
    /// and anything derived from a template) are hidden from this list.
    pub async fn list_tests_for_user(&self, user_id: i32) -> Result<Vec<Test>> {
        let tests = sqlx::query_as::<_, Test>(
            r#"
            SELECT * FROM tests
            WHERE user_id = $1 AND is_student_only = FALSE AND template_id IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tests)
    }

    pub async fn create_test(&self, payload: CreateTestPayload, user_id: i32) -> Result<Test> {
        let test = sqlx::query_as::<_, Test>(
            r#"
            INSERT INTO tests (title, description, user_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(test)
    }

    pub async fn get_test(&self, test_id: i32) -> Result<Option<Test>> {
        let test = sqlx::query_as::<_, Test>("SELECT * FROM tests WHERE id = $1")
            .bind(test_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(test)
    }

    pub async fn get_test_with_questions(&self, test_id: i32) -> Result<TestWithQuestions> {
        let test = self
            .get_test(test_id)
            .await?
            .ok_or_else(|| Error::NotFound("Test not found".to_string()))?;

        let questions =
            sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE test_id = $1 ORDER BY id")
                .bind(test_id)
                .fetch_all(&self.pool)
                .await?;

        let mut with_options = Vec::with_capacity(questions.len());
        for question in questions {
            let options = sqlx::query_as::<_, AnswerOption>(
                "SELECT * FROM options WHERE question_id = $1 ORDER BY id",
            )
            .bind(question.id)
            .fetch_all(&self.pool)
            .await?;
            with_options.push(QuestionWithOptions { question, options });
        }

        Ok(TestWithQuestions {
            test,
            questions: with_options,
        })
    }

    /// Owner-scoped delete; returns false when the test does not exist or
    /// belongs to someone else.
    pub async fn delete_test(&self, test_id: i32, user_id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tests WHERE id = $1 AND user_id = $2")
            .bind(test_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_category(&self, test_id: i32, category: &str) -> Result<()> {
        let capped: String = category.chars().take(100).collect();
        sqlx::query("UPDATE tests SET category = $1, updated_at = NOW() WHERE id = $2")
            .bind(capped)
            .bind(test_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Marks a test as a template once it has spawned generated variations.
    pub async fn mark_template(&self, test_id: i32) -> Result<()> {
        sqlx::query("UPDATE tests SET is_template = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(test_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
