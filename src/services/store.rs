use crate::error::Result;
use crate::models::question::{AnswerOption, Question};
use crate::models::test::Test;
use async_trait::async_trait;
use sqlx::PgPool;

/// Row data for a freshly created variation test, before any questions exist.
#[derive(Debug, Clone)]
pub struct NewTestShell {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub user_id: Option<i32>,
    pub template_id: i32,
    pub is_student_only: bool,
}

/// Persistence collaborator of the variation pipeline. Plain create/read
/// operations; the store only guarantees foreign-key integrity between
/// tests, questions and options. Each created question and its options form
/// their own commit unit; there is no batch-wide transaction.
#[async_trait]
pub trait VariationStore: Send + Sync {
    async fn get_test(&self, test_id: i32) -> Result<Option<Test>>;
    async fn get_question(&self, question_id: i32) -> Result<Option<Question>>;
    async fn list_questions(&self, test_id: i32) -> Result<Vec<Question>>;
    async fn list_options(&self, question_id: i32) -> Result<Vec<AnswerOption>>;
    async fn create_test_shell(&self, shell: &NewTestShell) -> Result<i32>;
    async fn create_question(&self, test_id: i32, text: &str, topic: Option<&str>)
        -> Result<i32>;
    async fn create_option(&self, question_id: i32, text: &str, is_correct: bool) -> Result<()>;
}

#[derive(Clone)]
pub struct PgVariationStore {
    pool: PgPool,
}

impl PgVariationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VariationStore for PgVariationStore {
    async fn get_test(&self, test_id: i32) -> Result<Option<Test>> {
        let test = sqlx::query_as::<_, Test>("SELECT * FROM tests WHERE id = $1")
            .bind(test_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(test)
    }

    async fn get_question(&self, question_id: i32) -> Result<Option<Question>> {
        let question = sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = $1")
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(question)
    }

    async fn list_questions(&self, test_id: i32) -> Result<Vec<Question>> {
        let questions =
            sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE test_id = $1 ORDER BY id")
                .bind(test_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(questions)
    }

    async fn list_options(&self, question_id: i32) -> Result<Vec<AnswerOption>> {
        let options = sqlx::query_as::<_, AnswerOption>(
            "SELECT * FROM options WHERE question_id = $1 ORDER BY id",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }

    async fn create_test_shell(&self, shell: &NewTestShell) -> Result<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO tests (title, description, user_id, category, is_template, template_id, is_student_only)
            VALUES ($1, $2, $3, $4, FALSE, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&shell.title)
        .bind(&shell.description)
        .bind(shell.user_id)
        .bind(&shell.category)
        .bind(shell.template_id)
        .bind(shell.is_student_only)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn create_question(
        &self,
        test_id: i32,
        text: &str,
        topic: Option<&str>,
    ) -> Result<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO questions (text, test_id, topic) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(text)
        .bind(test_id)
        .bind(topic)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn create_option(&self, question_id: i32, text: &str, is_correct: bool) -> Result<()> {
        sqlx::query("INSERT INTO options (text, is_correct, question_id) VALUES ($1, $2, $3)")
            .bind(text)
            .bind(is_correct)
            .bind(question_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
