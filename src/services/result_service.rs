use crate::dto::result_dto::{CreateResultPayload, QuestionWithStudentAnswer, ResultWithQuestions};
use crate::error::{Error, Result};
use crate::models::question::{AnswerOption, Question};
use crate::models::result::TestResult;
use crate::models::test::Test;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;

#[derive(Clone)]
pub struct ResultService {
    pool: PgPool,
}

impl ResultService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a finished sitting.
    ///
    /// The questions the student saw are snapshotted into the result row.
    /// When the sat test was a generated variation, the result is attached
    /// to its template test and the ephemeral variation row is deleted
    /// afterwards; review then runs off the snapshot.
    pub async fn create_result(&self, payload: CreateResultPayload) -> Result<TestResult> {
        let test = sqlx::query_as::<_, Test>("SELECT * FROM tests WHERE id = $1")
            .bind(payload.test_id)
            .fetch_optional(&self.pool)
            .await?;

        let snapshot = match &test {
            Some(test) => Some(self.snapshot_questions(test.id).await?),
            None => None,
        };

        let (target_test_id, original_test_id) = match &test {
            Some(test) => match test.template_id {
                Some(template_id) => {
                    tracing::info!(
                        variation_id = test.id,
                        template_id,
                        "result for a variation, re-attaching to template"
                    );
                    (template_id, Some(template_id))
                }
                None => (test.id, Some(test.id)),
            },
            None => (payload.test_id, Some(payload.test_id)),
        };

        let result = sqlx::query_as::<_, TestResult>(
            r#"
            INSERT INTO results
                (test_id, user_name, score, max_score, answers, question_times, total_time,
                 original_test_id, questions_snapshot)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(target_test_id)
        .bind(&payload.user_name)
        .bind(payload.score)
        .bind(payload.max_score)
        .bind(payload.answers.clone().unwrap_or_else(|| json!({})))
        .bind(&payload.question_times)
        .bind(payload.total_time)
        .bind(original_test_id)
        .bind(&snapshot)
        .fetch_one(&self.pool)
        .await?;

        if let Some(test) = &test {
            if test.template_id.is_some() {
                sqlx::query("DELETE FROM tests WHERE id = $1")
                    .bind(test.id)
                    .execute(&self.pool)
                    .await?;
                tracing::info!(variation_id = test.id, "variation deleted after submission");
            }
        }

        Ok(result)
    }

    /// Results for a test, each joined with the questions the student saw
    /// (snapshot when present, live rows otherwise) and their answers.
    pub async fn list_results_for_test(&self, test_id: i32) -> Result<Vec<ResultWithQuestions>> {
        let test = sqlx::query_as::<_, Test>("SELECT * FROM tests WHERE id = $1")
            .bind(test_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Test not found".to_string()))?;

        let results = sqlx::query_as::<_, TestResult>(
            "SELECT * FROM results WHERE test_id = $1 ORDER BY created_at DESC",
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;

        let live_questions = self.snapshot_questions(test_id).await?;

        let mut out = Vec::with_capacity(results.len());
        for result in results {
            let questions_data = result
                .questions_snapshot
                .clone()
                .unwrap_or_else(|| live_questions.clone());
            let answers = result.answers.as_object().cloned().unwrap_or_default();

            let mut questions_with_answers = Vec::new();
            if let Some(items) = questions_data.as_array() {
                for item in items {
                    let question_id = item.get("id").and_then(|v| v.as_i64()).unwrap_or(0) as i32;
                    let student_answer = answers.get(&question_id.to_string()).cloned();
                    questions_with_answers.push(QuestionWithStudentAnswer {
                        id: question_id,
                        text: item
                            .get("text")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        options: item.get("options").cloned().unwrap_or_else(|| json!([])),
                        student_answer,
                    });
                }
            }

            out.push(ResultWithQuestions {
                id: result.id,
                test_id: result.test_id,
                original_test_id: result.original_test_id,
                test_title: test.title.clone(),
                user_name: result.user_name,
                score: result.score,
                max_score: result.max_score,
                created_at: result.created_at,
                total_time: result.total_time,
                question_times: result.question_times,
                questions_with_answers,
            });
        }

        Ok(out)
    }

    /// JSON snapshot of a test's questions and options as the student saw
    /// them: `[{id, text, topic, options: [{id, text, is_correct}]}]`.
    async fn snapshot_questions(&self, test_id: i32) -> Result<JsonValue> {
        let questions =
            sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE test_id = $1 ORDER BY id")
                .bind(test_id)
                .fetch_all(&self.pool)
                .await?;

        let mut snapshot = Vec::with_capacity(questions.len());
        for question in questions {
            let options = sqlx::query_as::<_, AnswerOption>(
                "SELECT * FROM options WHERE question_id = $1 ORDER BY id",
            )
            .bind(question.id)
            .fetch_all(&self.pool)
            .await?;

            snapshot.push(json!({
                "id": question.id,
                "text": question.text,
                "topic": question.topic,
                "options": options
                    .iter()
                    .map(|o| json!({"id": o.id, "text": o.text, "is_correct": o.is_correct}))
                    .collect::<Vec<_>>(),
            }));
        }

        Ok(JsonValue::Array(snapshot))
    }
}
