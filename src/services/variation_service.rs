use crate::error::{Error, Result};
use crate::models::question::{AnswerOption, Question};
use crate::services::classifier::{self, ClassifierService};
use crate::services::generation_service::CompletionBackend;
use crate::services::parser::{self, Correctness, ParsedQuestion};
use crate::services::prompt;
use crate::services::store::{NewTestShell, VariationStore};
use std::sync::Arc;
use std::time::Duration;

/// Pause between per-question generation calls in whole-test mode, so batch
/// runs respect the external service's rate limits.
const QUESTION_PACING: Duration = Duration::from_secs(1);

/// What to do with a source question whose variation could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Leave the question out; the variation ends up smaller than the source.
    SkipQuestion,
    /// Carry the source question and options over unchanged, so a student
    /// sitting always receives a complete test.
    CopySource,
}

/// One whole-test variation order. Consumed by `create_test_variation`.
#[derive(Debug, Clone)]
pub struct VariationRequest {
    pub source_test_id: i32,
    pub new_title: Option<String>,
    pub new_description: Option<String>,
    pub user_id: Option<i32>,
    pub student_only: bool,
    pub fallback: FallbackPolicy,
}

/// Drives the generation pipeline end to end, from topic resolution through
/// prompt, gateway and parse to persistence. Owns no state beyond handles to
/// its collaborators.
#[derive(Clone)]
pub struct VariationService {
    completion: Arc<dyn CompletionBackend>,
    store: Arc<dyn VariationStore>,
    classifier: ClassifierService,
    pacing: Duration,
}

impl VariationService {
    pub fn new(completion: Arc<dyn CompletionBackend>, store: Arc<dyn VariationStore>) -> Self {
        let classifier = ClassifierService::new(completion.clone());
        Self {
            completion,
            store,
            classifier,
            pacing: QUESTION_PACING,
        }
    }

    /// Overrides the inter-question pause; tests run with `Duration::ZERO`.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Generates a variation of a single question and persists it under
    /// `target_test_id`. Returns `Ok(None)` when the generation service is
    /// unavailable or its output does not parse; these are expected
    /// degradations, not errors.
    pub async fn generate_for_question(
        &self,
        question_id: i32,
        target_test_id: i32,
    ) -> Result<Option<i32>> {
        let question = self
            .store
            .get_question(question_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Question {} not found", question_id)))?;
        let options = self.store.list_options(question.id).await?;
        let topic = self.resolve_topic(&question).await;

        match self.generate_one(&question, &options, &topic).await {
            Some(parsed) => {
                let new_id = self
                    .persist_generated(target_test_id, &parsed, &topic)
                    .await?;
                Ok(Some(new_id))
            }
            None => Ok(None),
        }
    }

    /// Whole-test mode. The new test shell is created before any generation
    /// happens, so a partially failed batch yields a smaller test rather
    /// than no test. Per-question failures are logged and handled per the
    /// request's fallback policy; only a missing source test aborts the
    /// whole operation.
    pub async fn create_test_variation(&self, request: VariationRequest) -> Result<i32> {
        let source = self
            .store
            .get_test(request.source_test_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("Test {} not found", request.source_test_id))
            })?;

        let shell = NewTestShell {
            title: request
                .new_title
                .unwrap_or_else(|| format!("{} (Generated Variation)", source.title)),
            description: request.new_description.or_else(|| source.description.clone()),
            category: source.category.clone(),
            user_id: request.user_id.or(source.user_id),
            template_id: source.id,
            is_student_only: request.student_only,
        };
        let new_test_id = self.store.create_test_shell(&shell).await?;

        let questions = self.store.list_questions(source.id).await?;
        for question in &questions {
            if let Err(e) = self
                .process_batch_question(new_test_id, question, request.fallback)
                .await
            {
                tracing::error!(question_id = question.id, error = ?e, "failed to persist generated question, skipping");
            }
            tokio::time::sleep(self.pacing).await;
        }

        tracing::info!(source_test_id = source.id, new_test_id, "test variation created");
        Ok(new_test_id)
    }

    async fn process_batch_question(
        &self,
        new_test_id: i32,
        question: &Question,
        fallback: FallbackPolicy,
    ) -> Result<()> {
        let options = self.store.list_options(question.id).await?;
        let topic = self.resolve_topic(question).await;

        match self.generate_one(question, &options, &topic).await {
            Some(parsed) => {
                self.persist_generated(new_test_id, &parsed, &topic).await?;
            }
            None => match fallback {
                FallbackPolicy::SkipQuestion => {
                    tracing::warn!(
                        question_id = question.id,
                        "no variation generated, skipping question"
                    );
                }
                FallbackPolicy::CopySource => {
                    tracing::warn!(
                        question_id = question.id,
                        "no variation generated, copying source question"
                    );
                    self.persist_source_copy(new_test_id, question, &options, &topic)
                        .await?;
                }
            },
        }
        Ok(())
    }

    /// Best-effort topic for one question: remote classification first, then
    /// the stored label, then the local keyword table.
    async fn resolve_topic(&self, question: &Question) -> String {
        if let Some(topic) = self.classifier.classify_question(&question.text).await {
            return topic;
        }
        question
            .topic
            .clone()
            .unwrap_or_else(|| classifier::keyword_topic(&question.text).to_string())
    }

    /// One generation attempt: prompt, gateway call, parse. `None` covers both
    /// an unavailable service and unparseable output; the raw exchange only
    /// surfaces in diagnostic logs.
    async fn generate_one(
        &self,
        question: &Question,
        options: &[AnswerOption],
        topic: &str,
    ) -> Option<ParsedQuestion> {
        let correct_text = options
            .iter()
            .find(|o| o.is_correct)
            .map(|o| o.text.clone());
        let messages = prompt::build_variation_messages(
            topic,
            &question.text,
            options,
            correct_text.as_deref(),
            prompt::variation_nonce(),
        );

        let raw = self.completion.complete(&messages, 0.7, 800, false).await?;
        tracing::debug!(question_id = question.id, raw_output = %raw, "generation output received");

        let parsed = match parser::parse_generated(&raw) {
            Some(parsed) => parsed,
            None => {
                tracing::warn!(question_id = question.id, "generation output did not parse");
                return None;
            }
        };
        if parsed.correctness() == Correctness::Unmarked {
            // kept as-is: an unscored candidate, not a rejection
            tracing::warn!(
                question_id = question.id,
                "generated item has no usable correctness marker"
            );
        }
        let preview: String = parsed.text.chars().take(50).collect();
        tracing::info!(question_id = question.id, "generated question: {}...", preview);
        Some(parsed)
    }

    async fn persist_generated(
        &self,
        test_id: i32,
        parsed: &ParsedQuestion,
        topic: &str,
    ) -> Result<i32> {
        let question_id = self
            .store
            .create_question(test_id, &parsed.text, Some(topic))
            .await?;
        for option in &parsed.options {
            self.store
                .create_option(question_id, &option.text, option.is_correct)
                .await?;
        }
        Ok(question_id)
    }

    async fn persist_source_copy(
        &self,
        test_id: i32,
        question: &Question,
        options: &[AnswerOption],
        topic: &str,
    ) -> Result<i32> {
        let question_id = self
            .store
            .create_question(test_id, &question.text, Some(topic))
            .await?;
        for option in options {
            self.store
                .create_option(question_id, &option.text, option.is_correct)
                .await?;
        }
        Ok(question_id)
    }
}
