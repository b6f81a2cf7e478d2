use crate::services::generation_service::CompletionBackend;
use crate::services::prompt;
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// Ordered substring-to-canonical-label table used to normalize raw
/// classification replies. First match wins; the order is significant.
const CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    ("матем", "Математика"),
    ("истор", "История"),
    ("болог", "Биология"),
    ("хим", "Химия"),
    ("физ", "Физика"),
    ("мов", "Мовы"),
    ("язык", "Языки"),
    ("литера", "Литература"),
    ("географ", "География"),
    ("інформ", "Інформатика"),
    ("информ", "Информатика"),
];

/// Ordered keyword table for the network-free fallback. More specific
/// keywords come before broader ones; first match wins.
const TOPIC_KEYWORDS: &[(&str, &str)] = &[
    ("алгебр", "Алгебра"),
    ("логарифм", "Алгебра"),
    ("куб", "Геометрия"),
    ("квадрат", "Геометрия"),
    ("треугол", "Геометрия"),
    ("периметр", "Геометрия"),
    ("площад", "Геометрия"),
    ("дериват", "Аналіз"),
    ("процент", "Арифметика"),
    ("дроб", "Арифметика"),
    ("корен", "Алгебра"),
];

pub const DEFAULT_TOPIC: &str = "Математика";

static THINK_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("valid think-block regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

static NON_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s\-А-Яа-яЁёІіЇїЄєҐґ]").expect("valid label charset regex")
});

/// Cleans a raw classification reply down to a single usable label.
///
/// Strips quotes, reasoning-trace markup and leftover tags, keeps the first
/// non-blank line (up to the first colon), then tries the canonical category
/// table before falling back to the cleaned text capped at 100 characters.
pub fn sanitize_topic(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }
    let text = raw.trim().replace(['"', '\''], "");
    let text = THINK_BLOCK_RE.replace_all(&text, "");
    let text = TAG_RE.replace_all(&text, "");

    let mut first_line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .to_string();
    if let Some((head, _)) = first_line.split_once(':') {
        first_line = head.trim().to_string();
    }

    let low = first_line.to_lowercase();
    for (key, label) in CATEGORY_KEYWORDS {
        if low.contains(key) {
            return Some((*label).to_string());
        }
    }

    let cleaned = NON_LABEL_RE.replace_all(&first_line, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    Some(cleaned.chars().take(100).collect())
}

/// Network-free topic inference over the raw question text. Deterministic:
/// the first table entry whose keyword occurs in the text wins.
pub fn keyword_topic(text: &str) -> &'static str {
    if text.is_empty() {
        return DEFAULT_TOPIC;
    }
    let low = text.to_lowercase();
    for (key, label) in TOPIC_KEYWORDS {
        if low.contains(key) {
            return label;
        }
    }
    DEFAULT_TOPIC
}

/// Topic classification with a remote primary path and the keyword fallback.
#[derive(Clone)]
pub struct ClassifierService {
    completion: Arc<dyn CompletionBackend>,
}

impl ClassifierService {
    pub fn new(completion: Arc<dyn CompletionBackend>) -> Self {
        Self { completion }
    }

    /// Single-question topic via the generation service; `None` when the
    /// service is unavailable or its reply sanitizes to nothing.
    pub async fn classify_question(&self, question_text: &str) -> Option<String> {
        let messages = prompt::build_topic_messages(question_text);
        let raw = self.completion.complete(&messages, 0.1, 200, false).await?;
        sanitize_topic(&raw)
    }

    /// Whole-test category from its title, description and question texts.
    pub async fn classify_test(
        &self,
        title: &str,
        description: Option<&str>,
        question_texts: &[String],
    ) -> Option<String> {
        let messages = prompt::build_test_summary_messages(title, description, question_texts);
        let raw = self.completion.complete(&messages, 0.1, 50, true).await?;
        sanitize_topic(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_quotes_and_matches_table() {
        assert_eq!(sanitize_topic("\"Математика\""), Some("Математика".into()));
        assert_eq!(sanitize_topic("история древнего мира"), Some("История".into()));
    }

    #[test]
    fn sanitize_strips_reasoning_trace_markup() {
        let raw = "<think>the user asks about numbers\nso it is math</think>\nМатематика";
        assert_eq!(sanitize_topic(raw), Some("Математика".into()));
    }

    #[test]
    fn sanitize_keeps_text_before_colon() {
        assert_eq!(
            sanitize_topic("Тема: квадратні рівняння"),
            Some("Тема".into())
        );
    }

    #[test]
    fn sanitize_falls_back_to_cleaned_first_line() {
        assert_eq!(sanitize_topic("Тригонометрія!!!"), Some("Тригонометрія".into()));
    }

    #[test]
    fn sanitize_rejects_empty_and_symbol_only_input() {
        assert_eq!(sanitize_topic(""), None);
        assert_eq!(sanitize_topic("   \n  "), None);
        assert_eq!(sanitize_topic("!!!???"), None);
    }

    #[test]
    fn sanitize_truncates_long_labels() {
        let long = "а".repeat(250);
        let label = sanitize_topic(&long).unwrap();
        assert_eq!(label.chars().count(), 100);
    }

    #[test]
    fn keyword_topic_first_table_entry_wins() {
        // "квадрат" appears first in the text, but "алгебр" comes first in
        // the table; table order decides.
        let text = "Площа квадрата та алгебраїчні вирази";
        assert_eq!(keyword_topic(text), "Алгебра");
    }

    #[test]
    fn keyword_topic_matches_substrings_case_insensitively() {
        assert_eq!(keyword_topic("Обчисліть ЛОГАРИФМ числа"), "Алгебра");
        assert_eq!(keyword_topic("Знайдіть периметр фігури"), "Геометрия");
        assert_eq!(keyword_topic("Скільки процентів від 80?"), "Арифметика");
    }

    #[test]
    fn keyword_topic_defaults_and_is_idempotent() {
        let text = "Побудуйте графік функції";
        assert_eq!(keyword_topic(text), DEFAULT_TOPIC);
        assert_eq!(keyword_topic(text), keyword_topic(text));
        assert_eq!(keyword_topic(""), DEFAULT_TOPIC);
    }
}
