use crate::models::question::AnswerOption;
use rand::Rng;
use serde::Serialize;

/// One entry of the message list sent to the generation service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

const MATH_EXPERT_PERSONA: &str = "Ти експерт по математиці. Відповідай лише назвою теми.";
const AUTHOR_PERSONA: &str = "Ти експерт зі створення навчальних матеріалів з математики.";

/// Formats source options as `a) text` lines in their original order.
pub fn format_options_for_prompt(options: &[AnswerOption]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(i, opt)| format!("{}) {}", (b'a' + i as u8) as char, opt.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 4-digit nonce injected into variation prompts so repeated calls with the
/// same source question do not produce verbatim repeats.
pub fn variation_nonce() -> u16 {
    rand::thread_rng().gen_range(1000..=9999)
}

pub fn build_topic_messages(question_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(MATH_EXPERT_PERSONA),
        ChatMessage::user(format!(
            "Визнач **МАКСИМАЛЬНО КОНКРЕТНУ** тему з математики для наступного питання. \
             Поверни **ЛИШЕ ОДНЕ СЛОВО** – назву цієї теми, без лапок, пояснень чи інших \
             символів і відповідь на Українскій мові.\n\n\n\nПитання: {}",
            question_text
        )),
    ]
}

/// Summary-based classification input for a whole test: title, optional
/// description and the enumerated question texts.
pub fn build_test_summary_messages(
    title: &str,
    description: Option<&str>,
    question_texts: &[String],
) -> Vec<ChatMessage> {
    let mut test_content = format!("Назва тесту: {}\n", title);
    if let Some(desc) = description {
        if !desc.is_empty() {
            test_content.push_str(&format!("Опис: {}\n", desc));
        }
    }
    if !question_texts.is_empty() {
        test_content.push_str("Питання:\n");
        for (i, text) in question_texts.iter().enumerate() {
            test_content.push_str(&format!("{}. {}\n", i + 1, text));
        }
    }

    vec![
        ChatMessage::system(MATH_EXPERT_PERSONA),
        ChatMessage::user(format!(
            "Визнач МАКСИМАЛЬНО КОНКРЕТНУ тему з математики для наступного питання.\n\
             Поверни ЛИШЕ ОДНЕ СЛОВО — назву цієї теми українською без пояснень.\n\
             Тест для аналізу:\n{}\n",
            test_content
        )),
    ]
}

/// Builds the isomorphic-variation prompt. The instructions pin the four
/// generation constraints (topic fidelity, difficulty parity, numeric
/// magnitude parity, surface-only changes) and the fixed a-d output grammar
/// that `parser::parse_generated` expects.
pub fn build_variation_messages(
    topic: &str,
    question_text: &str,
    options: &[AnswerOption],
    correct_text: Option<&str>,
    nonce: u16,
) -> Vec<ChatMessage> {
    let options_block = if options.is_empty() {
        "Варіанти відсутні".to_string()
    } else {
        format_options_for_prompt(options)
    };
    let correct_block = correct_text.unwrap_or("Правильна відповідь відсутня");

    let prompt = format!(
        r#"
Ти — експерт зі створення навчальних матеріалів з математики.
Твоє завдання: створити нове тестове завдання, яке є математично аналогічним (ізоморфним) до наданого зразка.
Випадкове число для різноманітності: {nonce}
Вхідні дані:
- Тема: "{topic}"
- Зразок питання: {question_text}
- Зразок варіантів:
{options_block}
- Зразок правильної відповіді: {correct_block}
Інструкції:
1. Тема та Концепція: Нове питання має СТРОГО відповідати темі "{topic}" та перевіряти ТУ ЖЕ математичну навичку.
2. Складність: СТРОГО ДОТРИМУЙ рівень складності оригіналу. Якщо оригіналь простий - генеруй простий. Не роби складнішим!
3. Числовий діапазон: Використовуй числа ПОДІБНОГО розміру до оригіналу. Якщо там однозначні числа - генеруй однозначні.
4. Зміни: Змінюй тільки конкретні числа та wording, але ЗБЕРІГАЙ структуру та складність.
5. Варіанти відповідей:
    - Згенеруй 4 варіанти відповіді (марковані як a, b, c, d).
    - Тільки один варіант правильний.
    - Позиція правильної відповіді ВИПАДКОВА (a, b, c або d).
    - Неправильні варіанти мають бути реалістичними помилками.
Формат виводу:
ПИТАННЯ: [Текст нового питання]
a) [Варіант A]
b) [Варіант B]
c) [Варіант C]
d) [Варіант D]
ПРАВИЛЬНА: [Тільки буква]
"#
    );

    vec![ChatMessage::system(AUTHOR_PERSONA), ChatMessage::user(prompt)]
}
