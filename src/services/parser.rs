use regex::Regex;
use std::sync::LazyLock;

static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)ПИТАННЯ:\s*(.*?)(?:\n[a-d]\)|\n\n|$)").expect("valid question regex")
});

static OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*([a-dA-D])\)\s*(.+)$").expect("valid option regex")
});

static CORRECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)ПРАВИЛЬНА:\s*([a-dA-D])").expect("valid marker regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOption {
    pub text: String,
    pub is_correct: bool,
}

/// Structured form of one generated item. Options keep their document order;
/// the original letter is implied by position and not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuestion {
    pub text: String,
    pub options: Vec<ParsedOption>,
}

/// Whether the correctness marker resolved to exactly one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correctness {
    Single,
    /// Marker missing or pointing outside the parsed options. The item is
    /// still usable as a candidate; callers decide whether to keep it.
    Unmarked,
}

impl ParsedQuestion {
    pub fn correctness(&self) -> Correctness {
        if self.options.iter().filter(|o| o.is_correct).count() == 1 {
            Correctness::Single
        } else {
            Correctness::Unmarked
        }
    }
}

/// Extracts a question stem, its options and the correct-answer marker from
/// raw generation output.
///
/// The stem runs from the `ПИТАННЯ:` marker to the first option line, the
/// first blank line, or end of text. Option lines are scanned over the whole
/// text, not just past the stem. Returns `None` when the stem is missing or
/// no option lines were found; an unusable correctness marker is tolerated
/// and simply leaves every option unflagged.
pub fn parse_generated(raw: &str) -> Option<ParsedQuestion> {
    let stem = QUESTION_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())?;

    let mut options: Vec<ParsedOption> = OPTION_RE
        .captures_iter(raw)
        .map(|c| ParsedOption {
            text: c[2].trim().to_string(),
            is_correct: false,
        })
        .collect();

    if options.is_empty() {
        return None;
    }

    if let Some(c) = CORRECT_RE.captures(raw) {
        let letter = c[1].to_lowercase().chars().next()?;
        let index = (letter as usize) - ('a' as usize);
        if let Some(opt) = options.get_mut(index) {
            opt.is_correct = true;
        }
    }

    Some(ParsedQuestion {
        text: stem,
        options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str =
        "ПИТАННЯ: What is 2+2?\na) 3\nb) 4\nc) 5\nd) 6\nПРАВИЛЬНА: b";

    #[test]
    fn parses_well_formed_output() {
        let parsed = parse_generated(WELL_FORMED).unwrap();
        assert_eq!(parsed.text, "What is 2+2?");
        assert_eq!(parsed.options.len(), 4);
        let texts: Vec<&str> = parsed.options.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, vec!["3", "4", "5", "6"]);
        assert!(parsed.options[1].is_correct);
        assert_eq!(parsed.options.iter().filter(|o| o.is_correct).count(), 1);
        assert_eq!(parsed.correctness(), Correctness::Single);
    }

    #[test]
    fn stem_may_span_lines_until_blank_line() {
        let raw = "ПИТАННЯ: Solve for x:\n2x + 3 = 7\n\nsome trailing prose\na) 1\nb) 2\nc) 3\nd) 4\nПРАВИЛЬНА: b";
        let parsed = parse_generated(raw).unwrap();
        assert_eq!(parsed.text, "Solve for x:\n2x + 3 = 7");
        assert_eq!(parsed.options.len(), 4);
        assert!(parsed.options[1].is_correct);
    }

    #[test]
    fn missing_question_marker_fails() {
        let raw = "a) 1\nb) 2\nc) 3\nd) 4\nПРАВИЛЬНА: a";
        assert_eq!(parse_generated(raw), None);
    }

    #[test]
    fn zero_option_lines_fail_even_with_stem_and_marker() {
        let raw = "ПИТАННЯ: What is 2+2?\nПРАВИЛЬНА: b";
        assert_eq!(parse_generated(raw), None);
    }

    #[test]
    fn missing_marker_yields_zero_correct_options() {
        let raw = "ПИТАННЯ: What is 2+2?\na) 3\nb) 4\nc) 5\nd) 6";
        let parsed = parse_generated(raw).unwrap();
        assert_eq!(parsed.options.len(), 4);
        assert!(parsed.options.iter().all(|o| !o.is_correct));
        assert_eq!(parsed.correctness(), Correctness::Unmarked);
    }

    #[test]
    fn out_of_range_marker_yields_zero_correct_options() {
        // only two options parsed, marker points at the fourth
        let raw = "ПИТАННЯ: Pick one\na) yes\nb) no\nПРАВИЛЬНА: d";
        let parsed = parse_generated(raw).unwrap();
        assert_eq!(parsed.options.len(), 2);
        assert!(parsed.options.iter().all(|o| !o.is_correct));
        assert_eq!(parsed.correctness(), Correctness::Unmarked);
    }

    #[test]
    fn markers_and_letters_are_case_insensitive() {
        let raw = "питання: What?\nA) one\nB) two\nC) three\nD) four\nправильна: C";
        let parsed = parse_generated(raw).unwrap();
        assert_eq!(parsed.text, "What?");
        assert!(parsed.options[2].is_correct);
    }

    #[test]
    fn option_lines_tolerate_leading_whitespace() {
        let raw = "ПИТАННЯ: What?\n  a) one\n\tb) two\nc) three\nd) four\nПРАВИЛЬНА: a";
        let parsed = parse_generated(raw).unwrap();
        assert_eq!(parsed.options.len(), 4);
        assert!(parsed.options[0].is_correct);
    }

    #[test]
    fn preamble_before_marker_is_ignored() {
        let raw = "Ось нове завдання.\n\nПИТАННЯ: Скільки буде 3+4?\na) 6\nb) 7\nc) 8\nd) 9\nПРАВИЛЬНА: b";
        let parsed = parse_generated(raw).unwrap();
        assert_eq!(parsed.text, "Скільки буде 3+4?");
        assert!(parsed.options[1].is_correct);
    }
}
