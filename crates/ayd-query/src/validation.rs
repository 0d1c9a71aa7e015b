//! Input validation for questions and file names.

use std::sync::LazyLock;

use regex::Regex;

/// Shortest accepted question, in non-space characters.
pub const MIN_QUESTION_CHARS: usize = 3;

/// Longest accepted question, in characters.
pub const MAX_QUESTION_LENGTH: usize = 1000;

/// Default limit for [`sanitize_input`].
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 1000;

/// Markup and script fragments rejected in questions.
static HARMFUL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)<script|javascript:|\bon\w+\s*=").ok());

/// Windows device names that cannot be used as file names.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Checks a question before retrieval, returning a message describing the problem.
pub fn validate_question(question: &str) -> Result<(), String> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err("Question cannot be empty".into());
    }
    if trimmed.chars().filter(|c| !c.is_whitespace()).count() < MIN_QUESTION_CHARS {
        return Err(format!(
            "Question is too short (at least {MIN_QUESTION_CHARS} characters)"
        ));
    }
    if trimmed.chars().count() > MAX_QUESTION_LENGTH {
        return Err(format!(
            "Question is too long (at most {MAX_QUESTION_LENGTH} characters)"
        ));
    }
    if trimmed.chars().all(|c| c == '?' || c.is_whitespace()) {
        return Err("Question cannot consist of only question marks".into());
    }
    if HARMFUL.as_ref().is_some_and(|re| re.is_match(trimmed)) {
        return Err("Question contains potentially harmful content".into());
    }
    Ok(())
}

/// Cleans free-form input.
///
/// Control characters other than newline and tab are dropped, whitespace runs
/// collapse to one space and the result is trimmed. Text longer than
/// `max_length` characters is cut at the last word boundary and ends in "...".
pub fn sanitize_input(input: &str, max_length: usize) -> String {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_length {
        return collapsed;
    }

    let cut: String = collapsed.chars().take(max_length).collect();
    let truncated = match cut.rfind(' ') {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}...", truncated.trim_end())
}

/// Returns true if `name` is a plain file name safe to create on any platform.
pub fn is_safe_filename(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    if name.contains(['/', '\\']) || name.contains("..") {
        return false;
    }
    if name
        .chars()
        .any(|c| matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*') || c.is_control())
    {
        return false;
    }
    let stem = name.split('.').next().unwrap_or(name);
    !RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(stem))
}
