//! Body cleaning ahead of extraction: signatures, quoted replies and the
//! opening greeting are removed so they never reach the digest.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::Message;

/// Signature blocks. Each pattern cuts from its anchor to the end of the
/// body, except the mobile footer which only drops its own line.
static SIGNATURE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?s)\n--\s*\n.*",
        r"(?is)\nBest regards,?\n.*",
        r"(?is)\nThanks,?\n.*",
        r"(?i)\nSent from my (?:iPhone|iPad|Android|mobile device)[^\n]*",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static GREETING: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^(?:Hi|Hello|Hey|Dear)\s+\w+,?\s*\n"));

fn compile(pattern: &str) -> Regex {
    // static literals, cannot fail
    #[allow(clippy::expect_used)]
    Regex::new(pattern).expect("cleaner regex")
}

/// Clean a body: signatures, then quoted lines, then a leading greeting.
/// The result is trimmed.
pub fn clean_body(body: &str) -> String {
    let mut text = body.to_string();
    for pattern in SIGNATURE_PATTERNS.iter() {
        text = pattern.replace_all(&text, "").into_owned();
    }

    let text = strip_quoted_lines(&text);
    let text = GREETING.replace(&text, "");
    text.trim().to_string()
}

/// Cleaned copy of `message`; the original is left untouched.
pub fn clean_message(message: &Message) -> Message {
    message.with_cleaned_body(clean_body(&message.body_text))
}

/// Drop every line whose first non-blank character is `>`.
fn strip_quoted_lines(body: &str) -> String {
    body.split('\n')
        .filter(|line| !line.trim().starts_with('>'))
        .collect::<Vec<_>>()
        .join("\n")
}
