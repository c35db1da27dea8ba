//! Message body extraction and text cleanup.

use base64::prelude::*;
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{GmailMessage, GmailMessagePart};

const HTML: &str = "text/html";
const PLAIN: &str = "text/plain";

fn compile(rules: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    rules
        .iter()
        .filter_map(|(pattern, replacement)| match Regex::new(pattern) {
            Ok(re) => Some((re, *replacement)),
            Err(e) => {
                tracing::error!("Invalid cleanup pattern {}: {}", pattern, e);
                None
            }
        })
        .collect()
}

lazy_static! {
    static ref TAGS: Vec<(Regex, &'static str)> = compile(&[(r"<[^>]*>", " ")]);
    static ref WHITESPACE: Vec<(Regex, &'static str)> = compile(&[(r"\s+", " ")]);
    static ref FOOTERS: Vec<Regex> = compile(&[
        (r"(?i)Unsubscribe\s*\|", ""),
        (r"(?i)To stop receiving", ""),
        (r"(?i)View this email in your browser", ""),
        (r"(?i)This email was sent to", ""),
        (r"(?i)Copyright © \d{4}", ""),
        (r"(?i)All Rights Reserved", ""),
        (r"(?i)Contact us at", ""),
        (r"(?i)Please do not reply", ""),
    ])
    .into_iter()
    .map(|(re, _)| re)
    .collect();

    // Applied in order
    static ref DISPLAY_RULES: Vec<(Regex, &'static str)> = compile(&[
        (r"(?s)<style[^>]*>.*?</style>", ""),
        (r"(?s)<script[^>]*>.*?</script>", ""),
        (r#"<img[^>]*alt="([^"]*)"[^>]*>"#, "$1"),
        (r"<img[^>]*>", ""),
        (r"(?i)Copyright (?:Â)?©[^\n]*", ""),
        (r"(?i)You are receiving this email because[^\n]*", ""),
        (r"(?i)To connect with us[^\n]*", ""),
        (r"(?i)Our mailing address[^\n]*", ""),
        (r"(?i)Unsubscribe[^\n]*", ""),
        (r"(?i)Add [^\n]* to your address book[^\n]*", ""),
        (r#"style="[^"]*""#, ""),
        (r#"class="[^"]*""#, ""),
        (r#"width="[^"]*""#, ""),
        (r#"height="[^"]*""#, ""),
        (r#"align="[^"]*""#, ""),
        (r#"<a[^>]*href="[^"]*"[^>]*>([^<]+)</a>"#, "$1"),
        (r"data:image/[^;]+;base64,[a-zA-Z0-9+/]+=*", ""),
        (r"<[^>]+>", " "),
        (r" +", " "),
        (r"\n\s*\n\s*\n+", "\n\n"),
        (r"(?m)^\s*>+\s*", "> "),
    ]);
    static ref NESTED_QUOTE: Vec<(Regex, &'static str)> = compile(&[
        (r"\s*>\s*>\s*", "> "),
        (r"^\s*>+\s*", "> "),
    ]);
    static ref BLANK_LINES: Vec<(Regex, &'static str)> = compile(&[(r"\n\s*\n\s*\n+", "\n\n")]);
}

fn apply(text: &str, rules: &[(Regex, &'static str)]) -> String {
    rules.iter().fold(text.to_string(), |acc, (re, replacement)| {
        re.replace_all(&acc, *replacement).into_owned()
    })
}

/// Decodes a Gmail body payload. Accepts either base64 alphabet with or
/// without padding; anything undecodable yields an empty string.
pub fn decode_body(data: &str) -> String {
    let normalized: String = data
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    match BASE64_URL_SAFE_NO_PAD.decode(normalized.as_bytes()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::debug!("Failed to decode message body: {}", e);
            String::new()
        }
    }
}

fn first_with_type(parts: &[GmailMessagePart], mime_type: &str) -> Option<String> {
    parts
        .iter()
        .filter(|p| p.mime_type == mime_type)
        .find_map(|p| p.body_data())
        .map(decode_body)
}

fn search_parts(parts: &[GmailMessagePart], preference: [&str; 2]) -> Option<String> {
    first_with_type(parts, preference[0])
        .or_else(|| first_with_type(parts, preference[1]))
        .or_else(|| {
            parts
                .iter()
                .filter(|p| !p.parts.is_empty())
                .find_map(|p| search_parts(&p.parts, preference))
        })
}

fn extract_body(message: &GmailMessage, preference: [&str; 2]) -> Option<String> {
    let payload = message.payload.as_ref()?;
    if let Some(data) = payload.body_data() {
        return Some(decode_body(data));
    }
    search_parts(&payload.parts, preference)
}

/// Body for display: HTML preferred over plain text, falling back to the snippet.
pub fn extract_display_content(message: &GmailMessage) -> String {
    extract_body(message, [HTML, PLAIN]).unwrap_or_else(|| message.snippet.clone())
}

/// Body for analysis: plain text preferred over HTML, empty when absent.
pub fn extract_plain_content(message: &GmailMessage) -> String {
    extract_body(message, [PLAIN, HTML]).unwrap_or_default()
}

/// Flattens a body to one line of text and cuts it at the first footer.
pub fn clean_for_classification(content: &str) -> String {
    let text = apply(content, &TAGS);
    let mut text = apply(&text, &WHITESPACE).trim().to_string();

    for footer in FOOTERS.iter() {
        if let Some(m) = footer.find(&text) {
            if m.start() > 0 {
                text = text[..m.start()].trim().to_string();
            }
        }
    }

    text
}

/// Readable cleanup of an HTML or text body: markup, tracking images and
/// marketing boilerplate removed, quote markers normalised.
pub fn clean_email_content(content: &str) -> String {
    let text = apply(content, &DISPLAY_RULES);

    let text = text
        .split('\n')
        .map(|line| {
            if line.trim().starts_with('>') {
                apply(line, &NESTED_QUOTE)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    apply(&text, &BLANK_LINES).trim().to_string()
}

/// The user message sent to the model for a single email.
pub fn format_for_classification(message: &GmailMessage) -> String {
    let from = message.header("From").unwrap_or_default();
    let subject = message.header("Subject").unwrap_or_default();
    let content = clean_for_classification(&extract_plain_content(message));

    format!("From: {}\nSubject: {}\n\nContent:\n{}", from, subject, content)
}
