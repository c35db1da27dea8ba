use chrono::Utc;

use crate::models::{EmailContent, UserPreference};

pub const DEFAULT_CLASSIFICATION_PROMPT: &str = r#"You are an AI assistant that helps classify emails into categories.
Analyze the email content, subject, and sender to determine the most appropriate category.

Categories:
- ATTN: Urgent emails requiring immediate attention
- FK-U: Spam, scams, or unwanted communications
- MARKETING: Promotional emails and newsletters
- TAKE-A-LOOK: Non-urgent but potentially interesting or useful emails
- HMMMM: Emails that are ambiguous or need more context to categorize

Provide your classification and a brief explanation why in JSON format:
{"classification": "ATTN/FK-U/MARKETING/TAKE-A-LOOK/HMMMM", "reason": "your explanation here", "confidence": 0.0-1.0}"#;

/// Template for caller-supplied content; see [`render_template`].
pub const DEFAULT_CONTENT_TEMPLATE: &str = r#"Please classify this email as either:

ATTN: emails that are clearly from a real person that wanted to reach out to me for a specific reason. you can also place high value notifications here/ time sensitive.
FK-U: people trying to sell me stuff via their annoying email funnel or scam/phish me (ex. "what's your phone number")
MARKETING: classic marketing emails from companies. safe to ignore type stuff. stuff like ny times/bloomberg type stuff fits in here.
TAKE-A-LOOK: notification style emails that i should look at quickly ex flight updates, bank updates, bills, etc.
HMMMM: if you really aren't sure where to put it. dont put newsletters from builder type individuals in here, i prefer them in attn.

From: {sender}
Subject: {subject}
Content: {content}
Date Sent: {email_date}

Provide your classification and a brief explanation why in JSON format:
{{"classification": "ATTN/FK-U/MARKETING/TAKE-A-LOOK/HMMMM", "reason": "your explanation here"}}"#;

pub const BULK_CLASSIFICATION_PROMPT: &str = r#"You are an email classifier. You will receive a list of emails and must return a JSON object mapping email IDs to their classifications.

Classification Categories:
ATTN: emails that are clearly from a real person that wanted to reach out to me for a specific reason. you can also place high value notifications here/ time sensitive.
FK-U: people trying to sell me stuff via their annoying email funnel or scam/phish me (ex. "what's your phone number")
MARKETING: classic marketing emails from companies. safe to ignore type stuff. stuff like ny times/bloomberg type stuff fits in here.
TAKE-A-LOOK: notification style emails that i should look at quickly ex flight updates, bank updates, bills, etc.
HMMMM: if you really aren't sure where to put it.

Classification Rules:
- Personal message from friend or colleagues -> ATTN
- Tech feature announcements <14 days old -> TAKE-A-LOOK
- Tech feature announcements >14 days old -> MARKETING
- Mass outreach/sales pitches -> FK-U
- Service notifications (banking, flights) -> TAKE-A-LOOK
- News/world updates -> MARKETING
- Impersonal outreach -> FK-U

REQUIRED OUTPUT FORMAT:
{
  "email_id": {
    "classification": "one of: ATTN/FK-U/MARKETING/TAKE-A-LOOK/HMMMM",
    "reason": "brief explanation"
  }
}"#;

pub const IMPORTANCE_PROMPT: &str = r#"You are an email analyzer that:
1. Selects the top 20 most important emails based on urgency, sender credibility, content relevance, and time sensitivity
2. Ignores marketing emails and other non-urgent emails from SaaS products or services unless they are important.
3. Creates a brief, actionable summary for each selected email in casual, witty language.
Return only a JSON object with array 'important_emails' containing objects with 'id' and 'summary' fields."#;

/// Substitutes `{sender}`, `{subject}`, `{content}` and `{email_date}`.
/// `{{` and `}}` render as literal braces; unknown placeholders are left as is.
pub fn render_template(template: &str, email: &EmailContent) -> String {
    let mut out = String::with_capacity(template.len() + email.content.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('{') {
            if let Some(end) = tail.find('}') {
                if let Some(value) = placeholder(&tail[1..end], email) {
                    out.push_str(&value);
                    rest = &tail[end + 1..];
                    continue;
                }
            }
        }

        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}

/// The supplied send date, or the current time when the caller gave none.
pub(crate) fn sent_date(email: &EmailContent) -> String {
    email
        .email_date
        .clone()
        .unwrap_or_else(|| Utc::now().to_rfc3339())
}

fn placeholder(name: &str, email: &EmailContent) -> Option<String> {
    match name {
        "sender" => Some(email.sender.clone()),
        "subject" => Some(email.subject.clone()),
        "content" => Some(email.content.clone()),
        "email_date" => Some(sent_date(email)),
        _ => None,
    }
}

/// User-specific inputs to prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptSettings {
    pub custom_prompt: Option<String>,
    pub priority_senders: Vec<String>,
    pub ignored_senders: Vec<String>,
    pub content_keywords: Vec<String>,
}

impl PromptSettings {
    pub fn from_preference(preference: Option<&UserPreference>) -> Self {
        match preference {
            Some(pref) => Self {
                custom_prompt: pref.prompt().map(str::to_string),
                priority_senders: pref.priority_senders(),
                ignored_senders: pref.ignored_senders(),
                content_keywords: pref.content_keywords(),
            },
            None => Self::default(),
        }
    }

    /// The custom prompt when set, otherwise `default`, with preference context appended.
    pub fn system_prompt(&self, default: &str) -> String {
        let base = self.custom_prompt.as_deref().unwrap_or(default);
        self.with_preferences(base)
    }

    /// Appends the user's sender and keyword lists to `prompt`.
    pub fn with_preferences(&self, prompt: &str) -> String {
        let sections = [
            ("Priority senders (lean towards ATTN)", &self.priority_senders),
            ("Ignored senders (lean towards MARKETING or FK-U)", &self.ignored_senders),
            ("Keywords the user cares about", &self.content_keywords),
        ];

        let context: Vec<String> = sections
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(title, values)| format!("- {}: {}", title, values.join(", ")))
            .collect();

        if context.is_empty() {
            return prompt.to_string();
        }

        format!(
            "{}\n\nUser preferences:\n{}",
            prompt.trim_end(),
            context.join("\n")
        )
    }
}
