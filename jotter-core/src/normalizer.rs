//! Natural-language task normalization.
//!
//! Free text goes in, a [`StructuredTask`] comes out:
//! 1) build a prompt asking for a four-field JSON object
//! 2) one call to the injected [`TextGenerator`]
//! 3) parse the reply; anything malformed becomes an empty record
//! 4) repair each field against its closed set / date rules
//!
//! Only a failed generator call is returned as an error. Bad model output never is.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::fuzzy_date::DateParser;
use crate::task::{Category, Priority, StructuredTask};

/// Failure of the outbound model call itself (network, auth, quota, provider).
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("model provider is not configured: {0}")]
    NotConfigured(String),

    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model provider returned {status}: {body}")]
    Provider { status: u16, body: String },
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("text generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Text in, free-form text out. Implementations may be slow or fail.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

impl<G: TextGenerator + ?Sized> TextGenerator for &G {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}

impl<G: TextGenerator + ?Sized> TextGenerator for Box<G> {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}

/// Model output as parsed, before repair. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExtractedFields {
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

pub struct TaskNormalizer<G> {
    generator: G,
    dates: DateParser,
}

impl<G: TextGenerator> TaskNormalizer<G> {
    pub fn new(generator: G) -> Result<Self, regex::Error> {
        Ok(Self::with_date_parser(generator, DateParser::new()?))
    }

    pub fn with_date_parser(generator: G, dates: DateParser) -> Self {
        Self { generator, dates }
    }

    /// Normalize `raw_text` submitted on `reference_date`.
    pub fn normalize(
        &self,
        raw_text: &str,
        reference_date: NaiveDate,
    ) -> Result<StructuredTask, NormalizeError> {
        let prompt = build_prompt(raw_text, reference_date);
        let reply = self.generator.generate(&prompt)?;
        let fields = parse_response(&reply);
        let task = self.repair(fields, raw_text, reference_date);

        info!(
            category = %task.category,
            priority = %task.priority,
            due_date = ?task.due_date,
            "normalized task"
        );
        Ok(task)
    }

    /// Coerce extracted fields into a valid task. Never fails.
    pub fn repair(
        &self,
        fields: ExtractedFields,
        raw_text: &str,
        reference_date: NaiveDate,
    ) -> StructuredTask {
        let description = match fields.task {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => {
                debug!("no description extracted; keeping raw input");
                raw_text.to_string()
            }
        };

        let category = fields
            .category
            .as_deref()
            .and_then(Category::parse_exact)
            .unwrap_or_else(|| {
                debug!(value = ?fields.category, "category outside closed set; using Personal");
                Category::Personal
            });

        let priority = fields
            .priority
            .as_deref()
            .and_then(Priority::parse_loose)
            .unwrap_or_else(|| {
                debug!(value = ?fields.priority, "priority outside closed set; using medium");
                Priority::Medium
            });

        let due_date = self.repair_due_date(fields.due_date.as_deref(), raw_text, reference_date);

        StructuredTask {
            description,
            category,
            priority,
            due_date,
        }
    }

    fn repair_due_date(
        &self,
        model_value: Option<&str>,
        raw_text: &str,
        reference_date: NaiveDate,
    ) -> Option<NaiveDate> {
        match model_value.filter(|v| !is_no_date_marker(v)) {
            // Explicit value from the model: keep whatever it parses to, past or not.
            Some(v) => {
                let parsed = self.dates.parse(v, reference_date);
                if parsed.is_none() {
                    debug!(value = v, "unparseable due_date from model; dropping");
                }
                parsed
            }
            // Inferred from the raw text: only accept today or later.
            None => {
                let inferred = self.dates.parse(raw_text, reference_date)?;
                if inferred >= reference_date {
                    Some(inferred)
                } else {
                    debug!(%inferred, %reference_date, "inferred due date is in the past; dropping");
                    None
                }
            }
        }
    }
}

/// Build the single prompt sent to the model.
pub fn build_prompt(raw_text: &str, reference_date: NaiveDate) -> String {
    let categories = Category::ALL.map(Category::as_str).join(", ");
    let priorities = Priority::ALL.map(Priority::as_str).join(", ");

    format!(
        "You turn a user's free-form todo note into a structured task.\n\
Today's date is {today} ({weekday}).\n\
\n\
Rules:\n\
- task: rewrite the note as one concise, actionable description.\n\
- category: exactly one of: {categories}.\n\
- priority: one of: {priorities}. Infer it from urgency and importance cues in the note \
(deadlines, words like \"asap\" or \"critical\", consequences of missing it).\n\
- due_date: if the note states or implies a date, give it as YYYY-MM-DD, resolving \
relative phrases like \"tomorrow\" or \"next Friday\" against today's date. \
If there is no date, use JSON null.\n\
\n\
Respond with ONLY a JSON object with exactly these keys: \"task\", \"category\", \"priority\", \"due_date\".\n\
No commentary, no Markdown, no extra keys.\n\
Never use placeholder values such as \"YYYY-MM-DD\", \"string\" or \"...\"; use real values from the note.\n\
\n\
Note: {raw_text}",
        today = reference_date.format("%Y-%m-%d"),
        weekday = reference_date.format("%A"),
    )
}

/// Parse a model reply into extracted fields. Malformed input yields all-`None`.
///
/// The reply only has to contain the object: a Markdown fence or prose around
/// it is tolerated.
pub fn parse_response(reply: &str) -> ExtractedFields {
    let body = strip_code_fence(reply);
    let value = match serde_json::from_str::<Value>(body) {
        Ok(v) => v,
        Err(e) => match embedded_object(body) {
            Some(v) => {
                debug!("model reply has text around the JSON object; using the object");
                v
            }
            None => {
                debug!(error = %e, "model reply is not JSON; treating as empty");
                return ExtractedFields::default();
            }
        },
    };

    match value {
        Value::Object(map) => match serde_json::from_value::<ExtractedFields>(Value::Object(map)) {
            Ok(fields) => fields,
            Err(e) => {
                debug!(error = %e, "model reply has the wrong shape; treating as empty");
                ExtractedFields::default()
            }
        },
        other => {
            debug!(kind = json_kind(&other), "model reply is not a JSON object; treating as empty");
            ExtractedFields::default()
        }
    }
}

/// Models often wrap JSON in ```json (or ```JSON) fences despite instructions.
fn strip_code_fence(reply: &str) -> &str {
    let s = reply.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// The span from the first `{` to the last `}`, if it parses as JSON.
fn embedded_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn is_no_date_marker(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "" | "null" | "none" | "no date" | "n/a"
    )
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_prompt_embeds_schema_and_input() {
        let p = build_prompt("call the dentist tmrw", d(2025, 6, 10));
        assert!(p.contains("call the dentist tmrw"));
        assert!(p.contains("2025-06-10"));
        assert!(p.contains("Tuesday"));
        for key in ["\"task\"", "\"category\"", "\"priority\"", "\"due_date\""] {
            assert!(p.contains(key), "missing {key}");
        }
        assert!(p.contains("Work, Personal, Shopping, Health, Study, Finance"));
        assert!(p.contains("low, medium, high, urgent"));
    }

    #[test]
    fn test_parse_plain_json() {
        let f = parse_response(
            r#"{"task":"Buy milk","category":"Shopping","priority":"low","due_date":null}"#,
        );
        assert_eq!(f.task.as_deref(), Some("Buy milk"));
        assert_eq!(f.category.as_deref(), Some("Shopping"));
        assert_eq!(f.priority.as_deref(), Some("low"));
        assert_eq!(f.due_date, None);
    }

    #[test]
    fn test_parse_fenced_json() {
        let f = parse_response("```json\n{\"task\":\"Run\",\"category\":\"Health\"}\n```");
        assert_eq!(f.task.as_deref(), Some("Run"));
        assert_eq!(f.category.as_deref(), Some("Health"));
        assert_eq!(f.priority, None);
    }

    #[test]
    fn test_parse_fence_tag_ignores_case() {
        let f = parse_response("```JSON\n{\"task\":\"Run\",\"priority\":\"high\"}\n```");
        assert_eq!(f.task.as_deref(), Some("Run"));
        assert_eq!(f.priority.as_deref(), Some("high"));
    }

    #[test]
    fn test_parse_object_inside_prose() {
        let f = parse_response(
            "Here is the task:\n{\"task\":\"Run\",\"category\":\"Health\"}\nLet me know!",
        );
        assert_eq!(f.task.as_deref(), Some("Run"));
        assert_eq!(f.category.as_deref(), Some("Health"));

        let f = parse_response("Sure:\n```json\n{\"task\":\"Run\"}\n```");
        assert_eq!(f.task.as_deref(), Some("Run"));
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert_eq!(parse_response("use {curly} braces"), ExtractedFields::default());
        assert_eq!(parse_response("} backwards {"), ExtractedFields::default());
        assert_eq!(parse_response("Sure! Here is your task."), ExtractedFields::default());
        assert_eq!(parse_response("[1, 2, 3]"), ExtractedFields::default());
        assert_eq!(parse_response(""), ExtractedFields::default());
    }

    #[test]
    fn test_parse_wrong_types_is_empty() {
        let f = parse_response(r#"{"task": 42, "category": "Work"}"#);
        assert_eq!(f, ExtractedFields::default());
    }

    #[test]
    fn test_no_date_markers() {
        assert!(is_no_date_marker(" None "));
        assert!(is_no_date_marker("null"));
        assert!(!is_no_date_marker("2025-06-14"));
    }
}
