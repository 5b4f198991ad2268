use serde::{Deserialize, Serialize};
use tracing::debug;

/// System prompt for the task-extraction call. The model is asked for a
/// bare JSON object; anything it returns that does not parse is handled
/// by [`parse_decision`].
pub const EXTRACTION_PROMPT: &str = "\
You classify a short transcribed voice memo. Decide whether the speaker \
is recording a task to do. Reply with only a JSON object, no prose and \
no code fences: {\"is_todo\": bool, \"title\": string, \"when\": string, \
\"notes\": string}. \"title\" is a short imperative task name in the \
speaker's language. \"when\" is the due date or time mentioned, verbatim. \
\"notes\" is any remaining detail. Omit fields you cannot fill. If the \
utterance is not a task, reply {\"is_todo\": false}.";

/// Structured output of the task-extraction call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoDecision {
    #[serde(default)]
    pub is_todo: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Best-effort parse of the model's reply. Models sometimes wrap the
/// object in Markdown code fences; strip those, then try JSON. Any
/// failure means "not a task", never a request error.
pub fn parse_decision(raw: &str) -> TodoDecision {
    let trimmed = strip_code_fences(raw.trim());
    match serde_json::from_str::<TodoDecision>(trimmed) {
        Ok(decision) => decision,
        Err(err) => {
            debug!(%err, "model reply did not parse as a todo decision");
            TodoDecision::default()
        }
    }
}

fn strip_code_fences(raw: &str) -> &str {
    let Some(inner) = raw.strip_prefix("```") else {
        return raw;
    };
    // Opening fence may carry a language tag ("```json").
    let inner = inner.strip_prefix("json").unwrap_or(inner).trim();
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
