use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::NotionConfig;
use crate::error::AppError;

const NOTION_API_URL: &str = "https://api.notion.com/v1/pages";
const NOTION_VERSION: &str = "2022-06-28";

/// A task extracted from an utterance, ready to persist.
#[derive(Debug, Clone)]
pub struct TodoRecord {
    pub title: String,
    pub when: Option<String>,
    pub notes: Option<String>,
    /// The raw recognized utterance, kept with the record for context.
    pub transcript: String,
}

/// Notes-storage seam. A failed save is reported to the caller as a
/// flag, never as a request failure.
#[async_trait]
pub trait NotesStore: Send + Sync {
    async fn save(&self, record: &TodoRecord) -> Result<(), AppError>;
}

pub struct NotionClient {
    client: Client,
    token: String,
    database_id: String,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Self {
        Self {
            client: Client::new(),
            token: config.token.clone(),
            database_id: config.database_id.clone(),
        }
    }
}

#[async_trait]
impl NotesStore for NotionClient {
    async fn save(&self, record: &TodoRecord) -> Result<(), AppError> {
        let body = build_page_body(&self.database_id, record);

        debug!(title = %record.title, "creating notion page");

        let response = self
            .client
            .post(NOTION_API_URL)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream {
                service: "notion",
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

fn build_page_body(database_id: &str, record: &TodoRecord) -> Value {
    let mut properties = json!({
        "Name": {
            "title": [{ "text": { "content": &record.title } }]
        },
    });

    if let Some(when) = &record.when {
        properties["When"] = json!({
            "rich_text": [{ "text": { "content": when } }]
        });
    }
    if let Some(notes) = &record.notes {
        properties["Notes"] = json!({
            "rich_text": [{ "text": { "content": notes } }]
        });
    }

    let captured = format!(
        "Captured at {}: {}",
        Local::now().format("%Y-%m-%d %H:%M"),
        record.transcript
    );

    json!({
        "parent": { "database_id": database_id },
        "properties": properties,
        "children": [{
            "object": "block",
            "type": "paragraph",
            "paragraph": {
                "rich_text": [{ "type": "text", "text": { "content": captured } }]
            }
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TodoRecord {
        TodoRecord {
            title: "牛乳を買う".into(),
            when: Some("明日".into()),
            notes: None,
            transcript: "明日牛乳を買わないと".into(),
        }
    }

    #[test]
    fn test_page_body_targets_database() {
        let body = build_page_body("db-123", &record());
        assert_eq!(body["parent"]["database_id"], "db-123");
    }

    #[test]
    fn test_title_and_when_properties() {
        let body = build_page_body("db", &record());
        assert_eq!(
            body["properties"]["Name"]["title"][0]["text"]["content"],
            "牛乳を買う"
        );
        assert_eq!(
            body["properties"]["When"]["rich_text"][0]["text"]["content"],
            "明日"
        );
        // Absent annotation never becomes an empty property.
        assert!(body["properties"].get("Notes").is_none());
    }

    #[test]
    fn test_transcript_lands_in_child_paragraph() {
        let body = build_page_body("db", &record());
        let text = body["children"][0]["paragraph"]["rich_text"][0]["text"]["content"]
            .as_str()
            .unwrap();
        assert!(text.contains("明日牛乳を買わないと"));
    }
}
