use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    pub speech: SpeechConfig,
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub notion: Option<NotionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Azure Speech credentials plus the capture/synthesis parameters both
/// speech clients share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub subscription_key: String,
    #[serde(default)]
    pub region: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub deployment: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_reply_prompt")]
    pub reply_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    pub token: String,
    pub database_id: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_language() -> String {
    "ja-JP".to_string()
}

fn default_voice() -> String {
    "ja-JP-NanamiNeural".to_string()
}

fn default_output_format() -> String {
    "riff-16khz-16bit-mono-pcm".to_string()
}

fn default_api_version() -> String {
    "2024-02-15-preview".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_reply_prompt() -> String {
    "You are a friendly voice assistant on a small desk device. \
     Answer in one or two short spoken sentences, in the same language \
     the user spoke."
        .to_string()
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;

        let path_lower = path.to_lowercase();
        let mut config: Config = if path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Credentials may be supplied through the environment instead of the
    /// config file. Resolved once at load time; nothing reads the
    /// environment after this.
    fn apply_env_overrides(&mut self) {
        env_override(&mut self.speech.subscription_key, "AZURE_SPEECH_KEY");
        env_override(&mut self.speech.region, "AZURE_SPEECH_REGION");
        env_override(&mut self.openai.endpoint, "AZURE_OPENAI_ENDPOINT");
        env_override(&mut self.openai.deployment, "AZURE_OPENAI_DEPLOYMENT");
        env_override(&mut self.openai.api_key, "AZURE_OPENAI_KEY");

        let token = std::env::var("NOTION_TOKEN").ok().filter(|v| !v.is_empty());
        let database_id = std::env::var("NOTION_DATABASE_ID")
            .ok()
            .filter(|v| !v.is_empty());
        match (&mut self.notion, token, database_id) {
            (Some(notion), token, database_id) => {
                if let Some(token) = token {
                    notion.token = token;
                }
                if let Some(database_id) = database_id {
                    notion.database_id = database_id;
                }
            }
            (notion @ None, Some(token), Some(database_id)) => {
                *notion = Some(NotionConfig { token, database_id });
            }
            _ => {}
        }
    }

    /// Required credentials are checked once at startup so a misconfigured
    /// deployment fails before serving. The Notion section is optional;
    /// when present it must be complete.
    pub fn validate(&self) -> Result<()> {
        if self.speech.subscription_key.is_empty() {
            bail!("speech.subscription_key is not set (or AZURE_SPEECH_KEY)");
        }
        if self.speech.region.is_empty() {
            bail!("speech.region is not set (or AZURE_SPEECH_REGION)");
        }
        if self.openai.endpoint.is_empty() {
            bail!("openai.endpoint is not set (or AZURE_OPENAI_ENDPOINT)");
        }
        if self.openai.deployment.is_empty() {
            bail!("openai.deployment is not set (or AZURE_OPENAI_DEPLOYMENT)");
        }
        if self.openai.api_key.is_empty() {
            bail!("openai.api_key is not set (or AZURE_OPENAI_KEY)");
        }
        if let Some(notion) = &self.notion {
            if notion.token.is_empty() || notion.database_id.is_empty() {
                bail!("notion section is present but token or database_id is empty");
            }
        }
        Ok(())
    }
}

fn env_override(target: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if !value.is_empty() {
            *target = value;
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
