use reqwest::Client;
use tracing::debug;

use crate::config::SpeechConfig;
use crate::error::AppError;

/// Azure Speech synthesis client.
pub struct TtsClient {
    client: Client,
    subscription_key: String,
    region: String,
    language: String,
    voice: String,
    output_format: String,
}

impl TtsClient {
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            client: Client::new(),
            subscription_key: config.subscription_key.clone(),
            region: config.region.clone(),
            language: config.language.clone(),
            voice: config.voice.clone(),
            output_format: config.output_format.clone(),
        }
    }

    pub fn output_format(&self) -> &str {
        &self.output_format
    }

    /// Synthesize text into audio bytes in the configured output format.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AppError> {
        let url = format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        );
        let ssml = build_ssml(text, &self.language, &self.voice);

        debug!(ssml_bytes = ssml.len(), "sending synthesis request");

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", &self.output_format)
            .body(ssml)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream {
                service: "azure-speech-tts",
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

fn build_ssml(text: &str, language: &str, voice: &str) -> String {
    format!(
        r#"<speak version="1.0" xml:lang="{}"><voice name="{}">{}</voice></speak>"#,
        language,
        voice,
        escape_xml(text)
    )
}

/// The reply text is interpolated into the SSML document, so the five
/// XML special characters must not pass through literally.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
