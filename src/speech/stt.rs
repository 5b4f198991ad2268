use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::SpeechConfig;
use crate::error::AppError;

/// Azure Speech short-form recognition client.
pub struct SttClient {
    client: Client,
    subscription_key: String,
    region: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct RecognitionResponse {
    #[serde(rename = "RecognitionStatus")]
    recognition_status: String,
    #[serde(rename = "DisplayText", default)]
    display_text: Option<String>,
}

impl SttClient {
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            client: Client::new(),
            subscription_key: config.subscription_key.clone(),
            region: config.region.clone(),
            language: config.language.clone(),
        }
    }

    /// Recognize a single short utterance from a WAV byte stream.
    ///
    /// An unsuccessful recognition status (silence, noise) is not an
    /// error; it comes back as empty text and the caller decides what a
    /// "nothing said" outcome means for its endpoint.
    pub async fn recognize(&self, wav: Vec<u8>) -> Result<String, AppError> {
        let url = format!(
            "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1?language={}",
            self.region, self.language
        );

        debug!(wav_bytes = wav.len(), "sending audio for recognition");

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .header("Content-Type", "audio/wav")
            .body(wav)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream {
                service: "azure-speech-stt",
                status: status.as_u16(),
            });
        }

        let result: RecognitionResponse = response.json().await?;
        Ok(recognized_text(result))
    }
}

fn recognized_text(response: RecognitionResponse) -> String {
    if response.recognition_status != "Success" {
        warn!(
            status = %response.recognition_status,
            "recognition did not succeed, treating as empty"
        );
        return String::new();
    }
    response.display_text.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_recognition_returns_display_text() {
        let response: RecognitionResponse = serde_json::from_str(
            r#"{"RecognitionStatus":"Success","DisplayText":"牛乳を買う","Offset":0,"Duration":1200}"#,
        )
        .unwrap();
        assert_eq!(recognized_text(response), "牛乳を買う");
    }

    #[test]
    fn test_no_match_yields_empty_text() {
        let response: RecognitionResponse =
            serde_json::from_str(r#"{"RecognitionStatus":"NoMatch"}"#).unwrap();
        assert_eq!(recognized_text(response), "");
    }

    #[test]
    fn test_success_without_display_text_yields_empty() {
        let response: RecognitionResponse =
            serde_json::from_str(r#"{"RecognitionStatus":"Success"}"#).unwrap();
        assert_eq!(recognized_text(response), "");
    }
}
