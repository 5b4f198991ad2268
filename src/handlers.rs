use anyhow::anyhow;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audio::{decode_pcm_base64, pcm_to_wav, CHANNELS, SAMPLE_RATE};
use crate::error::AppError;
use crate::llm::todo::{parse_decision, EXTRACTION_PROMPT};
use crate::llm::ChatCompletion as _;
use crate::notion::{NotesStore as _, TodoRecord};
use crate::state::AppState;

/// Recognized `mode` value for the todo endpoint.
const MODE_TODO: &str = "todo";

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    /// Base64-encoded raw PCM, 16 kHz / 16-bit / mono.
    #[serde(default)]
    pub audio: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub session_id: String,
    pub recognized_text: String,
    pub is_todo: bool,
    pub title: Option<String>,
    pub when: Option<String>,
    pub notes: Option<String>,
    /// Whether the record reached the notes store. Save failures are
    /// reported here, not as request failures.
    pub saved: bool,
}

/// `POST /api/todo` — utterance to structured todo record.
pub async fn capture_todo(
    State(state): State<AppState>,
    Json(request): Json<VoiceRequest>,
) -> Result<Json<TodoResponse>, AppError> {
    match request.mode.as_deref() {
        Some(MODE_TODO) => {}
        other => {
            return Err(AppError::BadRequest(format!(
                "mode must be \"{}\", got {:?}",
                MODE_TODO, other
            )))
        }
    }

    let session_id = request
        .session_id
        .clone()
        .unwrap_or_else(|| state.generate_session_id());
    let pcm = decode_audio(&request)?;

    let wav = pcm_to_wav(&pcm, SAMPLE_RATE, CHANNELS);
    let text = state.stt.recognize(wav).await?;
    info!(%session_id, recognized = %text, "todo capture recognized");

    // Nothing said: short-circuit without consulting the model.
    if text.is_empty() {
        return Ok(Json(TodoResponse {
            session_id,
            recognized_text: text,
            is_todo: false,
            title: None,
            when: None,
            notes: None,
            saved: false,
        }));
    }

    let reply = state.llm.complete(EXTRACTION_PROMPT, &text).await?;
    let decision = parse_decision(&reply);

    let saved = if decision.is_todo {
        let record = TodoRecord {
            title: decision
                .title
                .clone()
                .unwrap_or_else(|| text.clone()),
            when: decision.when.clone(),
            notes: decision.notes.clone(),
            transcript: text.clone(),
        };
        save_record(&state, &record).await
    } else {
        false
    };

    Ok(Json(TodoResponse {
        session_id,
        recognized_text: text,
        is_todo: decision.is_todo,
        title: decision.title,
        when: decision.when,
        notes: decision.notes,
        saved,
    }))
}

/// `POST /api/talk` — utterance to spoken reply.
pub async fn talk(
    State(state): State<AppState>,
    Json(request): Json<VoiceRequest>,
) -> Result<Response, AppError> {
    let pcm = decode_audio(&request)?;

    let wav = pcm_to_wav(&pcm, SAMPLE_RATE, CHANNELS);
    let text = state.stt.recognize(wav).await?;
    info!(recognized = %text, "talk recognized");

    if text.is_empty() {
        return Err(AppError::NothingRecognized);
    }

    let reply = state
        .llm
        .complete(&state.config.openai.reply_prompt, &text)
        .await?;
    let audio = state.tts.synthesize(&reply).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(mime_for_output_format(state.tts.output_format())),
    );
    headers.insert("x-recognized-text", encode_header_text(&text)?);
    headers.insert("x-reply-text", encode_header_text(&reply)?);

    Ok((headers, audio).into_response())
}

/// Reject bad input before any external call is made.
fn decode_audio(request: &VoiceRequest) -> Result<Vec<u8>, AppError> {
    if request.audio.is_empty() {
        return Err(AppError::BadRequest("audio field is missing or empty".into()));
    }
    let pcm = decode_pcm_base64(&request.audio)
        .map_err(|e| AppError::BadRequest(format!("audio is not valid base64: {}", e)))?;
    if pcm.is_empty() {
        return Err(AppError::BadRequest("decoded audio payload is empty".into()));
    }
    if pcm.len() % 2 != 0 {
        return Err(AppError::BadRequest(
            "decoded audio payload is not 16-bit aligned".into(),
        ));
    }
    Ok(pcm)
}

async fn save_record(state: &AppState, record: &TodoRecord) -> bool {
    let Some(notes) = &state.notes else {
        warn!("skipping save, notes store not configured");
        return false;
    };
    match notes.save(record).await {
        Ok(()) => true,
        Err(err) => {
            warn!(%err, "saving todo record failed");
            false
        }
    }
}

/// Header values must stay ASCII, so the echoed texts are percent-encoded.
fn encode_header_text(text: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&urlencoding::encode(text))
        .map_err(|e| AppError::Internal(anyhow!("header encoding failed: {}", e)))
}

fn mime_for_output_format(format: &str) -> &'static str {
    if format.starts_with("riff") {
        "audio/wav"
    } else if format.contains("mp3") {
        "audio/mpeg"
    } else {
        // raw PCM and anything unrecognized
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    fn request(audio: &str) -> VoiceRequest {
        VoiceRequest {
            audio: audio.to_string(),
            session_id: None,
            mode: Some(MODE_TODO.to_string()),
        }
    }

    #[test]
    fn test_decode_audio_accepts_aligned_payload() {
        let encoded = STANDARD.encode([0x01, 0x02, 0x03, 0x04]);
        let pcm = decode_audio(&request(&encoded)).unwrap();
        assert_eq!(pcm, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_decode_audio_rejects_empty_field() {
        assert!(matches!(
            decode_audio(&request("")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_decode_audio_rejects_invalid_base64() {
        assert!(matches!(
            decode_audio(&request("***")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_decode_audio_rejects_odd_length_payload() {
        let encoded = STANDARD.encode([0x01, 0x02, 0x03]);
        assert!(matches!(
            decode_audio(&request(&encoded)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_header_text_is_ascii_safe() {
        let value = encode_header_text("牛乳を買う").unwrap();
        assert!(value.to_str().unwrap().is_ascii());
        assert_eq!(
            urlencoding::decode(value.to_str().unwrap()).unwrap(),
            "牛乳を買う"
        );
    }

    #[test]
    fn test_mime_for_output_format() {
        assert_eq!(mime_for_output_format("riff-16khz-16bit-mono-pcm"), "audio/wav");
        assert_eq!(
            mime_for_output_format("audio-16khz-32kbitrate-mono-mp3"),
            "audio/mpeg"
        );
        assert_eq!(
            mime_for_output_format("raw-16khz-16bit-mono-pcm"),
            "application/octet-stream"
        );
    }
}
