use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::config::Config;
use crate::llm::{AzureOpenAiClient, ChatCompletion};
use crate::notion::{NotesStore, NotionClient};
use crate::speech::{SttClient, TtsClient};

/// Shared, read-only service handles. Cloned per request; no mutable
/// state crosses invocations.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub stt: Arc<SttClient>,
    pub tts: Arc<TtsClient>,
    pub llm: Arc<dyn ChatCompletion>,
    pub notes: Option<Arc<dyn NotesStore>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let stt = Arc::new(SttClient::new(&config.speech));
        let tts = Arc::new(TtsClient::new(&config.speech));
        let llm: Arc<dyn ChatCompletion> = Arc::new(AzureOpenAiClient::new(&config.openai));

        let notes: Option<Arc<dyn NotesStore>> = match &config.notion {
            Some(notion) => Some(Arc::new(NotionClient::new(notion))),
            None => {
                warn!("notion is not configured, todo records will not be saved");
                None
            }
        };

        Self {
            config,
            stt,
            tts,
            llm,
            notes,
        }
    }

    pub fn generate_session_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
