pub mod conversation;
pub mod errors;

pub use errors::SendRejected;

pub mod settings {
    use serde::{Deserialize, Serialize};
    use std::fs;
    use std::io;
    use std::path::Path;

    pub const DEFAULT_BACKEND_URL: &str = "https://api.kolosal.ai";
    pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-maverick-17b-128e-instruct";

    pub const ENV_API_KEY: &str = "AGENT_CHAT_API_KEY";
    pub const ENV_BACKEND_URL: &str = "AGENT_CHAT_BACKEND_URL";

    fn default_backend_url() -> String {
        DEFAULT_BACKEND_URL.to_string()
    }

    fn default_model() -> String {
        DEFAULT_MODEL.to_string()
    }

    fn default_max_tokens() -> u32 {
        1000
    }

    fn default_chunk_size() -> usize {
        10
    }

    fn default_timeout_secs() -> u64 {
        120
    }

    fn default_threshold() -> f32 {
        0.5
    }

    fn default_ocr_language() -> String {
        "auto".to_string()
    }

    /// Which OCR endpoint variant to call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
    #[serde(rename_all = "lowercase")]
    pub enum OcrTransport {
        /// multipart/form-data upload of the decoded image
        #[default]
        Form,
        /// JSON body carrying the base64 payload
        Json,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppSettings {
        #[serde(default = "default_backend_url")]
        pub backend_url: String,
        /// Bearer token for the backend. Falls back to the environment.
        #[serde(default)]
        pub api_key: Option<String>,
        #[serde(default = "default_model")]
        pub default_model: String,
        #[serde(default = "default_max_tokens")]
        pub max_tokens: u32,
        /// Characters appended per frame while revealing a reply.
        #[serde(default = "default_chunk_size")]
        pub reveal_chunk_size: usize,
        #[serde(default = "default_timeout_secs")]
        pub request_timeout_secs: u64,
        #[serde(default = "default_threshold")]
        pub detect_threshold: f32,
        #[serde(default = "default_ocr_language")]
        pub ocr_language: String,
        #[serde(default)]
        pub ocr_transport: OcrTransport,
        #[serde(default)]
        pub dark_mode: bool,
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                backend_url: default_backend_url(),
                api_key: None,
                default_model: default_model(),
                max_tokens: default_max_tokens(),
                reveal_chunk_size: default_chunk_size(),
                request_timeout_secs: default_timeout_secs(),
                detect_threshold: default_threshold(),
                ocr_language: default_ocr_language(),
                ocr_transport: OcrTransport::default(),
                dark_mode: true,
            }
        }
    }

    impl AppSettings {
        /// Read settings from `path`. A missing or malformed file yields defaults.
        pub fn load_from(path: &Path) -> Self {
            match fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<AppSettings>(&bytes) {
                    Ok(settings) => settings,
                    Err(e) => {
                        tracing::warn!("ignoring unreadable settings at {:?}: {}", path, e);
                        Self::default()
                    }
                },
                Err(_) => Self::default(),
            }
        }

        pub fn save_to(&self, path: &Path) -> io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let bytes = serde_json::to_vec_pretty(self)?;
            fs::write(path, bytes)
        }

        /// Apply `AGENT_CHAT_*` environment overrides.
        pub fn with_env_overrides(mut self) -> Self {
            self.apply_overrides(
                std::env::var(ENV_API_KEY).ok(),
                std::env::var(ENV_BACKEND_URL).ok(),
            );
            self
        }

        fn apply_overrides(&mut self, api_key: Option<String>, backend_url: Option<String>) {
            if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
                self.api_key = Some(key.trim().to_string());
            }
            if let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) {
                self.backend_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        /// Chunk size used by the reveal engine, never zero.
        pub fn chunk_size(&self) -> usize {
            self.reveal_chunk_size.max(1)
        }
    }

}

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    /// Role/content pair as sent to the chat completion endpoint.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: String, // "system" | "user" | "assistant"
        pub content: String,
    }
}
