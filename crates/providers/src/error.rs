use serde_json::Value;

/// Failure talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {}", error_detail(.body).unwrap_or_default())]
    Status { status: u16, body: Value },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl BackendError {
    /// The most useful human-readable message for this failure.
    pub fn detail(&self) -> String {
        match self {
            BackendError::Status { status, body } => {
                error_detail(body).unwrap_or_else(|| format!("HTTP {}", status))
            }
            BackendError::Transport(e) => e.to_string(),
            BackendError::Decode(msg) => msg.clone(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            BackendError::Transport(e) => e.status().map(|s| s.as_u16()),
            BackendError::Decode(_) => None,
        }
    }
}

/// Pull an error message out of a JSON error body.
///
/// Looks at `detail`, `message`, `error` (string or `{message}`), then the
/// same fields one level down under `details`.
pub fn error_detail(body: &Value) -> Option<String> {
    fn direct(body: &Value) -> Option<String> {
        let as_text = |v: &Value| v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(String::from);

        body.get("detail")
            .and_then(as_text)
            .or_else(|| body.get("message").and_then(as_text))
            .or_else(|| body.get("error").and_then(as_text))
            .or_else(|| {
                body.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(as_text)
            })
    }

    body.get("details")
        .and_then(direct)
        .or_else(|| direct(body))
}
